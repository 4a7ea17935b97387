//! One coordinator print cycle: aggregate, emit, decide.
use crate::collector::RunReports;
use crate::error::RuntimeError;
use lancet_core::{
    aggregate_latency, aggregate_throughput, ci_width_for_rank, AggregationConfig,
    LatencyAggregate, ReportFormatter, ThroughputReport,
};
use std::fmt;
use std::path::PathBuf;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Accepted relative deviation between achieved and target request rate.
pub const DEFAULT_RPS_TOLERANCE: f64 = 0.05;

/// Percentile whose confidence interval gates a run by default.
pub const DEFAULT_CI_PERCENTILE: u8 = 99;

/// Acceptance criteria the coordinator checks a finished run against.
#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds {
    pub target_rps: Option<f64>,
    pub rps_tolerance: f64,
    pub ci_percentile: u8,
    pub max_ci_width: Option<u64>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            target_rps: None,
            rps_tolerance: DEFAULT_RPS_TOLERANCE,
            ci_percentile: DEFAULT_CI_PERCENTILE,
            max_ci_width: None,
        }
    }
}

impl Thresholds {
    pub fn target_rps(mut self, rps: f64) -> Self {
        self.target_rps = Some(rps);
        self
    }

    pub fn rps_tolerance(mut self, tolerance: f64) -> Self {
        self.rps_tolerance = tolerance;
        self
    }

    pub fn ci_percentile(mut self, rank: u8) -> Self {
        self.ci_percentile = rank;
        self
    }

    pub fn max_ci_width(mut self, width: u64) -> Self {
        self.max_ci_width = Some(width);
        self
    }

    fn evaluate(&self, rps: f64, ci_width: u64, latency: &LatencyAggregate) -> Vec<Verdict> {
        let mut verdicts = vec![];

        if let Some(target) = self.target_rps {
            if target > 0. && ((rps - target) / target).abs() > self.rps_tolerance {
                verdicts.push(Verdict::LoadMismatch {
                    achieved: rps,
                    target,
                });
            }
        }

        if let Some(max) = self.max_ci_width {
            if ci_width > max {
                verdicts.push(Verdict::WideInterval {
                    width: ci_width,
                    max,
                });
            }
        }

        if !latency.all_stationary() {
            verdicts.push(Verdict::NotStationary {
                stationary: latency.stationary_count,
                agents: latency.agent_count,
            });
        }

        if let Some(samples) = latency.sampling_reduction() {
            verdicts.push(Verdict::ReduceSampling(samples));
        }

        verdicts
    }
}

/// Reasons a run should not be taken at face value.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    LoadMismatch { achieved: f64, target: f64 },
    WideInterval { width: u64, max: u64 },
    NotStationary { stationary: usize, agents: usize },
    ReduceSampling(u64),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadMismatch { achieved, target } => {
                write!(f, "Achieved {achieved:.2} req/s against a target of {target:.2}")
            }
            Self::WideInterval { width, max } => {
                write!(f, "Confidence interval is {width}ns wide (max {max}ns)")
            }
            Self::NotStationary { stationary, agents } => {
                write!(f, "Only {stationary} of {agents} agents saw a stationary latency")
            }
            Self::ReduceSampling(samples) => {
                write!(f, "Samples are not independent; reduce sampling to {samples}")
            }
        }
    }
}

/// Outcome of one print cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleSummary {
    pub throughput: ThroughputReport,
    pub latency: LatencyAggregate,
    pub rps: f64,
    /// Confidence interval width of the gating percentile, as measured by the first agent.
    pub ci_width: u64,
    pub verdicts: Vec<Verdict>,
}

impl CycleSummary {
    pub fn accepted(&self) -> bool {
        self.verdicts.is_empty()
    }
}

pub struct Coordinator {
    config: AggregationConfig,
    formatter: ReportFormatter,
    thresholds: Thresholds,
}

impl Coordinator {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            config: AggregationConfig::default(),
            formatter: ReportFormatter::new(output),
            thresholds: Thresholds::default(),
        }
    }

    pub fn config(mut self, config: AggregationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Reduce a complete run and append it to the output file.
    #[instrument(name = "print_cycle", skip_all, fields(agents = reports.len()))]
    pub fn print_cycle(&self, reports: &RunReports) -> Result<CycleSummary, RuntimeError> {
        let throughput = aggregate_throughput(&reports.throughput, &self.config)?;
        let latency = aggregate_latency(&reports.latency, &self.config)?;
        let ci_width = ci_width_for_rank(&reports.latency, self.thresholds.ci_percentile)?;

        self.formatter.print_cycle(&throughput, &latency)?;

        let rps = throughput.requests_per_sec()?;
        let verdicts = self.thresholds.evaluate(rps, ci_width, &latency);

        if verdicts.is_empty() {
            info!("Run accepted at {rps:.2} req/s");
        }
        for verdict in &verdicts {
            warn!("{verdict}");
        }

        let summary = CycleSummary {
            throughput,
            latency,
            rps,
            ci_width,
            verdicts,
        };
        record_metrics(&summary);

        Ok(summary)
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(summary: &CycleSummary) {
    metrics::gauge!("lancet.requests_per_sec").set(summary.rps);
    metrics::gauge!("lancet.avg_latency_ns").set(summary.latency.avg_latency as f64);
    metrics::gauge!("lancet.ci_width_ns").set(summary.ci_width as f64);
    metrics::counter!("lancet.print_cycles").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_metrics(_summary: &CycleSummary) {}
