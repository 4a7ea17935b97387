//! Reduction of per-agent reports into one report for the whole run.
//!
//! Agents summarise their own samples before reporting, so latency figures are combined as a
//! mean of summaries rather than recomputed from raw data. This is only meaningful because every
//! agent of a run is driven with the same target load for the same duration.
use crate::{
    AggregationConfig, DurationCheck, LatencyAggregate, LatencyReport, MeanPolicy, Percentile,
    PercentileEstimate, StatsError, ThroughputReport,
};
use humantime::format_duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// Sum the byte and request counters of every agent.
///
/// The measurement window is not summed: it is taken from the first report, after checking the
/// others against it according to `config.duration_check`.
pub fn aggregate_throughput(
    reports: &[ThroughputReport],
    config: &AggregationConfig,
) -> Result<ThroughputReport, StatsError> {
    let first = reports.first().ok_or(StatsError::NoReports)?;

    for (index, report) in reports.iter().enumerate().skip(1) {
        if report.duration_micros() == first.duration_micros() {
            continue;
        }

        match config.duration_check {
            DurationCheck::Strict => {
                return Err(StatsError::InconsistentDuration {
                    index,
                    expected: first.duration,
                    found: report.duration,
                });
            }
            DurationCheck::TrustFirst => {
                warn!(
                    "Agent {index} measured over {} instead of {}; using the first agent's window.",
                    format_duration(report.duration),
                    format_duration(first.duration),
                );
            }
        }
    }

    let aggregate = reports.iter().try_fold(
        ThroughputReport {
            duration: first.duration,
            ..Default::default()
        },
        |acc, report| {
            Ok::<_, StatsError>(ThroughputReport {
                rx_bytes: add(acc.rx_bytes, report.rx_bytes, "rx_bytes")?,
                tx_bytes: add(acc.tx_bytes, report.tx_bytes, "tx_bytes")?,
                req_count: add(acc.req_count, report.req_count, "req_count")?,
                correct_iad: add(acc.correct_iad, report.correct_iad, "correct_iad")?,
                duration: acc.duration,
            })
        },
    )?;

    debug!(
        "Aggregated throughput of {} agents: {} requests over {}",
        reports.len(),
        aggregate.req_count,
        format_duration(aggregate.duration)
    );

    Ok(aggregate)
}

/// Merge every agent's latency summary.
///
/// Latency fields are averaged (see [`MeanPolicy`]) with integer truncation. Stationarity and
/// independence are counted rather than averaged. A sampling reduction is only recommended when
/// no agent judged its samples independent, in which case the smallest suggestion wins.
pub fn aggregate_latency(
    reports: &[LatencyReport],
    config: &AggregationConfig,
) -> Result<LatencyAggregate, StatsError> {
    if reports.is_empty() {
        return Err(StatsError::NoReports);
    }

    // Weights never sum past this total, which keeps every weighted sum within a u128.
    let sample_count = reports
        .iter()
        .try_fold(0, |acc, r| add(acc, r.sample_count, "sample_count"))?;
    let mean = Mean::new(reports, config.mean)?;

    let mut aggregate = LatencyAggregate {
        agent_count: reports.len(),
        avg_latency: mean.of("avg_latency", |r| r.avg_latency)?,
        stationary_count: reports.iter().filter(|r| r.is_stationary).count(),
        iid_count: reports.iter().filter(|r| r.is_iid).count(),
        sample_count,
        ..Default::default()
    };

    for percentile in Percentile::ALL {
        *aggregate.percentile_mut(percentile) = PercentileEstimate {
            estimate: mean.of("percentile", |r| r.percentile(percentile).estimate)?,
            lower: mean.of("percentile", |r| r.percentile(percentile).lower)?,
            upper: mean.of("percentile", |r| r.percentile(percentile).upper)?,
        };
    }

    // NOTE: A single independent agent is enough to drop the recommendation, even if the others
    // suggested a reduction.
    if aggregate.iid_count == 0 {
        aggregate.to_reduce_sampling = reports
            .iter()
            .map(|r| r.to_reduce_sampling)
            .fold(config.sampling_sentinel, u64::min);
        debug!(
            "No agent reported IID samples; recommending {} samples",
            aggregate.to_reduce_sampling
        );
    }

    debug!(
        "Aggregated latency of {} agents ({} stationary, {} IID)",
        aggregate.agent_count, aggregate.stationary_count, aggregate.iid_count
    );

    Ok(aggregate)
}

/// Per-report weights for averaging a field across agents.
struct Mean<'a> {
    reports: &'a [LatencyReport],
    weights: Vec<u128>,
    total: u128,
}

impl<'a> Mean<'a> {
    fn new(reports: &'a [LatencyReport], policy: MeanPolicy) -> Result<Self, StatsError> {
        let weights: Vec<u128> = match policy {
            MeanPolicy::Unweighted => vec![1; reports.len()],
            MeanPolicy::WeightedBySamples => {
                reports.iter().map(|r| r.sample_count as u128).collect()
            }
        };

        let total: u128 = weights.iter().sum();
        if total == 0 {
            return Err(StatsError::ZeroSampleWeight);
        }

        Ok(Self {
            reports,
            weights,
            total,
        })
    }

    fn of(
        &self,
        name: &'static str,
        field: impl Fn(&LatencyReport) -> u64,
    ) -> Result<u64, StatsError> {
        let sum = self
            .reports
            .iter()
            .zip(&self.weights)
            .try_fold(0u128, |acc, (r, w)| {
                (field(r) as u128)
                    .checked_mul(*w)
                    .and_then(|weighted| acc.checked_add(weighted))
            })
            .ok_or(StatsError::CounterOverflow(name))?;

        // The mean never exceeds the largest input, so it always fits back into a u64.
        Ok((sum / self.total) as u64)
    }
}

fn add(acc: u64, value: u64, name: &'static str) -> Result<u64, StatsError> {
    acc.checked_add(value).ok_or(StatsError::CounterOverflow(name))
}
