//! Default Lancet coordinator runtime
//!
//! Loads one report file per agent, replays the replies through a [`ReportCollector`] and runs a
//! single print cycle once the run is complete.
use crate::{
    collector::ReportCollector,
    coordinator::{
        Coordinator, CycleSummary, Thresholds, DEFAULT_CI_PERCENTILE, DEFAULT_RPS_TOLERANCE,
    },
    error::RuntimeError,
    message::AgentReports,
};
use clap::Parser;
use lancet_core::AggregationConfig;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, instrument, Instrument};

const DEFAULT_COLLECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(version, about = "Merge per-agent load-testing reports into one run report")]
struct LancetCli {
    /// Tab-separated results file; appended to, never truncated
    #[arg(short, long)]
    output: PathBuf,

    /// Weight each agent's latency summary by its sample count
    #[arg(long)]
    weighted: bool,

    /// Take the first agent's measurement window even when others disagree
    #[arg(long)]
    trust_first_duration: bool,

    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    collect_timeout: Duration,

    #[arg(long)]
    target_rps: Option<f64>,

    #[arg(long, default_value_t = DEFAULT_RPS_TOLERANCE)]
    rps_tolerance: f64,

    /// Percentile whose confidence interval is checked
    #[arg(long, default_value_t = DEFAULT_CI_PERCENTILE)]
    ci_percentile: u8,

    /// Widest acceptable confidence interval, in nanoseconds
    #[arg(long)]
    max_ci_width: Option<u64>,

    /// One JSON report file per agent
    #[arg(required = true)]
    reports: Vec<PathBuf>,
}

/// Default Lancet coordinator runtime.
///
/// # Example
///
/// ```ignore
/// use lancet_runtime::LancetRuntime;
///
/// #[tokio::main]
/// async fn main() {
///     let summary = LancetRuntime::from_args().run().await.unwrap();
///     println!("{} req/s", summary.rps);
/// }
/// ```
pub struct LancetRuntime {
    output: PathBuf,
    reports: Vec<PathBuf>,
    config: AggregationConfig,
    thresholds: Thresholds,
    collect_timeout: Duration,
}

impl LancetRuntime {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            reports: vec![],
            config: AggregationConfig::default(),
            thresholds: Thresholds::default(),
            collect_timeout: DEFAULT_COLLECT_TIMEOUT,
        }
    }

    /// Build the runtime from the command line.
    ///
    /// ```ignore
    /// $ lancet-aggregate -o results.tsv agent-0.json agent-1.json
    /// $ lancet-aggregate -o results.tsv --weighted --target-rps 50000 --max-ci-width 20000 agents/*.json
    /// ```
    pub fn from_args() -> Self {
        let args = LancetCli::parse();

        let mut config = AggregationConfig::new();
        if args.weighted {
            config = config.weighted();
        }
        if args.trust_first_duration {
            config = config.trust_first_duration();
        }

        let mut thresholds = Thresholds::default()
            .rps_tolerance(args.rps_tolerance)
            .ci_percentile(args.ci_percentile);
        if let Some(rps) = args.target_rps {
            thresholds = thresholds.target_rps(rps);
        }
        if let Some(width) = args.max_ci_width {
            thresholds = thresholds.max_ci_width(width);
        }

        Self::new(args.output)
            .reports(&args.reports)
            .config(config)
            .thresholds(thresholds)
            .collect_timeout(args.collect_timeout)
    }

    pub fn reports(mut self, reports: &[PathBuf]) -> Self {
        self.reports = reports.to_vec();
        self
    }

    pub fn config(mut self, config: AggregationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn collect_timeout(mut self, timeout: Duration) -> Self {
        self.collect_timeout = timeout;
        self
    }

    #[instrument(name = "lancet", skip_all, fields(output = %self.output.display()))]
    pub async fn run(self) -> Result<CycleSummary, RuntimeError> {
        let agents = self
            .reports
            .iter()
            .map(|path| AgentReports::from_path(path))
            .collect::<Result<Vec<_>, _>>()?;

        let expected = NonZeroUsize::new(agents.len()).ok_or(RuntimeError::NoAgents)?;
        info!("Collecting reports from {expected} agents");

        let collector = ReportCollector::new(expected);
        let sender = collector.sender();
        // NOTE: Replies are replayed in file order, so the first file names the reference agent.
        tokio::spawn(
            async move {
                for reply in agents.into_iter().flat_map(AgentReports::into_replies) {
                    if let Err(err) = sender.send(reply).await {
                        error!("Failed to forward agent reply: {err}");
                    }
                }
            }
            .in_current_span(),
        );

        let reports = collector.collect(self.collect_timeout).await?;

        Coordinator::new(self.output)
            .config(self.config)
            .thresholds(self.thresholds)
            .print_cycle(&reports)
    }
}
