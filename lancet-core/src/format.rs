//! Tab-separated rendering of aggregated reports.
use crate::{LatencyAggregate, Percentile, StatsError, ThroughputReport, NANOS_PER_MICRO};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

const THROUGHPUT_HEADER: &str = "#ReqCount\tQPS\tRxBw\tTxBw";
const LATENCY_HEADER: &str = "#Avg Lat\t50th\t90th\t95th\t99th";

/// A report which renders as one header line and one data line.
pub trait Tabular {
    fn header(&self) -> &'static str;
    fn data_line(&self) -> Result<String, StatsError>;
}

impl Tabular for ThroughputReport {
    fn header(&self) -> &'static str {
        THROUGHPUT_HEADER
    }

    fn data_line(&self) -> Result<String, StatsError> {
        Ok(format!(
            "{}\t{}\t{}\t{}",
            self.req_count,
            self.requests_per_sec()?,
            self.rx_bandwidth()?,
            self.tx_bandwidth()?,
        ))
    }
}

impl Tabular for LatencyAggregate {
    fn header(&self) -> &'static str {
        LATENCY_HEADER
    }

    fn data_line(&self) -> Result<String, StatsError> {
        let mut line = micros(self.avg_latency).to_string();
        for percentile in Percentile::ALL {
            let p = self.percentile(percentile);
            // Writing into a String can't fail.
            let _ = write!(
                line,
                "\t{}({}, {})",
                micros(p.estimate),
                micros(p.lower),
                micros(p.upper)
            );
        }
        Ok(line)
    }
}

fn micros(nanos: u64) -> f64 {
    nanos as f64 / NANOS_PER_MICRO
}

/// Appends aggregated reports to a results file and echoes them to stdout.
#[derive(Clone, Debug)]
pub struct ReportFormatter {
    path: PathBuf,
}

impl ReportFormatter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one header/data pair. The file is created if missing and never truncated; the handle
    /// is closed before returning, on success or failure.
    pub fn append<T: Tabular>(&self, report: &T) -> Result<(), StatsError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| StatsError::OutputOpen {
                path: self.path.clone(),
                source,
            })?;

        let mut stdout = io::stdout().lock();
        self.write_to(&mut file, &mut stdout, report)
    }

    /// Write the throughput pair followed by the latency pair.
    pub fn print_cycle(
        &self,
        throughput: &ThroughputReport,
        latency: &LatencyAggregate,
    ) -> Result<(), StatsError> {
        self.append(throughput)?;
        self.append(latency)
    }

    /// Render `report` into arbitrary sinks. The data line is rendered before anything is
    /// written, so a report which can't be rendered leaves no dangling header behind.
    pub fn write_to<T, W, C>(
        &self,
        out: &mut W,
        console: &mut C,
        report: &T,
    ) -> Result<(), StatsError>
    where
        T: Tabular,
        W: Write,
        C: Write,
    {
        let data = report.data_line()?;

        for line in [report.header(), data.as_str()] {
            writeln!(console, "{line}").map_err(StatsError::ConsoleWrite)?;
            writeln!(out, "{line}").map_err(|source| StatsError::OutputWrite {
                path: self.path.clone(),
                source,
            })?;
        }

        trace!("Appended {:?} to {}", report.header(), self.path.display());
        Ok(())
    }
}
