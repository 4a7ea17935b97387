use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("No reports to aggregate")]
    NoReports,

    #[error("Agent {index} measured over {found:?} but agent 0 measured over {expected:?}")]
    InconsistentDuration {
        index: usize,
        expected: Duration,
        found: Duration,
    },

    #[error("Weighted mean requested but no agent reported any samples")]
    ZeroSampleWeight,

    #[error("Sum of {0} across agents does not fit in 64 bits")]
    CounterOverflow(&'static str),

    #[error("Rate requested for a zero-length measurement window")]
    ZeroDuration,

    #[error("No confidence interval is tracked for percentile p{0}")]
    UnsupportedPercentile(u8),

    #[error("Can't open {} for appending: {source}", .path.display())]
    OutputOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Can't write to {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Can't echo report to the console: {0}")]
    ConsoleWrite(#[source] std::io::Error),
}

impl StatsError {
    /// Errors which indicate a caller bug rather than a runtime condition. Callers should abort
    /// instead of recovering from these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedPercentile(_))
    }
}
