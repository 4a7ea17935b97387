use crate::{LatencyReport, StatsError};
#[cfg(feature = "rt")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentile kinds every agent reports with a confidence interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub enum Percentile {
    P50,
    P90,
    P95,
    P99,
}

impl Percentile {
    pub const ALL: [Percentile; 4] = [
        Percentile::P50,
        Percentile::P90,
        Percentile::P95,
        Percentile::P99,
    ];

    pub fn from_rank(rank: u8) -> Result<Self, StatsError> {
        match rank {
            50 => Ok(Self::P50),
            90 => Ok(Self::P90),
            95 => Ok(Self::P95),
            99 => Ok(Self::P99),
            other => Err(StatsError::UnsupportedPercentile(other)),
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Self::P50 => 50,
            Self::P90 => 90,
            Self::P95 => 95,
            Self::P99 => 99,
        }
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.rank())
    }
}

/// Width of the confidence interval around `percentile`, as measured by the first agent.
pub fn ci_width(reports: &[LatencyReport], percentile: Percentile) -> Result<u64, StatsError> {
    let first = reports.first().ok_or(StatsError::NoReports)?;
    Ok(first.percentile(percentile).ci_width())
}

/// Same as [`ci_width`] for a numeric rank such as `99`.
///
/// Ranks without interval fields fail with [`StatsError::UnsupportedPercentile`], which is
/// fatal: asking for one is a caller bug.
pub fn ci_width_for_rank(reports: &[LatencyReport], rank: u8) -> Result<u64, StatsError> {
    ci_width(reports, Percentile::from_rank(rank)?)
}
