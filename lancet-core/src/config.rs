use crate::DEFAULT_SAMPLING_SENTINEL;
#[cfg(feature = "rt")]
use serde::{Deserialize, Serialize};

/// How per-agent latency summaries are combined into one figure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub enum MeanPolicy {
    /// Every agent counts once, regardless of how many requests it measured. Only sound when all
    /// agents run the same target load for the same duration.
    #[default]
    Unweighted,
    /// Agents are weighted by the `sample_count` of their report.
    WeightedBySamples,
}

/// What to do when agents report different measurement windows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub enum DurationCheck {
    /// Reject the run with [`crate::StatsError::InconsistentDuration`].
    #[default]
    Strict,
    /// Take the first agent's duration and only log the divergence.
    TrustFirst,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct AggregationConfig {
    pub mean: MeanPolicy,
    pub duration_check: DurationCheck,
    pub sampling_sentinel: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            mean: MeanPolicy::default(),
            duration_check: DurationCheck::default(),
            sampling_sentinel: DEFAULT_SAMPLING_SENTINEL,
        }
    }
}

impl AggregationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weighted(mut self) -> Self {
        self.mean = MeanPolicy::WeightedBySamples;
        self
    }

    pub fn trust_first_duration(mut self) -> Self {
        self.duration_check = DurationCheck::TrustFirst;
        self
    }

    pub fn sampling_sentinel(mut self, sentinel: u64) -> Self {
        self.sampling_sentinel = sentinel;
        self
    }
}
