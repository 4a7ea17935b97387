#[cfg(feature = "rt")]
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
#[cfg(feature = "rt")]
use serde_with::{serde_as, DurationMicroSeconds};
use std::time::Duration;

use crate::Percentile;

/// Throughput counters measured by one agent, or the sum over every agent of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "rt", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct ThroughputReport {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub req_count: u64,
    /// Requests whose observed inter-arrival delay matched the intended distribution.
    pub correct_iad: u64,
    /// Length of the measurement window. Only whole microseconds are significant.
    #[cfg_attr(feature = "rt", serde_as(as = "DurationMicroSeconds<u64>"))]
    pub duration: Duration,
}

impl ThroughputReport {
    pub fn new(
        rx_bytes: u64,
        tx_bytes: u64,
        req_count: u64,
        correct_iad: u64,
        duration: Duration,
    ) -> Self {
        Self {
            rx_bytes,
            tx_bytes,
            req_count,
            correct_iad,
            duration,
        }
    }

    pub fn duration_micros(&self) -> u128 {
        self.duration.as_micros()
    }
}

/// A percentile point estimate bracketed by its confidence interval. All values are nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct PercentileEstimate {
    pub estimate: u64,
    pub lower: u64,
    pub upper: u64,
}

impl PercentileEstimate {
    pub fn new(estimate: u64, lower: u64, upper: u64) -> Self {
        Self {
            estimate,
            lower,
            upper,
        }
    }

    /// Distance between the interval bounds. Inverted bounds yield zero.
    pub fn ci_width(&self) -> u64 {
        self.upper.saturating_sub(self.lower)
    }
}

/// Latency summary computed by a single agent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct LatencyReport {
    /// Mean request latency in nanoseconds.
    pub avg_latency: u64,
    pub p50: PercentileEstimate,
    pub p90: PercentileEstimate,
    pub p95: PercentileEstimate,
    pub p99: PercentileEstimate,
    pub is_stationary: bool,
    pub is_iid: bool,
    /// Reduced sample count the agent suggests when its samples were not independent. Zero means
    /// no suggestion; since the run takes the smallest suggestion, one agent reporting zero
    /// leaves the whole run without a recommendation.
    pub to_reduce_sampling: u64,
    /// Number of latency samples behind this summary.
    #[cfg_attr(feature = "rt", serde(default))]
    pub sample_count: u64,
}

impl LatencyReport {
    pub fn percentile(&self, percentile: Percentile) -> &PercentileEstimate {
        match percentile {
            Percentile::P50 => &self.p50,
            Percentile::P90 => &self.p90,
            Percentile::P95 => &self.p95,
            Percentile::P99 => &self.p99,
        }
    }
}

/// Latency view of a whole run, merged from every agent's [`LatencyReport`].
///
/// The per-agent `is_stationary` / `is_iid` flags become counts here, so a reader can tell
/// "every agent agreed" apart from "some agent agreed".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct LatencyAggregate {
    pub agent_count: usize,
    pub avg_latency: u64,
    pub p50: PercentileEstimate,
    pub p90: PercentileEstimate,
    pub p95: PercentileEstimate,
    pub p99: PercentileEstimate,
    pub stationary_count: usize,
    pub iid_count: usize,
    /// Zero when no reduction is recommended.
    pub to_reduce_sampling: u64,
    pub sample_count: u64,
}

impl LatencyAggregate {
    pub fn percentile(&self, percentile: Percentile) -> &PercentileEstimate {
        match percentile {
            Percentile::P50 => &self.p50,
            Percentile::P90 => &self.p90,
            Percentile::P95 => &self.p95,
            Percentile::P99 => &self.p99,
        }
    }

    pub fn ci_width(&self, percentile: Percentile) -> u64 {
        self.percentile(percentile).ci_width()
    }

    pub(crate) fn percentile_mut(&mut self, percentile: Percentile) -> &mut PercentileEstimate {
        match percentile {
            Percentile::P50 => &mut self.p50,
            Percentile::P90 => &mut self.p90,
            Percentile::P95 => &mut self.p95,
            Percentile::P99 => &mut self.p99,
        }
    }

    pub fn all_stationary(&self) -> bool {
        self.stationary_count == self.agent_count
    }

    pub fn all_iid(&self) -> bool {
        self.iid_count == self.agent_count
    }

    /// Sample count to reduce to, if any. `None` when an agent saw independent samples or an
    /// agent had no suggestion.
    pub fn sampling_reduction(&self) -> Option<u64> {
        match self.to_reduce_sampling {
            0 => None,
            n => Some(n),
        }
    }
}
