/// Initial candidate when reconciling the sampling reductions suggested by agents. An aggregate
/// never recommends more than this many samples.
pub const DEFAULT_SAMPLING_SENTINEL: u64 = 1_000_000;

/// Durations are carried in whole microseconds; rates scale by this factor to reach per-second.
pub const MICROS_PER_SEC: f64 = 1e6;

/// Latencies are stored in nanoseconds and rendered in microseconds.
pub const NANOS_PER_MICRO: f64 = 1e3;
