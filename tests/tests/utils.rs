use lancet_core::{LatencyReport, PercentileEstimate, ThroughputReport};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            error!("Panic occurred: {info:?}");
            default_panic(info);
        }));

        FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_env_filter("lancet_core=debug,lancet_runtime=debug")
            .with_test_writer()
            .init();
    });
}

/// Scratch file path which does not exist yet.
#[allow(unused)]
pub fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lancet-{name}-{}", uuid::Uuid::new_v4()))
}

#[allow(unused)]
pub fn throughput(rx: u64, tx: u64, req: u64, iad: u64, micros: u64) -> ThroughputReport {
    ThroughputReport::new(rx, tx, req, iad, Duration::from_micros(micros))
}

/// Latency report whose percentiles are multiples of `avg`, each with a +/-10% interval.
#[allow(unused)]
pub fn latency(avg: u64, is_iid: bool, to_reduce_sampling: u64) -> LatencyReport {
    let p = |mult: u64| {
        let estimate = avg * mult;
        PercentileEstimate::new(estimate, estimate - estimate / 10, estimate + estimate / 10)
    };

    LatencyReport {
        avg_latency: avg,
        p50: p(1),
        p90: p(2),
        p95: p(3),
        p99: p(5),
        is_stationary: true,
        is_iid,
        to_reduce_sampling,
        sample_count: 10_000,
    }
}
