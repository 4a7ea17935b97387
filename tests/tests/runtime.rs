mod utils;
use utils::*;

use lancet_core::{AggregationConfig, StatsError};
use lancet_runtime::{AgentReports, LancetRuntime, RuntimeError, Thresholds};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

fn write_agent(dir: &Path, reports: &AgentReports) -> PathBuf {
    let path = dir.join(format!("{}.json", reports.agent_id));
    std::fs::write(&path, serde_json::to_string_pretty(reports).unwrap()).unwrap();
    path
}

fn agent(req: u64, micros: u64, avg: u64) -> AgentReports {
    AgentReports {
        agent_id: Uuid::new_v4(),
        throughput: throughput(req * 100, req * 10, req, req, micros),
        latency: latency(avg, true, 0),
    }
}

#[tracing_test::traced_test]
#[tokio::test]
#[ntest::timeout(10_000)]
async fn aggregates_report_files() {
    let dir = scratch("agents");
    std::fs::create_dir_all(&dir).unwrap();
    let paths: Vec<_> = [agent(1_000, 1_000_000, 40_000), agent(3_000, 1_000_000, 60_000)]
        .iter()
        .map(|a| write_agent(&dir, a))
        .collect();

    let output = dir.join("results.tsv");
    let summary = LancetRuntime::new(&output)
        .reports(&paths)
        .thresholds(Thresholds::default().target_rps(4_000.))
        .collect_timeout(Duration::from_secs(5))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.rps, 4_000.);
    assert_eq!(summary.latency.avg_latency, 50_000);
    assert!(summary.accepted());
    assert!(logs_contain("All 2 agents reported"));

    let contents = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "4000\t4000\t400000\t40000");
    assert_eq!(lines[3].split('\t').count(), 5);
    assert!(lines[3].starts_with("50\t50(45, 55)\t"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn repeated_runs_append() {
    let dir = scratch("append");
    std::fs::create_dir_all(&dir).unwrap();
    let paths = vec![write_agent(&dir, &agent(10, 1_000, 1_000))];
    let output = dir.join("results.tsv");

    for _ in 0..3 {
        LancetRuntime::new(&output)
            .reports(&paths)
            .run()
            .await
            .unwrap();
    }

    let contents = std::fs::read_to_string(&output).unwrap();
    assert_eq!(contents.lines().count(), 12);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn divergent_windows_need_opt_in() {
    let dir = scratch("windows");
    std::fs::create_dir_all(&dir).unwrap();
    let paths = vec![
        write_agent(&dir, &agent(10, 1_000, 1_000)),
        write_agent(&dir, &agent(10, 2_000, 1_000)),
    ];
    let output = dir.join("results.tsv");

    let err = LancetRuntime::new(&output)
        .reports(&paths)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Stats(StatsError::InconsistentDuration { .. })
    ));
    assert!(!output.exists());

    // Trusting the first agent reports 20 requests in 1ms, although the second agent needed 2ms.
    let summary = LancetRuntime::new(&output)
        .reports(&paths)
        .config(AggregationConfig::new().trust_first_duration())
        .run()
        .await
        .unwrap();
    assert_eq!(summary.rps, 20_000.);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn missing_inputs() {
    let output = scratch("unused");

    let err = LancetRuntime::new(&output).run().await.unwrap_err();
    assert!(matches!(err, RuntimeError::NoAgents));

    let missing = scratch("missing").join("agent.json");
    let err = LancetRuntime::new(&output)
        .reports(&[missing.clone()])
        .run()
        .await
        .unwrap_err();
    match err {
        RuntimeError::ReportRead { path, .. } => assert_eq!(path, missing),
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_report_file() {
    let dir = scratch("malformed");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("agent.json");
    std::fs::write(&path, r#"{ "throughput": {} }"#).unwrap();

    let err = LancetRuntime::new(dir.join("results.tsv"))
        .reports(&[path])
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::ReportParse { .. }));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn unsupported_ci_percentile_is_fatal() {
    let dir = scratch("fatal");
    std::fs::create_dir_all(&dir).unwrap();
    let paths = vec![write_agent(&dir, &agent(10, 1_000, 1_000))];

    let err = LancetRuntime::new(dir.join("results.tsv"))
        .reports(&paths)
        .thresholds(Thresholds::default().ci_percentile(42))
        .run()
        .await
        .unwrap_err();
    assert!(err.is_fatal());

    std::fs::remove_dir_all(&dir).unwrap();
}
