mod utils;
use utils::*;

use lancet_core::{AggregationConfig, PercentileEstimate};
use lancet_runtime::{AgentReply, Coordinator, Message, ReportCollector, Thresholds, Verdict};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroUsize;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn three_agents_report_concurrently() {
    init();

    let agents = vec![
        (
            Uuid::new_v4(),
            throughput(100, 50, 10, 9, 1000),
            latency(1_000, false, 500),
        ),
        (
            Uuid::new_v4(),
            throughput(200, 60, 20, 18, 1000),
            latency(2_000, false, 300),
        ),
        (
            Uuid::new_v4(),
            throughput(300, 70, 30, 27, 1000),
            latency(3_000, false, 700),
        ),
    ];

    let collector = ReportCollector::new(NonZeroUsize::new(agents.len()).unwrap());
    let mut rng = SmallRng::seed_from_u64(7);

    for (agent_id, tput, lat) in agents.clone() {
        let sender = collector.sender();
        let jitter = Duration::from_millis(rng.gen_range(0..50));
        tokio::spawn(async move {
            tokio::time::sleep(jitter).await;
            // Latency first for some agents, throughput first for others.
            let mut replies = vec![
                AgentReply::throughput(agent_id, tput),
                AgentReply::latency(agent_id, lat),
            ];
            if jitter.as_millis() % 2 == 0 {
                replies.reverse();
            }
            for reply in replies {
                let frame = Message::new(reply).to_bytes().unwrap();
                sender.send_bytes(frame).await.unwrap();
            }
        });
    }

    let reports = collector.collect(Duration::from_secs(5)).await.unwrap();
    assert_eq!(reports.len(), 3);
    for (agent_id, tput, lat) in &agents {
        let idx = reports.agent_ids.iter().position(|id| id == agent_id).unwrap();
        assert_eq!(&reports.throughput[idx], tput);
        assert_eq!(&reports.latency[idx], lat);
    }

    let output = scratch("distributed");
    let summary = Coordinator::new(&output)
        .thresholds(Thresholds::default().target_rps(60_000.))
        .print_cycle(&reports)
        .unwrap();

    assert_eq!(summary.throughput, throughput(600, 180, 60, 54, 1000));
    assert_eq!(summary.rps, 60_000.);
    assert_eq!(summary.latency.avg_latency, 2_000);
    assert_eq!(
        summary.latency.p99,
        PercentileEstimate::new(10_000, 9_000, 11_000)
    );
    assert_eq!(summary.latency.to_reduce_sampling, 300);
    assert_eq!(summary.verdicts, vec![Verdict::ReduceSampling(300)]);

    let contents = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "#ReqCount\tQPS\tRxBw\tTxBw",
            "60\t60000\t600000\t180000",
            "#Avg Lat\t50th\t90th\t95th\t99th",
            "2\t2(1.8, 2.2)\t4(3.6, 4.4)\t6(5.4, 6.6)\t10(9, 11)",
        ]
    );
    std::fs::remove_file(&output).unwrap();
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn straggler_blocks_aggregation() {
    init();

    let collector = ReportCollector::new(NonZeroUsize::new(2).unwrap());
    let sender = collector.sender();
    let on_time = Uuid::new_v4();
    let straggler = Uuid::new_v4();

    sender
        .send(AgentReply::throughput(on_time, throughput(1, 1, 1, 1, 1000)))
        .await
        .unwrap();
    sender
        .send(AgentReply::latency(on_time, latency(1_000, true, 0)))
        .await
        .unwrap();
    sender
        .send(AgentReply::throughput(straggler, throughput(1, 1, 1, 1, 1000)))
        .await
        .unwrap();

    let err = collector
        .collect(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("1 of 2 agents complete"));
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn one_iid_agent_drops_the_reduction() {
    init();

    let collector = ReportCollector::new(NonZeroUsize::new(2).unwrap());
    let sender = collector.sender();
    for (is_iid, to_reduce) in [(true, 500), (false, 300)] {
        let id = Uuid::new_v4();
        sender
            .send(AgentReply::throughput(id, throughput(10, 10, 10, 10, 1000)))
            .await
            .unwrap();
        sender
            .send(AgentReply::latency(id, latency(1_000, is_iid, to_reduce)))
            .await
            .unwrap();
    }

    let reports = collector.collect(Duration::from_secs(2)).await.unwrap();
    let output = scratch("iid");
    let summary = Coordinator::new(&output)
        .config(AggregationConfig::new().weighted())
        .print_cycle(&reports)
        .unwrap();

    assert_eq!(summary.latency.iid_count, 1);
    assert_eq!(summary.latency.sampling_reduction(), None);
    assert!(summary.accepted());
    std::fs::remove_file(&output).unwrap();
}
