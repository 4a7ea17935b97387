//! Collection barrier for agent replies.
//!
//! A run is only handed to the aggregators once every agent has delivered both of its reports.
//! Partial runs are reported as errors and never aggregated.
use crate::error::RuntimeError;
use crate::message::{AgentReply, Message, ReplyPayload};
use async_channel::{bounded, Receiver, Sender};
use humantime::format_duration;
use lancet_core::{LatencyReport, ThroughputReport};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

/// Every report of a completed run, one element per agent in order of first contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReports {
    pub agent_ids: Vec<Uuid>,
    pub throughput: Vec<ThroughputReport>,
    pub latency: Vec<LatencyReport>,
}

impl RunReports {
    pub fn len(&self) -> usize {
        self.agent_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agent_ids.is_empty()
    }
}

/// Handle given to the transport layer for forwarding agent replies to a [`ReportCollector`].
#[derive(Clone, Debug)]
pub struct ReplySender {
    tx: Sender<Vec<u8>>,
}

impl ReplySender {
    pub async fn send(&self, reply: AgentReply) -> Result<(), RuntimeError> {
        self.send_bytes(Message::new(reply).to_bytes()?).await
    }

    /// Forward an encoded [`Message<AgentReply>`] frame as received from an agent.
    pub async fn send_bytes(&self, frame: Vec<u8>) -> Result<(), RuntimeError> {
        // NOTE: The collector only goes away once it has everything it needs or has given up, so
        // a closed channel is not the sender's problem.
        if self.tx.send(frame).await.is_err() {
            debug!("Collector no longer listening; dropping reply");
        }
        Ok(())
    }
}

pub struct ReportCollector {
    expected: NonZeroUsize,
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl ReportCollector {
    pub fn new(expected: NonZeroUsize) -> Self {
        let (tx, rx) = bounded(expected.get() * 2);
        Self { expected, tx, rx }
    }

    pub fn sender(&self) -> ReplySender {
        ReplySender {
            tx: self.tx.clone(),
        }
    }

    /// Wait until every expected agent has sent both reports, or `timeout` elapses.
    #[instrument(name = "collect", skip_all, fields(expected = self.expected.get()))]
    pub async fn collect(self, timeout: Duration) -> Result<RunReports, RuntimeError> {
        let ReportCollector { expected, tx, rx } = self;
        // Only outstanding `ReplySender`s may keep the channel open.
        drop(tx);

        let mut pending = Pending::new(expected.get());
        let res = tokio::time::timeout(timeout, pending.fill(&rx)).await;

        match res {
            Ok(Ok(())) => {
                info!("All {} agents reported", expected);
                Ok(pending.finish())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                error!("Gave up on agent reports after {}", format_duration(timeout));
                Err(RuntimeError::CollectTimeout {
                    timeout,
                    received: pending.complete(),
                    expected: expected.get(),
                })
            }
        }
    }
}

#[derive(Default)]
struct Slot {
    throughput: Option<ThroughputReport>,
    latency: Option<LatencyReport>,
}

impl Slot {
    fn is_complete(&self) -> bool {
        self.throughput.is_some() && self.latency.is_some()
    }
}

struct Pending {
    expected: usize,
    order: Vec<Uuid>,
    slots: HashMap<Uuid, Slot>,
}

impl Pending {
    fn new(expected: usize) -> Self {
        Self {
            expected,
            order: Vec::with_capacity(expected),
            slots: HashMap::with_capacity(expected),
        }
    }

    async fn fill(&mut self, rx: &Receiver<Vec<u8>>) -> Result<(), RuntimeError> {
        while self.complete() < self.expected {
            let frame = rx.recv().await.map_err(|_| RuntimeError::ChannelClosed {
                received: self.complete(),
                expected: self.expected,
            })?;
            let reply = Message::<AgentReply>::from_bytes(&frame)?.into_inner();
            self.accept(reply)?;
        }
        Ok(())
    }

    fn accept(&mut self, reply: AgentReply) -> Result<(), RuntimeError> {
        let AgentReply { agent_id, payload } = reply;

        if !self.slots.contains_key(&agent_id) {
            if self.order.len() == self.expected {
                return Err(RuntimeError::UnexpectedAgent {
                    agent_id,
                    expected: self.expected,
                });
            }
            self.order.push(agent_id);
        }

        let kind = payload.kind();
        let slot = self.slots.entry(agent_id).or_default();
        let duplicate = match payload {
            ReplyPayload::Throughput(report) => slot.throughput.replace(report).is_some(),
            ReplyPayload::Latency(report) => slot.latency.replace(report).is_some(),
        };

        if duplicate {
            return Err(RuntimeError::DuplicateReply { agent_id, kind });
        }

        trace!("Received {kind} report from agent {agent_id}");
        Ok(())
    }

    fn complete(&self) -> usize {
        self.slots.values().filter(|s| s.is_complete()).count()
    }

    fn finish(mut self) -> RunReports {
        let mut reports = RunReports::default();
        for agent_id in self.order {
            if let Some(Slot {
                throughput: Some(throughput),
                latency: Some(latency),
            }) = self.slots.remove(&agent_id)
            {
                reports.agent_ids.push(agent_id);
                reports.throughput.push(throughput);
                reports.latency.push(latency);
            }
        }
        reports
    }
}
