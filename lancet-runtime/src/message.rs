//! Messages exchanged between agents and the coordinator.
use crate::error::RuntimeError;
use lancet_core::{LatencyReport, ThroughputReport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Wire envelope. Frames are encoded with bincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<M> {
    inner: M,
}

impl<M> Message<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: Serialize> Message<M> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, RuntimeError> {
        Ok(bincode::serialize(self)?)
    }
}

impl<M: for<'a> Deserialize<'a>> Message<M> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Message<M>, RuntimeError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// One report sent by one agent at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    pub agent_id: Uuid,
    pub payload: ReplyPayload,
}

impl AgentReply {
    pub fn throughput(agent_id: Uuid, report: ThroughputReport) -> Self {
        Self {
            agent_id,
            payload: ReplyPayload::Throughput(report),
        }
    }

    pub fn latency(agent_id: Uuid, report: LatencyReport) -> Self {
        Self {
            agent_id,
            payload: ReplyPayload::Latency(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyPayload {
    Throughput(ThroughputReport),
    Latency(LatencyReport),
}

impl ReplyPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Throughput(_) => "throughput",
            Self::Latency(_) => "latency",
        }
    }
}

/// Both reports of one agent as stored on disk (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReports {
    #[serde(default = "Uuid::new_v4")]
    pub agent_id: Uuid,
    pub throughput: ThroughputReport,
    pub latency: LatencyReport,
}

impl AgentReports {
    pub fn from_path(path: &Path) -> Result<Self, RuntimeError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RuntimeError::ReportRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| RuntimeError::ReportParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_replies(self) -> [AgentReply; 2] {
        [
            AgentReply::throughput(self.agent_id, self.throughput),
            AgentReply::latency(self.agent_id, self.latency),
        ]
    }
}
