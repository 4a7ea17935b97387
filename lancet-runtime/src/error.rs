use lancet_core::StatsError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("No agents to collect reports from")]
    NoAgents,

    #[error(
        "Timed out after {timeout:?} waiting for agent reports ({received} of {expected} agents complete)"
    )]
    CollectTimeout {
        timeout: Duration,
        received: usize,
        expected: usize,
    },

    #[error("Report channel closed early ({received} of {expected} agents complete)")]
    ChannelClosed { received: usize, expected: usize },

    #[error("Agent {agent_id} sent its {kind} report twice")]
    DuplicateReply { agent_id: Uuid, kind: &'static str },

    #[error("Agent {agent_id} is not part of this run of {expected} agents")]
    UnexpectedAgent { agent_id: Uuid, expected: usize },

    #[error("Error deserializing with Bincode: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Can't read agent report {}: {source}", .path.display())]
    ReportRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Can't parse agent report {}: {source}", .path.display())]
    ReportParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl RuntimeError {
    /// Caller bugs which should halt the coordinator instead of being reported and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Stats(err) if err.is_fatal())
    }
}
