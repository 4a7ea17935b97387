//! Coordinator runtime for distributed Lancet runs.
//!
//! Collects one throughput and one latency report from every agent, waits until the run is
//! complete, then reduces and prints the global report.
pub mod collector;
pub mod coordinator;
mod error;
pub mod message;
pub mod runtime;

pub use crate::collector::{ReplySender, ReportCollector, RunReports};
pub use crate::coordinator::{Coordinator, CycleSummary, Thresholds, Verdict};
pub use crate::error::RuntimeError;
pub use crate::message::{AgentReply, AgentReports, Message, ReplyPayload};
pub use crate::runtime::LancetRuntime;
