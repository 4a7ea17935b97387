#![cfg_attr(docsrs, feature(doc_cfg))]
//! Statistics reduction for distributed load-testing runs.
//!
//! Every load-generating agent summarises its own measurements into a [`ThroughputReport`] and a
//! [`LatencyReport`]. This crate merges those per-agent summaries into one global view of the
//! run and renders it as tab-separated output.
mod config;
mod constants;
mod data;
mod error;
mod format;
mod percentile;
mod rate;
mod stats;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use error::*;
pub use format::*;
pub use percentile::*;
pub use stats::*;
