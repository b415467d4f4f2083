//! Batch orchestration for balance lookup.
//!
//! A [`Pipeline`] runs the stages in order, each to completion before the
//! next begins: replicate the remote store directory, scan the local
//! snapshot, decode and persist every record, then aggregate balances and
//! write the reports. Every failure is reported as a [`PipelineError`]
//! carrying the [`Stage`] it came from.
//!
//! Settings come from a TOML file, see [`PipelineConfig`].

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{
    AggregateConfig, ConfigError, MirrorConfig, OutputConfig, PipelineConfig, RemoteConfig,
    StoreConfig,
};
pub use error::{PipelineError, PipelineResult, Stage};
pub use pipeline::{BalanceSummary, Pipeline, RunSummary, ScanSummary};

// Re-export the types callers need to drive a pipeline.
pub use bal_mirror::{LocalTree, MirrorReport, RemoteTree, SftpTree};
pub use bal_ledger::BalanceRow;
