use std::fmt;

use bal_ledger::LedgerError;
use bal_mirror::MirrorError;
use bal_report::ReportError;
use bal_store::StoreError;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// The pipeline stage an error originated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Config,
    Replication,
    Scan,
    Decode,
    Aggregation,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Replication => "replication",
            Stage::Scan => "scan",
            Stage::Decode => "decode",
            Stage::Aggregation => "aggregation",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config stage failed: {0}")]
    Config(#[from] ConfigError),

    #[error("replication stage failed: {0}")]
    Replication(#[from] MirrorError),

    #[error("scan stage failed: {0}")]
    Scan(#[from] StoreError),

    #[error("aggregation stage failed: {0}")]
    Aggregation(#[from] LedgerError),

    #[error("{stage} stage failed: {source}")]
    Persist {
        stage: Stage,
        #[source]
        source: ReportError,
    },
}

impl PipelineError {
    pub(crate) fn persist(stage: Stage) -> impl FnOnce(ReportError) -> Self {
        move |source| PipelineError::Persist { stage, source }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Config(_) => Stage::Config,
            PipelineError::Replication(_) => Stage::Replication,
            PipelineError::Scan(_) => Stage::Scan,
            PipelineError::Aggregation(_) => Stage::Aggregation,
            PipelineError::Persist { stage, .. } => *stage,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
