use std::path::PathBuf;
use thiserror::Error;
use voting_crypto::{
    CombineError, FatalError, SelectionError, ValidationError, VerificationFailure, WorkflowError,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Selection(#[from] SelectionError),

    #[error("{0}")]
    Verification(#[from] VerificationFailure),

    #[error("{0}")]
    Combine(#[from] CombineError),

    #[error("{0}")]
    Workflow(#[from] WorkflowError),

    #[error("{0}")]
    Fatal(#[from] FatalError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
