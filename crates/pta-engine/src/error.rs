//! Errors reported by a solver session.

use std::path::PathBuf;

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A call that needs a running session was made before `launch`.
    #[error("No active solver session")]
    NoSession,

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Setup not found: {0}")]
    SetupNotFound(String),

    #[error("No solution available")]
    NoSolution,

    /// The solver rejected an operation.
    #[error("{operation} failed: {message}")]
    Failed { operation: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Failed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
