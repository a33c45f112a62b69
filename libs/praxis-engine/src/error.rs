//! Error types for the execution engine.

use std::path::PathBuf;

use thiserror::Error;

/// Infrastructure-level failures inside the engine.
///
/// These never reach API callers directly: `Engine::execute` folds them into
/// a failed [`crate::types::ExecutionResult`] so the pipeline stays total.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn execution cell at {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cell pipe unavailable: {0}")]
    Pipe(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cell protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("execution task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
