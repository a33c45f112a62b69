//! Wire protocol between the engine and the `praxis-cell` child process.
//!
//! The parent writes one JSON-encoded [`CellRequest`] line to the cell's
//! stdin and reads newline-delimited [`Frame`]s from its stdout. Output
//! frames are flushed as they are produced, so everything emitted before a
//! kill has already reached the parent. A missing final `done` frame means
//! the cell died and is classified by the parent.

use serde::{Deserialize, Serialize};

/// Everything the cell needs to run one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellRequest {
    pub code: String,
    pub inputs: Vec<String>,
    pub recursion_limit: usize,
}

/// One stdout line from the cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Frame {
    /// A chunk of script output, in production order.
    Out { chunk: String },
    /// Terminal frame: the session finished. `error` is empty when `ok`.
    Done { ok: bool, error: String },
}
