use std::path::PathBuf;

use thiserror::Error;

use crate::session::TrackerState;

/// Errors raised by the pacing engine and the session analyzer.
#[derive(Debug, Error)]
pub enum HelmError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot {operation} while session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: TrackerState,
    },

    /// Elapsed time went backwards between two consecutive entries.
    #[error("corrupt record: entry {index} has elapsed {current}s after {previous}s")]
    CorruptRecord {
        index: usize,
        previous: u64,
        current: u64,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failures while writing, reading, listing or deleting stored sessions.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("no session log at {}", .0.display())]
    NotFound(PathBuf),
}

pub type Result<T, E = HelmError> = std::result::Result<T, E>;
