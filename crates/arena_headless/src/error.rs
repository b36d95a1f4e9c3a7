//! Runner error types.

use std::path::PathBuf;

use arena_core::error::AgentError;
use thiserror::Error;

/// Errors raised outside the decision core.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Reading or writing a stream or file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or stream name.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A line was not valid protocol JSON.
    #[error("Malformed line {line}: {source}")]
    Json {
        /// 1-based line number.
        line: usize,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The decision core rejected something (usually configuration).
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// A replay run did not reproduce the first run.
    #[error("Replay of {} diverged: hashes {first:#x} and {second:#x}", .path.display())]
    Diverged {
        /// Replayed file.
        path: PathBuf,
        /// State hash of the first run.
        first: u64,
        /// State hash of the differing run.
        second: u64,
    },
}

impl RunnerError {
    /// Wrap an I/O error with the name of what was being accessed.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
