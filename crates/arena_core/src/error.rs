//! Error types for the decision core.

use thiserror::Error;

/// Result type alias using [`AgentError`].
pub type Result<T> = std::result::Result<T, AgentError>;

/// Top-level error type for all decision-core errors.
///
/// None of these escape a turn: the [`Agent`](crate::agent::Agent) turn
/// boundary converts every error into "no action this turn".
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration file parsing error.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse {
        /// Path (or label) of the source that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Configuration values that contradict each other.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot that cannot be reasoned about (e.g. agent outside the map).
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Path string containing something other than `u`, `d`, `l`, `r`.
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// Status Memory violated one of its own invariants.
    #[error("Status memory corrupted: {0}")]
    StateCorrupted(String),
}

impl AgentError {
    /// Whether this error means the persisted state can no longer be trusted.
    #[must_use]
    pub const fn requires_rebuild(&self) -> bool {
        matches!(self, Self::StateCorrupted(_))
    }
}
