//! Headless runner for the arena agent.
//!
//! Drives the decision core without a game connection, controlled via JSON
//! lines on stdin with responses on stdout. This enables:
//!
//! - **Offline play**: feed recorded or synthetic snapshots to the agent
//! - **Regression checks**: replay a session file and diff the action stream
//! - **Determinism checks**: replay the same file several times and compare
//!
//! # Protocol
//!
//! - **stdin**: Commands from the connector (snapshot, reset, hash, quit)
//! - **stdout**: Responses (JSON, one per line)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"quit"}' | cargo run -p arena_headless
//!
//! # Replay a recorded session twice and check it is reproducible
//! cargo run -p arena_headless -- replay --file session.jsonl --verify
//! ```

pub mod config_loader;
pub mod error;
pub mod pathfinding;
pub mod protocol;
pub mod runner;

pub use config_loader::{load_config, load_or_default};
pub use error::RunnerError;
pub use pathfinding::GridOracle;
pub use protocol::{Command, Response};
pub use runner::{replay_file, verify_replay, HeadlessRunner, ReplayOutcome, SessionStats};
