//! # Arena Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Snapshot builder and weapon helpers
//! - Breadth-first fixture path oracle
//! - Agent determinism check over a snapshot script
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
