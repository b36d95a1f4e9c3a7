//! # Arena Core
//!
//! Deterministic decision core for the arena survival agent.
//!
//! Each turn the connector hands the core an immutable [`WorldSnapshot`] and
//! the core answers with at most one [`Action`]. This crate contains **only**
//! the decision logic:
//! - No network or file IO
//! - No pathfinding algorithm (consumed through [`oracle::PathOracle`])
//! - No unseeded randomness
//! - No floating-point math: comparisons use exact integer arithmetic
//!
//! This separation enables:
//! - Replaying recorded sessions and getting identical action streams
//! - Unit-testing every handler without a live game server
//! - Swapping the pathfinding collaborator without touching the core
//!
//! ## Crate Structure
//!
//! - [`memory`] - Cross-turn Status Memory
//! - [`arbiter`] - Priority arbitrator and the pure `decide` turn function
//! - [`acquisition`] - Evict-then-pick-up item protocol
//! - [`combat`] - Target/weapon scoring and fire-vs-reposition
//! - [`efficiency`] - Loot-vs-obstacle comparator (farming fallback)
//! - [`healing`] - Self-preservation handler
//! - [`agent`] - Session wrapper catching failures at the turn boundary
//!
//! [`WorldSnapshot`]: snapshot::WorldSnapshot
//! [`Action`]: action::Action

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod acquisition;
pub mod action;
pub mod agent;
pub mod arbiter;
pub mod combat;
pub mod config;
pub mod efficiency;
pub mod error;
pub mod geometry;
pub mod healing;
pub mod item;
pub mod memory;
pub mod movement;
pub mod oracle;
pub mod snapshot;
pub mod valuation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{Action, Path};
    pub use crate::agent::{Agent, TurnInput};
    pub use crate::arbiter::{decide, Decision, Handler, Outcome, TurnContext};
    pub use crate::config::{AgentConfig, ScoreTables, WeaponEffect};
    pub use crate::error::{AgentError, Result};
    pub use crate::geometry::{Direction, Fixed, Position};
    pub use crate::item::{ArmorSlot, ItemKind, Weapon, WeaponClass, WeaponStats};
    pub use crate::memory::{EffectTimers, PickupState, StatusMemory, StrategyMode};
    pub use crate::oracle::{AvoidSet, PathMode, PathOracle};
    pub use crate::snapshot::{
        Ally, Hostile, HostileKind, Inventory, LootItem, Obstacle, ObstacleTags, SafeZone,
        SelfStatus, WorldSnapshot,
    };
}
