//! Session wrapper around the pure turn function.
//!
//! [`Agent`] owns the persisted [`StatusMemory`] and is the turn boundary:
//! nothing raised while deciding a turn escapes it. A failed turn issues no
//! action and keeps the previous memory; a corruption signal (from the
//! connector, or detected in memory itself) rebuilds the whole decision
//! state while the session carries on.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, warn};

use crate::action::Action;
use crate::arbiter::decide;
use crate::config::AgentConfig;
use crate::memory::StatusMemory;
use crate::oracle::PathOracle;
use crate::snapshot::WorldSnapshot;

/// One push from the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    /// A fresh world snapshot.
    Snapshot(Box<WorldSnapshot>),
    /// The connector lost track of state and asks for a clean slate.
    Corrupted {
        /// Connector-supplied reason, for logs.
        reason: String,
    },
}

impl From<WorldSnapshot> for TurnInput {
    fn from(snapshot: WorldSnapshot) -> Self {
        Self::Snapshot(Box::new(snapshot))
    }
}

/// Decision core for one session.
pub struct Agent<O: PathOracle> {
    config: AgentConfig,
    oracle: O,
    memory: StatusMemory,
    failed_turns: u64,
    rebuilds: u64,
}

impl<O: PathOracle> Agent<O> {
    /// New agent with fresh memory.
    pub fn new(config: AgentConfig, oracle: O) -> Self {
        let memory = StatusMemory::new(config.rng_seed);
        Self {
            config,
            oracle,
            memory,
            failed_turns: 0,
            rebuilds: 0,
        }
    }

    /// Handle one input. Returns at most one action.
    pub fn on_turn(&mut self, input: &TurnInput) -> Option<Action> {
        match input {
            TurnInput::Snapshot(snapshot) => self.turn(snapshot),
            TurnInput::Corrupted { reason } => {
                warn!(reason = %reason, "Corruption signalled, rebuilding decision state");
                self.rebuild();
                None
            }
        }
    }

    fn turn(&mut self, snapshot: &WorldSnapshot) -> Option<Action> {
        if !snapshot.is_alive() {
            debug!(turn = snapshot.turn, health = snapshot.me.health, "Dead, skipping turn");
            return None;
        }
        match decide(&self.config, snapshot, &self.oracle, &self.memory) {
            Ok((decision, memory)) => {
                self.memory = memory;
                decision.action
            }
            Err(err) => {
                self.failed_turns += 1;
                warn!(turn = snapshot.turn, error = %err, "Turn failed, no action");
                if err.requires_rebuild() {
                    self.rebuild();
                }
                None
            }
        }
    }

    /// Discard all decision state.
    pub fn rebuild(&mut self) {
        self.memory = StatusMemory::new(self.config.rng_seed);
        self.rebuilds += 1;
    }

    /// Persisted memory.
    pub fn memory(&self) -> &StatusMemory {
        &self.memory
    }

    /// Configuration in use.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Turns that ended in an error.
    pub fn failed_turns(&self) -> u64 {
        self.failed_turns
    }

    /// Times the state was rebuilt.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Hash of the persisted memory, for determinism checks.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.memory.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Path;
    use crate::geometry::Position;
    use crate::oracle::{AvoidSet, PathMode};
    use crate::snapshot::{Inventory, SelfStatus};

    struct NoPaths;

    impl PathOracle for NoPaths {
        fn path(
            &self,
            _snapshot: &WorldSnapshot,
            _avoid: &AvoidSet,
            _from: Position,
            _to: Position,
            _mode: PathMode,
        ) -> Option<Path> {
            None
        }
    }

    fn snapshot(health: i32) -> WorldSnapshot {
        WorldSnapshot {
            turn: 3,
            map_size: 8,
            me: SelfStatus {
                id: "me".into(),
                position: Position::new(1, 1),
                health,
            },
            inventory: Inventory::default(),
            hostiles: vec![],
            allies: vec![],
            loot: vec![],
            obstacles: vec![],
            safe_zone: None,
        }
    }

    #[test]
    fn test_dead_agent_does_not_advance() {
        let mut agent = Agent::new(AgentConfig::default(), NoPaths);
        let before = agent.state_hash();
        assert_eq!(agent.on_turn(&snapshot(0).into()), None);
        assert_eq!(agent.state_hash(), before);
        assert_eq!(agent.memory().revision(), 0);
    }

    #[test]
    fn test_failed_turn_keeps_memory() {
        let mut agent = Agent::new(AgentConfig::default(), NoPaths);
        agent.on_turn(&snapshot(100).into());
        let before = agent.memory().clone();

        let mut bad = snapshot(100);
        bad.map_size = 0;
        assert_eq!(agent.on_turn(&bad.into()), None);
        assert_eq!(agent.memory(), &before);
        assert_eq!(agent.failed_turns(), 1);
        assert_eq!(agent.rebuilds(), 0);
    }

    #[test]
    fn test_corruption_rebuilds() {
        let mut agent = Agent::new(AgentConfig::default(), NoPaths);
        agent.on_turn(&snapshot(100).into());
        assert_eq!(agent.memory().revision(), 1);

        let action = agent.on_turn(&TurnInput::Corrupted {
            reason: "desync".into(),
        });
        assert_eq!(action, None);
        assert_eq!(agent.memory().revision(), 0);
        assert_eq!(agent.rebuilds(), 1);
    }
}
