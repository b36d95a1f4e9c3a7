//! Status Memory: everything the agent remembers between turns.
//!
//! The arbitrator owns one [`StatusMemory`] value and threads it by `&mut`
//! through every handler. Fields are private; state changes only through the
//! transition methods below, which keep the invariants:
//!
//! - at most one item-protocol transaction is pending
//! - effect timers never go negative and are purged at zero
//! - the blacklist is scoped to the cell it was built on

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{AgentConfig, WeaponEffect};
use crate::error::{AgentError, Result};
use crate::geometry::Position;
use crate::snapshot::WorldSnapshot;

/// High-level posture, switched with hysteresis on weapon count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StrategyMode {
    /// Gear up: loot and break obstacles.
    #[default]
    Farming,
    /// Seek out hostiles.
    Hunting,
}

/// Timed effects on one hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EffectTimers {
    stun: u32,
    smoke: u32,
    pulled: bool,
}

impl EffectTimers {
    /// Turns of stun left.
    #[must_use]
    pub const fn stun_turns(&self) -> u32 {
        self.stun
    }

    /// Turns of smoke left.
    #[must_use]
    pub const fn smoke_turns(&self) -> u32 {
        self.smoke
    }

    /// Whether the target is stunned this turn.
    #[must_use]
    pub const fn is_stunned(&self) -> bool {
        self.stun > 0
    }

    /// Whether the target is smoked this turn.
    #[must_use]
    pub const fn is_smoked(&self) -> bool {
        self.smoke > 0
    }

    /// Whether the target has been pulled in.
    #[must_use]
    pub const fn is_pulled(&self) -> bool {
        self.pulled
    }

    const fn is_expired(&self) -> bool {
        self.stun == 0 && self.smoke == 0
    }

    fn tick(&mut self) {
        self.stun = self.stun.saturating_sub(1);
        self.smoke = self.smoke.saturating_sub(1);
    }
}

/// Item-acquisition protocol state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PickupState {
    /// No transaction in flight.
    #[default]
    Idle,
    /// Waiting for `revoke` to leave the inventory before picking up `target`.
    PendingRevoke {
        /// Item being acquired.
        target: String,
        /// Held item being dropped to make room.
        revoke: String,
        /// Turns waited so far.
        wait_turns: u32,
    },
    /// Pick-up issued; waiting for one more copy of `target` in the inventory.
    PendingPickup {
        /// Item being acquired.
        target: String,
        /// Copies of `target` held when the pick-up was issued.
        held_before: usize,
    },
}

impl PickupState {
    /// True when no transaction is in flight.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Item being acquired, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::PendingRevoke { target, .. } | Self::PendingPickup { target, .. } => {
                Some(target)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Blacklist {
    anchor: Option<Position>,
    ids: BTreeSet<String>,
}

impl Blacklist {
    /// Clears on any position delta. Returns whether entries were dropped.
    fn observe(&mut self, position: Position) -> bool {
        let moved = self.anchor.is_some_and(|anchor| anchor != position);
        self.anchor = Some(position);
        if moved && !self.ids.is_empty() {
            self.ids.clear();
            return true;
        }
        false
    }
}

/// Last hostile the agent fired at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatMemory {
    /// Hostile id.
    pub target_id: String,
    /// Turns since the attack, 0 on the turn it happened.
    pub turns_since_attack: u32,
}

/// Cross-turn state of the decision core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusMemory {
    revision: u64,
    pickup: PickupState,
    blacklist: Blacklist,
    effects: BTreeMap<String, EffectTimers>,
    last_attacked_obstacle: Option<Position>,
    last_target: Option<CombatMemory>,
    strategy: StrategyMode,
    engaged: bool,
    used_one_shot_utility: bool,
    hostile_positions: BTreeMap<String, Position>,
    rng_state: u64,
}

impl StatusMemory {
    /// Fresh memory for a new session.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            revision: 0,
            pickup: PickupState::Idle,
            blacklist: Blacklist::default(),
            effects: BTreeMap::new(),
            last_attacked_obstacle: None,
            last_target: None,
            strategy: StrategyMode::Farming,
            engaged: false,
            used_one_shot_utility: false,
            hostile_positions: BTreeMap::new(),
            rng_state: rng_seed,
        }
    }

    /// Number of completed turns.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Check internal invariants against `config`.
    pub fn validate(&self, config: &AgentConfig) -> Result<()> {
        match &self.pickup {
            PickupState::PendingRevoke {
                target,
                revoke,
                wait_turns,
            } => {
                if *wait_turns > config.items.max_revoke_wait {
                    return Err(AgentError::StateCorrupted(format!(
                        "revoke wait {wait_turns} exceeds bound {}",
                        config.items.max_revoke_wait
                    )));
                }
                if target.is_empty() || revoke.is_empty() {
                    return Err(AgentError::StateCorrupted(
                        "pending revoke without item ids".to_string(),
                    ));
                }
            }
            PickupState::PendingPickup { target, .. } if target.is_empty() => {
                return Err(AgentError::StateCorrupted(
                    "pending pickup without target id".to_string(),
                ));
            }
            _ => {}
        }
        if let Some(id) = self.effects.iter().find(|(_, t)| t.is_expired()).map(|(id, _)| id) {
            return Err(AgentError::StateCorrupted(format!(
                "expired effect timer kept for '{id}'"
            )));
        }
        Ok(())
    }

    /// Per-turn bookkeeping before any handler runs.
    ///
    /// Clears the blacklist on a position delta, ticks effect timers and ages
    /// the last combat target.
    pub fn begin_turn(&mut self, snapshot: &WorldSnapshot) {
        if self.blacklist.observe(snapshot.me.position) {
            debug!(position = %snapshot.me.position, "Moved, blacklist cleared");
        }
        for timers in self.effects.values_mut() {
            timers.tick();
        }
        self.effects.retain(|_, timers| !timers.is_expired());
        if let Some(memory) = &mut self.last_target {
            memory.turns_since_attack = memory.turns_since_attack.saturating_add(1);
        }
    }

    /// Per-turn bookkeeping after the action is chosen.
    pub fn end_turn(&mut self, snapshot: &WorldSnapshot) {
        self.hostile_positions = snapshot
            .hostiles
            .iter()
            .map(|h| (h.id.clone(), h.position))
            .collect();
        self.revision += 1;
    }

    // ---------------------------------------------------------------- pickup

    /// Current item-protocol state.
    #[must_use]
    pub const fn pickup(&self) -> &PickupState {
        &self.pickup
    }

    /// `Idle → PendingRevoke`.
    pub fn start_revoke(&mut self, target: &str, revoke: &str) {
        info!(target, revoke, "Item protocol: revoking to make room");
        self.pickup = PickupState::PendingRevoke {
            target: target.to_string(),
            revoke: revoke.to_string(),
            wait_turns: 0,
        };
    }

    /// `Idle | PendingRevoke → PendingPickup`.
    ///
    /// `held_before` is how many copies of `target` the inventory holds now;
    /// the pick-up counts as landed once that number grows.
    pub fn start_pickup(&mut self, target: &str, held_before: usize) {
        info!(target, held_before, "Item protocol: picking up");
        self.pickup = PickupState::PendingPickup {
            target: target.to_string(),
            held_before,
        };
    }

    /// Count one more turn of waiting on an eviction. Returns the new count,
    /// or `None` when no eviction is pending.
    pub fn bump_revoke_wait(&mut self) -> Option<u32> {
        match &mut self.pickup {
            PickupState::PendingRevoke { wait_turns, .. } => {
                *wait_turns += 1;
                Some(*wait_turns)
            }
            _ => None,
        }
    }

    /// Any state `→ Idle`.
    pub fn finish_pickup(&mut self) {
        self.pickup = PickupState::Idle;
    }

    // ------------------------------------------------------------- blacklist

    /// Mark `item_id` as unobtainable from the current cell.
    pub fn blacklist(&mut self, item_id: &str) {
        if self.blacklist.ids.insert(item_id.to_string()) {
            info!(item = item_id, "Blacklisted item");
        }
    }

    /// Whether `item_id` is blacklisted here.
    #[must_use]
    pub fn is_blacklisted(&self, item_id: &str) -> bool {
        self.blacklist.ids.contains(item_id)
    }

    // --------------------------------------------------------------- effects

    /// Timers on `hostile_id`, if any are active.
    #[must_use]
    pub fn effects_on(&self, hostile_id: &str) -> Option<&EffectTimers> {
        self.effects.get(hostile_id)
    }

    /// Record the side effect of a hit on `hostile_id`.
    ///
    /// Re-applying never shortens a running timer.
    pub fn apply_effect(&mut self, hostile_id: &str, effect: WeaponEffect) {
        let timers = self.effects.entry(hostile_id.to_string()).or_default();
        match effect {
            WeaponEffect::Pull { stun_turns } => {
                timers.pulled = true;
                timers.stun = timers.stun.max(stun_turns);
            }
            WeaponEffect::Stun { turns } => timers.stun = timers.stun.max(turns),
            WeaponEffect::Smoke { turns } => timers.smoke = timers.smoke.max(turns),
        }
        self.effects.retain(|_, timers| !timers.is_expired());
    }

    // ---------------------------------------------------------------- combat

    /// Remember a hit on `hostile_id` and mark the agent engaged.
    pub fn record_attack(&mut self, hostile_id: &str) {
        self.last_target = Some(CombatMemory {
            target_id: hostile_id.to_string(),
            turns_since_attack: 0,
        });
        self.set_engaged(true);
    }

    /// Last hostile fired at.
    #[must_use]
    pub const fn last_target(&self) -> Option<&CombatMemory> {
        self.last_target.as_ref()
    }

    /// Whether the agent is committed to a fight.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Set the engagement flag.
    pub fn set_engaged(&mut self, engaged: bool) {
        if self.engaged != engaged {
            info!(engaged, "Engagement changed");
        }
        self.engaged = engaged;
    }

    /// Where `hostile_id` stood last turn.
    #[must_use]
    pub fn previous_position(&self, hostile_id: &str) -> Option<Position> {
        self.hostile_positions.get(hostile_id).copied()
    }

    /// Whether the one-shot utility has been spent.
    #[must_use]
    pub const fn used_one_shot_utility(&self) -> bool {
        self.used_one_shot_utility
    }

    /// Spend the one-shot utility.
    pub fn mark_utility_used(&mut self) {
        self.used_one_shot_utility = true;
    }

    // ------------------------------------------------------------- obstacles

    /// Obstacle most recently struck, awaiting its drop.
    #[must_use]
    pub const fn last_attacked_obstacle(&self) -> Option<Position> {
        self.last_attacked_obstacle
    }

    /// Remember striking the obstacle at `position`.
    pub fn remember_obstacle(&mut self, position: Position) {
        self.last_attacked_obstacle = Some(position);
    }

    /// Forget the struck obstacle.
    pub fn forget_obstacle(&mut self) {
        self.last_attacked_obstacle = None;
    }

    // -------------------------------------------------------------- strategy

    /// Current strategy mode.
    #[must_use]
    pub const fn strategy(&self) -> StrategyMode {
        self.strategy
    }

    /// Apply hysteresis to `weapon_count` and return the resulting mode.
    pub fn update_strategy(&mut self, weapon_count: usize, config: &AgentConfig) -> StrategyMode {
        let next = match self.strategy {
            StrategyMode::Farming if weapon_count >= config.strategy.hunting_weapon_threshold => {
                StrategyMode::Hunting
            }
            StrategyMode::Hunting if weapon_count <= config.strategy.farming_weapon_threshold => {
                StrategyMode::Farming
            }
            current => current,
        };
        if next != self.strategy {
            info!(from = ?self.strategy, to = ?next, weapon_count, "Strategy changed");
            self.strategy = next;
        }
        next
    }

    // ------------------------------------------------------------------- rng

    /// Uniform index in `0..len` from the seeded stream. `len` must be > 0.
    pub fn random_index(&mut self, len: usize) -> usize {
        let mut rng = ChaCha8Rng::seed_from_u64(self.rng_state);
        let index = rng.gen_range(0..len.max(1));
        self.rng_state = rng.gen();
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Hostile, HostileKind, Inventory, SelfStatus};

    fn snapshot_at(x: i32, y: i32) -> WorldSnapshot {
        WorldSnapshot {
            turn: 0,
            map_size: 20,
            me: SelfStatus {
                id: "me".into(),
                position: Position::new(x, y),
                health: 100,
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
    fn test_blacklist_scoped_to_position() {
        let mut memory = StatusMemory::new(1);
        memory.begin_turn(&snapshot_at(3, 3));
        memory.blacklist("AXE");

        memory.begin_turn(&snapshot_at(3, 3));
        assert!(memory.is_blacklisted("AXE"));

        memory.begin_turn(&snapshot_at(3, 4));
        assert!(!memory.is_blacklisted("AXE"));
    }

    #[test]
    fn test_effect_timers_tick_and_purge() {
        let mut memory = StatusMemory::new(1);
        let snapshot = snapshot_at(0, 0);
        memory.apply_effect("p2", WeaponEffect::Pull { stun_turns: 2 });
        assert!(memory.effects_on("p2").unwrap().is_pulled());

        memory.begin_turn(&snapshot);
        let timers = memory.effects_on("p2").unwrap();
        assert!(timers.is_stunned());
        assert_eq!(timers.stun_turns(), 1);

        memory.begin_turn(&snapshot);
        assert!(memory.effects_on("p2").is_none());
    }

    #[test]
    fn test_reapplying_never_shortens() {
        let mut memory = StatusMemory::new(1);
        memory.apply_effect("p2", WeaponEffect::Smoke { turns: 3 });
        memory.apply_effect("p2", WeaponEffect::Smoke { turns: 1 });
        assert_eq!(memory.effects_on("p2").unwrap().smoke_turns(), 3);
    }

    #[test]
    fn test_zero_duration_effect_is_not_kept() {
        let mut memory = StatusMemory::new(1);
        memory.apply_effect("p2", WeaponEffect::Stun { turns: 0 });
        assert!(memory.effects_on("p2").is_none());
        assert!(memory.validate(&AgentConfig::default()).is_ok());
    }

    #[test]
    fn test_strategy_hysteresis() {
        let config = AgentConfig::default();
        let mut memory = StatusMemory::new(1);
        assert_eq!(memory.update_strategy(3, &config), StrategyMode::Farming);
        assert_eq!(memory.update_strategy(4, &config), StrategyMode::Hunting);
        assert_eq!(memory.update_strategy(3, &config), StrategyMode::Hunting);
        assert_eq!(memory.update_strategy(2, &config), StrategyMode::Farming);
        assert_eq!(memory.update_strategy(3, &config), StrategyMode::Farming);
    }

    #[test]
    fn test_pickup_transitions() {
        let mut memory = StatusMemory::new(1);
        assert!(memory.pickup().is_idle());
        assert_eq!(memory.bump_revoke_wait(), None);

        memory.start_revoke("SHOTGUN", "RUBBER_GUN");
        assert_eq!(memory.pickup().target(), Some("SHOTGUN"));
        assert_eq!(memory.bump_revoke_wait(), Some(1));

        memory.start_pickup("SHOTGUN", 0);
        assert_eq!(
            memory.pickup(),
            &PickupState::PendingPickup {
                target: "SHOTGUN".into(),
                held_before: 0,
            }
        );
        memory.finish_pickup();
        assert!(memory.pickup().is_idle());
    }

    #[test]
    fn test_validate_flags_overlong_wait() {
        let config = AgentConfig::default();
        let mut memory = StatusMemory::new(1);
        memory.start_revoke("SHOTGUN", "RUBBER_GUN");
        for _ in 0..3 {
            memory.bump_revoke_wait();
        }
        let err = memory.validate(&config).unwrap_err();
        assert!(err.requires_rebuild());
    }

    #[test]
    fn test_attack_memory_ages() {
        let mut memory = StatusMemory::new(1);
        let snapshot = snapshot_at(0, 0);
        memory.record_attack("p2");
        assert!(memory.is_engaged());
        memory.begin_turn(&snapshot);
        memory.begin_turn(&snapshot);
        assert_eq!(memory.last_target().unwrap().turns_since_attack, 2);
    }

    #[test]
    fn test_end_turn_tracks_hostiles() {
        let mut memory = StatusMemory::new(1);
        let mut snapshot = snapshot_at(0, 0);
        snapshot.hostiles.push(Hostile {
            id: "p2".into(),
            position: Position::new(4, 4),
            health: 100,
            kind: HostileKind::Player,
        });
        memory.end_turn(&snapshot);
        assert_eq!(memory.previous_position("p2"), Some(Position::new(4, 4)));
        assert_eq!(memory.revision(), 1);

        memory.end_turn(&snapshot_at(0, 0));
        assert_eq!(memory.previous_position("p2"), None);
    }

    #[test]
    fn test_random_index_is_seeded() {
        let mut a = StatusMemory::new(42);
        let mut b = StatusMemory::new(42);
        let xs: Vec<usize> = (0..16).map(|_| a.random_index(4)).collect();
        let ys: Vec<usize> = (0..16).map(|_| b.random_index(4)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|&i| i < 4));
        assert_eq!(a, b);
    }
}
