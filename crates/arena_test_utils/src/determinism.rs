//! Determinism testing utilities.
//!
//! The decision core must give identical action streams for identical inputs
//! so recorded sessions can be replayed. Sources of non-determinism include:
//!
//! - **Floating-point math**: ratios compare by exact integer
//!   cross-multiplication.
//! - **HashMap iteration order**: Status Memory only holds ordered maps.
//! - **System randomness**: the random step draws from a seeded `ChaCha8Rng`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use arena_core::action::Action;
use arena_core::agent::{Agent, TurnInput};
use arena_core::config::AgentConfig;
use arena_core::oracle::PathOracle;
use arena_core::snapshot::WorldSnapshot;
use tracing::debug;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns played.
    pub turns: u64,
}

impl DeterminismResult {
    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let mut unique = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Decision core is non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Play `script` through a fresh agent, returning every turn's action and
/// the final memory hash.
fn play<O: PathOracle>(
    config: &AgentConfig,
    oracle: O,
    script: &[WorldSnapshot],
) -> (Vec<Option<Action>>, u64) {
    let mut agent = Agent::new(config.clone(), oracle);
    let actions = script
        .iter()
        .map(|snapshot| agent.on_turn(&TurnInput::from(snapshot.clone())))
        .collect();
    (actions, agent.state_hash())
}

/// Play `script` `runs` times and verify the action streams and final
/// memories all match.
pub fn verify_agent_determinism<O, F>(
    config: &AgentConfig,
    make_oracle: F,
    script: &[WorldSnapshot],
    runs: usize,
) -> DeterminismResult
where
    O: PathOracle,
    F: Fn() -> O,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let (actions, state) = play(config, make_oracle(), script);
            let hash = compute_hash(&(actions, state));
            debug!(hash, "Determinism run finished");
            hash
        })
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        turns: script.len() as u64,
    }
}

/// Compute a simple hash for any hashable value.
fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for decision-core properties.
///
/// These generate random but reproducible snapshots and inventories.
pub mod strategies {
    use arena_core::geometry::Position;
    use arena_core::item::{ArmorSlot, ItemKind, WeaponClass};
    use arena_core::snapshot::{
        Hostile, HostileKind, LootItem, Obstacle, ObstacleTags, SelfStatus, WorldSnapshot,
    };
    use proptest::prelude::*;

    use crate::fixtures::{melee, weapon};

    /// Map side used by generated snapshots.
    pub const MAP_SIZE: i32 = 12;

    /// A cell on the generated map.
    pub fn arb_position() -> impl Strategy<Value = Position> {
        (0..MAP_SIZE, 0..MAP_SIZE).prop_map(|(x, y)| Position::new(x, y))
    }

    /// Any weapon class.
    pub fn arb_weapon_class() -> impl Strategy<Value = WeaponClass> {
        prop_oneof![
            Just(WeaponClass::Gun),
            Just(WeaponClass::Throwable),
            Just(WeaponClass::Special),
            Just(WeaponClass::Melee),
        ]
    }

    /// Any item category.
    pub fn arb_item_kind() -> impl Strategy<Value = ItemKind> {
        prop_oneof![
            arb_weapon_class().prop_map(ItemKind::Weapon),
            Just(ItemKind::Armor(ArmorSlot::Armor)),
            Just(ItemKind::Armor(ArmorSlot::Helmet)),
            Just(ItemKind::Consumable),
        ]
    }

    /// Item ids drawn from the default score tables, plus one unknown id.
    pub fn arb_item_id() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "SAHUR_BAT",
            "ROPE",
            "SHOTGUN",
            "SMOKE",
            "AXE",
            "KNIFE",
            "RUBBER_GUN",
            "MAGIC_ARMOR",
            "WOODEN_HELMET",
            "ELIXIR",
            "GOD_LEAF",
            "COMPASS",
            "MYSTERY",
        ])
        .prop_map(str::to_string)
    }

    /// A loot item anywhere on the map.
    pub fn arb_loot() -> impl Strategy<Value = LootItem> {
        (arb_item_id(), arb_item_kind(), arb_position()).prop_map(|(id, kind, position)| {
            LootItem {
                id,
                position,
                kind,
                stats: None,
            }
        })
    }

    /// A hostile anywhere on the map.
    pub fn arb_hostile() -> impl Strategy<Value = Hostile> {
        (0u8..4, arb_position(), -10i32..120, any::<bool>()).prop_map(
            |(n, position, health, npc)| Hostile {
                id: format!("h{n}"),
                position,
                health,
                kind: if npc {
                    HostileKind::Npc
                } else {
                    HostileKind::Player
                },
            },
        )
    }

    /// An obstacle anywhere on the map.
    pub fn arb_obstacle() -> impl Strategy<Value = Obstacle> {
        (
            arb_position(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(position, passable, trap, transparent, breakable)| Obstacle {
                id: if breakable { "CHEST" } else { "ROCK" }.to_string(),
                position,
                tags: ObstacleTags {
                    passable,
                    trap,
                    transparent,
                },
                breakable,
            })
    }

    /// A whole snapshot with the agent somewhere on the map.
    pub fn arb_snapshot() -> impl Strategy<Value = WorldSnapshot> {
        (
            arb_position(),
            1i32..=100,
            prop::collection::vec(arb_hostile(), 0..4),
            prop::collection::vec(arb_loot(), 0..6),
            prop::collection::vec(arb_obstacle(), 0..10),
            prop::collection::vec(arb_item_id(), 0..5),
            any::<bool>(),
        )
            .prop_map(
                |(position, health, hostiles, loot, obstacles, consumables, armed)| {
                    let mut snapshot = WorldSnapshot {
                        turn: 1,
                        map_size: MAP_SIZE,
                        me: SelfStatus {
                            id: "me".to_string(),
                            position,
                            health,
                        },
                        inventory: arena_core::snapshot::Inventory {
                            melee: Some(melee("HAND", 5)),
                            consumables,
                            ..Default::default()
                        },
                        hostiles,
                        allies: Vec::new(),
                        loot,
                        obstacles,
                        safe_zone: None,
                    };
                    if armed {
                        snapshot.inventory.gun =
                            Some(weapon("RUBBER_GUN", WeaponClass::Gun, 20, 5, 3));
                    }
                    snapshot
                },
            )
    }

    /// A script of snapshots walking the agent around.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<WorldSnapshot>> {
        prop::collection::vec(arb_snapshot(), 1..max_len.max(2)).prop_map(|mut script| {
            for (turn, snapshot) in script.iter_mut().enumerate() {
                snapshot.turn = turn as u64 + 1;
            }
            script
        })
    }
}
