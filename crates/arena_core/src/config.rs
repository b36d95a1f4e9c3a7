//! Tunable constants and score tables.
//!
//! Everything here is plain data deserialized from RON. Every struct carries
//! `#[serde(default)]`, so a config file only needs the values it overrides.
//!
//! **Note:** This module contains no IO. File loading is handled by
//! `arena_headless`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::item::{ArmorSlot, ItemKind};

/// Stateful side effect applied to a target when a weapon fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponEffect {
    /// Drags the target in: sets the pulled flag and stuns it.
    Pull {
        /// Stun duration in turns.
        stun_turns: u32,
    },
    /// Stuns the target.
    Stun {
        /// Duration in turns.
        turns: u32,
    },
    /// Blinds the target with smoke.
    Smoke {
        /// Duration in turns.
        turns: u32,
    },
}

/// Health thresholds for self-preservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Below this, use the best healing consumable.
    pub heal_threshold: i32,
    /// Below this with nothing to consume, retreat to a healer.
    pub critical_threshold: i32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            heal_threshold: 75,
            critical_threshold: 50,
        }
    }
}

/// Hysteresis bounds on equipped-weapon count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Farming flips to Hunting at this many weapons or more.
    pub hunting_weapon_threshold: usize,
    /// Hunting flips back to Farming at this many weapons or fewer.
    pub farming_weapon_threshold: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            hunting_weapon_threshold: 4,
            farming_weapon_threshold: 2,
        }
    }
}

/// Combat scoring weights and weapon behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Hostiles within this distance can trigger a reactive engage.
    pub reactive_engage_distance: u32,
    /// Minimum weapon score for a reactive engage while farming.
    pub reactive_weapon_score: i32,
    /// Added when one hit kills.
    pub lethal_bonus: i32,
    /// Subtracted per cell of distance.
    pub distance_penalty: i32,
    /// Flat opener bonus for throwables.
    pub throwable_bonus: i32,
    /// Per-item utility bonus (area or crowd-control weapons).
    pub utility_bonus: BTreeMap<String, i32>,
    /// Bonus for hitting a stunned target.
    pub stunned_bonus: i32,
    /// Bonus for a close-quarters weapon against a smoked target.
    pub smoked_bonus: i32,
    /// Bonus for a close-quarters weapon against a pulled target.
    pub pulled_bonus: i32,
    /// Bonus for opening with a pull on a target not yet pulled.
    pub pull_opener_bonus: i32,
    /// Non-melee weapons that count as close-quarters.
    pub close_quarters_ids: BTreeSet<String>,
    /// Side effects by weapon id.
    pub effects: BTreeMap<String, WeaponEffect>,
    /// Turns a previous target stays worth chasing.
    pub chase_memory_turns: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            reactive_engage_distance: 7,
            reactive_weapon_score: 750,
            lethal_bonus: 500,
            distance_penalty: 10,
            throwable_bonus: 150,
            utility_bonus: [("SMOKE", 300), ("SEED", 200), ("BELL", 200)]
                .into_iter()
                .map(|(id, bonus)| (id.to_string(), bonus))
                .collect(),
            stunned_bonus: 400,
            smoked_bonus: 350,
            pulled_bonus: 500,
            pull_opener_bonus: 1000,
            close_quarters_ids: std::iter::once("SHOTGUN".to_string()).collect(),
            effects: [
                ("ROPE", WeaponEffect::Pull { stun_turns: 2 }),
                ("SAHUR_BAT", WeaponEffect::Stun { turns: 2 }),
                ("SEED", WeaponEffect::Stun { turns: 2 }),
                ("SMOKE", WeaponEffect::Smoke { turns: 3 }),
            ]
            .into_iter()
            .map(|(id, effect)| (id.to_string(), effect))
            .collect(),
            chase_memory_turns: 2,
        }
    }
}

/// The one-shot area-stun consumable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityConfig {
    /// Consumable id.
    pub item_id: String,
    /// Radius (Manhattan) of the stun.
    pub radius: u32,
    /// Stun duration in turns.
    pub stun_turns: u32,
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            item_id: "COMPASS".to_string(),
            radius: 3,
            stun_turns: 3,
        }
    }
}

/// Item-protocol bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// Turns to wait for an eviction before aborting.
    pub max_revoke_wait: u32,
    /// Size of the consumable set.
    pub consumable_capacity: usize,
    /// Placeholder melee id that counts as an empty slot.
    pub default_melee_id: String,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            max_revoke_wait: 2,
            consumable_capacity: 4,
            default_melee_id: "HAND".to_string(),
        }
    }
}

/// Obstacle economy for the farming fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmingConfig {
    /// Value of breaking an obstacle when ungeared.
    pub obstacle_value: i32,
    /// Floor for the obstacle value.
    pub min_obstacle_value: i32,
    /// Value lost per 1000 points of equipped score.
    pub equipment_decay_per_mille: i32,
    /// Nearest breakable obstacles considered per turn.
    pub obstacle_candidates: usize,
    /// Radius around a broken obstacle searched for its drop.
    pub loot_radius: u32,
    /// Distance at which a broken obstacle is forgotten.
    pub loot_abandon_distance: u32,
}

impl Default for FarmingConfig {
    fn default() -> Self {
        Self {
            obstacle_value: 150,
            min_obstacle_value: 25,
            equipment_decay_per_mille: 50,
            obstacle_candidates: 5,
            loot_radius: 1,
            loot_abandon_distance: 2,
        }
    }
}

/// Score tables: item id to integer score, unknown ids score 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTables {
    /// Weapon scores.
    pub weapons: BTreeMap<String, i32>,
    /// Armor and helmet scores.
    pub armor: BTreeMap<String, i32>,
    /// Consumable scores. Bigger heals better.
    pub consumables: BTreeMap<String, i32>,
}

fn table(entries: &[(&str, i32)]) -> BTreeMap<String, i32> {
    entries
        .iter()
        .map(|(id, score)| ((*id).to_string(), *score))
        .collect()
}

impl Default for ScoreTables {
    fn default() -> Self {
        Self {
            weapons: table(&[
                ("SAHUR_BAT", 1000),
                ("ROPE", 950),
                ("SHOTGUN", 900),
                ("SEED", 850),
                ("MACE", 800),
                ("CROSSBOW", 750),
                ("SMOKE", 700),
                ("CRYSTAL", 650),
                ("METEORITE_FRAGMENT", 640),
                ("BANANA", 630),
                ("AXE", 600),
                ("BELL", 550),
                ("RUBBER_GUN", 500),
                ("SCEPTER", 450),
                ("BONE", 400),
                ("KNIFE", 350),
                ("TREE_BRANCH", 300),
                ("HAND", 0),
            ]),
            armor: table(&[
                ("MAGIC_ARMOR", 1050),
                ("MAGIC_HELMET", 700),
                ("ARMOR", 700),
                ("WOODEN_HELMET", 250),
            ]),
            consumables: table(&[
                ("ELIXIR_OF_LIFE", 2000),
                ("UNICORN_BLOOD", 1100),
                ("PHOENIX_FEATHERS", 850),
                ("MERMAID_TAIL", 700),
                ("SPIRIT_TEAR", 550),
                ("GOD_LEAF", 500),
                ("COMPASS", 400),
                ("ELIXIR", 350),
                ("MAGIC", 300),
            ]),
        }
    }
}

impl ScoreTables {
    /// Weapon score.
    #[must_use]
    pub fn weapon(&self, id: &str) -> i32 {
        self.weapons.get(id).copied().unwrap_or(0)
    }

    /// Armor or helmet score.
    #[must_use]
    pub fn armor(&self, id: &str) -> i32 {
        self.armor.get(id).copied().unwrap_or(0)
    }

    /// Consumable score.
    #[must_use]
    pub fn consumable(&self, id: &str) -> i32 {
        self.consumables.get(id).copied().unwrap_or(0)
    }

    /// Score of `id` looked up in the table for `kind`.
    #[must_use]
    pub fn for_kind(&self, kind: ItemKind, id: &str) -> i32 {
        match kind {
            ItemKind::Weapon(_) => self.weapon(id),
            ItemKind::Armor(ArmorSlot::Armor | ArmorSlot::Helmet) => self.armor(id),
            ItemKind::Consumable => self.consumable(id),
        }
    }
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Self-preservation thresholds.
    pub health: HealthConfig,
    /// Farming/Hunting hysteresis.
    pub strategy: StrategyConfig,
    /// Combat weights.
    pub combat: CombatConfig,
    /// One-shot area utility.
    pub utility: UtilityConfig,
    /// Item-protocol bounds.
    pub items: ItemConfig,
    /// Obstacle economy.
    pub farming: FarmingConfig,
    /// Obstacle id of the unique high-priority objective.
    pub objective_id: String,
    /// Ally id that heals when approached.
    pub healer_ally_id: String,
    /// Seed for the deadlock-avoidance random step.
    pub rng_seed: u64,
    /// Item scores.
    pub scores: ScoreTables,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            health: HealthConfig::default(),
            strategy: StrategyConfig::default(),
            combat: CombatConfig::default(),
            utility: UtilityConfig::default(),
            items: ItemConfig::default(),
            farming: FarmingConfig::default(),
            objective_id: "DRAGON_EGG".to_string(),
            healer_ally_id: "SPIRIT".to_string(),
            rng_seed: 0x5EED,
            scores: ScoreTables::default(),
        }
    }
}

impl AgentConfig {
    /// Parse and validate a RON document.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Self::from_ron_labeled(ron, "<inline>")
    }

    /// Parse and validate a RON document, naming `label` in errors.
    pub fn from_ron_labeled(ron: &str, label: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| AgentError::ConfigParse {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject contradictory values.
    pub fn validate(&self) -> Result<()> {
        if self.strategy.farming_weapon_threshold >= self.strategy.hunting_weapon_threshold {
            return Err(AgentError::InvalidConfig(format!(
                "farming_weapon_threshold ({}) must be below hunting_weapon_threshold ({})",
                self.strategy.farming_weapon_threshold, self.strategy.hunting_weapon_threshold
            )));
        }
        if self.health.critical_threshold > self.health.heal_threshold {
            return Err(AgentError::InvalidConfig(format!(
                "critical_threshold ({}) exceeds heal_threshold ({})",
                self.health.critical_threshold, self.health.heal_threshold
            )));
        }
        if self.items.consumable_capacity == 0 {
            return Err(AgentError::InvalidConfig(
                "consumable_capacity must be at least 1".to_string(),
            ));
        }
        if self.farming.min_obstacle_value > self.farming.obstacle_value {
            return Err(AgentError::InvalidConfig(format!(
                "min_obstacle_value ({}) exceeds obstacle_value ({})",
                self.farming.min_obstacle_value, self.farming.obstacle_value
            )));
        }
        Ok(())
    }

    /// Side effect of firing weapon `id`, if any.
    #[must_use]
    pub fn effect_of(&self, id: &str) -> Option<WeaponEffect> {
        self.combat.effects.get(id).copied()
    }

    /// Whether `id` is the placeholder melee weapon.
    #[must_use]
    pub fn is_default_melee(&self, id: &str) -> bool {
        self.items.default_melee_id == id
    }

    /// Whether `id` is the one-shot area utility.
    #[must_use]
    pub fn is_one_shot_utility(&self, id: &str) -> bool {
        self.utility.item_id == id
    }
}
