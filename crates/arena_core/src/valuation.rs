//! Marginal item value against the current inventory.
//!
//! One value function serves both the item protocol and the efficiency
//! comparator: the score an item would add over whatever currently occupies
//! its category, never below zero.

use crate::config::AgentConfig;
use crate::item::{ItemKind, WeaponClass};
use crate::memory::StatusMemory;
use crate::snapshot::{Inventory, LootItem};

/// Effective score of a consumable, accounting for the one-shot utility.
///
/// The utility counts double until spent and nothing afterwards.
#[must_use]
pub fn consumable_score(config: &AgentConfig, memory: &StatusMemory, id: &str) -> i32 {
    let base = config.scores.consumable(id);
    if config.is_one_shot_utility(id) {
        if memory.used_one_shot_utility() {
            0
        } else {
            base.saturating_mul(2)
        }
    } else {
        base
    }
}

/// Lowest-scoring held consumable (ties: smallest id).
#[must_use]
pub fn worst_consumable<'a>(
    config: &AgentConfig,
    memory: &StatusMemory,
    inventory: &'a Inventory,
) -> Option<&'a str> {
    inventory
        .consumables
        .iter()
        .min_by(|a, b| {
            consumable_score(config, memory, a)
                .cmp(&consumable_score(config, memory, b))
                .then_with(|| a.cmp(b))
        })
        .map(String::as_str)
}

/// Best healing consumable held: highest positive score, utility excluded.
#[must_use]
pub fn best_healing<'a>(config: &AgentConfig, inventory: &'a Inventory) -> Option<&'a str> {
    inventory
        .consumables
        .iter()
        .filter(|id| !config.is_one_shot_utility(id))
        .map(|id| (config.scores.consumable(id), id))
        .filter(|(score, _)| *score > 0)
        .max_by(|(sa, a), (sb, b)| sa.cmp(sb).then_with(|| b.cmp(a)))
        .map(|(_, id)| id.as_str())
}

/// Item in the slot `kind` maps to, if that slot counts as occupied.
///
/// The placeholder melee weapon never occupies its slot. Consumables have no
/// single slot and always return `None`.
#[must_use]
pub fn slot_occupant<'a>(
    config: &AgentConfig,
    inventory: &'a Inventory,
    kind: ItemKind,
) -> Option<&'a str> {
    match kind {
        ItemKind::Weapon(class) => inventory
            .weapon(class)
            .map(|w| w.id.as_str())
            .filter(|id| !config.is_default_melee(id)),
        ItemKind::Armor(slot) => inventory.armor_in(slot),
        ItemKind::Consumable => None,
    }
}

/// Score `item` would add over what it replaces; zero when not an upgrade.
#[must_use]
pub fn marginal_value(
    config: &AgentConfig,
    memory: &StatusMemory,
    inventory: &Inventory,
    item: &LootItem,
) -> i32 {
    match item.kind {
        ItemKind::Weapon(_) | ItemKind::Armor(_) => {
            let new = config.scores.for_kind(item.kind, &item.id);
            match slot_occupant(config, inventory, item.kind) {
                None => new.max(0),
                Some(current) if current == item.id => 0,
                Some(current) => (new - config.scores.for_kind(item.kind, current)).max(0),
            }
        }
        ItemKind::Consumable => {
            // Consumables form a set: a second copy adds nothing.
            if inventory.consumables.iter().any(|c| *c == item.id) {
                return 0;
            }
            let new = consumable_score(config, memory, &item.id);
            if inventory.consumables.len() < config.items.consumable_capacity {
                new.max(0)
            } else {
                let worst = worst_consumable(config, memory, inventory)
                    .map_or(0, |id| consumable_score(config, memory, id));
                (new - worst).max(0)
            }
        }
    }
}

/// Held item that must be dropped before `item` can be picked up.
#[must_use]
pub fn eviction_for(
    config: &AgentConfig,
    memory: &StatusMemory,
    inventory: &Inventory,
    item: &LootItem,
) -> Option<String> {
    match item.kind {
        ItemKind::Weapon(_) | ItemKind::Armor(_) => {
            slot_occupant(config, inventory, item.kind).map(str::to_string)
        }
        ItemKind::Consumable => (inventory.consumables.len() >= config.items.consumable_capacity)
            .then(|| worst_consumable(config, memory, inventory).map(str::to_string))
            .flatten(),
    }
}

/// Weapons held, not counting the placeholder melee.
#[must_use]
pub fn weapon_count(config: &AgentConfig, inventory: &Inventory) -> usize {
    WeaponClass::EVALUATION_ORDER
        .into_iter()
        .filter(|class| slot_occupant(config, inventory, ItemKind::Weapon(*class)).is_some())
        .count()
}

/// Total score of equipped weapons and armor.
#[must_use]
pub fn equipped_score(config: &AgentConfig, inventory: &Inventory) -> i32 {
    let weapons: i32 = inventory
        .weapons()
        .map(|w| config.scores.weapon(&w.id))
        .sum();
    let armor: i32 = [inventory.armor.as_deref(), inventory.helmet.as_deref()]
        .into_iter()
        .flatten()
        .map(|id| config.scores.armor(id))
        .sum();
    weapons + armor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::item::{ArmorSlot, Weapon, WeaponStats};

    fn loot(id: &str, kind: ItemKind) -> LootItem {
        LootItem {
            id: id.into(),
            position: Position::new(0, 0),
            kind,
            stats: None,
        }
    }

    fn melee(id: &str) -> Option<Weapon> {
        Some(Weapon::new(id, WeaponClass::Melee, WeaponStats::default()))
    }

    #[test]
    fn test_weapon_value_over_current() {
        let config = AgentConfig::default();
        let memory = StatusMemory::new(0);
        let axe = loot("AXE", ItemKind::Weapon(WeaponClass::Melee));

        let empty = Inventory {
            melee: melee("HAND"),
            ..Inventory::default()
        };
        assert_eq!(marginal_value(&config, &memory, &empty, &axe), 600);

        let knife = Inventory {
            melee: melee("KNIFE"),
            ..Inventory::default()
        };
        assert_eq!(marginal_value(&config, &memory, &knife, &axe), 250);

        let mace = Inventory {
            melee: melee("MACE"),
            ..Inventory::default()
        };
        assert_eq!(marginal_value(&config, &memory, &mace, &axe), 0);

        let same = Inventory {
            melee: melee("AXE"),
            ..Inventory::default()
        };
        assert_eq!(marginal_value(&config, &memory, &same, &axe), 0);
    }

    #[test]
    fn test_armor_slot_eviction() {
        let config = AgentConfig::default();
        let memory = StatusMemory::new(0);
        let helmet = loot("MAGIC_HELMET", ItemKind::Armor(ArmorSlot::Helmet));
        let inventory = Inventory {
            helmet: Some("WOODEN_HELMET".into()),
            ..Inventory::default()
        };
        assert_eq!(marginal_value(&config, &memory, &inventory, &helmet), 450);
        assert_eq!(
            eviction_for(&config, &memory, &inventory, &helmet).as_deref(),
            Some("WOODEN_HELMET")
        );
        assert_eq!(
            eviction_for(&config, &memory, &Inventory::default(), &helmet),
            None
        );
    }

    #[test]
    fn test_consumables_against_full_set() {
        let config = AgentConfig::default();
        let memory = StatusMemory::new(0);
        let blood = loot("UNICORN_BLOOD", ItemKind::Consumable);
        let mut inventory = Inventory {
            consumables: vec!["ELIXIR".into(), "MAGIC".into(), "GOD_LEAF".into()],
            ..Inventory::default()
        };
        assert_eq!(marginal_value(&config, &memory, &inventory, &blood), 1100);
        assert_eq!(eviction_for(&config, &memory, &inventory, &blood), None);

        inventory.consumables.push("SPIRIT_TEAR".into());
        assert_eq!(marginal_value(&config, &memory, &inventory, &blood), 800);
        assert_eq!(
            eviction_for(&config, &memory, &inventory, &blood).as_deref(),
            Some("MAGIC")
        );
    }

    #[test]
    fn test_held_consumable_adds_nothing() {
        let config = AgentConfig::default();
        let memory = StatusMemory::new(0);
        let inventory = Inventory {
            consumables: vec!["ELIXIR".into()],
            ..Inventory::default()
        };
        let elixir = loot("ELIXIR", ItemKind::Consumable);
        assert_eq!(marginal_value(&config, &memory, &inventory, &elixir), 0);
        let blood = loot("UNICORN_BLOOD", ItemKind::Consumable);
        assert!(marginal_value(&config, &memory, &inventory, &blood) > 0);
    }

    #[test]
    fn test_one_shot_utility_value() {
        let config = AgentConfig::default();
        let mut memory = StatusMemory::new(0);
        let compass = loot("COMPASS", ItemKind::Consumable);
        assert_eq!(
            marginal_value(&config, &memory, &Inventory::default(), &compass),
            800
        );
        memory.mark_utility_used();
        assert_eq!(
            marginal_value(&config, &memory, &Inventory::default(), &compass),
            0
        );
    }

    #[test]
    fn test_best_healing_skips_utility() {
        let config = AgentConfig::default();
        let inventory = Inventory {
            consumables: vec!["COMPASS".into(), "ELIXIR".into(), "GOD_LEAF".into()],
            ..Inventory::default()
        };
        assert_eq!(best_healing(&config, &inventory), Some("GOD_LEAF"));
        let only_utility = Inventory {
            consumables: vec!["COMPASS".into()],
            ..Inventory::default()
        };
        assert_eq!(best_healing(&config, &only_utility), None);
    }

    #[test]
    fn test_weapon_count_ignores_placeholder() {
        let config = AgentConfig::default();
        let inventory = Inventory {
            melee: melee("HAND"),
            gun: Some(Weapon::new("SHOTGUN", WeaponClass::Gun, WeaponStats::default())),
            ..Inventory::default()
        };
        assert_eq!(weapon_count(&config, &inventory), 1);
        assert_eq!(equipped_score(&config, &inventory), 900);
    }
}
