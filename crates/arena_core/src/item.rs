//! Item categories as a closed tagged-variant type.
//!
//! Every item the agent can hold falls in exactly one [`ItemKind`]. Code that
//! branches on the category matches exhaustively, so adding a category is a
//! compile-time-checked change.

use serde::{Deserialize, Serialize};

/// Weapon class; each class has exactly one inventory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    /// Primary ranged weapon, fired with `shoot`.
    Gun,
    /// Secondary ranged/throwable weapon, fired with `throw`.
    Throwable,
    /// Special weapon, fired with `use_special`.
    Special,
    /// Melee weapon, used with `attack`.
    Melee,
}

impl WeaponClass {
    /// Fixed order in which weapons are evaluated against a target.
    ///
    /// Openers first, melee last. Used as the final tie-break when two
    /// options score the same.
    pub const EVALUATION_ORDER: [Self; 4] = [Self::Throwable, Self::Special, Self::Gun, Self::Melee];

    /// Whether the class fires at range.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        !matches!(self, Self::Melee)
    }

    /// Position in [`Self::EVALUATION_ORDER`].
    #[must_use]
    pub const fn evaluation_rank(self) -> usize {
        match self {
            Self::Throwable => 0,
            Self::Special => 1,
            Self::Gun => 2,
            Self::Melee => 3,
        }
    }
}

/// Armor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorSlot {
    /// Body armor.
    Armor,
    /// Helmet.
    Helmet,
}

/// Category of any item, on the ground or in the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A weapon of the given class.
    Weapon(WeaponClass),
    /// Armor for the given slot.
    Armor(ArmorSlot),
    /// A healing or utility consumable, held in the bounded consumable set.
    Consumable,
}

/// Combat statistics of a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Damage per hit.
    pub damage: u32,
    /// Maximum range in cells (Manhattan).
    pub range: u32,
    /// Remaining uses; `None` means unlimited (melee).
    #[serde(default)]
    pub uses: Option<u32>,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            damage: 0,
            range: 1,
            uses: None,
        }
    }
}

/// An equipped weapon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Weapon {
    /// Item id, also the score-table key.
    pub id: String,
    /// Weapon class (decides slot and fire action).
    pub class: WeaponClass,
    /// Combat statistics.
    #[serde(flatten)]
    pub stats: WeaponStats,
}

impl Weapon {
    /// Create a weapon.
    #[must_use]
    pub fn new(id: impl Into<String>, class: WeaponClass, stats: WeaponStats) -> Self {
        Self {
            id: id.into(),
            class,
            stats,
        }
    }

    /// Whether the weapon can still be used.
    #[must_use]
    pub fn has_uses(&self) -> bool {
        self.stats.uses.map_or(true, |uses| uses > 0)
    }

    /// Maximum range in cells.
    #[must_use]
    pub const fn max_range(&self) -> u32 {
        self.stats.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_uses() {
        let melee = Weapon::new("AXE", WeaponClass::Melee, WeaponStats::default());
        assert!(melee.has_uses());

        let empty_gun = Weapon::new(
            "RUBBER_GUN",
            WeaponClass::Gun,
            WeaponStats {
                damage: 20,
                range: 6,
                uses: Some(0),
            },
        );
        assert!(!empty_gun.has_uses());
    }

    #[test]
    fn test_evaluation_rank_matches_order() {
        for (rank, class) in WeaponClass::EVALUATION_ORDER.iter().enumerate() {
            assert_eq!(class.evaluation_rank(), rank);
        }
        assert!(!WeaponClass::Melee.is_ranged());
        assert!(WeaponClass::Throwable.is_ranged());
    }

    #[test]
    fn test_item_kind_serde_shape() {
        let kind = ItemKind::Weapon(WeaponClass::Gun);
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"weapon":"gun"}"#);
        let parsed: ItemKind = serde_json::from_str(r#""consumable""#).unwrap();
        assert_eq!(parsed, ItemKind::Consumable);
    }
}
