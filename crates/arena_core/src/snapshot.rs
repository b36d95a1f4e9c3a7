//! Per-turn world snapshot pushed by the connector.
//!
//! A snapshot is immutable for the duration of a turn. Every list and the
//! inventory default to empty, whether the connector omits the field or sends
//! `null`: either way it means "nothing of that kind is visible".

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AgentError, Result};
use crate::geometry::Position;
use crate::item::{ArmorSlot, ItemKind, Weapon, WeaponClass, WeaponStats};

/// Decode a field where `null` means the same as absent.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The agent's own status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfStatus {
    /// Player id of the agent.
    #[serde(default)]
    pub id: String,
    /// Current cell.
    pub position: Position,
    /// Current health. Zero or below means dead.
    pub health: i32,
}

/// Inventory slots.
///
/// One slot per weapon class, one per armor slot, and a bounded set of
/// consumables (the bound lives in configuration).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    /// Primary ranged weapon.
    pub gun: Option<Weapon>,
    /// Throwable weapon.
    pub throwable: Option<Weapon>,
    /// Special weapon.
    pub special: Option<Weapon>,
    /// Melee weapon.
    pub melee: Option<Weapon>,
    /// Body armor id.
    pub armor: Option<String>,
    /// Helmet id.
    pub helmet: Option<String>,
    /// Held consumable ids.
    #[serde(deserialize_with = "null_as_default")]
    pub consumables: Vec<String>,
}

impl Inventory {
    /// The weapon in `class`'s slot.
    #[must_use]
    pub fn weapon(&self, class: WeaponClass) -> Option<&Weapon> {
        match class {
            WeaponClass::Gun => self.gun.as_ref(),
            WeaponClass::Throwable => self.throwable.as_ref(),
            WeaponClass::Special => self.special.as_ref(),
            WeaponClass::Melee => self.melee.as_ref(),
        }
    }

    /// Held weapons in [`WeaponClass::EVALUATION_ORDER`].
    pub fn weapons(&self) -> impl Iterator<Item = &Weapon> {
        WeaponClass::EVALUATION_ORDER
            .into_iter()
            .filter_map(|class| self.weapon(class))
    }

    /// The armor id in `slot`.
    #[must_use]
    pub fn armor_in(&self, slot: ArmorSlot) -> Option<&str> {
        match slot {
            ArmorSlot::Armor => self.armor.as_deref(),
            ArmorSlot::Helmet => self.helmet.as_deref(),
        }
    }

    /// Whether any slot or the consumable set holds `item_id`.
    #[must_use]
    pub fn contains(&self, item_id: &str) -> bool {
        self.weapons().any(|w| w.id == item_id)
            || self.armor.as_deref() == Some(item_id)
            || self.helmet.as_deref() == Some(item_id)
            || self.consumables.iter().any(|c| c == item_id)
    }

    /// How many copies of `item_id` the inventory holds across all slots.
    #[must_use]
    pub fn count(&self, item_id: &str) -> usize {
        let slotted = self.weapons().filter(|w| w.id == item_id).count()
            + usize::from(self.armor.as_deref() == Some(item_id))
            + usize::from(self.helmet.as_deref() == Some(item_id));
        slotted + self.consumables.iter().filter(|c| *c == item_id).count()
    }
}

/// Kind of hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostileKind {
    /// An opposing player.
    #[default]
    Player,
    /// An NPC enemy.
    Npc,
}

/// A visible hostile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hostile {
    /// Unique id.
    pub id: String,
    /// Current cell.
    pub position: Position,
    /// Current health.
    pub health: i32,
    /// Player or NPC.
    #[serde(default)]
    pub kind: HostileKind,
}

/// A visible friendly NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ally {
    /// Ally id.
    pub id: String,
    /// Current cell.
    pub position: Position,
    /// Whether standing next to this ally restores health.
    #[serde(default)]
    pub heals: bool,
}

/// An item lying on the ground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootItem {
    /// Item id.
    pub id: String,
    /// Cell the item lies on.
    pub position: Position,
    /// Category.
    pub kind: ItemKind,
    /// Stats, for weapons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<WeaponStats>,
}

/// Obstacle tags.
///
/// The defaults describe a plain wall: solid, not a trap, blocks sight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTags {
    /// Can be walked through.
    pub passable: bool,
    /// Damages whoever steps on it.
    pub trap: bool,
    /// Projectiles and sight pass through.
    pub transparent: bool,
}

/// A visible obstacle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Obstacle id (e.g. `CHEST`).
    pub id: String,
    /// Cell.
    pub position: Position,
    /// Tags.
    #[serde(default)]
    pub tags: ObstacleTags,
    /// Whether attacking it eventually breaks it and drops loot.
    #[serde(default)]
    pub breakable: bool,
}

impl Obstacle {
    /// Solid obstacles cannot be entered.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        !self.tags.passable
    }

    /// Cells to keep out of when pathing.
    #[must_use]
    pub const fn is_hazard(&self) -> bool {
        self.is_solid() || self.tags.trap
    }
}

/// The safe zone: every cell within `radius` (Chebyshev) of `center`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeZone {
    /// Zone center.
    pub center: Position,
    /// Zone radius.
    pub radius: u32,
}

impl SafeZone {
    /// Whether `position` is inside the zone.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        self.center.chebyshev(position) <= self.radius
    }
}

/// Immutable world state for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Turn counter supplied by the connector.
    #[serde(default)]
    pub turn: u64,
    /// Side length of the square map.
    pub map_size: i32,
    /// The agent itself.
    #[serde(rename = "self")]
    pub me: SelfStatus,
    /// The agent's inventory.
    #[serde(default, deserialize_with = "null_as_default")]
    pub inventory: Inventory,
    /// Visible hostiles.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hostiles: Vec<Hostile>,
    /// Visible allies.
    #[serde(default, deserialize_with = "null_as_default")]
    pub allies: Vec<Ally>,
    /// Visible loot.
    #[serde(default, deserialize_with = "null_as_default")]
    pub loot: Vec<LootItem>,
    /// Visible obstacles.
    #[serde(default, deserialize_with = "null_as_default")]
    pub obstacles: Vec<Obstacle>,
    /// Safe-zone geometry; `None` means the whole map is safe.
    #[serde(default)]
    pub safe_zone: Option<SafeZone>,
}

impl WorldSnapshot {
    /// Reject snapshots the core cannot reason about.
    pub fn validate(&self) -> Result<()> {
        if self.map_size <= 0 {
            return Err(AgentError::InvalidSnapshot(format!(
                "map size must be positive, got {}",
                self.map_size
            )));
        }
        if !self.in_bounds(self.me.position) {
            return Err(AgentError::InvalidSnapshot(format!(
                "agent position {} outside {}x{} map",
                self.me.position, self.map_size, self.map_size
            )));
        }
        Ok(())
    }

    /// Whether the agent is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.me.health > 0
    }

    /// Whether `position` lies on the map.
    #[must_use]
    pub const fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.map_size && position.y < self.map_size
    }

    /// Whether `position` is inside the safe zone.
    #[must_use]
    pub fn in_safe_zone(&self, position: Position) -> bool {
        self.safe_zone.map_or(true, |zone| zone.contains(position))
    }

    /// Center of the safe zone, or of the map when there is none.
    #[must_use]
    pub fn safe_anchor(&self) -> Position {
        self.safe_zone
            .map_or_else(|| Position::new(self.map_size / 2, self.map_size / 2), |z| z.center)
    }

    /// Obstacle occupying `position`, if any.
    #[must_use]
    pub fn obstacle_at(&self, position: Position) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.position == position)
    }

    /// Whether a solid obstacle or a trap occupies `position`.
    #[must_use]
    pub fn is_hazard_at(&self, position: Position) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.position == position && o.is_hazard())
    }

    /// Whether the agent could stand on `position`.
    #[must_use]
    pub fn is_standable(&self, position: Position) -> bool {
        self.in_bounds(position)
            && !self.is_hazard_at(position)
            && !self.hostiles.iter().any(|h| h.position == position)
    }

    /// Whether anything blocks a projectile at `position`.
    ///
    /// Opaque obstacles block, except `ignored_obstacle_id`; hostiles other
    /// than `target_id` block.
    #[must_use]
    pub fn blocks_sight(&self, position: Position, target_id: &str, ignored_obstacle_id: &str) -> bool {
        self.obstacles.iter().any(|o| {
            o.position == position && !o.tags.transparent && o.id != ignored_obstacle_id
        }) || self
            .hostiles
            .iter()
            .any(|h| h.position == position && h.id != target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> WorldSnapshot {
        serde_json::from_str(
            r#"{"map_size":10,"self":{"position":{"x":2,"y":3},"health":100}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let snapshot = minimal();
        assert!(snapshot.hostiles.is_empty());
        assert!(snapshot.loot.is_empty());
        assert!(snapshot.inventory.consumables.is_empty());
        assert!(snapshot.safe_zone.is_none());
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_null_lists_default_to_empty() {
        let snapshot: WorldSnapshot = serde_json::from_str(
            r#"{"map_size":10,"self":{"position":{"x":2,"y":3},"health":100},
                "inventory":null,"hostiles":null,"allies":null,"loot":null,
                "obstacles":null,"safe_zone":null}"#,
        )
        .unwrap();
        assert_eq!(snapshot, minimal());

        let inventory: Inventory =
            serde_json::from_str(r#"{"gun":null,"consumables":null}"#).unwrap();
        assert_eq!(inventory, Inventory::default());
    }

    #[test]
    fn test_traps_are_hazards() {
        let mut snapshot = minimal();
        snapshot.obstacles.push(Obstacle {
            id: "SPIKES".into(),
            position: Position::new(4, 4),
            tags: ObstacleTags {
                passable: true,
                trap: true,
                transparent: true,
            },
            breakable: false,
        });
        assert!(snapshot.is_hazard_at(Position::new(4, 4)));
        assert!(!snapshot.is_standable(Position::new(4, 4)));
        assert!(!snapshot.is_hazard_at(Position::new(4, 5)));
    }

    #[test]
    fn test_validate_rejects_out_of_map_agent() {
        let mut snapshot = minimal();
        snapshot.me.position = Position::new(10, 0);
        assert!(matches!(
            snapshot.validate(),
            Err(AgentError::InvalidSnapshot(_))
        ));
        snapshot.map_size = 0;
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_safe_zone_contains() {
        let zone = SafeZone {
            center: Position::new(5, 5),
            radius: 2,
        };
        assert!(zone.contains(Position::new(7, 3)));
        assert!(!zone.contains(Position::new(8, 5)));

        let mut snapshot = minimal();
        assert!(snapshot.in_safe_zone(Position::new(0, 0)));
        snapshot.safe_zone = Some(zone);
        assert!(!snapshot.in_safe_zone(Position::new(0, 0)));
        assert_eq!(snapshot.safe_anchor(), Position::new(5, 5));
    }

    #[test]
    fn test_inventory_contains_checks_every_slot() {
        let inventory = Inventory {
            melee: Some(Weapon::new("AXE", WeaponClass::Melee, WeaponStats::default())),
            helmet: Some("WOODEN_HELMET".into()),
            consumables: vec!["ELIXIR".into()],
            ..Inventory::default()
        };
        assert!(inventory.contains("AXE"));
        assert!(inventory.contains("WOODEN_HELMET"));
        assert!(inventory.contains("ELIXIR"));
        assert!(!inventory.contains("MAGIC_ARMOR"));
    }

    #[test]
    fn test_blocks_sight_rules() {
        let mut snapshot = minimal();
        snapshot.obstacles.push(Obstacle {
            id: "BUSH".into(),
            position: Position::new(4, 3),
            tags: ObstacleTags {
                passable: true,
                trap: false,
                transparent: true,
            },
            breakable: false,
        });
        snapshot.obstacles.push(Obstacle {
            id: "DRAGON_EGG".into(),
            position: Position::new(5, 3),
            tags: ObstacleTags::default(),
            breakable: true,
        });
        snapshot.hostiles.push(Hostile {
            id: "p2".into(),
            position: Position::new(6, 3),
            health: 50,
            kind: HostileKind::Player,
        });

        assert!(!snapshot.blocks_sight(Position::new(4, 3), "p1", "DRAGON_EGG"));
        assert!(!snapshot.blocks_sight(Position::new(5, 3), "p1", "DRAGON_EGG"));
        assert!(snapshot.blocks_sight(Position::new(5, 3), "p1", ""));
        assert!(snapshot.blocks_sight(Position::new(6, 3), "p1", "DRAGON_EGG"));
        assert!(!snapshot.blocks_sight(Position::new(6, 3), "p2", "DRAGON_EGG"));
    }
}
