//! Test fixtures and helpers.
//!
//! A fluent [`SnapshotBuilder`] for consistent world states, weapon helpers,
//! and [`BfsOracle`], a breadth-first path oracle good enough for tests.

use std::collections::{BTreeMap, VecDeque};

use arena_core::action::Path;
use arena_core::geometry::{Direction, Position};
use arena_core::item::{ArmorSlot, ItemKind, Weapon, WeaponClass, WeaponStats};
use arena_core::oracle::{AvoidSet, PathMode, PathOracle};
use arena_core::snapshot::{
    Ally, Hostile, HostileKind, Inventory, LootItem, Obstacle, ObstacleTags, SafeZone, SelfStatus,
    WorldSnapshot,
};

/// Create a weapon with limited uses.
#[must_use]
pub fn weapon(id: &str, class: WeaponClass, damage: u32, range: u32, uses: u32) -> Weapon {
    Weapon::new(
        id,
        class,
        WeaponStats {
            damage,
            range,
            uses: Some(uses),
        },
    )
}

/// Create a melee weapon (range 1, unlimited uses).
#[must_use]
pub fn melee(id: &str, damage: u32) -> Weapon {
    Weapon::new(
        id,
        WeaponClass::Melee,
        WeaponStats {
            damage,
            range: 1,
            uses: None,
        },
    )
}

/// Fluent builder for [`WorldSnapshot`].
///
/// Defaults: 20x20 map, agent `me` at the centre with 100 health, empty
/// inventory apart from the `HAND` placeholder, no safe zone.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: WorldSnapshot,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new(20)
    }
}

impl SnapshotBuilder {
    /// Start a snapshot on a `map_size` square map.
    #[must_use]
    pub fn new(map_size: i32) -> Self {
        Self {
            snapshot: WorldSnapshot {
                turn: 1,
                map_size,
                me: SelfStatus {
                    id: "me".to_string(),
                    position: Position::new(map_size / 2, map_size / 2),
                    health: 100,
                },
                inventory: Inventory {
                    melee: Some(melee("HAND", 5)),
                    ..Inventory::default()
                },
                hostiles: Vec::new(),
                allies: Vec::new(),
                loot: Vec::new(),
                obstacles: Vec::new(),
                safe_zone: None,
            },
        }
    }

    /// Turn counter.
    #[must_use]
    pub fn turn(mut self, turn: u64) -> Self {
        self.snapshot.turn = turn;
        self
    }

    /// Agent position.
    #[must_use]
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.snapshot.me.position = Position::new(x, y);
        self
    }

    /// Agent health.
    #[must_use]
    pub fn health(mut self, health: i32) -> Self {
        self.snapshot.me.health = health;
        self
    }

    /// Safe zone.
    #[must_use]
    pub fn safe_zone(mut self, x: i32, y: i32, radius: u32) -> Self {
        self.snapshot.safe_zone = Some(SafeZone {
            center: Position::new(x, y),
            radius,
        });
        self
    }

    /// Equip a weapon in its class slot.
    #[must_use]
    pub fn equip(mut self, weapon: Weapon) -> Self {
        let inventory = &mut self.snapshot.inventory;
        match weapon.class {
            WeaponClass::Gun => inventory.gun = Some(weapon),
            WeaponClass::Throwable => inventory.throwable = Some(weapon),
            WeaponClass::Special => inventory.special = Some(weapon),
            WeaponClass::Melee => inventory.melee = Some(weapon),
        }
        self
    }

    /// Equip armor or a helmet.
    #[must_use]
    pub fn wear(mut self, id: &str, slot: ArmorSlot) -> Self {
        match slot {
            ArmorSlot::Armor => self.snapshot.inventory.armor = Some(id.to_string()),
            ArmorSlot::Helmet => self.snapshot.inventory.helmet = Some(id.to_string()),
        }
        self
    }

    /// Add a held consumable.
    #[must_use]
    pub fn holding(mut self, id: &str) -> Self {
        self.snapshot.inventory.consumables.push(id.to_string());
        self
    }

    /// Add a hostile player.
    #[must_use]
    pub fn hostile(self, id: &str, x: i32, y: i32, health: i32) -> Self {
        self.hostile_of(id, x, y, health, HostileKind::Player)
    }

    /// Add a hostile NPC.
    #[must_use]
    pub fn npc(self, id: &str, x: i32, y: i32, health: i32) -> Self {
        self.hostile_of(id, x, y, health, HostileKind::Npc)
    }

    fn hostile_of(mut self, id: &str, x: i32, y: i32, health: i32, kind: HostileKind) -> Self {
        self.snapshot.hostiles.push(Hostile {
            id: id.to_string(),
            position: Position::new(x, y),
            health,
            kind,
        });
        self
    }

    /// Add an ally.
    #[must_use]
    pub fn ally(mut self, id: &str, x: i32, y: i32, heals: bool) -> Self {
        self.snapshot.allies.push(Ally {
            id: id.to_string(),
            position: Position::new(x, y),
            heals,
        });
        self
    }

    /// Drop an item on the ground.
    #[must_use]
    pub fn loot(mut self, id: &str, kind: ItemKind, x: i32, y: i32) -> Self {
        self.snapshot.loot.push(LootItem {
            id: id.to_string(),
            position: Position::new(x, y),
            kind,
            stats: None,
        });
        self
    }

    /// Solid, unbreakable, opaque wall.
    #[must_use]
    pub fn wall(self, x: i32, y: i32) -> Self {
        self.obstacle("WALL", x, y, ObstacleTags::default(), false)
    }

    /// Solid, breakable, opaque chest.
    #[must_use]
    pub fn chest(self, id: &str, x: i32, y: i32) -> Self {
        self.obstacle(id, x, y, ObstacleTags::default(), true)
    }

    /// Arbitrary obstacle.
    #[must_use]
    pub fn obstacle(mut self, id: &str, x: i32, y: i32, tags: ObstacleTags, breakable: bool) -> Self {
        self.snapshot.obstacles.push(Obstacle {
            id: id.to_string(),
            position: Position::new(x, y),
            tags,
            breakable,
        });
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> WorldSnapshot {
        self.snapshot
    }
}

/// Breadth-first path oracle over the snapshot grid.
///
/// Neighbours are expanded in [`Direction::ALL`] order, so paths are
/// deterministic. Cells in the avoid set are never entered except as the
/// destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfsOracle;

impl PathOracle for BfsOracle {
    fn path(
        &self,
        snapshot: &WorldSnapshot,
        avoid: &AvoidSet,
        from: Position,
        to: Position,
        _mode: PathMode,
    ) -> Option<Path> {
        if from == to {
            return Some(Path::default());
        }
        if !snapshot.in_bounds(to) {
            return None;
        }
        let mut came_from: BTreeMap<Position, (Position, Direction)> = BTreeMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for direction in Direction::ALL {
                let next = current.step(direction);
                if next == from
                    || came_from.contains_key(&next)
                    || !snapshot.in_bounds(next)
                    || (next != to && avoid.contains(next))
                {
                    continue;
                }
                came_from.insert(next, (current, direction));
                if next == to {
                    let mut steps = Vec::new();
                    let mut at = to;
                    while at != from {
                        let (prev, step) = came_from[&at];
                        steps.push(step);
                        at = prev;
                    }
                    steps.reverse();
                    return Some(Path::new(steps));
                }
                queue.push_back(next);
            }
        }
        None
    }
}
