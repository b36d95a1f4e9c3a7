//! Pathfinding collaborator seam.
//!
//! The core never searches the grid itself. It asks a [`PathOracle`] for
//! shortest paths, telling it which cells to keep out of via an [`AvoidSet`].

use std::collections::BTreeSet;

use crate::action::Path;
use crate::geometry::Position;
use crate::snapshot::{HostileKind, WorldSnapshot};

/// How cautiously to path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathMode {
    /// Keep away from every hostile.
    Cautious,
    /// Chasing: players may be approached, NPCs are still avoided.
    Pursuit,
}

/// Cells a path must not enter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvoidSet {
    cells: BTreeSet<Position>,
}

impl AvoidSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard avoid set for `mode`.
    ///
    /// Solid obstacles, traps and NPC hostiles are always avoided; players
    /// only in [`PathMode::Cautious`].
    #[must_use]
    pub fn for_snapshot(snapshot: &WorldSnapshot, mode: PathMode) -> Self {
        let mut cells: BTreeSet<Position> = snapshot
            .obstacles
            .iter()
            .filter(|o| o.is_hazard())
            .map(|o| o.position)
            .collect();
        cells.extend(
            snapshot
                .hostiles
                .iter()
                .filter(|h| h.kind == HostileKind::Npc || mode == PathMode::Cautious)
                .map(|h| h.position),
        );
        Self { cells }
    }

    /// Whether `position` must be avoided.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.cells.contains(&position)
    }

    /// Number of avoided cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when nothing is avoided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Shortest-path and distance queries.
///
/// Implementations must be deterministic: the same snapshot, avoid set and
/// endpoints always yield the same path.
pub trait PathOracle {
    /// Shortest 4-directional path from `from` to `to`.
    ///
    /// Returns an empty path when `from == to` and `None` when `to` cannot be
    /// reached. The destination itself is always enterable, even if it is in
    /// `avoid`.
    fn path(
        &self,
        snapshot: &WorldSnapshot,
        avoid: &AvoidSet,
        from: Position,
        to: Position,
        mode: PathMode,
    ) -> Option<Path>;

    /// Straight-line grid distance.
    fn distance(&self, from: Position, to: Position) -> u32 {
        from.manhattan(to)
    }

    /// Safe-zone membership.
    fn in_safe_zone(&self, snapshot: &WorldSnapshot, position: Position) -> bool {
        snapshot.in_safe_zone(position)
    }
}

impl<T: PathOracle + ?Sized> PathOracle for &T {
    fn path(
        &self,
        snapshot: &WorldSnapshot,
        avoid: &AvoidSet,
        from: Position,
        to: Position,
        mode: PathMode,
    ) -> Option<Path> {
        (**self).path(snapshot, avoid, from, to, mode)
    }

    fn distance(&self, from: Position, to: Position) -> u32 {
        (**self).distance(from, to)
    }

    fn in_safe_zone(&self, snapshot: &WorldSnapshot, position: Position) -> bool {
        (**self).in_safe_zone(snapshot, position)
    }
}
