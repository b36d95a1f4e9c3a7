//! Grid path oracle using A* over the snapshot.
//!
//! The connector normally answers path queries; headless sessions answer them
//! here instead. Movement is 4-directional with unit step cost, so the
//! Manhattan distance is an exact lower bound and the first time the goal is
//! popped its path is shortest.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use arena_core::action::Path;
use arena_core::geometry::{Direction, Position};
use arena_core::oracle::{AvoidSet, PathMode, PathOracle};
use arena_core::snapshot::WorldSnapshot;

/// Default cap on expanded nodes per query.
pub const DEFAULT_NODE_LIMIT: usize = 65_536;

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    position: Position,
    /// g + heuristic.
    f_score: u32,
    g_score: u32,
    /// Lower coordinates first when f ties.
    tie_breaker: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for lowest f first.
        match other.f_score.cmp(&self.f_score) {
            // Deeper nodes first on equal f: they are closer to the goal.
            Ordering::Equal => match self.g_score.cmp(&other.g_score) {
                Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
                ord => ord,
            },
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deterministic tie-breaker from grid coordinates.
#[inline]
fn coords_to_tie_breaker(position: Position) -> u64 {
    (u64::from(position.y as u32) << 32) | u64::from(position.x as u32)
}

/// A* path oracle over the snapshot grid.
///
/// Cells outside the map and cells in the avoid set are impassable, except
/// that the goal itself may always be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOracle {
    node_limit: usize,
}

impl GridOracle {
    /// Oracle with the default expansion cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            node_limit: DEFAULT_NODE_LIMIT,
        }
    }

    /// Oracle that gives up after expanding `node_limit` nodes.
    #[must_use]
    pub const fn with_node_limit(node_limit: usize) -> Self {
        Self { node_limit }
    }

    fn passable(snapshot: &WorldSnapshot, avoid: &AvoidSet, cell: Position, goal: Position) -> bool {
        snapshot.in_bounds(cell) && (cell == goal || !avoid.contains(cell))
    }
}

impl Default for GridOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl PathOracle for GridOracle {
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

        let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
        let mut came_from: HashMap<Position, (Position, Direction)> = HashMap::new();
        let mut g_score: HashMap<Position, u32> = HashMap::new();

        g_score.insert(from, 0);
        open_set.push(AStarNode {
            position: from,
            f_score: from.manhattan(to),
            g_score: 0,
            tie_breaker: coords_to_tie_breaker(from),
        });

        let mut expanded = 0usize;
        while let Some(current) = open_set.pop() {
            if current.position == to {
                return Some(reconstruct_path(&came_from, from, to));
            }
            // Stale entry superseded by a cheaper one.
            if g_score
                .get(&current.position)
                .is_some_and(|&g| g < current.g_score)
            {
                continue;
            }
            expanded += 1;
            if expanded > self.node_limit {
                tracing::debug!(?from, ?to, expanded, "Path search gave up");
                return None;
            }

            for direction in Direction::ALL {
                let next = current.position.step(direction);
                if !Self::passable(snapshot, avoid, next, to) {
                    continue;
                }
                let tentative_g = current.g_score + 1;
                if g_score.get(&next).is_some_and(|&g| g <= tentative_g) {
                    continue;
                }
                came_from.insert(next, (current.position, direction));
                g_score.insert(next, tentative_g);
                open_set.push(AStarNode {
                    position: next,
                    f_score: tentative_g + next.manhattan(to),
                    g_score: tentative_g,
                    tie_breaker: coords_to_tie_breaker(next),
                });
            }
        }
        None
    }
}

/// Walk `came_from` back from the goal.
fn reconstruct_path(
    came_from: &HashMap<Position, (Position, Direction)>,
    from: Position,
    to: Position,
) -> Path {
    let mut steps = Vec::new();
    let mut at = to;
    while at != from {
        let Some(&(prev, direction)) = came_from.get(&at) else {
            break;
        };
        steps.push(direction);
        at = prev;
    }
    steps.reverse();
    Path::new(steps)
}
