//! Movement helpers shared by every handler.

use tracing::debug;

use crate::action::{Action, Path};
use crate::arbiter::TurnContext;
use crate::geometry::{Direction, Position};
use crate::memory::StatusMemory;
use crate::oracle::{AvoidSet, PathMode};

/// Shortest path from the agent to `to`.
#[must_use]
pub fn path_to(ctx: &TurnContext<'_>, to: Position, mode: PathMode) -> Option<Path> {
    let avoid = AvoidSet::for_snapshot(ctx.snapshot, mode);
    ctx.oracle
        .path(ctx.snapshot, &avoid, ctx.snapshot.me.position, to, mode)
}

/// A move along `path`, or `None` for an empty path.
#[must_use]
pub fn walk(path: Path) -> Option<Action> {
    (!path.is_empty()).then_some(Action::Move { path })
}

/// Move toward `to`. `None` if unreachable or already there.
#[must_use]
pub fn move_toward(ctx: &TurnContext<'_>, to: Position, mode: PathMode) -> Option<Action> {
    path_to(ctx, to, mode).and_then(walk)
}

/// A reachable cell next to a target, with the path to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approach {
    /// Cell to stand on.
    pub cell: Position,
    /// Path there (empty when already standing on it).
    pub path: Path,
}

/// Shortest route to any cell orthogonally adjacent to `target`.
#[must_use]
pub fn approach_adjacent(
    ctx: &TurnContext<'_>,
    target: Position,
    mode: PathMode,
) -> Option<Approach> {
    let me = ctx.snapshot.me.position;
    let mut best: Option<Approach> = None;
    for cell in target.neighbors() {
        if cell != me && !ctx.snapshot.is_standable(cell) {
            continue;
        }
        let Some(path) = path_to(ctx, cell, mode) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| path.len() < b.path.len()) {
            best = Some(Approach { cell, path });
        }
    }
    best
}

/// One random step onto a standable neighbour, drawn from the seeded stream.
pub fn random_step(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Option<Action> {
    let me = ctx.snapshot.me.position;
    let options: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|d| ctx.snapshot.is_standable(me.step(*d)))
        .collect();
    if options.is_empty() {
        debug!(position = %me, "Boxed in, no random step");
        return None;
    }
    let direction = options[memory.random_index(options.len())];
    debug!(?direction, "Random step");
    Some(Action::Move {
        path: Path::new(vec![direction]),
    })
}
