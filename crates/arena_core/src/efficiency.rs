//! Efficiency Comparator: the farming fallback.
//!
//! Loot and breakable obstacles compete on `value / (path + 1)`. Ratios are
//! compared by cross-multiplication so equal ratios compare equal exactly;
//! the fixed-point ratio is only produced for logging.

use std::cmp::Ordering;

use tracing::debug;

use crate::acquisition;
use crate::action::{Action, Path};
use crate::arbiter::{Outcome, TurnContext};
use crate::error::Result;
use crate::geometry::{ratio, Fixed};
use crate::memory::StatusMemory;
use crate::movement::{approach_adjacent, move_toward, path_to, random_step, Approach};
use crate::oracle::PathMode;
use crate::snapshot::{LootItem, Obstacle};
use crate::valuation::{equipped_score, marginal_value};

/// Value over path cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Efficiency {
    /// Value gained on arrival.
    pub value: i32,
    /// Steps to get there.
    pub path_len: u32,
}

impl Efficiency {
    /// Create an efficiency.
    #[must_use]
    pub const fn new(value: i32, path_len: u32) -> Self {
        Self { value, path_len }
    }

    /// Compare `value / (path_len + 1)` exactly.
    #[must_use]
    pub fn cmp_ratio(&self, other: &Self) -> Ordering {
        let lhs = i64::from(self.value) * (i64::from(other.path_len) + 1);
        let rhs = i64::from(other.value) * (i64::from(self.path_len) + 1);
        lhs.cmp(&rhs)
    }

    /// Strictly more efficient than `other`.
    #[must_use]
    pub fn beats(&self, other: &Self) -> bool {
        self.cmp_ratio(other) == Ordering::Greater
    }

    /// Fixed-point ratio.
    #[must_use]
    pub fn ratio(&self) -> Fixed {
        ratio(Fixed::from_num(self.value), self.path_len.saturating_add(1))
    }
}

/// Whether loot should be preferred over an obstacle.
#[must_use]
pub fn prefers_loot(loot: &Efficiency, obstacle: &Efficiency) -> bool {
    loot.beats(obstacle)
}

/// Value of breaking an obstacle given the current gear.
#[must_use]
pub fn obstacle_value(ctx: &TurnContext<'_>) -> i32 {
    let farming = &ctx.config.farming;
    let decay = equipped_score(ctx.config, &ctx.snapshot.inventory)
        .saturating_mul(farming.equipment_decay_per_mille)
        / 1000;
    (farming.obstacle_value - decay).max(farming.min_obstacle_value)
}

/// Loot item chosen by the comparator.
#[derive(Debug, Clone)]
pub struct LootChoice<'a> {
    /// The item.
    pub item: &'a LootItem,
    /// Its efficiency.
    pub efficiency: Efficiency,
    /// Path to it; empty when standing on it.
    pub path: Path,
}

/// Most efficient upgrade on the ground among items accepted by `within`.
///
/// Skips blacklisted items, items outside the safe zone and items lying on
/// solid obstacles or traps.
pub fn best_loot<'a>(
    ctx: &TurnContext<'a>,
    memory: &StatusMemory,
    within: impl Fn(&LootItem) -> bool,
) -> Option<LootChoice<'a>> {
    let snapshot = ctx.snapshot;
    let mut best: Option<LootChoice<'a>> = None;
    for item in &snapshot.loot {
        if !within(item)
            || memory.is_blacklisted(&item.id)
            || snapshot.is_hazard_at(item.position)
            || !ctx.oracle.in_safe_zone(snapshot, item.position)
        {
            continue;
        }
        let value = marginal_value(ctx.config, memory, &snapshot.inventory, item);
        if value <= 0 {
            continue;
        }
        let Some(path) = path_to(ctx, item.position, PathMode::Cautious) else {
            continue;
        };
        let efficiency = Efficiency::new(value, u32::try_from(path.len()).unwrap_or(u32::MAX));
        let better = best.as_ref().map_or(true, |b| {
            efficiency
                .cmp_ratio(&b.efficiency)
                .then_with(|| b.path.len().cmp(&path.len()))
                .then_with(|| b.item.id.cmp(&item.id))
                == Ordering::Greater
        });
        if better {
            best = Some(LootChoice {
                item,
                efficiency,
                path,
            });
        }
    }
    best
}

/// Obstacle chosen by the comparator.
#[derive(Debug, Clone)]
pub struct ObstacleChoice<'a> {
    /// The obstacle.
    pub obstacle: &'a Obstacle,
    /// Its efficiency.
    pub efficiency: Efficiency,
    /// Where to stand to strike it.
    pub approach: Approach,
}

/// Breakable obstacles in the safe zone, nearest first.
fn breakable_by_distance<'a>(ctx: &TurnContext<'a>) -> Vec<&'a Obstacle> {
    let me = ctx.snapshot.me.position;
    let mut obstacles: Vec<&Obstacle> = ctx
        .snapshot
        .obstacles
        .iter()
        .filter(|o| o.breakable && ctx.oracle.in_safe_zone(ctx.snapshot, o.position))
        .collect();
    obstacles.sort_by_key(|o| (ctx.oracle.distance(me, o.position), o.position));
    obstacles
}

/// Most efficient of the nearest breakable obstacles.
#[must_use]
pub fn best_obstacle<'a>(ctx: &TurnContext<'a>) -> Option<ObstacleChoice<'a>> {
    let value = obstacle_value(ctx);
    let mut best: Option<ObstacleChoice<'a>> = None;
    for obstacle in breakable_by_distance(ctx)
        .into_iter()
        .take(ctx.config.farming.obstacle_candidates)
    {
        let Some(approach) = approach_adjacent(ctx, obstacle.position, PathMode::Cautious) else {
            continue;
        };
        let efficiency = Efficiency::new(
            value,
            u32::try_from(approach.path.len()).unwrap_or(u32::MAX),
        );
        if best.as_ref().map_or(true, |b| efficiency.beats(&b.efficiency)) {
            best = Some(ObstacleChoice {
                obstacle,
                efficiency,
                approach,
            });
        }
    }
    best
}

fn strike(
    ctx: &TurnContext<'_>,
    memory: &mut StatusMemory,
    choice: ObstacleChoice<'_>,
) -> Outcome {
    if choice.approach.path.is_empty() {
        let Some(direction) = ctx.snapshot.me.position.direction_to(choice.obstacle.position) else {
            return Outcome::Pass;
        };
        memory.remember_obstacle(choice.obstacle.position);
        Outcome::Act(Action::Attack { direction })
    } else {
        Outcome::Act(Action::Move {
            path: choice.approach.path,
        })
    }
}

/// Walk to (or start acquiring) a chosen item.
fn collect(
    ctx: &TurnContext<'_>,
    memory: &mut StatusMemory,
    choice: LootChoice<'_>,
) -> Result<Outcome> {
    if choice.path.is_empty() {
        acquisition::initiate(ctx, memory, choice.item)
    } else {
        Ok(Outcome::Act(Action::Move { path: choice.path }))
    }
}

/// Farming fallback: best of loot and obstacle, else drift toward the safe
/// anchor, else a random step.
pub fn farm(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Result<Outcome> {
    // Second pass only after a walk-on item turned out not to be an upgrade.
    for _ in 0..2 {
        let loot = best_loot(ctx, memory, |_| true);
        let obstacle = best_obstacle(ctx);
        if let (Some(l), Some(o)) = (&loot, &obstacle) {
            debug!(
                item = %l.item.id,
                loot = %l.efficiency.ratio(),
                obstacle = %o.efficiency.ratio(),
                "Comparing loot and obstacle"
            );
        }
        match (loot, obstacle) {
            (Some(l), o) if o.as_ref().map_or(true, |o| prefers_loot(&l.efficiency, &o.efficiency)) => {
                match collect(ctx, memory, l)? {
                    Outcome::Pass => continue,
                    outcome => return Ok(outcome),
                }
            }
            (_, Some(o)) => return Ok(strike(ctx, memory, o)),
            _ => break,
        }
    }

    let me = ctx.snapshot.me.position;
    let anchor = ctx.snapshot.safe_anchor();
    if me != anchor {
        if let Some(action) = move_toward(ctx, anchor, PathMode::Cautious) {
            debug!(%anchor, "Nothing to farm, heading to anchor");
            return Ok(Outcome::Act(action));
        }
    }
    Ok(random_step(ctx, memory).map_or(Outcome::Pass, Outcome::Act))
}

/// Collect the drop of the obstacle struck most recently.
///
/// Waits while the obstacle stands; forgets it once the agent strays too far
/// or nothing worth taking is left around it.
pub fn collect_drop(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Result<Outcome> {
    let Some(site) = memory.last_attacked_obstacle() else {
        return Ok(Outcome::Pass);
    };
    let me = ctx.snapshot.me.position;
    if ctx.oracle.distance(me, site) > ctx.config.farming.loot_abandon_distance {
        debug!(%site, "Strayed from broken obstacle");
        memory.forget_obstacle();
        return Ok(Outcome::Pass);
    }
    if ctx.snapshot.obstacle_at(site).is_some_and(|o| o.breakable) {
        return Ok(Outcome::Pass);
    }
    let radius = ctx.config.farming.loot_radius;
    match best_loot(ctx, memory, |item| item.position.manhattan(site) <= radius) {
        Some(choice) => {
            debug!(item = %choice.item.id, %site, "Collecting drop");
            collect(ctx, memory, choice)
        }
        None => {
            memory.forget_obstacle();
            Ok(Outcome::Pass)
        }
    }
}

/// Attack the unique objective whenever it sits inside the safe zone.
pub fn pursue_objective(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Outcome {
    let objective = ctx.snapshot.obstacles.iter().find(|o| {
        o.id == ctx.config.objective_id && ctx.oracle.in_safe_zone(ctx.snapshot, o.position)
    });
    let Some(objective) = objective else {
        return Outcome::Pass;
    };
    let Some(approach) = approach_adjacent(ctx, objective.position, PathMode::Cautious) else {
        return Outcome::Pass;
    };
    let efficiency = Efficiency::new(0, u32::try_from(approach.path.len()).unwrap_or(u32::MAX));
    strike(
        ctx,
        memory,
        ObstacleChoice {
            obstacle: objective,
            efficiency,
            approach,
        },
    )
}
