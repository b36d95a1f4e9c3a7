//! Self-preservation handler.

use tracing::{debug, info};

use crate::action::Action;
use crate::arbiter::{Outcome, TurnContext};
use crate::memory::StatusMemory;
use crate::movement::{approach_adjacent, random_step, Approach};
use crate::oracle::PathMode;
use crate::snapshot::Ally;
use crate::valuation::best_healing;

fn is_healer(ctx: &TurnContext<'_>, ally: &Ally) -> bool {
    ally.heals || ally.id == ctx.config.healer_ally_id
}

/// Closest reachable healer inside the safe zone.
fn nearest_healer<'a>(ctx: &TurnContext<'a>) -> Option<(&'a Ally, Approach)> {
    ctx.snapshot
        .allies
        .iter()
        .filter(|a| is_healer(ctx, a) && ctx.oracle.in_safe_zone(ctx.snapshot, a.position))
        .filter_map(|a| approach_adjacent(ctx, a.position, PathMode::Cautious).map(|ap| (a, ap)))
        .min_by(|(a, x), (b, y)| x.path.len().cmp(&y.path.len()).then_with(|| a.id.cmp(&b.id)))
}

/// Heal, retreat, or break something that might drop a heal.
///
/// Below the soft threshold the best healing consumable is used. Below the
/// critical threshold with nothing to consume, the agent retreats to a healer
/// ally, then falls back to breaking the nearest obstacle.
pub fn preserve(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Outcome {
    let health = ctx.snapshot.me.health;
    let thresholds = &ctx.config.health;
    if health >= thresholds.heal_threshold {
        return Outcome::Pass;
    }
    if let Some(item_id) = best_healing(ctx.config, &ctx.snapshot.inventory) {
        info!(health, item = item_id, "Healing");
        return Outcome::Act(Action::Consume {
            item_id: item_id.to_string(),
        });
    }
    if health >= thresholds.critical_threshold {
        return Outcome::Pass;
    }

    if let Some((ally, approach)) = nearest_healer(ctx) {
        if approach.path.is_empty() {
            debug!(ally = %ally.id, "Resting beside healer");
            return Outcome::Hold;
        }
        info!(health, ally = %ally.id, "Critical, retreating to healer");
        return Outcome::Act(Action::Move {
            path: approach.path,
        });
    }

    let me = ctx.snapshot.me.position;
    let mut obstacles: Vec<_> = ctx
        .snapshot
        .obstacles
        .iter()
        .filter(|o| o.breakable && ctx.oracle.in_safe_zone(ctx.snapshot, o.position))
        .collect();
    obstacles.sort_by_key(|o| (ctx.oracle.distance(me, o.position), o.position));
    for obstacle in obstacles {
        let Some(approach) = approach_adjacent(ctx, obstacle.position, PathMode::Cautious) else {
            continue;
        };
        debug!(health, obstacle = %obstacle.id, "Critical, breaking for heals");
        if approach.path.is_empty() {
            if let Some(direction) = me.direction_to(obstacle.position) {
                memory.remember_obstacle(obstacle.position);
                return Outcome::Act(Action::Attack { direction });
            }
        }
        return Outcome::Act(Action::Move {
            path: approach.path,
        });
    }

    random_step(ctx, memory).map_or(Outcome::Pass, Outcome::Act)
}
