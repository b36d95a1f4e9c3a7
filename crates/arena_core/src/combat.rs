//! Combat Decision Engine.
//!
//! Scores every (weapon, hostile) pair, fires when the best target is lined
//! up and otherwise repositions onto a firing line. With nothing feasible it
//! decides between chasing the nearest hostile and disengaging.
//!
//! Line of sight is only ever orthogonal. A diagonal target is never "in
//! sight"; it is reached by moving onto one of its axes first.

use std::cmp::Reverse;

use tracing::{debug, info};

use crate::action::{Action, Path};
use crate::arbiter::{Outcome, TurnContext};
use crate::config::WeaponEffect;
use crate::geometry::{Direction, Position};
use crate::item::{Weapon, WeaponClass};
use crate::memory::StatusMemory;
use crate::movement::{path_to, walk};
use crate::oracle::PathMode;
use crate::snapshot::Hostile;

/// A scored (weapon, hostile) pairing.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Target.
    pub hostile: &'a Hostile,
    /// Weapon to use.
    pub weapon: &'a Weapon,
    /// Attack score.
    pub score: i32,
    /// Distance to the target.
    pub distance: u32,
}

impl Candidate<'_> {
    /// Total order: higher score, then closer, then earlier evaluation
    /// class, then smaller hostile id.
    fn rank(&self) -> (i32, Reverse<u32>, Reverse<usize>, Reverse<&str>) {
        (
            self.score,
            Reverse(self.distance),
            Reverse(self.weapon.class.evaluation_rank()),
            Reverse(self.hostile.id.as_str()),
        )
    }
}

/// Live hostiles inside the safe zone.
pub fn targets<'a>(ctx: &TurnContext<'a>) -> impl Iterator<Item = &'a Hostile> + 'a {
    let snapshot = ctx.snapshot;
    let oracle = ctx.oracle;
    snapshot
        .hostiles
        .iter()
        .filter(move |h| h.health > 0 && oracle.in_safe_zone(snapshot, h.position))
}

/// Whether a projectile from `from` reaches `target` unobstructed.
///
/// Always false off-axis.
#[must_use]
pub fn has_clear_sight(ctx: &TurnContext<'_>, from: Position, target: &Hostile) -> bool {
    from.cells_between(target.position).is_some_and(|cells| {
        cells
            .into_iter()
            .all(|cell| !ctx.snapshot.blocks_sight(cell, &target.id, &ctx.config.objective_id))
    })
}

/// Whether `weapon` can be brought to bear on `target` this turn or after a
/// reposition.
#[must_use]
pub fn is_feasible(ctx: &TurnContext<'_>, weapon: &Weapon, target: &Hostile, distance: u32) -> bool {
    if !weapon.has_uses() || distance > weapon.max_range() {
        return false;
    }
    let me = ctx.snapshot.me.position;
    !me.is_aligned_with(target.position) || has_clear_sight(ctx, me, target)
}

fn is_close_quarters(ctx: &TurnContext<'_>, weapon: &Weapon) -> bool {
    weapon.class == WeaponClass::Melee || ctx.config.combat.close_quarters_ids.contains(&weapon.id)
}

/// Attack score of `weapon` against `target` at `distance`.
#[must_use]
pub fn score(
    ctx: &TurnContext<'_>,
    memory: &StatusMemory,
    weapon: &Weapon,
    target: &Hostile,
    distance: u32,
) -> i32 {
    let combat = &ctx.config.combat;
    let mut score = ctx.config.scores.weapon(&weapon.id);

    if i64::from(weapon.stats.damage) >= i64::from(target.health) {
        score += combat.lethal_bonus;
    }
    if weapon.class == WeaponClass::Throwable {
        score += combat.throwable_bonus;
    }
    score += combat.utility_bonus.get(&weapon.id).copied().unwrap_or(0);

    let timers = memory.effects_on(&target.id).copied().unwrap_or_default();
    if timers.is_stunned() {
        score += combat.stunned_bonus;
    }
    if is_close_quarters(ctx, weapon) {
        if timers.is_smoked() {
            score += combat.smoked_bonus;
        }
        if timers.is_pulled() {
            score += combat.pulled_bonus;
        }
    }
    if matches!(ctx.config.effect_of(&weapon.id), Some(WeaponEffect::Pull { .. }))
        && !timers.is_pulled()
    {
        score += combat.pull_opener_bonus;
    }

    score - i32::try_from(distance).unwrap_or(i32::MAX).saturating_mul(combat.distance_penalty)
}

/// Highest-ranked feasible pairing, if any.
#[must_use]
pub fn best_candidate<'a>(ctx: &TurnContext<'a>, memory: &StatusMemory) -> Option<Candidate<'a>> {
    let me = ctx.snapshot.me.position;
    let inventory = &ctx.snapshot.inventory;
    targets(ctx)
        .flat_map(|hostile| inventory.weapons().map(move |weapon| (hostile, weapon)))
        .filter_map(|(hostile, weapon)| {
            let distance = ctx.oracle.distance(me, hostile.position);
            is_feasible(ctx, weapon, hostile, distance).then(|| Candidate {
                hostile,
                weapon,
                score: score(ctx, memory, weapon, hostile, distance),
                distance,
            })
        })
        .max_by(|a, b| a.rank().cmp(&b.rank()))
}

/// Whether a strong weapon and a close hostile justify fighting while
/// farming.
#[must_use]
pub fn reactive_trigger(ctx: &TurnContext<'_>) -> bool {
    let me = ctx.snapshot.me.position;
    let combat = &ctx.config.combat;
    let hostile_near = targets(ctx)
        .any(|h| ctx.oracle.distance(me, h.position) <= combat.reactive_engage_distance);
    let strong_weapon = ctx
        .snapshot
        .inventory
        .weapons()
        .any(|w| w.has_uses() && ctx.config.scores.weapon(&w.id) >= combat.reactive_weapon_score);
    hostile_near && strong_weapon
}

/// Consume the one-shot utility and stun every hostile in its radius.
pub fn trigger_area_utility(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Action {
    let utility = &ctx.config.utility;
    let me = ctx.snapshot.me.position;
    let mut stunned = 0_usize;
    for hostile in &ctx.snapshot.hostiles {
        if ctx.oracle.distance(me, hostile.position) <= utility.radius {
            memory.apply_effect(
                &hostile.id,
                WeaponEffect::Stun {
                    turns: utility.stun_turns,
                },
            );
            stunned += 1;
        }
    }
    memory.mark_utility_used();
    info!(item = %utility.item_id, stunned, "Area utility used");
    Action::Consume {
        item_id: utility.item_id.clone(),
    }
}

fn holds_unused_utility(ctx: &TurnContext<'_>, memory: &StatusMemory) -> bool {
    !memory.used_one_shot_utility()
        && ctx
            .snapshot
            .inventory
            .consumables
            .iter()
            .any(|id| ctx.config.is_one_shot_utility(id))
}

/// Run the engine for one turn.
pub fn engage(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Outcome {
    let me = ctx.snapshot.me.position;

    if holds_unused_utility(ctx, memory)
        && targets(ctx).any(|h| ctx.oracle.distance(me, h.position) <= ctx.config.utility.radius)
    {
        return Outcome::Act(trigger_area_utility(ctx, memory));
    }

    if let Some(candidate) = best_candidate(ctx, memory) {
        debug!(
            target = %candidate.hostile.id,
            weapon = %candidate.weapon.id,
            score = candidate.score,
            distance = candidate.distance,
            "Best pairing"
        );
        if me.is_aligned_with(candidate.hostile.position) {
            if let Some(direction) = me.direction_to(candidate.hostile.position) {
                return Outcome::Act(fire(ctx, memory, &candidate, direction));
            }
        }
        if let Some(path) = reposition(ctx, &candidate) {
            memory.set_engaged(true);
            return Outcome::Act(Action::Move { path });
        }
        debug!(target = %candidate.hostile.id, "No firing line reachable");
    }

    chase(ctx, memory)
}

fn fire(
    ctx: &TurnContext<'_>,
    memory: &mut StatusMemory,
    candidate: &Candidate<'_>,
    direction: Direction,
) -> Action {
    let weapon = candidate.weapon;
    let target = &candidate.hostile.id;
    if let Some(effect) = ctx.config.effect_of(&weapon.id) {
        memory.apply_effect(target, effect);
    }
    memory.record_attack(target);
    info!(target = %target, weapon = %weapon.id, ?direction, "Firing");
    Action::fire(weapon.class, direction)
}

/// Path to the nearest reachable in-range cell on one of the target's axes
/// with a clear line to it.
fn reposition(ctx: &TurnContext<'_>, candidate: &Candidate<'_>) -> Option<Path> {
    let target = candidate.hostile;
    let reach = i32::try_from(candidate.weapon.max_range())
        .unwrap_or(i32::MAX)
        .min(ctx.snapshot.map_size);
    let mut best: Option<Path> = None;
    for direction in Direction::ALL {
        for k in 1..=reach {
            let cell = target.position.offset(direction, k);
            if !ctx.snapshot.is_standable(cell)
                || !ctx.oracle.in_safe_zone(ctx.snapshot, cell)
                || !has_clear_sight(ctx, cell, target)
            {
                continue;
            }
            let Some(path) = path_to(ctx, cell, PathMode::Pursuit) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| path.len() < b.len()) {
                best = Some(path);
            }
        }
    }
    best.filter(|path| !path.is_empty())
}

/// Chase the nearest hostile or disengage.
fn chase(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Outcome {
    let me = ctx.snapshot.me.position;
    let nearest = targets(ctx).min_by(|a, b| {
        ctx.oracle
            .distance(me, a.position)
            .cmp(&ctx.oracle.distance(me, b.position))
            .then_with(|| a.id.cmp(&b.id))
    });
    let Some(hostile) = nearest else {
        memory.set_engaged(false);
        return Outcome::Pass;
    };

    let distance = ctx.oracle.distance(me, hostile.position);
    let remembered = memory.last_target().is_some_and(|m| {
        m.target_id == hostile.id && m.turns_since_attack <= ctx.config.combat.chase_memory_turns
    });
    let closing = memory
        .previous_position(&hostile.id)
        .map_or(true, |prev| distance <= ctx.oracle.distance(me, prev));
    let can_reach = ctx
        .snapshot
        .inventory
        .weapons()
        .any(|w| w.class.is_ranged() && w.has_uses());

    if remembered || (closing && can_reach) {
        let steps = path_to(ctx, hostile.position, PathMode::Pursuit).map(|path| {
            let keep = path.len().saturating_sub(1);
            path.steps()[..keep].iter().copied().collect::<Path>()
        });
        if let Some(action) = steps.and_then(walk) {
            debug!(target = %hostile.id, remembered, closing, "Chasing");
            memory.set_engaged(true);
            return Outcome::Act(action);
        }
    }

    debug!(target = %hostile.id, "Disengaging");
    memory.set_engaged(false);
    Outcome::Pass
}
