//! Item acquisition state machine.
//!
//! ```text
//! Idle ──initiate──► PendingRevoke ──evicted──► PendingPickup ──► Idle
//!   │                     │                                        ▲
//!   └──initiate (free)────┼──────────────► PendingPickup ──────────┘
//!                         └──wait bound hit, blacklist target──► Idle
//! ```
//!
//! Each pending state has its own transition function. None of them moves
//! the agent; walking to the item is the caller's job.

use tracing::{debug, info};

use crate::action::Action;
use crate::arbiter::{Outcome, TurnContext};
use crate::combat;
use crate::error::{AgentError, Result};
use crate::memory::{PickupState, StatusMemory};
use crate::snapshot::LootItem;
use crate::valuation::{eviction_for, marginal_value};

/// Advance an in-flight transaction. [`Outcome::Pass`] when idle.
pub fn resume(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Outcome {
    match memory.pickup().clone() {
        PickupState::Idle => Outcome::Pass,
        PickupState::PendingRevoke { target, revoke, .. } => {
            on_pending_revoke(ctx, memory, &target, &revoke)
        }
        PickupState::PendingPickup {
            target,
            held_before,
        } => on_pending_pickup(ctx, memory, &target, held_before),
    }
}

fn on_pending_revoke(
    ctx: &TurnContext<'_>,
    memory: &mut StatusMemory,
    target: &str,
    revoke: &str,
) -> Outcome {
    let waited = memory.bump_revoke_wait().unwrap_or_default();
    if !ctx.snapshot.inventory.contains(revoke) {
        memory.start_pickup(target, ctx.snapshot.inventory.count(target));
        return Outcome::Act(Action::PickUp);
    }
    if waited >= ctx.config.items.max_revoke_wait {
        info!(target, revoke, waited, "Eviction never landed, aborting");
        memory.blacklist(target);
        memory.finish_pickup();
        return Outcome::Pass;
    }
    debug!(target, revoke, waited, "Waiting on eviction");
    Outcome::Hold
}

fn on_pending_pickup(
    ctx: &TurnContext<'_>,
    memory: &mut StatusMemory,
    target: &str,
    held_before: usize,
) -> Outcome {
    memory.finish_pickup();
    let held = ctx.snapshot.inventory.count(target);
    if held <= held_before {
        info!(target, held, "Pick-up lost to contention");
        memory.blacklist(target);
        return Outcome::Pass;
    }
    info!(target, "Pick-up succeeded");
    if ctx.config.is_one_shot_utility(target) && !memory.used_one_shot_utility() {
        return Outcome::Act(combat::trigger_area_utility(ctx, memory));
    }
    Outcome::Pass
}

/// Start acquiring `item`, which lies under the agent.
///
/// Issues the eviction first when the destination slot is taken. An item
/// that turns out not to be an upgrade is blacklisted and the turn passes.
pub fn initiate(
    ctx: &TurnContext<'_>,
    memory: &mut StatusMemory,
    item: &LootItem,
) -> Result<Outcome> {
    if !memory.pickup().is_idle() {
        return Err(AgentError::StateCorrupted(format!(
            "initiating '{}' while {:?}",
            item.id,
            memory.pickup()
        )));
    }
    if memory.is_blacklisted(&item.id) {
        return Ok(Outcome::Pass);
    }
    let inventory = &ctx.snapshot.inventory;
    if marginal_value(ctx.config, memory, inventory, item) <= 0 {
        debug!(item = %item.id, "Not an upgrade");
        memory.blacklist(&item.id);
        return Ok(Outcome::Pass);
    }
    let outcome = match eviction_for(ctx.config, memory, inventory, item) {
        Some(revoke) => {
            memory.start_revoke(&item.id, &revoke);
            Outcome::Act(Action::Revoke { item_id: revoke })
        }
        None => {
            memory.start_pickup(&item.id, inventory.count(&item.id));
            Outcome::Act(Action::PickUp)
        }
    };
    Ok(outcome)
}
