//! Priority Arbitrator.
//!
//! [`decide`] is the pure turn function: `(snapshot, memory) -> (action,
//! memory')`. Handlers run in strict priority order and the first that
//! handles the turn ends it:
//!
//! 1. Item protocol in flight
//! 2. Drop of a freshly broken obstacle
//! 3. Objective inside the safe zone
//! 4. Self-preservation
//! 5. Strategy hysteresis (never ends the turn)
//! 6. Combat, when hunting, engaged, or reactively provoked
//! 7. Farming fallback

use tracing::{debug, trace};

use crate::acquisition;
use crate::action::Action;
use crate::combat;
use crate::config::AgentConfig;
use crate::efficiency;
use crate::error::Result;
use crate::healing;
use crate::memory::{StatusMemory, StrategyMode};
use crate::oracle::PathOracle;
use crate::snapshot::WorldSnapshot;
use crate::valuation::weapon_count;

/// Read-only inputs shared by every handler for one turn.
#[derive(Clone, Copy)]
pub struct TurnContext<'a> {
    /// Tunables.
    pub config: &'a AgentConfig,
    /// This turn's world.
    pub snapshot: &'a WorldSnapshot,
    /// Path and distance queries.
    pub oracle: &'a dyn PathOracle,
}

impl<'a> TurnContext<'a> {
    /// Bundle the turn inputs.
    #[must_use]
    pub fn new(
        config: &'a AgentConfig,
        snapshot: &'a WorldSnapshot,
        oracle: &'a dyn PathOracle,
    ) -> Self {
        Self {
            config,
            snapshot,
            oracle,
        }
    }
}

/// What a handler did with the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Handled; issue this action.
    Act(Action),
    /// Handled; deliberately issue nothing.
    Hold,
    /// Not handled; ask the next handler.
    Pass,
}

/// Handler that ended the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Item-protocol resumption.
    ItemProtocol,
    /// Post-break loot collection.
    PostBreakLoot,
    /// Objective override.
    Objective,
    /// Self-preservation.
    SelfPreservation,
    /// Combat Decision Engine.
    Combat,
    /// Efficiency Comparator.
    Farming,
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// At most one action.
    pub action: Option<Action>,
    /// Which handler ended the turn, if any did.
    pub handler: Option<Handler>,
    /// Strategy mode in force this turn.
    pub strategy: StrategyMode,
}

impl Decision {
    fn from_outcome(handler: Handler, outcome: Outcome, strategy: StrategyMode) -> Option<Self> {
        match outcome {
            Outcome::Act(action) => Some(Self {
                action: Some(action),
                handler: Some(handler),
                strategy,
            }),
            Outcome::Hold => Some(Self {
                action: None,
                handler: Some(handler),
                strategy,
            }),
            Outcome::Pass => None,
        }
    }
}

/// Decide one turn.
///
/// `memory` is never touched: the updated memory is returned alongside the
/// decision, so a failed turn leaves the caller's state as it was.
pub fn decide(
    config: &AgentConfig,
    snapshot: &WorldSnapshot,
    oracle: &dyn PathOracle,
    memory: &StatusMemory,
) -> Result<(Decision, StatusMemory)> {
    snapshot.validate()?;
    memory.validate(config)?;

    let mut next = memory.clone();
    next.begin_turn(snapshot);
    let ctx = TurnContext::new(config, snapshot, oracle);
    let decision = cascade(&ctx, &mut next)?;
    next.end_turn(snapshot);
    #[cfg(feature = "debug-validation")]
    next.validate(config)?;

    debug!(
        turn = snapshot.turn,
        handler = ?decision.handler,
        action = decision.action.as_ref().map(Action::label),
        strategy = ?decision.strategy,
        "Turn decided"
    );
    Ok((decision, next))
}

fn cascade(ctx: &TurnContext<'_>, memory: &mut StatusMemory) -> Result<Decision> {
    let strategy = memory.strategy();

    let outcome = acquisition::resume(ctx, memory);
    if let Some(d) = Decision::from_outcome(Handler::ItemProtocol, outcome, strategy) {
        return Ok(d);
    }

    let outcome = efficiency::collect_drop(ctx, memory)?;
    if let Some(d) = Decision::from_outcome(Handler::PostBreakLoot, outcome, strategy) {
        return Ok(d);
    }

    let outcome = efficiency::pursue_objective(ctx, memory);
    if let Some(d) = Decision::from_outcome(Handler::Objective, outcome, strategy) {
        return Ok(d);
    }

    let outcome = healing::preserve(ctx, memory);
    if let Some(d) = Decision::from_outcome(Handler::SelfPreservation, outcome, strategy) {
        return Ok(d);
    }

    let strategy = memory.update_strategy(weapon_count(ctx.config, &ctx.snapshot.inventory), ctx.config);

    let reactive = strategy == StrategyMode::Farming && combat::reactive_trigger(ctx);
    if strategy == StrategyMode::Hunting || memory.is_engaged() || reactive {
        trace!(?strategy, engaged = memory.is_engaged(), reactive, "Combat engine");
        let outcome = combat::engage(ctx, memory);
        if let Some(d) = Decision::from_outcome(Handler::Combat, outcome, strategy) {
            return Ok(d);
        }
    }

    let outcome = efficiency::farm(ctx, memory)?;
    Ok(Decision::from_outcome(Handler::Farming, outcome, strategy).unwrap_or(Decision {
        action: None,
        handler: None,
        strategy,
    }))
}
