//! [`ActionEngine`]: routes actions to handlers and settles their results.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use agora_dispatch::{Ack, Dispatcher};
use agora_types::{Action, ActionKind, ActionResult, CommandRequest, LocationId, ResultCode};
use agora_world::World;
use futures::FutureExt;
use tracing::{debug, error, info};

use super::outcome;
use super::{consume, cook, fishing, movement, rest, storage, talk, trade};
use crate::config::RulesConfig;
use crate::player::PlayerState;

/// What a handler produces: the success result, or the failure to report.
pub(crate) type Handled = Result<ActionResult, ActionResult>;

/// Executes actions for any player against one shared world.
#[derive(Debug)]
pub struct ActionEngine {
    world: Arc<World>,
    dispatcher: Arc<Dispatcher>,
    rules: RulesConfig,
}

impl ActionEngine {
    /// Create an engine over a world and the dispatcher that reaches its endpoints.
    pub const fn new(world: Arc<World>, dispatcher: Arc<Dispatcher>, rules: RulesConfig) -> Self {
        Self {
            world,
            dispatcher,
            rules,
        }
    }

    /// The shared world.
    pub const fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// The dispatcher commands go through.
    pub const fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// The game rules in force.
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Execute one action for `player`.
    ///
    /// Always yields exactly one result. A dead player gets `DEAD` without
    /// anything running; a panicking handler yields `CRASH` and the engine
    /// stays usable.
    pub async fn execute(&self, player: &mut PlayerState, action: &Action) -> ActionResult {
        let kind = action.kind();
        if player.is_dead() {
            return ActionResult::failure(kind, ResultCode::Dead, "you are dead and cannot act");
        }

        let outcome = AssertUnwindSafe(self.route(player, action))
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(handled) => handled.unwrap_or_else(|failure| failure),
            Err(_) => {
                error!(agent_id = %player.id(), action = %kind, "Action handler panicked");
                ActionResult::failure(kind, ResultCode::Crash, "the action failed unexpectedly")
            }
        };

        if result.ok {
            debug!(agent_id = %player.id(), action = %kind, "Action succeeded");
        } else {
            info!(
                agent_id = %player.id(),
                action = %kind,
                code = ?result.code,
                message = %result.message,
                "Action failed"
            );
        }
        result
    }

    async fn route(&self, player: &mut PlayerState, action: &Action) -> Handled {
        match action {
            Action::Move { target } => movement::execute(self, player, target).await,
            Action::Consume { item, qty } => consume::execute(self, player, item, *qty).await,
            Action::Cook { input, tool } => cook::execute(self, player, input, tool.as_ref()).await,
            Action::Trade { mode, item, qty } => {
                trade::execute(self, player, *mode, item, *qty).await
            }
            Action::Store {
                item,
                qty,
                container,
            } => storage::store(self, player, item, *qty, container.as_deref()).await,
            Action::Retrieve {
                item,
                qty,
                container,
            } => storage::retrieve(self, player, item, *qty, container.as_deref()).await,
            Action::Wait { seconds } => rest::wait(self, player, *seconds).await,
            Action::Sleep { minutes } => rest::sleep(self, player, *minutes).await,
            Action::Fishing { minutes } => fishing::execute(self, player, *minutes).await,
            Action::Talk { to, content } => talk::execute(self, player, to, content).await,
            Action::Unknown => Err(ActionResult::failure(
                ActionKind::Unknown,
                ResultCode::Unknown,
                "unrecognized action type",
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers shared by handlers
    // -----------------------------------------------------------------------

    /// Resolve the home alias to the player's own home.
    pub(crate) fn resolve_location(&self, player: &PlayerState, target: &LocationId) -> LocationId {
        if target.as_str() == self.rules.home_alias {
            player.home().clone()
        } else {
            target.clone()
        }
    }

    /// Ask the player's endpoint to perform `request` and wait for completion.
    pub(crate) async fn confirm(
        &self,
        player: &PlayerState,
        kind: ActionKind,
        request: CommandRequest,
    ) -> Result<Ack, ActionResult> {
        self.dispatcher
            .send(player.id(), request)
            .await
            .map_err(|e| outcome::dispatch_failure(kind, &e))
    }

    /// Like [`Self::confirm`] for commands that take `real` time to play out.
    ///
    /// The acknowledgment deadline is extended by the command's duration.
    pub(crate) async fn confirm_timed(
        &self,
        player: &PlayerState,
        kind: ActionKind,
        request: CommandRequest,
        real: Duration,
    ) -> Result<Ack, ActionResult> {
        let timeout = self.dispatcher.config().ack_timeout.saturating_add(real);
        self.dispatcher
            .send_with_timeout(player.id(), request, timeout)
            .await
            .map_err(|e| outcome::dispatch_failure(kind, &e))
    }

    /// Charge `simulated` time and the fixed fatigue cost of `kind`.
    ///
    /// Fails with a `DEAD` result if an attribute ran out.
    pub(crate) fn spend(
        &self,
        player: &mut PlayerState,
        kind: ActionKind,
        simulated: Duration,
    ) -> Result<(), ActionResult> {
        self.settle(player, kind, simulated, -self.rules.fatigue_cost(kind))
    }

    /// Charge `simulated` time and move fatigue by a signed amount.
    ///
    /// Exhaustion is judged on the net result, so recovery earned during
    /// the span offsets the drain of the same span.
    pub(crate) fn settle(
        &self,
        player: &mut PlayerState,
        kind: ActionKind,
        simulated: Duration,
        fatigue_change: f64,
    ) -> Result<(), ActionResult> {
        match player
            .pass_time(simulated, fatigue_change)
            .map_err(|e| outcome::agent_failure(kind, &e))?
        {
            Some(cause) => {
                info!(agent_id = %player.id(), action = %kind, cause = %cause, "Player died");
                Err(outcome::death(kind, &cause))
            }
            None => Ok(()),
        }
    }

    /// Parse a positive span of simulated minutes.
    pub(crate) fn simulated_minutes(kind: ActionKind, minutes: f64) -> Result<Duration, ActionResult> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(outcome::invalid(kind, format!("{minutes} is not a positive number of minutes")));
        }
        Duration::try_from_secs_f64(minutes * 60.0)
            .map_err(|_overflow| outcome::invalid(kind, format!("{minutes} minutes is too long")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_types::ItemId;

    use super::super::testing::Fixture;
    use super::*;

    #[tokio::test]
    async fn unknown_actions_are_reported_not_dropped() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        let result = fx.engine.execute(&mut player, &Action::Unknown).await;
        assert_eq!(result.code, ResultCode::Unknown);
        assert_eq!(result.action, ActionKind::Unknown);
    }

    #[tokio::test]
    async fn dead_players_cannot_act() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        player.pass_time(Duration::from_secs(100 * 3600), 0.0).unwrap();
        let action = Action::Consume {
            item: ItemId::from("bread"),
            qty: 1,
        };
        let result = fx.engine.execute(&mut player, &action).await;
        assert_eq!(result.code, ResultCode::Dead);
    }

    #[tokio::test]
    async fn home_alias_resolves_per_player() {
        let fx = Fixture::new().await;
        let player = fx.player("agent-2");
        let resolved = fx.engine.resolve_location(&player, &LocationId::from("home"));
        assert_eq!(resolved.as_str(), "agent-2_home");
        let other = fx.engine.resolve_location(&player, &LocationId::from("river"));
        assert_eq!(other.as_str(), "river");
    }

    #[tokio::test]
    async fn minutes_must_be_positive_and_finite() {
        assert!(ActionEngine::simulated_minutes(ActionKind::Sleep, 0.0).is_err());
        assert!(ActionEngine::simulated_minutes(ActionKind::Sleep, f64::NAN).is_err());
        assert_eq!(
            ActionEngine::simulated_minutes(ActionKind::Sleep, 1.5).unwrap(),
            Duration::from_secs(90)
        );
    }

    #[tokio::test]
    async fn unconnected_players_get_rejections() {
        let fx = Fixture::without_endpoints().await;
        let mut player = fx.player("agent-1");
        let action = Action::Move {
            target: LocationId::from("river"),
        };
        let result = fx.engine.execute(&mut player, &action).await;
        assert_eq!(result.code, ResultCode::Rejected);
        assert_eq!(player.location(), player.home());
    }
}
