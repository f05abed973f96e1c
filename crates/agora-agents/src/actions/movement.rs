//! `move`, and the walk every location-bound action starts with.

use std::time::Duration;

use agora_types::{ActionKind, ActionResult, CommandKind, CommandRequest, LocationId, ResultCode};

use super::engine::{ActionEngine, Handled};
use crate::player::PlayerState;

/// How a walk went.
pub(crate) enum Walk {
    /// The player was already at the destination.
    Stayed,
    /// The player walked over.
    Arrived {
        from: LocationId,
        to: LocationId,
        simulated: Duration,
    },
}

impl Walk {
    /// Simulated seconds spent walking.
    pub(crate) fn cost(&self) -> f64 {
        match self {
            Self::Stayed => 0.0,
            Self::Arrived { simulated, .. } => simulated.as_secs_f64(),
        }
    }

    /// A sentence describing the walk, if one happened.
    pub(crate) fn note(&self) -> Option<String> {
        match self {
            Self::Stayed => None,
            Self::Arrived {
                from,
                to,
                simulated,
            } => Some(format!(
                "Walked from {from} to {to} in {} minutes.",
                simulated.as_secs() / 60
            )),
        }
    }

    /// Prefix `text` with the walk note.
    pub(crate) fn narrate(&self, text: &str) -> String {
        match self.note() {
            Some(note) => format!("{note} {text}"),
            None => text.to_owned(),
        }
    }
}

pub(crate) async fn execute(
    engine: &ActionEngine,
    player: &mut PlayerState,
    target: &LocationId,
) -> Handled {
    let kind = ActionKind::Move;
    let walk = walk(engine, player, kind, target).await?;
    let result = match &walk {
        Walk::Stayed => ActionResult::success(kind, format!("you are already at {}", player.location())),
        Walk::Arrived { to, .. } => ActionResult::success(kind, format!("you arrived at {to}"))
            .with_cost(walk.cost())
            .with_event(walk.note().unwrap_or_default()),
    };
    Ok(result)
}

/// Walk `player` to `target`, confirming the trip with the endpoint.
///
/// Failures are reported under `kind`, so an implicit walk inside a trade
/// fails as a trade.
pub(crate) async fn walk(
    engine: &ActionEngine,
    player: &mut PlayerState,
    kind: ActionKind,
    target: &LocationId,
) -> Result<Walk, ActionResult> {
    let destination = engine.resolve_location(player, target);
    let def = engine.world().lock().await.location(destination.as_str()).cloned();
    let Some(def) = def else {
        return Err(ActionResult::failure(
            kind,
            ResultCode::NotFound,
            format!("there is no place called {destination}"),
        ));
    };
    if !def.admits(player.id()) {
        return Err(ActionResult::failure(
            kind,
            ResultCode::Forbidden,
            format!("{destination} is someone else's home"),
        ));
    }
    if *player.location() == destination {
        return Ok(Walk::Stayed);
    }

    let request = CommandRequest::new(CommandKind::GoTo, def.nav_target(), player.location().clone());
    let ack = engine.confirm(player, kind, request).await?;
    let simulated = engine.world().clock().to_simulated(ack.latency);

    let from = player.location().clone();
    player.move_to(destination.clone());
    engine.spend(player, ActionKind::Move, simulated).map_err(|mut dead| {
        dead.action = kind;
        dead
    })?;

    Ok(Walk::Arrived {
        from,
        to: destination,
        simulated,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use agora_dispatch::{DispatchConfig, Loopback};
    use agora_types::Action;

    use super::super::testing::Fixture;
    use super::*;
    use crate::player::AccessState;

    fn go(target: &str) -> Action {
        Action::Move {
            target: LocationId::from(target),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn travel_time_scales_with_latency() {
        let fx = Fixture::with_endpoint(Loopback::confirming().with_delay(Duration::from_secs(3)))
            .await;
        let mut player = fx.player("agent-1");

        let result = fx.engine.execute(&mut player, &go("river")).await;
        assert!(result.ok, "{}", result.message);
        assert_eq!(player.location().as_str(), "river");
        assert_eq!(player.access("river"), Some(AccessState::Visited));
        // Three real seconds at a ratio of 120 is six simulated minutes.
        let cost = result.delta.cost.unwrap();
        assert!((cost - 360.0).abs() < 1.0, "cost was {cost}");
        let hunger = player.attributes().current("hunger").unwrap();
        assert!((hunger - 99.8).abs() < 0.01, "hunger was {hunger}");
    }

    #[tokio::test]
    async fn staying_put_is_free() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        let result = fx.engine.execute(&mut player, &go("home")).await;
        assert!(result.ok);
        assert!(result.delta.cost.is_none());
        let fatigue = player.attributes().current("fatigue").unwrap();
        assert!((fatigue - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_and_private_places_are_refused() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");

        let result = fx.engine.execute(&mut player, &go("moon")).await;
        assert_eq!(result.code, ResultCode::NotFound);

        let result = fx.engine.execute(&mut player, &go("agent-2_home")).await;
        assert_eq!(result.code, ResultCode::Forbidden);
        assert_eq!(player.location(), player.home());
    }

    #[tokio::test]
    async fn rejected_walks_leave_the_player_in_place() {
        let fx = Fixture::with_endpoint(Loopback::rejecting()).await;
        let mut player = fx.player("agent-1");
        let result = fx.engine.execute(&mut player, &go("market")).await;
        assert_eq!(result.code, ResultCode::Rejected);
        assert_eq!(player.location(), player.home());
        assert_eq!(player.access("market"), Some(AccessState::Unvisited));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_endpoints_time_out() {
        let dispatch = DispatchConfig {
            ack_timeout: Duration::from_secs(25),
            ..DispatchConfig::default()
        };
        let fx = Fixture::build(|_| {}, Some(Loopback::silent()), dispatch).await;
        let mut player = fx.player("agent-1");
        let result = fx.engine.execute(&mut player, &go("market")).await;
        assert_eq!(result.code, ResultCode::Timeout);
        assert_eq!(player.location(), player.home());
    }

    #[tokio::test]
    async fn exhaustion_on_the_road_is_fatal() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        // Leave just under one point of fatigue; a walk costs one.
        player.attributes_mut().shift("fatigue", -99.5).unwrap();

        let result = fx.engine.execute(&mut player, &go("river")).await;
        assert_eq!(result.code, ResultCode::Dead);
        assert!(player.is_dead());

        let again = fx.engine.execute(&mut player, &go("market")).await;
        assert_eq!(again.code, ResultCode::Dead);
    }
}
