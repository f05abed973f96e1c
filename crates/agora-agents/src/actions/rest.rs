//! `wait` and `sleep`.
//!
//! A wait is given in real seconds and costs that much time scaled by the
//! clock ratio. Sleep is given in simulated minutes; it drains attributes
//! like any other time but restores fatigue at the configured hourly rate.
//! Recovery is netted against the drain before exhaustion is judged.

use std::time::Duration;

use agora_types::{ActionKind, ActionResult, CommandKind, CommandRequest};

use super::engine::{ActionEngine, Handled};
use super::outcome::invalid;
use crate::config::FATIGUE;
use crate::player::PlayerState;

pub(crate) async fn wait(engine: &ActionEngine, player: &mut PlayerState, seconds: f64) -> Handled {
    let kind = ActionKind::Wait;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid(kind, format!("{seconds} is not a positive number of seconds")));
    }
    let real = Duration::try_from_secs_f64(seconds)
        .map_err(|_overflow| invalid(kind, format!("{seconds} seconds is too long")))?;

    let request = CommandRequest::new(CommandKind::Waiting, "", player.location().clone())
        .with_value(seconds);
    engine.confirm_timed(player, kind, request, real).await?;

    let simulated = engine.world().clock().to_simulated(real);
    engine.spend(player, kind, simulated)?;
    Ok(ActionResult::success(kind, format!("you waited {seconds} seconds"))
        .with_cost(simulated.as_secs_f64()))
}

pub(crate) async fn sleep(engine: &ActionEngine, player: &mut PlayerState, minutes: f64) -> Handled {
    let kind = ActionKind::Sleep;
    let simulated = ActionEngine::simulated_minutes(kind, minutes)?;
    let real = engine.world().clock().to_real(simulated);

    let request = CommandRequest::new(CommandKind::Sleeping, "", player.location().clone())
        .with_value(real.as_secs_f64());
    engine.confirm_timed(player, kind, request, real).await?;

    let recovery = engine.rules().sleep_recovery_per_hour * simulated.as_secs_f64() / 3600.0;
    let before = player.attributes().current(FATIGUE);
    engine.settle(player, kind, simulated, recovery - engine.rules().fatigue_cost(kind))?;
    let restored = match (before, player.attributes().current(FATIGUE)) {
        (Some(before), Some(after)) => after - before,
        _ => 0.0,
    };

    let text = format!("Slept for {minutes} minutes.");
    Ok(ActionResult::success(kind, text.clone())
        .with_cost(simulated.as_secs_f64())
        .with_effect(std::iter::once((FATIGUE.to_owned(), restored)).collect())
        .with_event(text))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_dispatch::{DispatchConfig, Loopback};
    use agora_types::{Action, ResultCode};

    use super::super::testing::Fixture;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn waiting_costs_scaled_time() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        let result = fx
            .engine
            .execute(&mut player, &Action::Wait { seconds: 30.0 })
            .await;
        assert!(result.ok, "{}", result.message);
        // 30 real seconds at 120x is one simulated hour.
        assert!((result.delta.cost.unwrap() - 3600.0).abs() < 1e-6);
        let thirst = player.attributes().current("thirst").unwrap();
        assert!((thirst - 96.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn long_waits_outlast_the_default_deadline() {
        let dispatch = DispatchConfig {
            ack_timeout: Duration::from_secs(25),
            ..DispatchConfig::default()
        };
        let fx = Fixture::build(
            |_| {},
            Some(Loopback::confirming().honoring_durations()),
            dispatch,
        )
        .await;
        let mut player = fx.player("agent-1");
        let result = fx
            .engine
            .execute(&mut player, &Action::Wait { seconds: 40.0 })
            .await;
        assert!(result.ok, "{}", result.message);
    }

    #[tokio::test]
    async fn sleep_restores_fatigue() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        player.attributes_mut().shift("fatigue", -50.0).unwrap();

        let result = fx
            .engine
            .execute(&mut player, &Action::Sleep { minutes: 120.0 })
            .await;
        assert!(result.ok, "{}", result.message);
        // Two hours: -6 decay, +40 recovery.
        let fatigue = player.attributes().current("fatigue").unwrap();
        assert!((fatigue - 84.0).abs() < 1e-6, "fatigue was {fatigue}");
        let hunger = player.attributes().current("hunger").unwrap();
        assert!((hunger - 96.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn sleeping_while_exhausted_recovers() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        player.attributes_mut().shift("fatigue", -98.0).unwrap();

        let result = fx
            .engine
            .execute(&mut player, &Action::Sleep { minutes: 60.0 })
            .await;
        assert!(result.ok, "{}", result.message);
        assert!(!player.is_dead());
        // One hour: -3 decay, +20 recovery.
        let fatigue = player.attributes().current("fatigue").unwrap();
        assert!((fatigue - 19.0).abs() < 1e-6, "fatigue was {fatigue}");
        let restored = result.delta.effect.as_ref().unwrap()["fatigue"];
        assert!((restored - 17.0).abs() < 1e-6, "restored {restored}");
    }

    #[tokio::test]
    async fn non_positive_durations_are_invalid() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        let result = fx
            .engine
            .execute(&mut player, &Action::Wait { seconds: 0.0 })
            .await;
        assert_eq!(result.code, ResultCode::Invalid);
        let result = fx
            .engine
            .execute(&mut player, &Action::Sleep { minutes: f64::INFINITY })
            .await;
        assert_eq!(result.code, ResultCode::Invalid);
    }

    #[tokio::test]
    async fn sleeping_through_thirst_is_fatal() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        player.attributes_mut().shift("thirst", -95.0).unwrap();
        let result = fx
            .engine
            .execute(&mut player, &Action::Sleep { minutes: 120.0 })
            .await;
        assert_eq!(result.code, ResultCode::Dead);
        assert!(player.is_dead());
    }
}
