//! `fishing`: spend bait at the fishing spot for a chance at a catch.
//!
//! Bait is consumed before the command goes out and refunded if the
//! endpoint does not confirm. The catch roll uses the world's seeded
//! random source.

use agora_types::{ActionKind, ActionResult, CommandKind, CommandRequest, ResultCode};
use tracing::warn;

use super::engine::{ActionEngine, Handled};
use super::movement::walk;
use super::outcome::world_failure;
use crate::player::PlayerState;

pub(crate) async fn execute(engine: &ActionEngine, player: &mut PlayerState, minutes: f64) -> Handled {
    let kind = ActionKind::Fishing;
    let catalog = engine.world().catalog();
    let rules = catalog.fishing().clone();
    let duration = ActionEngine::simulated_minutes(kind, minutes)?;

    for (needed, what) in [(&rules.rod, "to fish"), (&rules.bait, "as bait")] {
        if player.holding(needed) == 0 {
            return Err(ActionResult::failure(
                kind,
                ResultCode::Insufficient,
                format!("you need a {needed} {what}"),
            ));
        }
    }
    let mut after = player.inventory().clone();
    after
        .remove(&rules.bait, 1)
        .map_err(|e| world_failure(kind, &e))?;
    after
        .ensure_room(catalog, &rules.catch, 1)
        .map_err(|e| world_failure(kind, &e))?;

    let walked = match &rules.location {
        Some(spot) => Some(walk(engine, player, kind, spot).await?),
        None => None,
    };

    player
        .inventory_mut()
        .remove(&rules.bait, 1)
        .map_err(|e| world_failure(kind, &e))?;

    let real = engine.world().clock().to_real(duration);
    let request = CommandRequest::new(CommandKind::Fish, rules.catch.as_str(), player.location().clone())
        .with_value(real.as_secs_f64());
    if let Err(failure) = engine.confirm_timed(player, kind, request, real).await {
        if let Err(e) = player.inventory_mut().add(catalog, &rules.bait, 1) {
            warn!(agent_id = %player.id(), error = %e, "Could not refund bait");
        }
        let message = format!("{} The bait was returned.", failure.message);
        return Err(ActionResult { message, ..failure });
    }

    let caught = engine.world().lock().await.roll(rules.catch_chance);
    if caught {
        player
            .inventory_mut()
            .add(catalog, &rules.catch, 1)
            .map_err(|e| world_failure(kind, &e))?;
    }
    engine.spend(player, kind, duration)?;

    let text = if caught {
        format!("Fished for {minutes} minutes and caught a {}.", rules.catch)
    } else {
        format!("Fished for {minutes} minutes and caught nothing.")
    };
    let walk_cost = walked.as_ref().map_or(0.0, |w| w.cost());
    let event = walked.as_ref().map_or_else(|| text.clone(), |w| w.narrate(&text));
    Ok(ActionResult::success(kind, text)
        .with_qty(u32::from(caught))
        .with_cost(walk_cost + duration.as_secs_f64())
        .with_event(event))
}
