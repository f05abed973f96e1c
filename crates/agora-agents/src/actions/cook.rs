//! `cook`: turn one raw input into food using a tool and one unit of fuel.
//!
//! Fixed tools (the pot at home) require walking to them first; carried
//! tools (a portable stove) work anywhere. The output's capacity is
//! checked before anything is consumed.

use agora_types::{ActionKind, ActionResult, CommandKind, CommandRequest, ItemId, ResultCode};
use agora_world::CookTool;

use super::engine::{ActionEngine, Handled};
use super::movement::walk;
use super::outcome::{invalid, world_failure};
use crate::player::PlayerState;

pub(crate) async fn execute(
    engine: &ActionEngine,
    player: &mut PlayerState,
    input: &ItemId,
    requested_tool: Option<&ItemId>,
) -> Handled {
    let kind = ActionKind::Cook;
    let catalog = engine.world().catalog();
    let recipe = catalog
        .recipe(input.as_str())
        .ok_or_else(|| invalid(kind, format!("{input} cannot be cooked")))?
        .clone();
    let tool = choose_tool(engine, player, requested_tool)?.clone();
    let fuel = catalog.fuel().clone();

    if tool.location.is_none() && player.holding(&tool.id) == 0 {
        return Err(ActionResult::failure(
            kind,
            ResultCode::Insufficient,
            format!("you need a {} to cook here", tool.id),
        ));
    }
    for (needed, what) in [(input, "ingredient"), (&fuel, "fuel")] {
        if player.holding(needed) == 0 {
            return Err(ActionResult::failure(
                kind,
                ResultCode::Insufficient,
                format!("you have no {needed} ({what})"),
            ));
        }
    }

    let mut after = player.inventory().clone();
    after.remove(input, 1).map_err(|e| world_failure(kind, &e))?;
    after.remove(&fuel, 1).map_err(|e| world_failure(kind, &e))?;
    after
        .ensure_room(catalog, &recipe.output, 1)
        .map_err(|e| world_failure(kind, &e))?;

    let cook_time = ActionEngine::simulated_minutes(kind, recipe.cook_minutes)?;

    let walked = match &tool.location {
        Some(place) => Some(walk(engine, player, kind, place).await?),
        None => None,
    };

    let real = engine.world().clock().to_real(cook_time);
    let request = CommandRequest::new(CommandKind::Cook, input.as_str(), player.location().clone())
        .with_value(real.as_secs_f64());
    engine.confirm_timed(player, kind, request, real).await?;

    let inventory = player.inventory_mut();
    inventory.remove(input, 1).map_err(|e| world_failure(kind, &e))?;
    inventory.remove(&fuel, 1).map_err(|e| world_failure(kind, &e))?;
    inventory
        .add(catalog, &recipe.output, 1)
        .map_err(|e| world_failure(kind, &e))?;
    engine.spend(player, kind, cook_time)?;

    let text = format!("Cooked {input} into {} with the {}.", recipe.output, tool.id);
    let walk_cost = walked.as_ref().map_or(0.0, |w| w.cost());
    let event = match &walked {
        Some(w) => w.narrate(&text),
        None => text.clone(),
    };
    Ok(ActionResult::success(kind, text)
        .with_qty(1)
        .with_cost(walk_cost + cook_time.as_secs_f64())
        .with_event(event))
}

fn choose_tool<'a>(
    engine: &'a ActionEngine,
    player: &PlayerState,
    requested: Option<&ItemId>,
) -> Result<&'a CookTool, ActionResult> {
    let catalog = engine.world().catalog();
    if let Some(id) = requested {
        return catalog
            .tool(id.as_str())
            .ok_or_else(|| invalid(ActionKind::Cook, format!("{id} is not a cooking tool")));
    }
    catalog
        .tools()
        .find(|tool| tool.location.is_none() && player.holding(&tool.id) > 0)
        .or_else(|| catalog.tools().find(|tool| tool.location.is_some()))
        .ok_or_else(|| invalid(ActionKind::Cook, "there is nothing to cook with"))
}
