//! `consume`: eat or drink a consumable, or equip gear.

use std::collections::BTreeMap;
use std::time::Duration;

use agora_types::{ActionKind, ActionResult, CommandKind, CommandRequest, ItemId, ResultCode};
use agora_world::ItemKind;

use super::engine::{ActionEngine, Handled};
use super::outcome::{agent_failure, invalid, world_failure};
use crate::player::PlayerState;

pub(crate) async fn execute(
    engine: &ActionEngine,
    player: &mut PlayerState,
    item: &ItemId,
    qty: u32,
) -> Handled {
    let kind = ActionKind::Consume;
    if qty == 0 {
        return Err(invalid(kind, "quantity must be at least 1"));
    }
    let catalog = engine.world().catalog();
    let def = catalog
        .item(item.as_str())
        .map_err(|e| world_failure(kind, &e))?;
    let held = player.holding(item);
    if held < qty {
        return Err(ActionResult::failure(
            kind,
            ResultCode::Insufficient,
            format!("you have {held} {item}, not {qty}"),
        ));
    }

    match &def.kind {
        ItemKind::Consumable { effect } => {
            let scaled: BTreeMap<String, f64> = effect
                .iter()
                .map(|(name, delta)| (name.clone(), delta * f64::from(qty)))
                .collect();
            player
                .attributes()
                .check(&scaled)
                .map_err(|e| agent_failure(kind, &e))?;

            animate(engine, player, item, qty).await?;

            player
                .inventory_mut()
                .remove(item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            let applied = player
                .attributes_mut()
                .apply(&scaled)
                .map_err(|e| agent_failure(kind, &e))?;
            engine.spend(player, kind, Duration::ZERO)?;

            let summary = describe(&applied);
            Ok(ActionResult::success(kind, format!("you consumed {qty} {item} ({summary})"))
                .with_qty(qty)
                .with_effect(applied)
                .with_event(format!("Consumed {qty} {item} ({summary})")))
        }
        ItemKind::Equipment { capacity_bonus } => {
            let bonus = capacity_bonus
                .checked_mul(qty)
                .ok_or_else(|| invalid(kind, "capacity bonus overflows"))?;

            animate(engine, player, item, qty).await?;

            let inventory = player.inventory_mut();
            inventory
                .remove(item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            inventory
                .extend_capacity(bonus)
                .map_err(|e| world_failure(kind, &e))?;
            engine.spend(player, kind, Duration::ZERO)?;

            Ok(ActionResult::success(
                kind,
                format!("you equipped {qty} {item}; you can carry {bonus} more"),
            )
            .with_qty(qty)
            .with_event(format!("Equipped {qty} {item}")))
        }
        ItemKind::Material => Err(invalid(kind, format!("{item} cannot be consumed"))),
    }
}

async fn animate(
    engine: &ActionEngine,
    player: &PlayerState,
    item: &ItemId,
    qty: u32,
) -> Result<(), ActionResult> {
    let request = CommandRequest::new(CommandKind::Animation, item.as_str(), player.location().clone())
        .with_value(f64::from(qty));
    engine
        .confirm(player, ActionKind::Consume, request)
        .await
        .map(|_| ())
}

fn describe(applied: &BTreeMap<String, f64>) -> String {
    applied
        .iter()
        .map(|(name, delta)| format!("{name} {delta:+.1}"))
        .collect::<Vec<_>>()
        .join(", ")
}
