//! `store` and `retrieve`: move items between inventory and home storage.

use std::time::Duration;

use agora_types::{ActionKind, ActionResult, ItemId};
use agora_world::container::transfer;

use super::engine::{ActionEngine, Handled};
use super::outcome::{invalid, world_failure};
use crate::player::PlayerState;

#[derive(Clone, Copy)]
enum Direction {
    Store,
    Retrieve,
}

pub(crate) async fn store(
    engine: &ActionEngine,
    player: &mut PlayerState,
    item: &ItemId,
    qty: u32,
    container: Option<&str>,
) -> Handled {
    shift(engine, player, Direction::Store, item, qty, container).await
}

pub(crate) async fn retrieve(
    engine: &ActionEngine,
    player: &mut PlayerState,
    item: &ItemId,
    qty: u32,
    container: Option<&str>,
) -> Handled {
    shift(engine, player, Direction::Retrieve, item, qty, container).await
}

async fn shift(
    engine: &ActionEngine,
    player: &mut PlayerState,
    direction: Direction,
    item: &ItemId,
    qty: u32,
    container: Option<&str>,
) -> Handled {
    let kind = match direction {
        Direction::Store => ActionKind::Store,
        Direction::Retrieve => ActionKind::Retrieve,
    };
    if qty == 0 {
        return Err(invalid(kind, "quantity must be at least 1"));
    }
    let catalog = engine.world().catalog();
    catalog
        .item(item.as_str())
        .map_err(|e| world_failure(kind, &e))?;

    let mut state = engine.world().lock().await;
    let name = match container {
        Some(name) => name.to_owned(),
        None => state
            .home(player.id())
            .map_err(|e| world_failure(kind, &e))?
            .primary_container()
            .to_owned(),
    };
    let storage = state
        .storage_mut(player.id(), &name)
        .map_err(|e| world_failure(kind, &e))?;
    let text = match direction {
        Direction::Store => {
            transfer(catalog, player.inventory_mut(), storage, item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            format!("Stored {qty} {item} in the {name}.")
        }
        Direction::Retrieve => {
            transfer(catalog, storage, player.inventory_mut(), item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            format!("Took {qty} {item} from the {name}.")
        }
    };
    drop(state);

    engine.spend(player, kind, Duration::ZERO)?;
    Ok(ActionResult::success(kind, text.clone())
        .with_qty(qty)
        .with_event(text))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_types::{Action, ResultCode};

    use super::super::testing::Fixture;
    use super::*;

    fn store(item: &str, qty: u32, container: Option<&str>) -> Action {
        Action::Store {
            item: ItemId::from(item),
            qty,
            container: container.map(str::to_owned),
        }
    }

    fn retrieve(item: &str, qty: u32) -> Action {
        Action::Retrieve {
            item: ItemId::from(item),
            qty,
            container: None,
        }
    }

    async fn locker(fx: &Fixture, agent: &str, item: &str) -> u32 {
        let state = fx.engine.world().lock().await;
        state
            .home(&agora_types::AgentId::from(agent))
            .unwrap()
            .container("locker")
            .unwrap()
            .quantity(item)
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        player
            .inventory_mut()
            .add(fx.engine.world().catalog(), &ItemId::from("paper"), 8)
            .unwrap();

        let result = fx.engine.execute(&mut player, &store("paper", 5, None)).await;
        assert!(result.ok, "{}", result.message);
        assert_eq!(player.holding(&ItemId::from("paper")), 3);
        assert_eq!(locker(&fx, "agent-1", "paper").await, 5);

        let result = fx.engine.execute(&mut player, &retrieve("paper", 5)).await;
        assert!(result.ok, "{}", result.message);
        assert_eq!(player.holding(&ItemId::from("paper")), 8);
        assert_eq!(locker(&fx, "agent-1", "paper").await, 0);
    }

    #[tokio::test]
    async fn failures_change_neither_side() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        player
            .inventory_mut()
            .add(fx.engine.world().catalog(), &ItemId::from("paper"), 2)
            .unwrap();

        let result = fx.engine.execute(&mut player, &store("paper", 3, None)).await;
        assert_eq!(result.code, ResultCode::Insufficient);

        let result = fx.engine.execute(&mut player, &store("paper", 1, Some("attic"))).await;
        assert_eq!(result.code, ResultCode::NotFound);

        let result = fx.engine.execute(&mut player, &retrieve("bread", 1)).await;
        assert_eq!(result.code, ResultCode::Insufficient);

        assert_eq!(player.holding(&ItemId::from("paper")), 2);
        assert_eq!(locker(&fx, "agent-1", "paper").await, 0);
    }

    #[tokio::test]
    async fn retrieving_respects_inventory_capacity() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-2");
        let catalog = fx.engine.world().catalog();
        player
            .inventory_mut()
            .add(catalog, &ItemId::from("paper"), 10)
            .unwrap();
        let result = fx.engine.execute(&mut player, &store("paper", 10, None)).await;
        assert!(result.ok);
        player
            .inventory_mut()
            .add(catalog, &ItemId::from("bait"), 95)
            .unwrap();

        let result = fx.engine.execute(&mut player, &retrieve("paper", 10)).await;
        assert_eq!(result.code, ResultCode::NoCapacity);
        assert_eq!(locker(&fx, "agent-2", "paper").await, 10);
    }
}
