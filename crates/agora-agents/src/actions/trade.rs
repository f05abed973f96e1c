//! `trade`: buy from or sell to the market at its current price.
//!
//! The player first walks to the market. Quote, checks, and commit then
//! happen under one hold of the world lock, so concurrent buyers can never
//! take more stock than exists.

use std::time::Duration;

use agora_types::{ActionKind, ActionResult, ItemId, ResultCode, TradeMode};

use super::engine::{ActionEngine, Handled};
use super::movement::walk;
use super::outcome::{agent_failure, invalid, world_failure};
use crate::player::PlayerState;

pub(crate) async fn execute(
    engine: &ActionEngine,
    player: &mut PlayerState,
    mode: TradeMode,
    item: &ItemId,
    qty: u32,
) -> Handled {
    let kind = ActionKind::Trade;
    if qty == 0 {
        return Err(invalid(kind, "quantity must be at least 1"));
    }
    let catalog = engine.world().catalog();
    catalog
        .item(item.as_str())
        .map_err(|e| world_failure(kind, &e))?;

    let market = engine.world().lock().await.market().location().clone();
    let walked = walk(engine, player, kind, &market).await?;

    let mut state = engine.world().lock().await;
    let (text, price) = match mode {
        TradeMode::Buy => {
            let price = state
                .market()
                .quote_buy(item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            if price > player.money() {
                return Err(ActionResult::failure(
                    kind,
                    ResultCode::NoFunds,
                    format!("{qty} {item} cost {price} but you have {}", player.money()),
                ));
            }
            player
                .inventory()
                .ensure_room(catalog, item, qty)
                .map_err(|e| world_failure(kind, &e))?;

            // Everything was checked above under the same lock.
            state
                .market_mut()
                .take(item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            player
                .inventory_mut()
                .add(catalog, item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            player.debit(price).map_err(|e| agent_failure(kind, &e))?;
            (format!("Bought {qty} {item} for {price}."), price)
        }
        TradeMode::Sell => {
            let held = player.holding(item);
            if held < qty {
                return Err(ActionResult::failure(
                    kind,
                    ResultCode::Insufficient,
                    format!("you have {held} {item}, not {qty}"),
                ));
            }
            let price = state
                .market()
                .quote_sell(item, qty)
                .map_err(|e| world_failure(kind, &e))?;

            player
                .inventory_mut()
                .remove(item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            state
                .market_mut()
                .put(item, qty)
                .map_err(|e| world_failure(kind, &e))?;
            player.credit(price).map_err(|e| agent_failure(kind, &e))?;
            (format!("Sold {qty} {item} for {price}."), price)
        }
    };
    drop(state);

    engine.spend(player, kind, Duration::ZERO)?;
    Ok(ActionResult::success(kind, text.clone())
        .with_qty(qty)
        .with_price(price)
        .with_cost(walked.cost())
        .with_event(walked.narrate(&text)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use agora_dispatch::{DispatchConfig, Loopback};
    use agora_types::Action;
    use rust_decimal_macros::dec;

    use super::super::testing::Fixture;
    use super::*;

    fn trade(mode: TradeMode, item: &str, qty: u32) -> Action {
        Action::Trade {
            mode,
            item: ItemId::from(item),
            qty,
        }
    }

    async fn cheap_fish() -> Fixture {
        Fixture::build(
            |content| {
                for listing in &mut content.market.listings {
                    if listing.item.as_str() == "fish" {
                        listing.avg_price = dec!(5);
                        listing.quantity = 5;
                    }
                }
                for seed in &mut content.players {
                    seed.money = Some(dec!(100));
                }
            },
            Some(Loopback::confirming()),
            DispatchConfig::default(),
        )
        .await
    }

    async fn stock(fx: &Fixture, item: &str) -> u32 {
        fx.engine
            .world()
            .lock()
            .await
            .market()
            .listing(item)
            .unwrap()
            .quantity
    }

    #[tokio::test]
    async fn buying_moves_money_and_stock() {
        let fx = cheap_fish().await;
        let mut player = fx.player("agent-1");

        let result = fx.engine.execute(&mut player, &trade(TradeMode::Buy, "fish", 2)).await;
        assert!(result.ok, "{}", result.message);
        assert_eq!(player.money(), dec!(90));
        assert_eq!(player.holding(&ItemId::from("fish")), 2);
        assert_eq!(stock(&fx, "fish").await, 3);
        assert_eq!(result.delta.price, Some(dec!(10)));
        assert_eq!(player.location().as_str(), "market");
    }

    #[tokio::test]
    async fn selling_pays_half_and_restocks() {
        let fx = cheap_fish().await;
        let mut player = fx.player("agent-1");
        player
            .inventory_mut()
            .add(fx.engine.world().catalog(), &ItemId::from("fish"), 2)
            .unwrap();

        let result = fx.engine.execute(&mut player, &trade(TradeMode::Sell, "fish", 2)).await;
        assert!(result.ok, "{}", result.message);
        assert_eq!(player.money(), dec!(105));
        assert_eq!(player.holding(&ItemId::from("fish")), 0);
        assert_eq!(stock(&fx, "fish").await, 7);
    }

    #[tokio::test]
    async fn refusals_leave_everything_unchanged() {
        let fx = cheap_fish().await;
        let mut player = fx.player("agent-1");

        let result = fx.engine.execute(&mut player, &trade(TradeMode::Buy, "fish", 6)).await;
        assert_eq!(result.code, ResultCode::OutOfStock);

        let result = fx
            .engine
            .execute(&mut player, &trade(TradeMode::Buy, "backpack", 2))
            .await;
        assert_eq!(result.code, ResultCode::NoFunds);

        let result = fx.engine.execute(&mut player, &trade(TradeMode::Sell, "bread", 1)).await;
        assert_eq!(result.code, ResultCode::Insufficient);

        let result = fx.engine.execute(&mut player, &trade(TradeMode::Buy, "unicorn", 1)).await;
        assert_eq!(result.code, ResultCode::NotFound);

        assert_eq!(player.money(), dec!(100));
        assert_eq!(stock(&fx, "fish").await, 5);
        assert_eq!(stock(&fx, "backpack").await, 2);
    }

    #[tokio::test]
    async fn no_capacity_for_bulk_buys() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-3");
        player
            .inventory_mut()
            .add(fx.engine.world().catalog(), &ItemId::from("paper"), 95)
            .unwrap();
        let result = fx.engine.execute(&mut player, &trade(TradeMode::Buy, "water", 6)).await;
        assert_eq!(result.code, ResultCode::NoCapacity);
        assert_eq!(stock(&fx, "water").await, 30);
        assert_eq!(player.money(), dec!(1000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_buyers_never_oversell() {
        let fx = Arc::new(cheap_fish().await);
        let mut handles = Vec::new();
        for id in ["agent-1", "agent-2", "agent-3", "agent-4"] {
            let fx = Arc::clone(&fx);
            handles.push(tokio::spawn(async move {
                let mut player = fx.player(id);
                let result = fx.engine.execute(&mut player, &trade(TradeMode::Buy, "fish", 2)).await;
                (result, player.money())
            }));
        }

        let mut sold = 0;
        for handle in handles {
            let (result, money) = handle.await.unwrap();
            if result.ok {
                sold += 2;
                assert_eq!(money, dec!(90));
            } else {
                assert_eq!(result.code, ResultCode::OutOfStock);
                assert_eq!(money, dec!(100));
            }
        }
        assert_eq!(sold, 4);
        assert_eq!(stock(&fx, "fish").await, 1);
    }
}
