//! Shared fixture for handler tests.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use agora_dispatch::{DispatchConfig, Dispatcher, Loopback};
use agora_types::AgentId;
use agora_world::{GameContent, MarketSettings, World, WorldClock, WorldState};
use rust_decimal::Decimal;

use super::ActionEngine;
use crate::config::RulesConfig;
use crate::player::PlayerState;

pub(crate) struct Fixture {
    pub engine: ActionEngine,
    pub content: GameContent,
    pub rules: RulesConfig,
}

impl Fixture {
    /// Default content with flat prices and confirming endpoints for everyone.
    pub async fn new() -> Self {
        Self::build(|_| {}, Some(Loopback::confirming()), DispatchConfig::default()).await
    }

    /// Default content with `loopback` answering for every player.
    pub async fn with_endpoint(loopback: Loopback) -> Self {
        Self::build(|_| {}, Some(loopback), DispatchConfig::default()).await
    }

    /// No endpoint is connected for anyone.
    pub async fn without_endpoints() -> Self {
        Self::build(|_| {}, None, DispatchConfig::default()).await
    }

    /// Full control over content, endpoints, and dispatch settings.
    pub async fn build(
        edit: impl FnOnce(&mut GameContent),
        loopback: Option<Loopback>,
        dispatch: DispatchConfig,
    ) -> Self {
        let mut content = GameContent::default();
        for listing in &mut content.market.listings {
            listing.daily_volatility = Decimal::ZERO;
        }
        edit(&mut content);

        let catalog = content.catalog().unwrap();
        let state =
            WorldState::from_content(&content, &catalog, MarketSettings::default(), 7).unwrap();
        let world = Arc::new(World::new(WorldClock::new(120).unwrap(), catalog, state));
        let dispatcher = Arc::new(Dispatcher::new(dispatch));
        if let Some(loopback) = loopback {
            for seed in &content.players {
                loopback.attach(&dispatcher, seed.id.clone()).await;
            }
        }

        let rules = RulesConfig::default();
        Self {
            engine: ActionEngine::new(world, dispatcher, rules.clone()),
            content,
            rules,
        }
    }

    pub fn player(&self, id: &str) -> PlayerState {
        let locations: BTreeMap<_, _> = self
            .content
            .locations
            .iter()
            .cloned()
            .chain(self.content.home_locations())
            .map(|def| (def.id.clone(), def))
            .collect();
        let seed = self
            .content
            .players
            .iter()
            .find(|seed| seed.id == AgentId::from(id))
            .unwrap();
        PlayerState::new(seed, &self.rules, self.engine.world().catalog(), &locations).unwrap()
    }
}
