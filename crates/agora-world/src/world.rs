//! Shared world state and the lock that guards it.
//!
//! [`WorldState`] holds everything several agent loops touch: locations,
//! the market, home storage, mailboxes, and the seeded random source.
//! [`World`] pairs that state with a single [`tokio::sync::Mutex`] and the
//! read-only clock and catalog. Every mutation of shared state goes
//! through [`World::lock`], which makes trades and the daily market
//! refresh atomic with respect to every other agent.

use std::collections::BTreeMap;

use agora_types::{AgentId, LocationId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::catalog::Catalog;
use crate::clock::WorldClock;
use crate::container::ResourceContainer;
use crate::content::GameContent;
use crate::error::WorldError;
use crate::location::{Home, LocationDef};
use crate::market::{Listing, Market, MarketSettings};

/// A message waiting in a player's mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    /// The sender.
    pub from: AgentId,
    /// The message body.
    pub content: String,
    /// Formatted simulated time the message was sent.
    pub sent_at: String,
}

/// Cross-agent mutable state. Only reachable through [`World::lock`].
#[derive(Debug)]
pub struct WorldState {
    locations: BTreeMap<LocationId, LocationDef>,
    market: Market,
    homes: BTreeMap<AgentId, Home>,
    mailboxes: BTreeMap<AgentId, Vec<Mail>>,
    rng: StdRng,
}

impl WorldState {
    /// Build the opening world from content and run the day-1 price refresh.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidContent`] if the market location or a
    /// listed item does not exist, or two locations share an id.
    pub fn from_content(
        content: &GameContent,
        catalog: &Catalog,
        settings: MarketSettings,
        seed: u64,
    ) -> Result<Self, WorldError> {
        let mut locations = BTreeMap::new();
        for def in content.locations.iter().cloned().chain(content.home_locations()) {
            let id = def.id.clone();
            if locations.insert(id.clone(), def).is_some() {
                return Err(WorldError::InvalidContent {
                    reason: format!("location `{id}` is defined twice"),
                });
            }
        }

        if !locations.contains_key(&content.market.location) {
            return Err(WorldError::InvalidContent {
                reason: format!("market location `{}` does not exist", content.market.location),
            });
        }

        let mut listings = BTreeMap::new();
        for def in &content.market.listings {
            catalog.item(def.item.as_str())?;
            listings.insert(
                def.item.clone(),
                Listing {
                    quantity: def.quantity,
                    avg_price: def.avg_price,
                    cur_price: def.avg_price,
                    daily_volatility: def.daily_volatility,
                    restock_to: def.restock_to,
                },
            );
        }

        let homes = content
            .players
            .iter()
            .map(|seed| {
                let home = Home::new(
                    seed.id.clone(),
                    seed.home_id(),
                    &content.home_storage,
                    content.home_storage_capacity,
                );
                (seed.id.clone(), home)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let mut market = Market::new(content.market.location.clone(), listings, settings);
        market.refresh(1, &mut rng);

        Ok(Self {
            locations,
            market,
            homes,
            mailboxes: BTreeMap::new(),
            rng,
        })
    }

    /// Look up a location.
    pub fn location(&self, id: &str) -> Option<&LocationDef> {
        self.locations.get(id)
    }

    /// Look up a location, failing if it is unknown.
    pub fn require_location(&self, id: &str) -> Result<&LocationDef, WorldError> {
        self.location(id).ok_or_else(|| WorldError::UnknownLocation {
            location: LocationId::from(id),
        })
    }

    /// All locations in key order.
    pub const fn locations(&self) -> &BTreeMap<LocationId, LocationDef> {
        &self.locations
    }

    /// The market.
    pub const fn market(&self) -> &Market {
        &self.market
    }

    /// The market, for trades.
    pub const fn market_mut(&mut self) -> &mut Market {
        &mut self.market
    }

    /// Whether `agent` is a registered player.
    pub fn has_player(&self, agent: &AgentId) -> bool {
        self.homes.contains_key(agent)
    }

    /// A player's home.
    pub fn home(&self, agent: &AgentId) -> Result<&Home, WorldError> {
        self.homes
            .get(agent)
            .ok_or_else(|| WorldError::UnknownHome {
                agent: agent.clone(),
            })
    }

    /// A named storage container in a player's home.
    pub fn storage_mut(
        &mut self,
        agent: &AgentId,
        container: &str,
    ) -> Result<&mut ResourceContainer, WorldError> {
        self.homes
            .get_mut(agent)
            .ok_or_else(|| WorldError::UnknownHome {
                agent: agent.clone(),
            })?
            .container_mut(container)
    }

    /// Roll a probability check with the world's seeded random source.
    pub fn roll(&mut self, chance: f64) -> bool {
        self.rng.random::<f64>() < chance
    }

    /// Reprice the market for `day`. Returns `false` if already done.
    pub fn refresh_market(&mut self, day: u32) -> bool {
        self.market.refresh(day, &mut self.rng)
    }

    /// Drop a message into a player's mailbox.
    pub fn post(&mut self, to: &AgentId, mail: Mail) -> Result<(), WorldError> {
        if !self.has_player(to) {
            return Err(WorldError::UnknownHome { agent: to.clone() });
        }
        self.mailboxes.entry(to.clone()).or_default().push(mail);
        Ok(())
    }

    /// Empty a player's mailbox.
    pub fn take_mail(&mut self, agent: &AgentId) -> Vec<Mail> {
        self.mailboxes.remove(agent).unwrap_or_default()
    }
}

/// The shared world: read-only clock and catalog plus locked state.
#[derive(Debug)]
pub struct World {
    clock: WorldClock,
    catalog: Catalog,
    state: Mutex<WorldState>,
}

impl World {
    /// Wrap world state in its lock.
    pub fn new(clock: WorldClock, catalog: Catalog, state: WorldState) -> Self {
        Self {
            clock,
            catalog,
            state: Mutex::new(state),
        }
    }

    /// The world clock.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// The item catalog.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Acquire the world-mutation lock.
    pub async fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().await
    }

    /// Refresh the market if the simulated day has advanced.
    ///
    /// Safe to call from every agent loop as often as it likes: the check
    /// and the refresh happen under the lock, so each day is refreshed
    /// exactly once. Returns the day refreshed, if any.
    pub async fn roll_over(&self) -> Option<u32> {
        let day = self.clock.day();
        let mut state = self.lock().await;
        if state.refresh_market(day) {
            info!(day, "Market refreshed for new day");
            Some(day)
        } else {
            None
        }
    }
}
