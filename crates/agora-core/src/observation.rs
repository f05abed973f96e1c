//! The snapshot a planner decides from.
//!
//! An [`Observation`] is plain serializable data: the planner never sees
//! live state. Locations the player has not entered are described only as
//! an unknown area.

use std::collections::BTreeMap;

use agora_agents::{AccessState, PlayerState};
use agora_types::{ActionResult, AgentId, ItemId, LocationId};
use agora_world::World;
use rust_decimal::Decimal;
use serde::Serialize;

/// How many memories an observation carries.
pub const OBSERVED_MEMORIES: usize = 20;

const UNKNOWN_AREA: &str = "unknown area";

/// One attribute as the planner sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeView {
    /// Current value; below zero is death.
    pub current: f64,
    /// Upper bound.
    pub max: f64,
}

/// One location as the planner sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationView {
    /// Location id to use in `move`.
    pub id: LocationId,
    /// What the player knows about it.
    pub access: AccessState,
    /// Description, or "unknown area" if never visited.
    pub description: String,
}

/// One market listing as the planner sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceView {
    /// The item.
    pub item: ItemId,
    /// Unit buy price today.
    pub price: Decimal,
    /// Units in stock.
    pub stock: u32,
}

/// Everything a planner is told about one player.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    /// Who is deciding.
    pub agent_id: AgentId,
    /// Free-text persona.
    pub persona: String,
    /// Formatted simulated time.
    pub time: String,
    /// Simulated day, starting at 1.
    pub day: u32,
    /// Current money.
    pub money: Decimal,
    /// Current location.
    pub location: LocationId,
    /// The player's home.
    pub home: LocationId,
    /// Survival attributes.
    pub attributes: BTreeMap<String, AttributeView>,
    /// Carried items.
    pub inventory: BTreeMap<ItemId, u32>,
    /// Free inventory capacity, if bounded.
    pub inventory_free: Option<u32>,
    /// Known locations.
    pub locations: Vec<LocationView>,
    /// Most recent memories, oldest first.
    pub memory: Vec<String>,
    /// Market prices and stock.
    pub market: Vec<PriceView>,
    /// The outcome of the previous action.
    pub last_result: Option<ActionResult>,
    /// The current plan.
    pub plan: Option<String>,
    /// The rolling reflection summary.
    pub summary: Option<String>,
}

/// Planner-facing context the loop carries between calls.
#[derive(Debug, Clone, Default)]
pub struct Deliberation {
    /// The current plan.
    pub plan: Option<String>,
    /// The rolling reflection summary.
    pub summary: Option<String>,
    /// The outcome of the previous action.
    pub last_result: Option<ActionResult>,
}

impl Observation {
    /// Capture a snapshot of `player` in `world`.
    pub async fn capture(world: &World, player: &PlayerState, deliberation: &Deliberation) -> Self {
        let clock = world.clock();
        let catalog = world.catalog();
        let state = world.lock().await;

        let locations = player
            .known_locations()
            .iter()
            .map(|(id, access)| {
                let description = match access {
                    AccessState::Unvisited => UNKNOWN_AREA.to_owned(),
                    AccessState::Visited | AccessState::Forbidden => state
                        .location(id.as_str())
                        .map_or_else(|| UNKNOWN_AREA.to_owned(), |def| def.description.clone()),
                };
                LocationView {
                    id: id.clone(),
                    access: *access,
                    description,
                }
            })
            .collect();

        let market = state
            .market()
            .listings()
            .iter()
            .map(|(item, listing)| PriceView {
                item: item.clone(),
                price: listing.cur_price,
                stock: listing.quantity,
            })
            .collect();
        drop(state);

        let attributes = player
            .attributes()
            .iter()
            .map(|(name, attribute)| {
                (
                    name.to_owned(),
                    AttributeView {
                        current: attribute.current(),
                        max: attribute.max(),
                    },
                )
            })
            .collect();

        Self {
            agent_id: player.id().clone(),
            persona: player.persona().to_owned(),
            time: clock.format_now(),
            day: clock.day(),
            money: player.money(),
            location: player.location().clone(),
            home: player.home().clone(),
            attributes,
            inventory: player.inventory().items().clone(),
            inventory_free: player.inventory().free(catalog).ok().flatten(),
            locations,
            memory: player.recent_memory(OBSERVED_MEMORIES),
            market,
            last_result: deliberation.last_result.clone(),
            plan: deliberation.plan.clone(),
            summary: deliberation.summary.clone(),
        }
    }
}
