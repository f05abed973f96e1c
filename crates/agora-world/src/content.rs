//! Game content: items, recipes, places, market listings, and players.
//!
//! Content is data, not engine logic. It deserializes from the `content`
//! section of the YAML configuration, and [`GameContent::default`]
//! provides a small riverside town so the simulation runs without any
//! content file.

use std::collections::BTreeMap;

use agora_types::{AgentId, ItemId, LocationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CookRecipe, CookTool, FishingRules, ItemDef, ItemKind};
use crate::error::WorldError;
use crate::location::{LocationDef, LocationKind};

/// Complete game content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameContent {
    /// Item catalog.
    pub items: Vec<ItemDef>,
    /// Cooking recipes keyed by their input.
    pub recipes: Vec<CookRecipe>,
    /// Cooking tools.
    pub tools: Vec<CookTool>,
    /// Fuel token burned by every cooking attempt.
    pub fuel: ItemId,
    /// Fishing rules.
    pub fishing: FishingRules,
    /// Public places and the market. Homes are derived from `players`.
    pub locations: Vec<LocationDef>,
    /// Market placement and opening stock.
    pub market: MarketDef,
    /// Name of the storage container in every home.
    pub home_storage: String,
    /// Capacity of the home storage container.
    pub home_storage_capacity: Option<u32>,
    /// The players taking part.
    pub players: Vec<PlayerSeed>,
}

/// Market placement and opening stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDef {
    /// The location the market stands at.
    pub location: LocationId,
    /// Opening listings.
    pub listings: Vec<ListingDef>,
}

/// Opening stock and pricing for one market item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDef {
    /// The listed item.
    pub item: ItemId,
    /// Opening stock.
    pub quantity: u32,
    /// Long-run average price.
    pub avg_price: Decimal,
    /// Maximum daily swing around the average.
    pub daily_volatility: Decimal,
    /// Stock floor restored on every daily refresh.
    #[serde(default)]
    pub restock_to: Option<u32>,
}

/// Starting data for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeed {
    /// The player's (and its agent's) id.
    pub id: AgentId,
    /// Short character sheet handed to the planner.
    #[serde(default)]
    pub persona: String,
    /// Home location id. Defaults to `<id>_home`.
    #[serde(default)]
    pub home: Option<LocationId>,
    /// Starting money. Defaults to the rules' starting money.
    #[serde(default)]
    pub money: Option<Decimal>,
    /// Starting inventory.
    #[serde(default)]
    pub inventory: BTreeMap<ItemId, u32>,
}

impl PlayerSeed {
    /// The home location id for this player.
    pub fn home_id(&self) -> LocationId {
        self.home
            .clone()
            .unwrap_or_else(|| LocationId::new(format!("{}_home", self.id)))
    }
}

impl GameContent {
    /// Build the read-only [`Catalog`] from this content.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidContent`] on dangling item references.
    pub fn catalog(&self) -> Result<Catalog, WorldError> {
        Catalog::new(
            self.items.clone(),
            self.recipes.clone(),
            self.tools.clone(),
            self.fuel.clone(),
            self.fishing.clone(),
        )
    }

    /// The location definition of every home, derived from the players.
    pub fn home_locations(&self) -> Vec<LocationDef> {
        self.players
            .iter()
            .map(|seed| LocationDef {
                id: seed.home_id(),
                description: format!(
                    "Home of {}. Only {} may enter. It has a bed, a pot, and a {}.",
                    seed.id, seed.id, self.home_storage
                ),
                nav_point: None,
                kind: LocationKind::Home {
                    owner: seed.id.clone(),
                },
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Built-in content
// ---------------------------------------------------------------------------

fn consumable(id: &str, description: &str, effect: &[(&str, f64)]) -> ItemDef {
    ItemDef {
        id: ItemId::from(id),
        description: description.to_owned(),
        unit_capacity: 1,
        kind: ItemKind::Consumable {
            effect: effect
                .iter()
                .map(|(attr, delta)| ((*attr).to_owned(), *delta))
                .collect(),
        },
    }
}

fn material(id: &str, description: &str, unit_capacity: u32) -> ItemDef {
    ItemDef {
        id: ItemId::from(id),
        description: description.to_owned(),
        unit_capacity,
        kind: ItemKind::Material,
    }
}

fn listing(item: &str, quantity: u32, avg_cents: i64, vol_cents: i64, restock: Option<u32>) -> ListingDef {
    ListingDef {
        item: ItemId::from(item),
        quantity,
        avg_price: Decimal::new(avg_cents, 2),
        daily_volatility: Decimal::new(vol_cents, 2),
        restock_to: restock,
    }
}

fn place(id: &str, description: &str, nav_point: Option<&str>, kind: LocationKind) -> LocationDef {
    LocationDef {
        id: LocationId::from(id),
        description: description.to_owned(),
        nav_point: nav_point.map(str::to_owned),
        kind,
    }
}

fn player(id: &str, persona: &str) -> PlayerSeed {
    PlayerSeed {
        id: AgentId::from(id),
        persona: persona.to_owned(),
        home: None,
        money: None,
        inventory: BTreeMap::new(),
    }
}

impl Default for GameContent {
    fn default() -> Self {
        let items = vec![
            material("fish", "A fresh river fish. Cook it before eating.", 1),
            consumable("grilled_fish", "Fish grilled over a flame.", &[("hunger", 30.0)]),
            consumable("bread", "A plain loaf.", &[("hunger", 20.0)]),
            consumable("water", "A bottle of clean water.", &[("thirst", 35.0)]),
            consumable("apple", "Crisp and juicy.", &[("hunger", 8.0), ("thirst", 5.0)]),
            consumable("coffee", "Strong and bitter.", &[("fatigue", 15.0), ("thirst", 5.0)]),
            material("fuel_can", "Burned once per cooking attempt.", 1),
            material("portable_stove", "Lets you cook anywhere.", 3),
            material("fishing_rod", "Needed to fish at the river.", 3),
            material("bait", "One piece is used per fishing attempt.", 1),
            material("paper", "Plain sheets. Painters turn them into art.", 1),
            ItemDef {
                id: ItemId::from("backpack"),
                description: "Equip to carry 30 more units.".to_owned(),
                unit_capacity: 2,
                kind: ItemKind::Equipment { capacity_bonus: 30 },
            },
        ];

        let market_listings = vec![
            listing("bread", 20, 800, 150, Some(10)),
            listing("water", 30, 300, 50, Some(15)),
            listing("apple", 20, 400, 100, None),
            listing("coffee", 10, 600, 100, None),
            listing("fish", 5, 1000, 250, None),
            listing("grilled_fish", 5, 1800, 300, None),
            listing("fuel_can", 10, 500, 100, Some(5)),
            listing("portable_stove", 2, 6000, 800, None),
            listing("fishing_rod", 3, 4000, 600, None),
            listing("bait", 30, 150, 30, Some(20)),
            listing("backpack", 2, 8000, 1000, None),
            listing("paper", 40, 100, 20, None),
        ];

        Self {
            items,
            recipes: vec![CookRecipe {
                input: ItemId::from("fish"),
                output: ItemId::from("grilled_fish"),
                cook_minutes: 20.0,
            }],
            tools: vec![
                CookTool {
                    id: ItemId::from("pot"),
                    location: Some(LocationId::from("home")),
                },
                CookTool {
                    id: ItemId::from("portable_stove"),
                    location: None,
                },
            ],
            fuel: ItemId::from("fuel_can"),
            fishing: FishingRules {
                rod: ItemId::from("fishing_rod"),
                bait: ItemId::from("bait"),
                catch: ItemId::from("fish"),
                catch_chance: 0.6,
                location: Some(LocationId::from("river")),
            },
            locations: vec![
                place(
                    "market",
                    "The town market. Buy and sell goods at the cashier.",
                    Some("cashier"),
                    LocationKind::Market,
                ),
                place(
                    "river",
                    "A long river. With a rod and bait you can fish here (60% chance per attempt).",
                    Some("fishing_spot"),
                    LocationKind::Public,
                ),
                place(
                    "forest",
                    "A dense forest. Quiet, but nothing to gather yet.",
                    None,
                    LocationKind::Public,
                ),
            ],
            market: MarketDef {
                location: LocationId::from("market"),
                listings: market_listings,
            },
            home_storage: "locker".to_owned(),
            home_storage_capacity: Some(100),
            players: vec![
                player("agent-1", "Barabasi, 21, a painter. Eight sheets of paper make one painting."),
                player("agent-2", "Davis, 57, a crafty trader who enjoys getting in others' way."),
                player("agent-3", "Rosenberg, 32, a wealthy investor confident in turning a quick profit."),
                player("agent-4", "Klein, 28, an expert angler."),
            ],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn homes_default_to_player_suffix() {
        let content = GameContent::default();
        let homes = content.home_locations();
        assert_eq!(homes.len(), 4);
        assert_eq!(homes[0].id, LocationId::from("agent-1_home"));
    }

    #[test]
    fn empty_yaml_yields_default_content() {
        let content: GameContent = serde_yml::from_str("{}").unwrap();
        assert_eq!(content, GameContent::default());
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = r"
players:
  - id: solo
    money: 50
    inventory:
      bait: 3
";
        let content: GameContent = serde_yml::from_str(yaml).unwrap();
        assert_eq!(content.players.len(), 1);
        assert_eq!(content.players[0].money, Some(Decimal::from(50)));
        assert_eq!(content.fuel, ItemId::from("fuel_can"));
    }
}
