//! Per-player state owned by a single agent loop.
//!
//! Nothing here is shared: the owning loop mutates its [`PlayerState`]
//! directly, and the action engine only touches shared state under the
//! world lock.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use agora_types::{AgentId, ItemId, LocationId};
use agora_world::{Catalog, LocationDef, LocationKind, PlayerSeed, ResourceContainer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeSet;
use crate::config::{FATIGUE, RulesConfig};
use crate::error::AgentError;

/// What a player knows about a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// Known but never entered.
    Unvisited,
    /// Entered at least once.
    Visited,
    /// Off limits to this player (another player's home).
    Forbidden,
}

/// Whether the player can still act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum Vitality {
    /// Acting normally.
    Alive,
    /// Terminal. No further actions execute.
    Dead {
        /// The attribute that ran out.
        cause: String,
    },
}

/// Everything one player owns and remembers.
#[derive(Debug, Clone)]
pub struct PlayerState {
    id: AgentId,
    persona: String,
    money: Decimal,
    location: LocationId,
    home: LocationId,
    attributes: AttributeSet,
    inventory: ResourceContainer,
    known_locations: BTreeMap<LocationId, AccessState>,
    memory: VecDeque<String>,
    memory_limit: usize,
    vitality: Vitality,
}

impl PlayerState {
    /// Create a player at home from its seed.
    ///
    /// Every location in `locations` becomes known: the player's own home
    /// as visited, other homes as forbidden, everything else unvisited.
    pub fn new(
        seed: &PlayerSeed,
        rules: &RulesConfig,
        catalog: &Catalog,
        locations: &BTreeMap<LocationId, LocationDef>,
    ) -> Result<Self, AgentError> {
        let home = seed.home_id();
        let mut inventory = ResourceContainer::new("inventory", rules.inventory_capacity);
        for (item, qty) in &seed.inventory {
            inventory.add(catalog, item, *qty)?;
        }

        let known_locations = locations
            .values()
            .map(|def| {
                let access = match &def.kind {
                    _ if def.id == home => AccessState::Visited,
                    LocationKind::Home { owner } if *owner != seed.id => AccessState::Forbidden,
                    _ => AccessState::Unvisited,
                };
                (def.id.clone(), access)
            })
            .collect();

        Ok(Self {
            id: seed.id.clone(),
            persona: seed.persona.clone(),
            money: seed.money.unwrap_or(rules.starting_money),
            location: home.clone(),
            home,
            attributes: AttributeSet::from_rules(&rules.attributes),
            inventory,
            known_locations,
            memory: VecDeque::new(),
            memory_limit: rules.memory_limit,
            vitality: Vitality::Alive,
        })
    }

    /// The player's id.
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// Free-text persona handed to the planner.
    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Current money. Never negative.
    pub const fn money(&self) -> Decimal {
        self.money
    }

    /// Pay `amount`. Fails without change if the player cannot afford it.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), AgentError> {
        if amount.is_sign_negative() {
            return Err(AgentError::NegativeAmount { amount });
        }
        if amount > self.money {
            return Err(AgentError::InsufficientFunds {
                required: amount,
                available: self.money,
            });
        }
        self.money = self
            .money
            .checked_sub(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: String::from("debit"),
            })?;
        Ok(())
    }

    /// Receive `amount`.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), AgentError> {
        if amount.is_sign_negative() {
            return Err(AgentError::NegativeAmount { amount });
        }
        self.money = self
            .money
            .checked_add(amount)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: String::from("credit"),
            })?;
        Ok(())
    }

    /// Where the player is.
    pub const fn location(&self) -> &LocationId {
        &self.location
    }

    /// The player's own home location.
    pub const fn home(&self) -> &LocationId {
        &self.home
    }

    /// Relocate and mark the destination visited.
    pub fn move_to(&mut self, location: LocationId) {
        self.known_locations
            .insert(location.clone(), AccessState::Visited);
        self.location = location;
    }

    /// What the player knows about `location`, if anything.
    pub fn access(&self, location: &str) -> Option<AccessState> {
        self.known_locations.get(location).copied()
    }

    /// All known locations.
    pub const fn known_locations(&self) -> &BTreeMap<LocationId, AccessState> {
        &self.known_locations
    }

    /// Survival attributes.
    pub const fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Survival attributes, for consumables and sleep.
    pub const fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    /// Carried items.
    pub const fn inventory(&self) -> &ResourceContainer {
        &self.inventory
    }

    /// Carried items, for mutation.
    pub const fn inventory_mut(&mut self) -> &mut ResourceContainer {
        &mut self.inventory
    }

    /// How many of `item` the player carries.
    pub fn holding(&self, item: &ItemId) -> u32 {
        self.inventory.quantity(item)
    }

    /// Let simulated time pass and move fatigue by `fatigue_change`.
    ///
    /// The change is signed: action costs are negative, sleep recovery is
    /// positive. Decay and the change are both applied before exhaustion
    /// is checked. Returns the exhausted attribute if this killed the
    /// player. A player who is already dead stays dead and nothing decays
    /// further.
    ///
    /// # Errors
    ///
    /// Propagates any attribute failure other than fatigue being
    /// untracked, which simply means there is no reserve to move.
    pub fn pass_time(
        &mut self,
        simulated: Duration,
        fatigue_change: f64,
    ) -> Result<Option<String>, AgentError> {
        if let Vitality::Dead { cause } = &self.vitality {
            return Ok(Some(cause.clone()));
        }
        self.attributes.decay(simulated);
        if fatigue_change.abs() > 0.0 {
            match self.attributes.shift(FATIGUE, fatigue_change) {
                Ok(_) | Err(AgentError::UnknownAttribute { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let Some(cause) = self.attributes.depleted().map(str::to_owned) else {
            return Ok(None);
        };
        self.vitality = Vitality::Dead {
            cause: cause.clone(),
        };
        Ok(Some(cause))
    }

    /// Alive or dead.
    pub const fn vitality(&self) -> &Vitality {
        &self.vitality
    }

    /// Whether the player can no longer act.
    pub const fn is_dead(&self) -> bool {
        matches!(self.vitality, Vitality::Dead { .. })
    }

    /// Append a timestamped memory, evicting the oldest past the limit.
    pub fn remember(&mut self, stamp: &str, text: &str) {
        self.memory.push_back(format!("[{stamp}] {text}"));
        while self.memory.len() > self.memory_limit {
            self.memory.pop_front();
        }
    }

    /// All retained memories, oldest first.
    pub fn memory(&self) -> impl Iterator<Item = &str> {
        self.memory.iter().map(String::as_str)
    }

    /// The `count` most recent memories, oldest first.
    pub fn recent_memory(&self, count: usize) -> Vec<String> {
        let skip = self.memory.len().saturating_sub(count);
        self.memory.iter().skip(skip).cloned().collect()
    }
}
