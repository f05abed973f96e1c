//! Action proposals submitted by planners to the action engine.
//!
//! Planners emit JSON objects discriminated by a `type` field, for
//! example `{"type": "trade", "mode": "buy", "item": "fish", "qty": 2}`.
//! [`Action`] is the closed set of variants the engine knows how to
//! execute. Any other tag deserializes to [`Action::Unknown`] so the
//! engine can reject it explicitly instead of failing the whole batch.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, ItemId, LocationId};

// ---------------------------------------------------------------------------
// Action payloads
// ---------------------------------------------------------------------------

/// Direction of a market trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeMode {
    /// Take stock from the market in exchange for money.
    Buy,
    /// Hand inventory to the market for half its current price.
    Sell,
}

/// A tagged request from a planner to change player or world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Walk to another location.
    Move {
        /// Destination location id or a symbolic alias such as `home`.
        target: LocationId,
    },
    /// Eat, drink, or equip an item from the inventory.
    Consume {
        /// The item to use.
        item: ItemId,
        /// How many units to use.
        #[serde(default = "default_qty")]
        qty: u32,
    },
    /// Turn a raw ingredient into its cooked counterpart.
    Cook {
        /// The ingredient to cook.
        input: ItemId,
        /// The cooking tool. Falls back to the first tool the player can use.
        #[serde(default)]
        tool: Option<ItemId>,
    },
    /// Buy from or sell to the market.
    Trade {
        /// Whether the player buys or sells.
        mode: TradeMode,
        /// The traded item.
        item: ItemId,
        /// Number of units traded.
        #[serde(default = "default_qty")]
        qty: u32,
    },
    /// Move items from the inventory into a home container.
    Store {
        /// The item to store.
        item: ItemId,
        /// Number of units to move.
        #[serde(default = "default_qty")]
        qty: u32,
        /// Name of the home container. Defaults to the home locker.
        #[serde(default)]
        container: Option<String>,
    },
    /// Move items from a home container back into the inventory.
    Retrieve {
        /// The item to retrieve.
        item: ItemId,
        /// Number of units to move.
        #[serde(default = "default_qty")]
        qty: u32,
        /// Name of the home container. Defaults to the home locker.
        #[serde(default)]
        container: Option<String>,
    },
    /// Idle in place for a number of real seconds.
    Wait {
        /// Real-time seconds to wait.
        seconds: f64,
    },
    /// Sleep for a number of simulated minutes, recovering fatigue.
    Sleep {
        /// Simulated minutes to sleep.
        minutes: f64,
    },
    /// Fish at the river with a rod and bait.
    Fishing {
        /// Simulated minutes spent fishing.
        #[serde(default = "default_fishing_minutes")]
        minutes: f64,
    },
    /// Send a short message to another player.
    Talk {
        /// The recipient.
        to: AgentId,
        /// The message body.
        content: String,
    },
    /// Any tag the engine does not recognize.
    #[serde(other)]
    Unknown,
}

const fn default_qty() -> u32 {
    1
}

const fn default_fishing_minutes() -> f64 {
    10.0
}

impl Action {
    /// Return the discriminant of this action.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Move { .. } => ActionKind::Move,
            Self::Consume { .. } => ActionKind::Consume,
            Self::Cook { .. } => ActionKind::Cook,
            Self::Trade { .. } => ActionKind::Trade,
            Self::Store { .. } => ActionKind::Store,
            Self::Retrieve { .. } => ActionKind::Retrieve,
            Self::Wait { .. } => ActionKind::Wait,
            Self::Sleep { .. } => ActionKind::Sleep,
            Self::Fishing { .. } => ActionKind::Fishing,
            Self::Talk { .. } => ActionKind::Talk,
            Self::Unknown => ActionKind::Unknown,
        }
    }
}

/// Discriminant of an [`Action`], echoed back in every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// See [`Action::Move`].
    Move,
    /// See [`Action::Consume`].
    Consume,
    /// See [`Action::Cook`].
    Cook,
    /// See [`Action::Trade`].
    Trade,
    /// See [`Action::Store`].
    Store,
    /// See [`Action::Retrieve`].
    Retrieve,
    /// See [`Action::Wait`].
    Wait,
    /// See [`Action::Sleep`].
    Sleep,
    /// See [`Action::Fishing`].
    Fishing,
    /// See [`Action::Talk`].
    Talk,
    /// See [`Action::Unknown`].
    Unknown,
}

impl ActionKind {
    /// The wire tag of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Consume => "consume",
            Self::Cook => "cook",
            Self::Trade => "trade",
            Self::Store => "store",
            Self::Retrieve => "retrieve",
            Self::Wait => "wait",
            Self::Sleep => "sleep",
            Self::Fishing => "fishing",
            Self::Talk => "talk",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trade_parses_with_defaults() {
        let action: Action =
            serde_json::from_str(r#"{"type":"trade","mode":"buy","item":"fish"}"#).unwrap();
        assert_eq!(
            action,
            Action::Trade {
                mode: TradeMode::Buy,
                item: ItemId::from("fish"),
                qty: 1,
            }
        );
    }

    #[test]
    fn fishing_defaults_to_ten_minutes() {
        let action: Action = serde_json::from_str(r#"{"type":"fishing"}"#).unwrap();
        assert_eq!(action, Action::Fishing { minutes: 10.0 });
    }

    #[test]
    fn unrecognized_tag_becomes_unknown() {
        let action: Action = serde_json::from_str(r#"{"type":"hunt","target":"deer"}"#).unwrap();
        assert_eq!(action.kind(), ActionKind::Unknown);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let parsed = serde_json::from_str::<Action>(r#"{"type":"move"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn store_container_is_optional() {
        let action: Action =
            serde_json::from_str(r#"{"type":"store","item":"fish","qty":2}"#).unwrap();
        assert_eq!(
            action,
            Action::Store {
                item: ItemId::from("fish"),
                qty: 2,
                container: None,
            }
        );
    }
}
