//! Outcome records returned by the action engine.
//!
//! An [`ActionResult`] serializes as the flat record
//! `{action, OK, MSG, code, [qty|cost|effect|price], [event]}` that
//! planners read back on the next turn.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;

/// Machine-readable outcome of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    /// The action committed.
    Ok,
    /// The action tag is not recognized.
    Unknown,
    /// Parameters are malformed or the action makes no sense here.
    Invalid,
    /// A referenced item, location, container, or player does not exist.
    NotFound,
    /// The player is not allowed to do this (e.g. entering another home).
    Forbidden,
    /// The source holds fewer units than requested.
    Insufficient,
    /// The destination cannot hold the requested units.
    NoCapacity,
    /// The player cannot afford the purchase.
    NoFunds,
    /// The market does not hold enough stock.
    OutOfStock,
    /// The external confirmation did not arrive in time.
    Timeout,
    /// The external endpoint refused or was unreachable.
    Rejected,
    /// A survival attribute dropped below zero. Terminal for the player.
    Dead,
    /// The handler faulted unexpectedly.
    Crash,
    /// The planner produced nothing executable.
    NoAction,
}

impl ResultCode {
    /// Whether a failure with this code should force a fresh plan.
    pub const fn is_blocking(self) -> bool {
        matches!(
            self,
            Self::Forbidden | Self::Invalid | Self::NotFound | Self::NoAction
        )
    }

    /// Whether this code ends the player's loop.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Dead)
    }
}

/// Optional numeric payload attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultDelta {
    /// Units moved, produced, or consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<u32>,
    /// Simulated seconds the action took.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Attribute changes applied by the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<BTreeMap<String, f64>>,
    /// Money paid (buy) or received (sell).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// The outcome record of executing one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Which action produced this result.
    pub action: ActionKind,
    /// Whether the action committed.
    #[serde(rename = "OK")]
    pub ok: bool,
    /// Machine-readable outcome.
    pub code: ResultCode,
    /// Human-readable explanation.
    #[serde(rename = "MSG")]
    pub message: String,
    /// Optional numeric payload.
    #[serde(flatten)]
    pub delta: ResultDelta,
    /// Memory line recorded for the player, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl ActionResult {
    /// A committed result.
    pub fn success(action: ActionKind, message: impl Into<String>) -> Self {
        Self {
            action,
            ok: true,
            code: ResultCode::Ok,
            message: message.into(),
            delta: ResultDelta::default(),
            event: None,
        }
    }

    /// A rejected or failed result.
    pub fn failure(action: ActionKind, code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            action,
            ok: false,
            code,
            message: message.into(),
            delta: ResultDelta::default(),
            event: None,
        }
    }

    /// Attach a unit count.
    #[must_use]
    pub const fn with_qty(mut self, qty: u32) -> Self {
        self.delta.qty = Some(qty);
        self
    }

    /// Attach a simulated time cost in seconds.
    #[must_use]
    pub const fn with_cost(mut self, seconds: f64) -> Self {
        self.delta.cost = Some(seconds);
        self
    }

    /// Attach the attribute changes that were applied.
    #[must_use]
    pub fn with_effect(mut self, effect: BTreeMap<String, f64>) -> Self {
        self.delta.effect = Some(effect);
        self
    }

    /// Attach a money amount.
    #[must_use]
    pub const fn with_price(mut self, price: Decimal) -> Self {
        self.delta.price = Some(price);
        self
    }

    /// Attach the memory line recorded for this result.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Whether this result reports the player's death.
    pub const fn is_dead(&self) -> bool {
        self.code.is_terminal()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_flat_record() {
        let result = ActionResult::success(ActionKind::Trade, "bought 2 fish")
            .with_qty(2)
            .with_price(Decimal::new(1000, 2));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["action"], "trade");
        assert_eq!(value["OK"], true);
        assert_eq!(value["MSG"], "bought 2 fish");
        assert_eq!(value["code"], "OK");
        assert_eq!(value["qty"], 2);
        assert!(value.get("cost").is_none());
        assert!(value.get("event").is_none());
    }

    #[test]
    fn blocking_codes_force_replanning() {
        assert!(ResultCode::Forbidden.is_blocking());
        assert!(ResultCode::NoAction.is_blocking());
        assert!(!ResultCode::Timeout.is_blocking());
        assert!(!ResultCode::Ok.is_blocking());
    }

    #[test]
    fn only_death_is_terminal() {
        let dead = ActionResult::failure(ActionKind::Move, ResultCode::Dead, "collapsed");
        assert!(dead.is_dead());
        assert!(!ResultCode::Crash.is_terminal());
    }
}
