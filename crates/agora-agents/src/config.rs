//! Game rules and their defaults.
//!
//! [`RulesConfig`] bundles every tunable that governs player survival and
//! action costs. The engine binary reads it from the `rules` section of
//! `agora-config.yaml`; tests construct it with [`Default`] and override
//! individual fields.

use std::collections::BTreeMap;

use agora_types::ActionKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name of the attribute drained by every action and restored by sleep.
pub const FATIGUE: &str = "fatigue";

/// Starting value, ceiling, and hourly decay of one survival attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeRule {
    /// Value at the start of the game.
    pub start: f64,
    /// Upper bound; restorations are capped here.
    pub max: f64,
    /// Points lost per simulated hour.
    pub decay_per_hour: f64,
}

impl AttributeRule {
    /// A rule starting full at `max`.
    pub const fn full(max: f64, decay_per_hour: f64) -> Self {
        Self {
            start: max,
            max,
            decay_per_hour,
        }
    }
}

/// Tunable game rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Money each player starts with unless the seed overrides it (default: 1000).
    pub starting_money: Decimal,

    /// Capacity units of a fresh inventory; `None` is unbounded (default: 100).
    pub inventory_capacity: Option<u32>,

    /// Maximum retained memory entries per player (default: 50).
    pub memory_limit: usize,

    /// Survival attributes keyed by name.
    ///
    /// Defaults: hunger decays 2/h, thirst 4/h, fatigue 3/h, all from 100.
    pub attributes: BTreeMap<String, AttributeRule>,

    /// Fatigue recovered per simulated hour of sleep (default: 20).
    pub sleep_recovery_per_hour: f64,

    /// Fixed fatigue spent by each successful action, on top of decay.
    pub action_fatigue_cost: BTreeMap<ActionKind, f64>,

    /// Location alias resolved to the acting player's own home (default: `home`).
    pub home_alias: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let attributes = [
            ("hunger", AttributeRule::full(100.0, 2.0)),
            ("thirst", AttributeRule::full(100.0, 4.0)),
            (FATIGUE, AttributeRule::full(100.0, 3.0)),
        ]
        .into_iter()
        .map(|(name, rule)| (name.to_owned(), rule))
        .collect();

        let action_fatigue_cost = ALL_KINDS
            .iter()
            .map(|kind| (*kind, default_fatigue_cost(*kind)))
            .collect();

        Self {
            starting_money: Decimal::from(1000),
            inventory_capacity: Some(100),
            memory_limit: 50,
            attributes,
            sleep_recovery_per_hour: 20.0,
            action_fatigue_cost,
            home_alias: String::from("home"),
        }
    }
}

impl RulesConfig {
    /// Fixed fatigue cost of a successful action of this kind.
    ///
    /// Kinds missing from the configured table fall back to the built-in
    /// default, so a partial `action_fatigue_cost` map in YAML only
    /// overrides the entries it names.
    pub fn fatigue_cost(&self, kind: ActionKind) -> f64 {
        self.action_fatigue_cost
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_fatigue_cost(kind))
    }
}

const ALL_KINDS: [ActionKind; 10] = [
    ActionKind::Move,
    ActionKind::Consume,
    ActionKind::Cook,
    ActionKind::Trade,
    ActionKind::Store,
    ActionKind::Retrieve,
    ActionKind::Wait,
    ActionKind::Sleep,
    ActionKind::Fishing,
    ActionKind::Talk,
];

/// Built-in fatigue cost per action kind.
#[allow(clippy::match_same_arms)] // One arm per kind keeps the table readable.
pub const fn default_fatigue_cost(kind: ActionKind) -> f64 {
    match kind {
        ActionKind::Move => 1.0,
        ActionKind::Consume => 0.0,
        ActionKind::Cook => 2.0,
        ActionKind::Trade => 1.0,
        ActionKind::Store => 0.5,
        ActionKind::Retrieve => 0.5,
        ActionKind::Wait => 0.0,
        ActionKind::Sleep => 0.0,
        ActionKind::Fishing => 3.0,
        ActionKind::Talk => 0.5,
        ActionKind::Unknown => 0.0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_rules() {
        let rules = RulesConfig::default();
        assert_eq!(rules.starting_money, Decimal::from(1000));
        assert_eq!(rules.inventory_capacity, Some(100));
        assert_eq!(rules.attributes.len(), 3);
        let thirst = rules.attributes.get("thirst").unwrap();
        assert!((thirst.decay_per_hour - 4.0).abs() < f64::EPSILON);
        assert!((thirst.start - 100.0).abs() < f64::EPSILON);
        assert!((rules.fatigue_cost(ActionKind::Fishing) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let yaml = "starting_money: 250\naction_fatigue_cost:\n  move: 4.0\n";
        let rules: RulesConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(rules.starting_money, Decimal::from(250));
        assert_eq!(rules.memory_limit, 50);
        assert!((rules.fatigue_cost(ActionKind::Move) - 4.0).abs() < f64::EPSILON);
        // Not named in the override map, so the built-in value applies.
        assert!((rules.fatigue_cost(ActionKind::Cook) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_actions_are_free() {
        assert!(default_fatigue_cost(ActionKind::Unknown).abs() < f64::EPSILON);
    }
}
