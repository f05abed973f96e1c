//! Survival attributes and their decay over simulated time.
//!
//! Every attribute is a reserve that drains at a fixed hourly rate and is
//! refilled by consumables or sleep. Refills are capped at the attribute's
//! maximum; drains are not floored, and any attribute below zero means the
//! player is dead.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::AttributeRule;
use crate::error::AgentError;

/// One survival attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    current: f64,
    max: f64,
    decay_per_hour: f64,
}

impl Attribute {
    /// Create an attribute from its rule, clamping the start to the maximum.
    pub const fn from_rule(rule: &AttributeRule) -> Self {
        Self {
            current: rule.start.min(rule.max),
            max: rule.max,
            decay_per_hour: rule.decay_per_hour,
        }
    }

    /// Current value.
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// Upper bound.
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Points lost per simulated hour.
    pub const fn decay_per_hour(&self) -> f64 {
        self.decay_per_hour
    }

    /// Whether the reserve is exhausted.
    pub fn is_depleted(&self) -> bool {
        self.current < 0.0
    }

    /// Drain for `hours` of simulated time.
    fn decay(&mut self, hours: f64) {
        self.current -= self.decay_per_hour * hours;
    }

    /// Shift by `delta`, capped at the maximum. Returns the applied change.
    fn shift(&mut self, delta: f64) -> f64 {
        let before = self.current;
        self.current = (self.current + delta).min(self.max);
        self.current - before
    }
}

/// The full set of a player's survival attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeSet {
    attributes: BTreeMap<String, Attribute>,
}

impl AttributeSet {
    /// Build from configured rules.
    pub fn from_rules(rules: &BTreeMap<String, AttributeRule>) -> Self {
        let attributes = rules
            .iter()
            .map(|(name, rule)| (name.clone(), Attribute::from_rule(rule)))
            .collect();
        Self { attributes }
    }

    /// Look up one attribute.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Current value of one attribute.
    pub fn current(&self, name: &str) -> Option<f64> {
        self.get(name).map(Attribute::current)
    }

    /// All attributes by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes
            .iter()
            .map(|(name, attribute)| (name.as_str(), attribute))
    }

    /// Current values by name.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.attributes
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.current))
            .collect()
    }

    /// Drain every attribute for a span of simulated time.
    pub fn decay(&mut self, simulated: Duration) {
        let hours = simulated.as_secs_f64() / 3600.0;
        for attribute in self.attributes.values_mut() {
            attribute.decay(hours);
        }
    }

    /// Shift one attribute by `delta`, capped at its maximum.
    ///
    /// Returns the change actually applied.
    pub fn shift(&mut self, name: &str, delta: f64) -> Result<f64, AgentError> {
        self.attributes
            .get_mut(name)
            .map(|attribute| attribute.shift(delta))
            .ok_or_else(|| AgentError::UnknownAttribute {
                name: name.to_owned(),
            })
    }

    /// Fail if `deltas` names an attribute this set does not track.
    pub fn check(&self, deltas: &BTreeMap<String, f64>) -> Result<(), AgentError> {
        match deltas.keys().find(|name| !self.attributes.contains_key(*name)) {
            Some(name) => Err(AgentError::UnknownAttribute { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// Apply several shifts at once. Either all apply or none do.
    ///
    /// Returns the change actually applied to each attribute.
    pub fn apply(
        &mut self,
        deltas: &BTreeMap<String, f64>,
    ) -> Result<BTreeMap<String, f64>, AgentError> {
        self.check(deltas)?;
        let mut applied = BTreeMap::new();
        for (name, delta) in deltas {
            applied.insert(name.clone(), self.shift(name, *delta)?);
        }
        Ok(applied)
    }

    /// The first exhausted attribute, if any.
    pub fn depleted(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(_, attribute)| attribute.is_depleted())
            .map(|(name, _)| name.as_str())
    }
}
