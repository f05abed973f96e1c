//! Locations and player homes.

use std::collections::BTreeMap;

use agora_types::{AgentId, LocationId};
use serde::{Deserialize, Serialize};

use crate::container::ResourceContainer;
use crate::error::WorldError;

/// What kind of place a location is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Open to everyone.
    #[default]
    Public,
    /// Where trading happens.
    Market,
    /// A private home. Only its owner may enter.
    Home {
        /// The resident.
        owner: AgentId,
    },
}

/// A place agents can walk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDef {
    /// Location key.
    pub id: LocationId,
    /// Free-text description shown to planners once visited.
    #[serde(default)]
    pub description: String,
    /// Spot inside the location the frontend walks to (e.g. `cashier`).
    #[serde(default)]
    pub nav_point: Option<String>,
    /// Access class.
    #[serde(default, with = "serde_yml::with::singleton_map")]
    pub kind: LocationKind,
}

impl LocationDef {
    /// The command target for walking here.
    pub fn nav_target(&self) -> &str {
        self.nav_point.as_deref().unwrap_or_else(|| self.id.as_str())
    }

    /// Whether `agent` may enter.
    pub fn admits(&self, agent: &AgentId) -> bool {
        match &self.kind {
            LocationKind::Home { owner } => owner == agent,
            LocationKind::Public | LocationKind::Market => true,
        }
    }
}

/// A player's home: its location plus private storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Home {
    owner: AgentId,
    location: LocationId,
    primary: String,
    containers: BTreeMap<String, ResourceContainer>,
}

impl Home {
    /// Create a home with a single storage container.
    pub fn new(
        owner: AgentId,
        location: LocationId,
        container: &str,
        capacity: Option<u32>,
    ) -> Self {
        let mut containers = BTreeMap::new();
        containers.insert(
            container.to_owned(),
            ResourceContainer::new(container, capacity),
        );
        Self {
            owner,
            location,
            primary: container.to_owned(),
            containers,
        }
    }

    /// The resident.
    pub const fn owner(&self) -> &AgentId {
        &self.owner
    }

    /// The home's location id.
    pub const fn location(&self) -> &LocationId {
        &self.location
    }

    /// Name of the container used when an action names none.
    pub fn primary_container(&self) -> &str {
        &self.primary
    }

    /// All storage containers by name.
    pub const fn containers(&self) -> &BTreeMap<String, ResourceContainer> {
        &self.containers
    }

    /// Look up a storage container.
    pub fn container(&self, name: &str) -> Result<&ResourceContainer, WorldError> {
        self.containers
            .get(name)
            .ok_or_else(|| WorldError::UnknownContainer {
                container: name.to_owned(),
            })
    }

    /// Look up a storage container for mutation.
    pub fn container_mut(&mut self, name: &str) -> Result<&mut ResourceContainer, WorldError> {
        self.containers
            .get_mut(name)
            .ok_or_else(|| WorldError::UnknownContainer {
                container: name.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn location_kinds_parse_from_plain_yaml_maps() {
        let yaml = r"
- id: market
  kind: market
- id: agent-1_home
  kind:
    home:
      owner: agent-1
- id: park
";
        let places: Vec<LocationDef> = serde_yml::from_str(yaml).unwrap();
        assert_eq!(places[0].kind, LocationKind::Market);
        assert!(places[1].admits(&AgentId::from("agent-1")));
        assert!(!places[1].admits(&AgentId::from("agent-2")));
        assert_eq!(places[2].kind, LocationKind::Public);
    }

    #[test]
    fn homes_admit_only_their_owner() {
        let home = LocationDef {
            id: LocationId::from("agent-1_home"),
            description: String::new(),
            nav_point: None,
            kind: LocationKind::Home {
                owner: AgentId::from("agent-1"),
            },
        };
        assert!(home.admits(&AgentId::from("agent-1")));
        assert!(!home.admits(&AgentId::from("agent-2")));
        assert_eq!(home.nav_target(), "agent-1_home");
    }

    #[test]
    fn unknown_container_is_an_error() {
        let mut home = Home::new(
            AgentId::from("agent-1"),
            LocationId::from("agent-1_home"),
            "locker",
            Some(100),
        );
        assert!(home.container("locker").is_ok());
        assert!(matches!(
            home.container_mut("fridge"),
            Err(WorldError::UnknownContainer { .. })
        ));
    }
}
