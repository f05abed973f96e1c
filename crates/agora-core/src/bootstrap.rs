//! Building the shared world and the players from configuration.

use std::sync::Arc;

use agora_agents::{AgentError, PlayerState};
use agora_world::{ClockError, World, WorldClock, WorldError, WorldState};
use tracing::info;

use crate::config::SimulationConfig;

/// Errors raised while turning configuration into a running game.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The clock ratio is unusable.
    #[error("invalid clock: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The game content is inconsistent.
    #[error("invalid game content: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A player could not be created from its seed.
    #[error("invalid player: {source}")]
    Player {
        /// The underlying player error.
        #[from]
        source: AgentError,
    },

    /// The content defines no players.
    #[error("the game content defines no players")]
    NoPlayers,
}

/// The world and its players, ready to be driven.
#[derive(Debug)]
pub struct Bootstrap {
    /// The shared world.
    pub world: Arc<World>,
    /// One state per player, in content order.
    pub players: Vec<PlayerState>,
}

impl Bootstrap {
    /// Build the world and every player described by `config`.
    ///
    /// The clock starts now and the market is priced for day one.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, BootstrapError> {
        let content = &config.content;
        if content.players.is_empty() {
            return Err(BootstrapError::NoPlayers);
        }

        let catalog = content.catalog()?;
        let state = WorldState::from_content(
            content,
            &catalog,
            config.world.market_settings(),
            config.world.seed,
        )?;
        let clock = WorldClock::new(config.world.time_ratio)?;

        let players = content
            .players
            .iter()
            .map(|seed| PlayerState::new(seed, &config.rules, &catalog, state.locations()))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            players = players.len(),
            locations = state.locations().len(),
            time_ratio = config.world.time_ratio,
            "World built"
        );
        Ok(Self {
            world: Arc::new(World::new(clock, catalog, state)),
            players,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_builds_four_players() {
        let boot = Bootstrap::from_config(&SimulationConfig::default()).unwrap();
        assert_eq!(boot.players.len(), 4);
        let first = &boot.players[0];
        assert_eq!(first.location(), first.home());
        assert_eq!(boot.world.clock().day(), 1);
        assert_eq!(boot.world.lock().await.market().last_refreshed_day(), 1);
    }

    #[tokio::test]
    async fn playerless_content_is_rejected() {
        let mut config = SimulationConfig::default();
        config.content.players.clear();
        assert!(matches!(
            Bootstrap::from_config(&config),
            Err(BootstrapError::NoPlayers)
        ));
    }

    #[tokio::test]
    async fn zero_time_ratio_is_rejected() {
        let mut config = SimulationConfig::default();
        config.world.time_ratio = 0;
        assert!(matches!(
            Bootstrap::from_config(&config),
            Err(BootstrapError::Clock { .. })
        ));
    }
}
