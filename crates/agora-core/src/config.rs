//! Configuration loading and typed config structures.
//!
//! The configuration lives in `agora-config.yaml`. Every section and
//! field has a default, so an empty file describes a runnable game with
//! the built-in content.

use std::path::Path;
use std::time::Duration;

use agora_agents::RulesConfig;
use agora_dispatch::{DispatchConfig, ServerConfig};
use agora_world::{GameContent, MarketSettings};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::agent_loop::LoopConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {value}")]
    Env {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration, mirroring `agora-config.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationConfig {
    /// Clock, seed, and market pricing.
    #[serde(default)]
    pub world: WorldConfig,

    /// Survival and economy rules.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Agent loop pacing and concurrency.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// The dispatch server and acknowledgment timing.
    #[serde(default)]
    pub dispatch: DispatchSettings,

    /// The HTTP planner bridge.
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Items, locations, market listings, and players.
    #[serde(default)]
    pub content: GameContent,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `AGORA_DISPATCH_HOST` overrides `dispatch.host`
    /// - `AGORA_DISPATCH_PORT` overrides `dispatch.port`
    /// - `AGORA_PLANNER_URL` overrides `planner.base_url`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_without_env(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string only.
    pub fn parse_without_env(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override dispatch and planner endpoints from the environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("AGORA_DISPATCH_HOST") {
            self.dispatch.host = val;
        }
        if let Ok(val) = std::env::var("AGORA_DISPATCH_PORT") {
            self.dispatch.port = val.parse().map_err(|_invalid| ConfigError::Env {
                var: "AGORA_DISPATCH_PORT",
                value: val.clone(),
            })?;
        }
        if let Ok(val) = std::env::var("AGORA_PLANNER_URL") {
            self.planner.base_url = Some(val);
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Simulated seconds per real second.
    #[serde(default = "default_time_ratio")]
    pub time_ratio: u32,

    /// Random seed for market prices and fishing rolls.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fraction of the average price that current prices may stray.
    #[serde(default = "default_price_band")]
    pub price_band: Decimal,

    /// Volatility multiplier applied on the first day.
    #[serde(default = "default_first_day_multiplier")]
    pub first_day_volatility_multiplier: Decimal,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            time_ratio: default_time_ratio(),
            seed: default_seed(),
            price_band: default_price_band(),
            first_day_volatility_multiplier: default_first_day_multiplier(),
        }
    }
}

impl WorldConfig {
    /// Market pricing settings.
    pub const fn market_settings(&self) -> MarketSettings {
        MarketSettings {
            price_band: self.price_band,
            first_day_multiplier: self.first_day_volatility_multiplier,
        }
    }
}

/// Agent loop pacing and concurrency limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentsConfig {
    /// Agents allowed inside a cycle at once.
    #[serde(default = "default_max_concurrent_agents")]
    pub max_concurrent_agents: usize,

    /// Planner calls allowed in flight at once.
    #[serde(default = "default_max_concurrent_planner_calls")]
    pub max_concurrent_planner_calls: usize,

    /// Milliseconds before a planner call is abandoned.
    #[serde(default = "default_planner_timeout_ms")]
    pub planner_timeout_ms: u64,

    /// Failed actions tolerated per cycle before the cycle ends.
    #[serde(default = "default_max_action_retries")]
    pub max_action_retries: u32,

    /// Actions executed per cycle at most.
    #[serde(default = "default_max_steps_per_cycle")]
    pub max_steps_per_cycle: u32,

    /// Actions between scheduled plans.
    #[serde(default = "default_interval_steps")]
    pub plan_min_interval_steps: u32,

    /// Actions between scheduled reflections.
    #[serde(default = "default_interval_steps")]
    pub reflect_min_interval_steps: u32,

    /// Pause after each action, in milliseconds.
    #[serde(default = "default_action_interval_ms")]
    pub action_interval_ms: u64,

    /// Pause between cycles, in milliseconds.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,

    /// How long a stop waits for loops to exit before aborting them.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_agents: default_max_concurrent_agents(),
            max_concurrent_planner_calls: default_max_concurrent_planner_calls(),
            planner_timeout_ms: default_planner_timeout_ms(),
            max_action_retries: default_max_action_retries(),
            max_steps_per_cycle: default_max_steps_per_cycle(),
            plan_min_interval_steps: default_interval_steps(),
            reflect_min_interval_steps: default_interval_steps(),
            action_interval_ms: default_action_interval_ms(),
            idle_interval_ms: default_idle_interval_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl AgentsConfig {
    /// Per-loop settings.
    pub const fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            max_action_retries: self.max_action_retries,
            max_steps_per_cycle: self.max_steps_per_cycle,
            plan_min_interval_steps: self.plan_min_interval_steps,
            reflect_min_interval_steps: self.reflect_min_interval_steps,
            action_interval: Duration::from_millis(self.action_interval_ms),
            idle_interval: Duration::from_millis(self.idle_interval_ms),
            planner_timeout: Duration::from_millis(self.planner_timeout_ms),
        }
    }

    /// Grace period for shutdown.
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Dispatch server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatchSettings {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Milliseconds to wait for a command's completion.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,

    /// Milliseconds between heartbeat pings.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Commands awaiting completion at once, across all agents.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Milliseconds to wait at startup for every endpoint to connect.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Answer commands in-process instead of serving endpoints.
    #[serde(default)]
    pub headless: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ack_timeout_ms: default_ack_timeout_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            max_in_flight: default_max_in_flight(),
            connect_timeout_ms: default_connect_timeout_ms(),
            headless: false,
        }
    }
}

impl DispatchSettings {
    /// Settings for the dispatcher itself.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            ack_timeout: Duration::from_millis(self.ack_timeout_ms),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            max_in_flight: self.max_in_flight,
            ..DispatchConfig::default()
        }
    }

    /// Settings for the WebSocket server.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// Startup connection deadline.
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// HTTP planner bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlannerConfig {
    /// Base URL of the planner service; `None` runs the built-in stub.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_planner_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_ms: default_planner_request_timeout_ms(),
        }
    }
}

const fn default_time_ratio() -> u32 {
    120
}

const fn default_seed() -> u64 {
    42
}

fn default_price_band() -> Decimal {
    Decimal::new(5, 1)
}

fn default_first_day_multiplier() -> Decimal {
    Decimal::from(4)
}

const fn default_max_concurrent_agents() -> usize {
    8
}

const fn default_max_concurrent_planner_calls() -> usize {
    4
}

const fn default_planner_timeout_ms() -> u64 {
    60_000
}

const fn default_max_action_retries() -> u32 {
    2
}

const fn default_max_steps_per_cycle() -> u32 {
    20
}

const fn default_interval_steps() -> u32 {
    20
}

const fn default_action_interval_ms() -> u64 {
    1500
}

const fn default_idle_interval_ms() -> u64 {
    5000
}

const fn default_shutdown_grace_ms() -> u64 {
    5000
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8765
}

const fn default_ack_timeout_ms() -> u64 {
    25_000
}

const fn default_heartbeat_interval_ms() -> u64 {
    10_000
}

const fn default_max_in_flight() -> usize {
    64
}

const fn default_connect_timeout_ms() -> u64 {
    120_000
}

const fn default_planner_request_timeout_ms() -> u64 {
    60_000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_types::ActionKind;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = SimulationConfig::parse_without_env("").unwrap();
        assert_eq!(config.world.time_ratio, 120);
        assert_eq!(config.world.price_band, dec!(0.5));
        assert_eq!(config.agents.max_steps_per_cycle, 20);
        assert_eq!(config.dispatch.ack_timeout_ms, 25_000);
        assert_eq!(config.content.players.len(), 4);
    }

    #[test]
    fn sections_override_independently() {
        let yaml = r"
world:
  time_ratio: 60
  seed: 7
rules:
  starting_money: 300
  action_fatigue_cost:
    fishing: 5.0
agents:
  max_action_retries: 4
  action_interval_ms: 10
dispatch:
  port: 9000
  headless: true
";
        let config = SimulationConfig::parse_without_env(yaml).unwrap();
        assert_eq!(config.world.time_ratio, 60);
        assert_eq!(config.world.price_band, dec!(0.5));
        assert_eq!(config.rules.starting_money, dec!(300));
        assert!((config.rules.fatigue_cost(ActionKind::Fishing) - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.agents.max_action_retries, 4);
        assert_eq!(config.agents.max_steps_per_cycle, 20);
        assert!(config.dispatch.headless);
        assert_eq!(config.dispatch.server_config().port, 9000);

        let loop_config = config.agents.loop_config();
        assert_eq!(loop_config.action_interval, Duration::from_millis(10));
        assert_eq!(loop_config.max_action_retries, 4);
    }

    #[test]
    fn content_can_replace_players() {
        let yaml = r"
content:
  players:
    - id: solo
      persona: A lone fisher.
      money: 50
";
        let config = SimulationConfig::parse_without_env(yaml).unwrap();
        assert_eq!(config.content.players.len(), 1);
        assert_eq!(config.content.players[0].money, Some(dec!(50)));
        // Omitted content keeps the built-in catalog.
        assert!(config.content.items.iter().any(|i| i.id.as_str() == "bread"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = SimulationConfig::parse_without_env("world: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../agora-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "failed to load agora-config.yaml: {config:?}");
        }
    }
}
