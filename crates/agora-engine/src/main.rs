//! Game server binary for the Agora trading simulation.
//!
//! Wires the world, the dispatch server, the planner bridge, and the
//! agent manager together, then runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration (first argument, `AGORA_CONFIG`, or
//!    `agora-config.yaml`)
//! 3. Build the world and players
//! 4. Start the dispatch server and wait for every player's endpoint,
//!    or attach in-process endpoints when running headless
//! 5. Select the planner and spawn one agent loop per player
//! 6. On Ctrl-C, stop the loops, then close the dispatcher

mod bridge;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use agora_agents::ActionEngine;
use agora_core::agent_loop::ExitReason;
use agora_core::bootstrap::Bootstrap;
use agora_core::config::SimulationConfig;
use agora_core::manager::{AgentExit, AgentReport, Manager};
use agora_dispatch::{Dispatcher, Loopback, spawn_server};
use agora_types::AgentId;
use anyhow::Context as _;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bridge::BridgePlanner;
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "agora-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("agora-engine starting");

    let config = load_config().context("failed to load configuration")?;
    info!(
        time_ratio = config.world.time_ratio,
        seed = config.world.seed,
        players = config.content.players.len(),
        headless = config.dispatch.headless,
        "Configuration loaded"
    );

    let boot = Bootstrap::from_config(&config)
        .map_err(EngineError::from)
        .context("failed to build the world")?;
    let agent_ids: Vec<AgentId> = boot.players.iter().map(|p| p.id().clone()).collect();

    let dispatcher = Arc::new(Dispatcher::new(config.dispatch.dispatch_config()));
    let server = if config.dispatch.headless {
        for agent_id in &agent_ids {
            Loopback::confirming().attach(&dispatcher, agent_id.clone()).await;
        }
        info!("Headless mode: commands are confirmed in-process");
        None
    } else {
        let (addr, server) = spawn_server(&config.dispatch.server_config(), Arc::clone(&dispatcher))
            .await
            .map_err(EngineError::from)
            .context("failed to start the dispatch server")?;
        dispatcher.spawn_heartbeat();
        info!(%addr, players = agent_ids.len(), "Waiting for frontend endpoints");
        dispatcher
            .wait_for_endpoints(&agent_ids, config.dispatch.connect_timeout())
            .await
            .map_err(EngineError::from)
            .context("frontend did not connect")?;
        info!("All endpoints connected");
        Some(server)
    };

    let planner = Arc::new(BridgePlanner::from_config(&config.planner)?);
    info!(planner = planner.name(), "Planner selected");

    let engine = Arc::new(ActionEngine::new(
        Arc::clone(&boot.world),
        Arc::clone(&dispatcher),
        config.rules.clone(),
    ));
    let mut manager = Manager::new(engine, planner, &config.agents);
    manager.spawn_all(boot.players);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    let reports = manager.stop().await;
    log_reports(&reports);
    dispatcher.shutdown().await;
    if let Some(server) = server {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Dispatch server ended with an error"),
            Err(e) => warn!(error = %e, "Dispatch server task failed"),
        }
    }

    info!(day = boot.world.clock().day(), "agora-engine shutdown complete");
    Ok(())
}

/// Load configuration, falling back to defaults when no file exists.
///
/// Environment overrides apply either way.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("AGORA_CONFIG").ok())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        info!(path = %path.display(), "Reading configuration");
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}

fn log_reports(reports: &[AgentReport]) {
    for report in reports {
        match &report.exit {
            AgentExit::Finished(outcome) => match &outcome.exit {
                ExitReason::Stopped => info!(
                    agent_id = %report.agent_id,
                    steps = outcome.steps,
                    money = %outcome.player.money(),
                    "Agent stopped"
                ),
                ExitReason::Died { cause } => info!(
                    agent_id = %report.agent_id,
                    steps = outcome.steps,
                    cause = %cause,
                    "Agent died"
                ),
            },
            AgentExit::Panicked => warn!(agent_id = %report.agent_id, "Agent loop panicked"),
            AgentExit::Aborted => warn!(agent_id = %report.agent_id, "Agent loop aborted"),
        }
    }
}
