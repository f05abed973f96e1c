//! Spawns and supervises agent loops.
//!
//! Every player runs in its own tokio task. The manager shares one
//! [`Admission`] and one [`StopSignal`] across all of them. Stopping is
//! cooperative: loops notice the signal at their next checkpoint and
//! return their final state. Loops still running when the shutdown grace
//! period ends are aborted.

use std::sync::Arc;
use std::time::Duration;

use agora_agents::{ActionEngine, PlayerState};
use agora_types::AgentId;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::admission::Admission;
use crate::agent_loop::{AgentLoop, LoopConfig, LoopOutcome};
use crate::config::AgentsConfig;
use crate::planner::Planner;
use crate::stop::StopSignal;

/// How one supervised loop ended.
#[derive(Debug)]
pub enum AgentExit {
    /// The loop returned normally.
    Finished(Box<LoopOutcome>),
    /// The loop's task panicked.
    Panicked,
    /// The loop outlived the grace period and was aborted.
    Aborted,
}

/// The fate of one agent at shutdown.
#[derive(Debug)]
pub struct AgentReport {
    /// The agent.
    pub agent_id: AgentId,
    /// How its loop ended.
    pub exit: AgentExit,
}

/// Owns every running agent loop.
#[derive(Debug)]
pub struct Manager<P> {
    engine: Arc<ActionEngine>,
    planner: Arc<P>,
    admission: Admission,
    stop: Arc<StopSignal>,
    config: LoopConfig,
    grace: Duration,
    tasks: Vec<(AgentId, JoinHandle<LoopOutcome>)>,
}

impl<P: Planner> Manager<P> {
    /// Create a manager with limits from `agents`.
    pub fn new(engine: Arc<ActionEngine>, planner: Arc<P>, agents: &AgentsConfig) -> Self {
        Self {
            engine,
            planner,
            admission: Admission::new(agents.max_concurrent_agents, agents.max_concurrent_planner_calls),
            stop: Arc::new(StopSignal::new()),
            config: agents.loop_config(),
            grace: agents.shutdown_grace(),
            tasks: Vec::new(),
        }
    }

    /// Replace the loop configuration for loops spawned from now on.
    #[must_use]
    pub const fn with_loop_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Start a loop for `player`.
    pub fn spawn(&mut self, player: PlayerState) {
        let agent_id = player.id().clone();
        let agent = AgentLoop::new(
            player,
            Arc::clone(&self.engine),
            Arc::clone(&self.planner),
            self.admission.clone(),
            Arc::clone(&self.stop),
            self.config,
        );
        info!(agent_id = %agent_id, "Spawning agent loop");
        self.tasks.push((agent_id, tokio::spawn(agent.run())));
    }

    /// Start a loop for each player.
    pub fn spawn_all(&mut self, players: impl IntoIterator<Item = PlayerState>) {
        for player in players {
            self.spawn(player);
        }
    }

    /// The shared stop signal.
    pub fn stop_signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.stop)
    }

    /// Loops that have not returned yet.
    pub fn running(&self) -> usize {
        self.tasks
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }

    /// Wait for every loop to end on its own.
    pub async fn join(self) -> Vec<AgentReport> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        for (agent_id, handle) in self.tasks {
            reports.push(report(agent_id, handle.await));
        }
        reports
    }

    /// Signal every loop to stop and collect their final states.
    pub async fn stop(self) -> Vec<AgentReport> {
        info!(agents = self.tasks.len(), grace_ms = self.grace.as_millis(), "Stopping agent loops");
        self.stop.request();
        self.admission.close();

        let started = Instant::now();
        let mut reports = Vec::with_capacity(self.tasks.len());
        for (agent_id, mut handle) in self.tasks {
            let remaining = self.grace.saturating_sub(started.elapsed());
            let joined = match tokio::time::timeout(remaining, &mut handle).await {
                Ok(joined) => joined,
                Err(_elapsed) => {
                    warn!(agent_id = %agent_id, "Agent loop ignored stop; aborting");
                    handle.abort();
                    handle.await
                }
            };
            reports.push(report(agent_id, joined));
        }
        reports
    }
}

fn report(agent_id: AgentId, joined: Result<LoopOutcome, JoinError>) -> AgentReport {
    let exit = match joined {
        Ok(outcome) => AgentExit::Finished(Box::new(outcome)),
        Err(error) if error.is_panic() => {
            warn!(agent_id = %agent_id, "Agent loop panicked");
            AgentExit::Panicked
        }
        Err(_cancelled) => AgentExit::Aborted,
    };
    AgentReport { agent_id, exit }
}
