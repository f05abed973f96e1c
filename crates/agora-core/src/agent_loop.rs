//! The per-player plan/act/reflect cycle.
//!
//! One [`AgentLoop`] owns one [`PlayerState`] outright and is the only
//! writer to it. A cycle runs:
//!
//! 1. Drain the player's mailbox into memory.
//! 2. Plan, if no plan exists, the plan is stale, or the last action
//!    failed with a blocking code.
//! 3. Think and act, up to `max_steps_per_cycle` actions. The cycle ends
//!    early on death, on a `finish` proposal, or once more than
//!    `max_action_retries` actions have failed.
//! 4. Reflect, if enough actions have passed or the player died.
//! 5. Roll the world over to a new day if one has begun.
//!
//! Planner failures never end a loop: a failed plan or reflection keeps
//! the previous text, and a failed proposal becomes a short wait. Each
//! fault is noted in the player's memory so the next prompt sees it.
//! Proposal text with no usable action is recorded as a `NO_ACTION`
//! failure, which forces a fresh plan.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agora_agents::{ActionEngine, PlayerState, Vitality};
use agora_types::{Action, ActionKind, ActionResult, AgentId, ResultCode};
use tracing::{debug, info, warn};

use crate::admission::Admission;
use crate::config::AgentsConfig;
use crate::observation::{Deliberation, Observation};
use crate::planner::{Planner, PlannerError, Proposal, parse_proposal};
use crate::stop::StopSignal;

/// Pacing and retry limits for one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Failed actions tolerated per cycle before the cycle ends.
    pub max_action_retries: u32,
    /// Actions executed per cycle at most.
    pub max_steps_per_cycle: u32,
    /// Actions between scheduled plans.
    pub plan_min_interval_steps: u32,
    /// Actions between scheduled reflections.
    pub reflect_min_interval_steps: u32,
    /// Pause after each action.
    pub action_interval: Duration,
    /// Pause between cycles.
    pub idle_interval: Duration,
    /// Deadline for each planner call.
    pub planner_timeout: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        AgentsConfig::default().loop_config()
    }
}

/// Why a loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The stop signal fired.
    Stopped,
    /// The player died.
    Died {
        /// The attribute that ran out.
        cause: String,
    },
}

/// The final state of a finished loop.
#[derive(Debug)]
pub struct LoopOutcome {
    /// The player as the loop left it.
    pub player: PlayerState,
    /// Why the loop ended.
    pub exit: ExitReason,
    /// Actions executed over the loop's life.
    pub steps: u64,
    /// Cycles started over the loop's life.
    pub cycles: u64,
}

/// Drives one player.
#[derive(Debug)]
pub struct AgentLoop<P> {
    player: PlayerState,
    engine: Arc<ActionEngine>,
    planner: Arc<P>,
    admission: Admission,
    stop: Arc<StopSignal>,
    config: LoopConfig,
    deliberation: Deliberation,
    steps: u64,
    cycles: u64,
    since_plan: u32,
    since_reflect: u32,
}

impl<P: Planner> AgentLoop<P> {
    /// Create a loop for `player`.
    pub fn new(
        player: PlayerState,
        engine: Arc<ActionEngine>,
        planner: Arc<P>,
        admission: Admission,
        stop: Arc<StopSignal>,
        config: LoopConfig,
    ) -> Self {
        Self {
            player,
            engine,
            planner,
            admission,
            stop,
            config,
            deliberation: Deliberation::default(),
            steps: 0,
            cycles: 0,
            since_plan: 0,
            since_reflect: 0,
        }
    }

    /// The player this loop drives.
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    /// The player's id.
    pub const fn agent_id(&self) -> &AgentId {
        self.player.id()
    }

    /// Actions executed so far.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// The current plan, summary, and last result.
    pub const fn deliberation(&self) -> &Deliberation {
        &self.deliberation
    }

    /// Run cycles until the player dies or a stop is requested.
    pub async fn run(mut self) -> LoopOutcome {
        info!(agent_id = %self.player.id(), "Agent loop started");
        let exit = loop {
            if self.stop.is_requested() {
                break ExitReason::Stopped;
            }
            let Some(permit) = self.admission.agent().await else {
                break ExitReason::Stopped;
            };
            self.cycle().await;
            drop(permit);

            if let Vitality::Dead { cause } = self.player.vitality() {
                break ExitReason::Died {
                    cause: cause.clone(),
                };
            }
            if !self.stop.sleep(self.config.idle_interval).await {
                break ExitReason::Stopped;
            }
        };

        info!(
            agent_id = %self.player.id(),
            steps = self.steps,
            cycles = self.cycles,
            exit = ?exit,
            "Agent loop finished"
        );
        LoopOutcome {
            player: self.player,
            exit,
            steps: self.steps,
            cycles: self.cycles,
        }
    }

    /// Run one plan/act/reflect cycle.
    pub async fn cycle(&mut self) {
        self.cycles = self.cycles.saturating_add(1);
        self.read_mail().await;
        if self.should_plan() {
            self.plan().await;
        }
        self.act().await;
        if self.should_reflect() {
            self.reflect().await;
        }
        if let Some(day) = self.engine.world().roll_over().await {
            debug!(agent_id = %self.player.id(), day, "Rolled the world over");
        }
    }

    async fn act(&mut self) {
        let mut executed: u32 = 0;
        let mut failures: u32 = 0;
        while executed < self.config.max_steps_per_cycle {
            if self.stop.is_requested() {
                return;
            }
            let Some(proposal) = self.think().await else {
                self.record_no_action();
                failures = failures.saturating_add(1);
                if failures > self.config.max_action_retries {
                    debug!(agent_id = %self.player.id(), failures, "Retry budget spent");
                    return;
                }
                self.plan().await;
                continue;
            };
            let mut replan = false;
            for action in &proposal.actions {
                if executed >= self.config.max_steps_per_cycle || self.stop.is_requested() {
                    return;
                }
                let result = self.execute(action).await;
                executed = executed.saturating_add(1);
                if result.is_dead() {
                    return;
                }
                if !result.ok {
                    failures = failures.saturating_add(1);
                    if failures > self.config.max_action_retries {
                        debug!(agent_id = %self.player.id(), failures, "Retry budget spent");
                        return;
                    }
                    replan = result.code.is_blocking();
                    break;
                }
                if !self.stop.sleep(self.config.action_interval).await {
                    return;
                }
            }
            if replan {
                self.plan().await;
            } else if proposal.finish {
                return;
            }
        }
    }

    async fn execute(&mut self, action: &Action) -> ActionResult {
        let result = self.engine.execute(&mut self.player, action).await;
        self.steps = self.steps.saturating_add(1);
        self.since_plan = self.since_plan.saturating_add(1);
        self.since_reflect = self.since_reflect.saturating_add(1);

        let text = match (&result.event, result.ok) {
            (Some(event), _) => event.clone(),
            (None, true) => result.message.clone(),
            (None, false) => format!("Tried to {} but failed: {}", result.action, result.message),
        };
        let stamp = self.engine.world().clock().format_now();
        self.player.remember(&stamp, &text);
        self.deliberation.last_result = Some(result.clone());
        result
    }

    fn record_no_action(&mut self) {
        let result = ActionResult::failure(
            ActionKind::Unknown,
            ResultCode::NoAction,
            "the proposal held no usable action",
        );
        debug!(agent_id = %self.player.id(), "Planner proposed nothing usable");
        let stamp = self.engine.world().clock().format_now();
        self.player.remember(&stamp, "Proposed nothing usable, planning again");
        self.deliberation.last_result = Some(result);
    }

    fn should_plan(&self) -> bool {
        self.deliberation.plan.is_none()
            || self.since_plan >= self.config.plan_min_interval_steps
            || self
                .deliberation
                .last_result
                .as_ref()
                .is_some_and(|r| !r.ok && r.code.is_blocking())
    }

    fn should_reflect(&self) -> bool {
        self.player.is_dead() || self.since_reflect >= self.config.reflect_min_interval_steps
    }

    async fn plan(&mut self) {
        let observation = self.observe().await;
        let planner = Arc::clone(&self.planner);
        if let Some(plan) = self.consult("plan", planner.plan(&observation)).await {
            debug!(agent_id = %self.player.id(), "New plan");
            self.deliberation.plan = Some(plan);
        }
        self.since_plan = 0;
    }

    /// The next proposal, or `None` if the planner answered with nothing
    /// usable.
    async fn think(&mut self) -> Option<Proposal> {
        let observation = self.observe().await;
        let planner = Arc::clone(&self.planner);
        match self.consult("act", planner.act(&observation)).await {
            Some(text) => parse_proposal(&text),
            None => Some(Proposal::fallback()),
        }
    }

    async fn reflect(&mut self) {
        let observation = self.observe().await;
        let planner = Arc::clone(&self.planner);
        if let Some(summary) = self.consult("reflect", planner.reflect(&observation)).await {
            self.deliberation.summary = Some(summary);
        }
        self.since_reflect = 0;
    }

    async fn read_mail(&mut self) {
        let mail = self.engine.world().lock().await.take_mail(self.player.id());
        for message in mail {
            self.player.remember(
                &message.sent_at,
                &format!("{} told you: {}", message.from, message.content),
            );
        }
    }

    async fn observe(&self) -> Observation {
        Observation::capture(self.engine.world(), &self.player, &self.deliberation).await
    }

    /// Run one planner call under the admission gate and deadline.
    ///
    /// A fault is logged and remembered; `None` tells the caller to keep
    /// what it had.
    async fn consult<F>(&mut self, phase: &'static str, call: F) -> Option<String>
    where
        F: Future<Output = Result<String, PlannerError>>,
    {
        let _permit = self.admission.planner().await?;
        let error = match tokio::time::timeout(self.config.planner_timeout, call).await {
            Ok(Ok(text)) => return Some(text),
            Ok(Err(error)) => error,
            Err(_elapsed) => PlannerError::Timeout {
                agent_id: self.player.id().clone(),
                timeout_ms: u64::try_from(self.config.planner_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            },
        };
        warn!(agent_id = %self.player.id(), phase, error = %error, "Planner call failed");
        let fallback = match phase {
            "plan" => "keeping the previous plan",
            "reflect" => "keeping the previous summary",
            _ => "waiting instead",
        };
        let stamp = self.engine.world().clock().format_now();
        self.player.remember(&stamp, &format!("Planner {phase} failed ({error}), {fallback}"));
        None
    }
}
