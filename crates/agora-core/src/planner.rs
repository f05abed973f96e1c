//! The planner contract, proposal parsing, and built-in planners.
//!
//! A [`Planner`] is the opaque decision maker behind every agent. It
//! receives an [`Observation`] and answers with text: free-form for plans
//! and reflections, JSON for action proposals. [`parse_proposal`] turns
//! the latter into [`Action`]s, tolerating the usual planner habits
//! (markdown fences, arrays, trailing prose).
//!
//! The [`StubPlanner`] never acts, which lets the loop and the engine run
//! end-to-end without a planner service. The [`ScriptedPlanner`] replays
//! a fixed list of responses.

use std::collections::VecDeque;
use std::future::Future;

use agora_types::{Action, AgentId};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;

use crate::observation::Observation;

/// Most actions accepted from a single proposal.
pub const MAX_PROPOSED_ACTIONS: usize = 5;

/// Seconds waited when a proposal cannot be understood.
pub const FALLBACK_WAIT_SECONDS: f64 = 5.0;

/// Errors that can occur when asking the planner.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The planner did not answer in time.
    #[error("planner timed out for {agent_id} after {timeout_ms}ms")]
    Timeout {
        /// The agent being planned for.
        agent_id: AgentId,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The planner failed.
    #[error("planner error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// A source of plans, actions, and reflections.
///
/// Implementations must be shareable across agent tasks.
pub trait Planner: Send + Sync + 'static {
    /// Produce a free-form plan for the coming cycle.
    fn plan(
        &self,
        observation: &Observation,
    ) -> impl Future<Output = Result<String, PlannerError>> + Send;

    /// Propose the next action or actions as JSON text.
    fn act(
        &self,
        observation: &Observation,
    ) -> impl Future<Output = Result<String, PlannerError>> + Send;

    /// Summarize what happened so far.
    fn reflect(
        &self,
        observation: &Observation,
    ) -> impl Future<Output = Result<String, PlannerError>> + Send;
}

/// What a planner asked for.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Proposal {
    /// Actions to execute in order.
    pub actions: Vec<Action>,
    /// The planner considers the cycle complete after these actions.
    pub finish: bool,
}

impl Proposal {
    /// The safe default when the planner cannot be reached.
    pub fn fallback() -> Self {
        Self {
            actions: vec![Action::Wait {
                seconds: FALLBACK_WAIT_SECONDS,
            }],
            finish: false,
        }
    }

    /// Nothing more to do this cycle.
    pub const fn finished() -> Self {
        Self {
            actions: Vec::new(),
            finish: true,
        }
    }
}

/// Parse planner text into a proposal.
///
/// Accepts a single action object, an array of them (only the first
/// [`MAX_PROPOSED_ACTIONS`] are kept), optionally inside a markdown code
/// fence or surrounded by prose. An element `{"type": "finish"}` ends the
/// proposal. Returns `None` when the text holds no usable action.
pub fn parse_proposal(text: &str) -> Option<Proposal> {
    let Some(value) = extract_json(text) else {
        warn!(text = %truncate(text), "Planner output is not JSON");
        return None;
    };

    let elements = match value {
        Value::Array(elements) => elements,
        other => vec![other],
    };
    if elements.is_empty() {
        return Some(Proposal::finished());
    }

    let mut proposal = Proposal::default();
    for element in elements {
        if proposal.actions.len() >= MAX_PROPOSED_ACTIONS {
            break;
        }
        if element.get("type").and_then(Value::as_str) == Some("finish") {
            proposal.finish = true;
            break;
        }
        match serde_json::from_value::<Action>(element) {
            Ok(action) => proposal.actions.push(action),
            Err(e) => warn!(error = %e, "Skipping malformed proposed action"),
        }
    }

    if proposal.actions.is_empty() && !proposal.finish {
        return None;
    }
    Some(proposal)
}

fn extract_json(text: &str) -> Option<Value> {
    let body = strip_fence(text.trim());
    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }
    // Planners often wrap JSON in prose; try the outermost bracketed span.
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (body.find(open), body.rfind(close))
            && start < end
            && let Some(span) = body.get(start..=end)
            && let Ok(value) = serde_json::from_str(span)
        {
            return Some(value);
        }
    }
    None
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) up to the first newline.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(text: &str) -> String {
    text.chars().take(120).collect()
}

/// A planner that never acts.
///
/// Every proposal is `finish`, so loops idle between cycles while the
/// rest of the system runs normally.
#[derive(Debug, Clone, Default)]
pub struct StubPlanner;

impl StubPlanner {
    /// Create a new stub planner.
    pub const fn new() -> Self {
        Self
    }
}

impl Planner for StubPlanner {
    async fn plan(&self, observation: &Observation) -> Result<String, PlannerError> {
        Ok(format!("{} rests at {}.", observation.agent_id, observation.location))
    }

    async fn act(&self, _observation: &Observation) -> Result<String, PlannerError> {
        Ok(String::from(r#"{"type": "finish"}"#))
    }

    async fn reflect(&self, _observation: &Observation) -> Result<String, PlannerError> {
        Ok(String::from("Nothing happened."))
    }
}

/// A planner that replays canned action responses in order.
///
/// Once the script runs out every proposal is `finish`. Plans and
/// reflections are fixed strings.
#[derive(Debug, Default)]
pub struct ScriptedPlanner {
    script: Mutex<VecDeque<String>>,
}

impl ScriptedPlanner {
    /// Replay `responses` to successive `act` calls.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    /// Responses not yet handed out.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

impl Planner for ScriptedPlanner {
    async fn plan(&self, _observation: &Observation) -> Result<String, PlannerError> {
        Ok(String::from("Follow the script."))
    }

    async fn act(&self, _observation: &Observation) -> Result<String, PlannerError> {
        Ok(self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| String::from(r#"{"type": "finish"}"#)))
    }

    async fn reflect(&self, observation: &Observation) -> Result<String, PlannerError> {
        Ok(format!("{} memories so far.", observation.memory.len()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_types::{ItemId, LocationId, TradeMode};

    use super::*;

    #[test]
    fn single_object() {
        let proposal = parse_proposal(r#"{"type": "move", "target": "market"}"#).unwrap();
        assert_eq!(proposal.actions, vec![Action::Move {
            target: LocationId::from("market")
        }]);
        assert!(!proposal.finish);
    }

    #[test]
    fn fenced_array_is_capped() {
        let text = "```json\n[\n{\"type\":\"wait\",\"seconds\":1},\
            {\"type\":\"wait\",\"seconds\":2},{\"type\":\"wait\",\"seconds\":3},\
            {\"type\":\"wait\",\"seconds\":4},{\"type\":\"wait\",\"seconds\":5},\
            {\"type\":\"wait\",\"seconds\":6}]\n```";
        let proposal = parse_proposal(text).unwrap();
        assert_eq!(proposal.actions.len(), MAX_PROPOSED_ACTIONS);
    }

    #[test]
    fn finish_ends_the_proposal() {
        let text = r#"[{"type":"trade","mode":"buy","item":"bread","qty":1},{"type":"finish"},{"type":"sleep","minutes":60}]"#;
        let proposal = parse_proposal(text).unwrap();
        assert!(proposal.finish);
        assert_eq!(proposal.actions, vec![Action::Trade {
            mode: TradeMode::Buy,
            item: ItemId::from("bread"),
            qty: 1,
        }]);
    }

    #[test]
    fn prose_around_json_is_tolerated() {
        let proposal = parse_proposal(
            "I am thirsty, so: {\"type\": \"consume\", \"item\": \"water\"} should help.",
        )
        .unwrap();
        assert_eq!(proposal.actions, vec![Action::Consume {
            item: ItemId::from("water"),
            qty: 1,
        }]);
    }

    #[test]
    fn garbage_yields_no_proposal() {
        assert_eq!(parse_proposal("let me think about it"), None);
        assert_eq!(parse_proposal(r#"{"type": "move"}"#), None);
        assert_eq!(parse_proposal("[]"), Some(Proposal::finished()));
    }

    #[test]
    fn unknown_types_survive_parsing() {
        let proposal = parse_proposal(r#"{"type": "dance"}"#).unwrap();
        assert_eq!(proposal.actions, vec![Action::Unknown]);
    }

    #[tokio::test]
    async fn scripted_planner_replays_then_finishes() {
        use crate::bootstrap::Bootstrap;
        use crate::config::SimulationConfig;
        use crate::observation::{Deliberation, Observation};

        let boot = Bootstrap::from_config(&SimulationConfig::default()).unwrap();
        let observation =
            Observation::capture(&boot.world, &boot.players[0], &Deliberation::default()).await;
        let planner = ScriptedPlanner::new([r#"{"type":"wait","seconds":1}"#]);

        let first = parse_proposal(&planner.act(&observation).await.unwrap()).unwrap();
        assert_eq!(first.actions.len(), 1);
        let second = parse_proposal(&planner.act(&observation).await.unwrap()).unwrap();
        assert_eq!(second, Proposal::finished());
        assert_eq!(planner.remaining().await, 0);
    }
}
