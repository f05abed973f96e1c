//! Error types for the dispatch layer.
//!
//! None of these are retried inside the dispatcher. Callers decide
//! whether a failed confirmation is worth another attempt.

use agora_types::{ActionId, AgentId, CompletionStatus};

/// Why a command did not get a positive acknowledgment.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No endpoint is registered for the agent.
    #[error("no endpoint connected for {agent_id}")]
    NotConnected {
        /// The unreachable agent.
        agent_id: AgentId,
    },

    /// The endpoint did not complete the command in time.
    #[error("command {action_id} for {agent_id} timed out after {timeout_ms}ms")]
    Timeout {
        /// The addressed agent.
        agent_id: AgentId,
        /// The expired command.
        action_id: ActionId,
        /// The deadline that passed.
        timeout_ms: u64,
    },

    /// The endpoint completed the command with a non-ok status.
    #[error("command {action_id} for {agent_id} completed with {status:?}")]
    Rejected {
        /// The addressed agent.
        agent_id: AgentId,
        /// The rejected command.
        action_id: ActionId,
        /// The status the endpoint reported.
        status: CompletionStatus,
    },

    /// The dispatcher shut down while the command was pending.
    #[error("command {action_id} for {agent_id} was cancelled by shutdown")]
    Cancelled {
        /// The addressed agent.
        agent_id: AgentId,
        /// The abandoned command.
        action_id: ActionId,
    },

    /// The dispatcher is shut down and accepts no new commands.
    #[error("dispatcher is closed")]
    Closed,

    /// Some endpoints never connected.
    #[error("endpoints did not connect in time: {missing:?}")]
    EndpointsMissing {
        /// Agents still without an endpoint.
        missing: Vec<AgentId>,
    },
}

impl DispatchError {
    /// Whether the failure was a deadline expiring.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
