//! Frames exchanged with the external frontend over the dispatch channel.
//!
//! Every frame is a JSON object discriminated by `type`:
//!
//! | type | direction |
//! |---|---|
//! | `hello` | endpoint to server |
//! | `hello_ack` | server to endpoint |
//! | `command` | server to endpoint |
//! | `ack` | endpoint to server |
//! | `complete` | endpoint to server |
//! | `ping` / `pong` | both |
//!
//! A `command` is correlated with its `complete` by `action_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, AgentId, LocationId};

/// One protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// An endpoint announces which agent it renders.
    Hello {
        /// The agent bound to the connection.
        agent_id: AgentId,
    },
    /// Reply to `hello`.
    HelloAck {
        /// Wall-clock time on the server.
        server_time: DateTime<Utc>,
    },
    /// Ask the endpoint to perform (and animate) an action.
    Command(Command),
    /// The endpoint received a command. Informational only.
    Ack {
        /// The command being acknowledged.
        action_id: ActionId,
    },
    /// The endpoint finished a command.
    Complete {
        /// The agent the command was for.
        agent_id: AgentId,
        /// The command being completed.
        action_id: ActionId,
        /// How the command ended.
        status: CompletionStatus,
    },
    /// Liveness check.
    Ping,
    /// Liveness reply.
    Pong,
}

/// What the endpoint should do for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Walk the avatar to `target`.
    GoTo,
    /// Play a short item animation.
    Animation,
    /// Idle for `value` real seconds.
    Waiting,
    /// Sleep for `value` real seconds.
    Sleeping,
    /// Cook the `target` item.
    Cook,
    /// Fish for `value` real seconds.
    Fish,
    /// Show a speech bubble addressed to `target`.
    Talk,
}

/// The command payload minus its addressing, as built by action handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// What to do.
    pub cmd: CommandKind,
    /// Target location, navigation point, item, or player.
    pub target: String,
    /// Numeric argument (seconds, quantity).
    pub value: f64,
    /// Where the agent currently is.
    pub cur_location: LocationId,
}

impl CommandRequest {
    /// Build a request with a zero value.
    pub fn new(cmd: CommandKind, target: impl Into<String>, cur_location: LocationId) -> Self {
        Self {
            cmd,
            target: target.into(),
            value: 0.0,
            cur_location,
        }
    }

    /// Set the numeric argument.
    #[must_use]
    pub const fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
}

/// A command frame as sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// The agent the command is for.
    pub agent_id: AgentId,
    /// Correlation key for the matching `complete`.
    pub action_id: ActionId,
    /// What to do.
    pub cmd: CommandKind,
    /// Target location, navigation point, item, or player.
    pub target: String,
    /// Numeric argument (seconds, quantity).
    pub value: f64,
    /// Where the agent currently is.
    pub cur_location: LocationId,
}

impl Command {
    /// Address a request to an agent under a correlation key.
    pub fn from_request(agent_id: AgentId, action_id: ActionId, request: CommandRequest) -> Self {
        Self {
            agent_id,
            action_id,
            cmd: request.cmd,
            target: request.target,
            value: request.value,
            cur_location: request.cur_location,
        }
    }
}

/// How an endpoint reports a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// The command played out.
    Ok,
    /// The endpoint could not perform the command.
    Failed,
    /// The command was interrupted before finishing.
    Interrupted,
    /// Any status string this server does not know.
    #[serde(other)]
    Other,
}

impl CompletionStatus {
    /// Whether the endpoint confirmed the command.
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_frame_is_flat() {
        let request = CommandRequest::new(CommandKind::GoTo, "cashier", LocationId::from("square"))
            .with_value(1.0);
        let command = Command::from_request(AgentId::from("agent-1"), ActionId::new(), request);
        let value = serde_json::to_value(WireMessage::Command(command)).unwrap();
        assert_eq!(value["type"], "command");
        assert_eq!(value["cmd"], "go_to");
        assert_eq!(value["target"], "cashier");
        assert_eq!(value["cur_location"], "square");
        assert!(value["action_id"].is_string());
    }

    #[test]
    fn complete_accepts_unknown_status() {
        let raw = format!(
            r#"{{"type":"complete","agent_id":"a","action_id":"{}","status":"exploded"}}"#,
            ActionId::new()
        );
        let message: WireMessage = serde_json::from_str(&raw).unwrap();
        match message {
            WireMessage::Complete { status, .. } => {
                assert_eq!(status, CompletionStatus::Other);
                assert!(!status.is_ok());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn ping_has_only_a_tag() {
        let json = serde_json::to_string(&WireMessage::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
    }
}
