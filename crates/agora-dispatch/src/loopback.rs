//! In-process endpoint that answers commands without a frontend.
//!
//! Used for headless runs (no visualizer attached) and by tests across
//! the workspace. A loopback registers like any other endpoint and
//! replies to each command with a configurable status after an optional
//! delay. It can also stay silent to exercise timeouts.

use std::sync::Arc;
use std::time::Duration;

use agora_types::{AgentId, CommandKind, CompletionStatus, WireMessage};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dispatcher::Dispatcher;

/// How a loopback endpoint answers commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loopback {
    status: Option<CompletionStatus>,
    delay: Duration,
    honor_durations: bool,
}

impl Loopback {
    /// Complete every command with `ok`.
    pub const fn confirming() -> Self {
        Self {
            status: Some(CompletionStatus::Ok),
            delay: Duration::ZERO,
            honor_durations: false,
        }
    }

    /// Complete every command with `failed`.
    pub const fn rejecting() -> Self {
        Self {
            status: Some(CompletionStatus::Failed),
            delay: Duration::ZERO,
            honor_durations: false,
        }
    }

    /// Never complete anything.
    pub const fn silent() -> Self {
        Self {
            status: None,
            delay: Duration::ZERO,
            honor_durations: false,
        }
    }

    /// Wait `delay` before answering each command.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Additionally wait `value` seconds for timed commands (wait, sleep, fish).
    #[must_use]
    pub const fn honoring_durations(mut self) -> Self {
        self.honor_durations = true;
        self
    }

    /// Register an endpoint for `agent_id` and answer its commands until
    /// the dispatcher drops the registration.
    ///
    /// Registration completes before this returns, so commands sent
    /// afterwards are guaranteed to reach the loopback.
    pub async fn attach(self, dispatcher: &Arc<Dispatcher>, agent_id: AgentId) -> JoinHandle<()> {
        let mut registration = dispatcher.register(agent_id.clone()).await;
        let dispatcher = Arc::clone(dispatcher);
        tokio::spawn(async move {
            while let Some(frame) = registration.outbound.recv().await {
                match frame {
                    WireMessage::Command(command) => {
                        let Some(status) = self.status else {
                            continue;
                        };
                        let mut pause = self.delay;
                        if self.honor_durations
                            && matches!(
                                command.cmd,
                                CommandKind::Waiting | CommandKind::Sleeping | CommandKind::Fish
                            )
                        {
                            pause = pause.saturating_add(
                                Duration::try_from_secs_f64(command.value).unwrap_or_default(),
                            );
                        }
                        if !pause.is_zero() {
                            tokio::time::sleep(pause).await;
                        }
                        dispatcher
                            .handle_inbound(
                                &agent_id,
                                WireMessage::Complete {
                                    agent_id: agent_id.clone(),
                                    action_id: command.action_id,
                                    status,
                                },
                            )
                            .await;
                    }
                    WireMessage::Ping => {
                        dispatcher.handle_inbound(&agent_id, WireMessage::Pong).await;
                    }
                    _ => {}
                }
            }
            debug!(agent_id = %agent_id, "Loopback endpoint closed");
        })
    }
}
