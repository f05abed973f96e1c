//! The correlation core: one command out, one completion back.
//!
//! # Lifecycle of a command
//!
//! 1. [`Dispatcher::send`] takes an in-flight permit, generates a fresh
//!    [`ActionId`], and registers a pending entry holding a oneshot sender.
//! 2. The command frame is pushed onto the endpoint's outbound channel.
//! 3. The caller awaits the oneshot. One deadline covers both the push
//!    and the wait, so a stalled endpoint cannot hold a caller past it.
//! 4. The inbound side calls [`Dispatcher::handle_inbound`]; a `complete`
//!    frame removes the pending entry and fires the oneshot.
//! 5. If the deadline passes first, the caller removes the entry itself.
//!
//! Each pending entry is therefore removed exactly once, by whichever of
//! completion, timeout, or shutdown gets there first. Completions for
//! unknown ids are logged and dropped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use agora_types::{
    ActionId, AgentId, Command, CommandRequest, CompletionStatus, WireMessage,
};
use tokio::sync::{Mutex, Semaphore, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::DispatchError;

/// Tunables for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How long a command may stay pending.
    pub ack_timeout: Duration,
    /// How often every endpoint is pinged.
    pub heartbeat_interval: Duration,
    /// Maximum commands pending at once across all agents.
    pub max_in_flight: usize,
    /// Outbound frames buffered per endpoint.
    pub outbound_buffer: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(25),
            heartbeat_interval: Duration::from_secs(10),
            max_in_flight: 64,
            outbound_buffer: 64,
        }
    }
}

/// A positive completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// The completed command.
    pub action_id: ActionId,
    /// Real time between sending and completion.
    pub latency: Duration,
}

/// Handed to a transport when its endpoint registers.
#[derive(Debug)]
pub struct Registration {
    /// Generation number of this connection.
    pub connection: u64,
    /// Frames the transport must deliver to the endpoint.
    pub outbound: mpsc::Receiver<WireMessage>,
}

#[derive(Debug)]
struct Endpoint {
    connection: u64,
    outbound: mpsc::Sender<WireMessage>,
    last_pong: Option<Instant>,
}

#[derive(Debug)]
struct PendingCommand {
    agent_id: AgentId,
    resolve: oneshot::Sender<CompletionStatus>,
}

/// Correlates outbound commands with inbound completions.
///
/// Owned by whoever runs the server and shared via [`Arc`]. All state is
/// instance-owned and torn down by [`Dispatcher::shutdown`].
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatchConfig,
    endpoints: Mutex<BTreeMap<AgentId, Endpoint>>,
    pending: Mutex<BTreeMap<ActionId, PendingCommand>>,
    in_flight: Semaphore,
    next_connection: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl Dispatcher {
    /// Create a dispatcher with no endpoints.
    pub fn new(config: DispatchConfig) -> Self {
        let permits = config.max_in_flight.max(1);
        Self {
            config,
            endpoints: Mutex::new(BTreeMap::new()),
            pending: Mutex::new(BTreeMap::new()),
            in_flight: Semaphore::new(permits),
            next_connection: AtomicU64::new(1),
            shutdown: watch::channel(false).0,
        }
    }

    /// The configuration in use.
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Endpoint registry
    // -----------------------------------------------------------------------

    /// Register (or replace) the endpoint for `agent_id`.
    ///
    /// A newer registration replaces an older one. The old transport sees
    /// its outbound channel close and winds down.
    pub async fn register(&self, agent_id: AgentId) -> Registration {
        let connection = self.next_connection.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer.max(1));
        let replaced = self.endpoints.lock().await.insert(
            agent_id.clone(),
            Endpoint {
                connection,
                outbound: tx,
                last_pong: None,
            },
        );
        if replaced.is_some() {
            info!(agent_id = %agent_id, connection, "Endpoint re-registered");
        } else {
            info!(agent_id = %agent_id, connection, "Endpoint registered");
        }
        Registration {
            connection,
            outbound: rx,
        }
    }

    /// Drop the endpoint for `agent_id` if it still belongs to `connection`.
    ///
    /// Returns whether a registration was removed. A stale connection
    /// cannot remove its replacement.
    pub async fn unregister(&self, agent_id: &AgentId, connection: u64) -> bool {
        let mut endpoints = self.endpoints.lock().await;
        if endpoints
            .get(agent_id)
            .is_some_and(|e| e.connection == connection)
        {
            endpoints.remove(agent_id);
            info!(agent_id = %agent_id, connection, "Endpoint unregistered");
            true
        } else {
            false
        }
    }

    /// Whether an endpoint is registered for `agent_id`.
    pub async fn is_connected(&self, agent_id: &AgentId) -> bool {
        self.endpoints.lock().await.contains_key(agent_id)
    }

    /// Agents with a registered endpoint, in key order.
    pub async fn connected(&self) -> Vec<AgentId> {
        self.endpoints.lock().await.keys().cloned().collect()
    }

    /// Wait until every agent in `agents` has an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::EndpointsMissing`] listing the absentees if
    /// `timeout` elapses first.
    pub async fn wait_for_endpoints(
        &self,
        agents: &[AgentId],
        timeout: Duration,
    ) -> Result<(), DispatchError> {
        let started = Instant::now();
        loop {
            let missing: Vec<AgentId> = {
                let endpoints = self.endpoints.lock().await;
                agents
                    .iter()
                    .filter(|a| !endpoints.contains_key(*a))
                    .cloned()
                    .collect()
            };
            if missing.is_empty() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(DispatchError::EndpointsMissing { missing });
            }
            debug!(missing = missing.len(), "Waiting for endpoints");
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Send a command with the default acknowledgment timeout.
    pub async fn send(
        &self,
        agent_id: &AgentId,
        request: CommandRequest,
    ) -> Result<Ack, DispatchError> {
        self.send_with_timeout(agent_id, request, self.config.ack_timeout)
            .await
    }

    /// Send a command and wait up to `timeout` for its completion.
    ///
    /// Never retries. On every failure path the pending entry is gone by
    /// the time this returns.
    pub async fn send_with_timeout(
        &self,
        agent_id: &AgentId,
        request: CommandRequest,
        timeout: Duration,
    ) -> Result<Ack, DispatchError> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_closed| DispatchError::Closed)?;

        let outbound = self
            .endpoints
            .lock()
            .await
            .get(agent_id)
            .map(|e| e.outbound.clone())
            .ok_or_else(|| DispatchError::NotConnected {
                agent_id: agent_id.clone(),
            })?;

        let action_id = ActionId::new();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(
            action_id,
            PendingCommand {
                agent_id: agent_id.clone(),
                resolve: tx,
            },
        );

        let cmd = request.cmd;
        let command = Command::from_request(agent_id.clone(), action_id, request);
        let started = Instant::now();
        let deadline = started.checked_add(timeout).unwrap_or_else(far_future);
        let frame = WireMessage::Command(command);
        match tokio::time::timeout_at(deadline, outbound.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(_closed)) => {
                self.pending.lock().await.remove(&action_id);
                return Err(DispatchError::NotConnected {
                    agent_id: agent_id.clone(),
                });
            }
            Err(_elapsed) => {
                self.pending.lock().await.remove(&action_id);
                warn!(
                    agent_id = %agent_id,
                    action_id = %action_id,
                    timeout_ms = duration_ms(timeout),
                    "Outbound queue stayed full until the deadline"
                );
                return Err(DispatchError::Timeout {
                    agent_id: agent_id.clone(),
                    action_id,
                    timeout_ms: duration_ms(timeout),
                });
            }
        }
        debug!(agent_id = %agent_id, action_id = %action_id, ?cmd, "Command sent");

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(status)) if status.is_ok() => Ok(Ack {
                action_id,
                latency: started.elapsed(),
            }),
            Ok(Ok(status)) => {
                warn!(agent_id = %agent_id, action_id = %action_id, ?status, "Command rejected");
                Err(DispatchError::Rejected {
                    agent_id: agent_id.clone(),
                    action_id,
                    status,
                })
            }
            Ok(Err(_dropped)) => Err(DispatchError::Cancelled {
                agent_id: agent_id.clone(),
                action_id,
            }),
            Err(_elapsed) => {
                self.pending.lock().await.remove(&action_id);
                warn!(
                    agent_id = %agent_id,
                    action_id = %action_id,
                    timeout_ms = duration_ms(timeout),
                    "Command timed out"
                );
                Err(DispatchError::Timeout {
                    agent_id: agent_id.clone(),
                    action_id,
                    timeout_ms: duration_ms(timeout),
                })
            }
        }
    }

    /// Resolve a pending command. Returns `false` for unknown ids.
    pub async fn resolve(&self, action_id: ActionId, status: CompletionStatus) -> bool {
        let Some(pending) = self.pending.lock().await.remove(&action_id) else {
            debug!(action_id = %action_id, "Ignoring completion for unknown command");
            return false;
        };
        if pending.resolve.send(status).is_err() {
            debug!(
                agent_id = %pending.agent_id,
                action_id = %action_id,
                "Completion arrived after the caller gave up"
            );
        }
        true
    }

    /// Number of commands awaiting completion.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Route one frame received from an endpoint.
    pub async fn handle_inbound(&self, agent_id: &AgentId, message: WireMessage) {
        match message {
            WireMessage::Complete {
                action_id, status, ..
            } => {
                self.resolve(action_id, status).await;
            }
            WireMessage::Ack { action_id } => {
                debug!(agent_id = %agent_id, action_id = %action_id, "Command received by endpoint");
            }
            WireMessage::Pong => {
                if let Some(endpoint) = self.endpoints.lock().await.get_mut(agent_id) {
                    endpoint.last_pong = Some(Instant::now());
                }
            }
            WireMessage::Hello { .. } => {
                debug!(agent_id = %agent_id, "Ignoring repeated hello");
            }
            WireMessage::HelloAck { .. } | WireMessage::Command(_) | WireMessage::Ping => {
                debug!(agent_id = %agent_id, "Ignoring server-bound frame from endpoint");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Heartbeat
    // -----------------------------------------------------------------------

    /// Ping every endpoint once, dropping those whose channel is closed.
    ///
    /// Commands already in flight for a dropped endpoint are left alone;
    /// they end through their own timeouts.
    pub async fn heartbeat(&self) -> Vec<AgentId> {
        let mut endpoints = self.endpoints.lock().await;
        let mut dropped = Vec::new();
        for (agent_id, endpoint) in endpoints.iter() {
            match endpoint.outbound.try_send(WireMessage::Ping) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(agent_id = %agent_id, "Endpoint backlog full, skipping ping");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dropped.push(agent_id.clone()),
            }
        }
        for agent_id in &dropped {
            endpoints.remove(agent_id);
            warn!(agent_id = %agent_id, "Endpoint dropped after failed ping");
        }
        dropped
    }

    /// Run [`Dispatcher::heartbeat`] every `heartbeat_interval` until shutdown.
    pub fn spawn_heartbeat(self: &Arc<Self>) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(dispatcher.config.heartbeat_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        dispatcher.heartbeat().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Heartbeat stopped");
        })
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Close the dispatcher.
    ///
    /// Drops every endpoint (closing their transports) and every pending
    /// entry (failing their callers with [`DispatchError::Cancelled`]).
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.in_flight.close();
        let endpoints = std::mem::take(&mut *self.endpoints.lock().await);
        let pending = std::mem::take(&mut *self.pending.lock().await);
        info!(
            endpoints = endpoints.len(),
            pending = pending.len(),
            "Dispatcher shut down"
        );
    }

    /// Whether [`Dispatcher::shutdown`] has been called.
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolve once the dispatcher shuts down.
    pub async fn closed(&self) {
        let mut shutdown = self.shutdown.subscribe();
        while !*shutdown.borrow_and_update() {
            if shutdown.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Roughly thirty years out, for deadlines too large to represent.
fn far_future() -> Instant {
    Instant::now()
        .checked_add(Duration::from_secs(946_080_000))
        .unwrap_or_else(Instant::now)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
