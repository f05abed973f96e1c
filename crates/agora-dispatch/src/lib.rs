//! Command/acknowledgment correlation for the Agora trading simulation.
//!
//! Every externally confirmed action becomes one `command` frame sent to
//! the frontend endpoint that renders the agent, and exactly one
//! `complete` frame (or a timeout) ends it. This crate provides:
//!
//! - **[`Dispatcher`]**: the correlation core. It owns the pending-command
//!   map keyed by `action_id`, the registry of connected endpoints, the
//!   admission semaphore for in-flight commands, and the heartbeat.
//! - **`WebSocket` transport** (`GET /ws`): adapts one socket per endpoint
//!   onto the dispatcher. The dispatcher itself never touches sockets, so
//!   tests drive it through in-process channels.
//!
//! # Modules
//!
//! - [`dispatcher`] -- Pending map, endpoint registry, heartbeat
//! - [`error`] -- Dispatch failures
//! - [`loopback`] -- In-process endpoint for headless runs
//! - [`router`] -- Axum router
//! - [`server`] -- Listener lifecycle
//! - [`ws`] -- Socket-to-dispatcher adapter

pub mod dispatcher;
pub mod error;
pub mod loopback;
pub mod router;
pub mod server;
pub mod ws;

pub use dispatcher::{Ack, DispatchConfig, Dispatcher, Registration};
pub use error::DispatchError;
pub use loopback::Loopback;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, spawn_server, start_server};
