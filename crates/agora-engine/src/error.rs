//! Error types for the game server binary.

use agora_core::bootstrap::BootstrapError;
use agora_core::config::ConfigError;
use agora_dispatch::{DispatchError, ServerError};

/// Top-level error for the game server.
///
/// Each variant wraps the failure of one startup step so `main` can
/// propagate them with `?` and attach context.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Building the world or players failed.
    #[error("bootstrap error: {source}")]
    Bootstrap {
        /// The underlying bootstrap error.
        #[from]
        source: BootstrapError,
    },

    /// The dispatch server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },

    /// Frontend endpoints never connected.
    #[error("dispatch error: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: DispatchError,
    },

    /// The HTTP planner client could not be built.
    #[error("planner bridge error: {message}")]
    Planner {
        /// Description of the failure.
        message: String,
    },
}
