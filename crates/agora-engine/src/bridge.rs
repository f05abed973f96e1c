//! Planner backends the server can run with.
//!
//! Uses enum dispatch instead of trait objects because the [`Planner`]
//! methods are async and therefore not dyn-compatible.

use std::time::Duration;

use agora_core::config::PlannerConfig;
use agora_core::observation::Observation;
use agora_core::planner::{Planner, PlannerError, StubPlanner};

use crate::error::EngineError;

/// The planner selected from configuration.
#[derive(Debug)]
pub enum BridgePlanner {
    /// An external planning service reached over HTTP.
    Http(HttpPlanner),
    /// The built-in planner that never acts.
    Stub(StubPlanner),
}

impl BridgePlanner {
    /// Use the HTTP bridge when a base URL is configured, else the stub.
    pub fn from_config(config: &PlannerConfig) -> Result<Self, EngineError> {
        match config.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(Self::Http(HttpPlanner::new(
                url,
                Duration::from_millis(config.request_timeout_ms),
            )?)),
            _ => Ok(Self::Stub(StubPlanner::new())),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Stub(_) => "stub",
        }
    }
}

impl Planner for BridgePlanner {
    async fn plan(&self, observation: &Observation) -> Result<String, PlannerError> {
        match self {
            Self::Http(planner) => planner.call("plan", observation).await,
            Self::Stub(planner) => planner.plan(observation).await,
        }
    }

    async fn act(&self, observation: &Observation) -> Result<String, PlannerError> {
        match self {
            Self::Http(planner) => planner.call("act", observation).await,
            Self::Stub(planner) => planner.act(observation).await,
        }
    }

    async fn reflect(&self, observation: &Observation) -> Result<String, PlannerError> {
        match self {
            Self::Http(planner) => planner.call("reflect", observation).await,
            Self::Stub(planner) => planner.reflect(observation).await,
        }
    }
}

/// Posts observations to `{base_url}/plan`, `/act` and `/reflect`.
///
/// The response body is the planner text, passed through untouched.
#[derive(Debug)]
pub struct HttpPlanner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlanner {
    /// Create a client with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Planner {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn call(&self, phase: &str, observation: &Observation) -> Result<String, PlannerError> {
        let url = format!("{}/{phase}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(observation)
            .send()
            .await
            .map_err(|e| PlannerError::Internal {
                message: format!("{phase} request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_unreadable| "unable to read error body".to_owned());
            return Err(PlannerError::Internal {
                message: format!("{phase} returned {status}: {body}"),
            });
        }

        response.text().await.map_err(|e| PlannerError::Internal {
            message: format!("{phase} response unreadable: {e}"),
        })
    }
}
