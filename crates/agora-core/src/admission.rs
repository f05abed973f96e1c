//! Admission control: how many agents may run a cycle and how many
//! planner calls may be in flight at once.
//!
//! Outbound commands are bounded separately by the dispatcher.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Shared semaphores for agent cycles and planner calls.
#[derive(Debug, Clone)]
pub struct Admission {
    agents: Arc<Semaphore>,
    planner: Arc<Semaphore>,
}

impl Admission {
    /// Allow `agents` concurrent cycles and `planner_calls` concurrent planner requests.
    ///
    /// Zero limits are raised to one so nothing can deadlock.
    pub fn new(agents: usize, planner_calls: usize) -> Self {
        Self {
            agents: Arc::new(Semaphore::new(agents.max(1))),
            planner: Arc::new(Semaphore::new(planner_calls.max(1))),
        }
    }

    /// Wait for a cycle slot. `None` once admission is closed.
    pub async fn agent(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.agents).acquire_owned().await.ok()
    }

    /// Wait for a planner slot. `None` once admission is closed.
    pub async fn planner(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.planner).acquire_owned().await.ok()
    }

    /// Refuse all further permits and wake every waiter.
    pub fn close(&self) {
        self.agents.close();
        self.planner.close();
    }

    /// Cycle slots currently free.
    pub fn available_agents(&self) -> usize {
        self.agents.available_permits()
    }
}
