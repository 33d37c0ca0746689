// SPDX-License-Identifier: MIT

//! Per-host deploy state machine:
//!
//! ```text
//! unseen -> attempting -> installed(timestamp)
//!            |
//!          failed(count) -> [count >= N] -> escalated(backoff_until)
//!                                               | after backoff window
//!                                            attempting
//! ```

use appliance_core::HostId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployState {
    Unseen,
    Attempting,
    Installed { installed_epoch_ms: u64 },
    Failed { count: u32 },
    Escalated { backoff_until_epoch_ms: u64 },
}

impl DeployState {
    /// Whether a deploy attempt may run now, given the current state and the
    /// clock. `Escalated` blocks until its backoff window elapses.
    pub fn may_attempt(self, now_epoch_ms: u64) -> bool {
        match self {
            DeployState::Escalated { backoff_until_epoch_ms } => now_epoch_ms >= backoff_until_epoch_ms,
            DeployState::Installed { .. } => false,
            _ => true,
        }
    }
}

#[derive(Debug, Default)]
pub struct DeployStateTable {
    states: Mutex<HashMap<HostId, DeployState>>,
}

impl DeployStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, host_id: HostId) -> DeployState {
        self.states.lock().get(&host_id).copied().unwrap_or(DeployState::Unseen)
    }

    pub fn set(&self, host_id: HostId, state: DeployState) {
        self.states.lock().insert(host_id, state);
    }

    /// Records a failed attempt, escalating once `count >= max_failures`.
    pub fn record_failure(&self, host_id: HostId, max_failures: u32, now_epoch_ms: u64, backoff_ms: u64) -> DeployState {
        let mut states = self.states.lock();
        let count = match states.get(&host_id) {
            Some(DeployState::Failed { count }) => count + 1,
            _ => 1,
        };
        let next = if count >= max_failures {
            DeployState::Escalated { backoff_until_epoch_ms: now_epoch_ms + backoff_ms }
        } else {
            DeployState::Failed { count }
        };
        states.insert(host_id, next);
        next
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
