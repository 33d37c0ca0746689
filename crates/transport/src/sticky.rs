// SPDX-License-Identifier: MIT

//! Per-cycle sticky failure tracking. An `auth_failed` or `dns_not_found`
//! result against a target is sticky for the remainder of the current scan
//! cycle: once recorded, the direct path is skipped for that target until
//! the next cycle clears the set.

use appliance_core::HostId;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct StickyFailureSet {
    hosts: RwLock<HashSet<HostId>>,
}

impl StickyFailureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, host_id: HostId) {
        self.hosts.write().insert(host_id);
    }

    pub fn is_marked(&self, host_id: HostId) -> bool {
        self.hosts.read().contains(&host_id)
    }

    /// Called once at the start of each scan cycle.
    pub fn reset(&self) {
        self.hosts.write().clear();
    }
}

#[cfg(test)]
#[path = "sticky_tests.rs"]
mod tests;
