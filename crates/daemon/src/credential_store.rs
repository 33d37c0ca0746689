// SPDX-License-Identifier: MIT

//! Pointer-swap fleet state: the current target/credential map is an
//! `Arc<HashMap<..>>` behind a `parking_lot::RwLock`, so readers on the
//! healing/scan hot paths never block a checkin-triggered refresh.

use appliance_core::{Credential, HostId, Target};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct FleetRegistry {
    entries: RwLock<Arc<HashMap<HostId, (Target, Credential)>>>,
}

impl FleetRegistry {
    pub fn new() -> Self {
        Self { entries: RwLock::new(Arc::new(HashMap::new())) }
    }

    /// Atomically replaces the whole fleet map, e.g. after a checkin response.
    pub fn replace(&self, entries: HashMap<HostId, (Target, Credential)>) {
        *self.entries.write() = Arc::new(entries);
    }

    pub fn snapshot(&self) -> Arc<HashMap<HostId, (Target, Credential)>> {
        self.entries.read().clone()
    }

    pub fn get(&self, host_id: &HostId) -> Option<(Target, Credential)> {
        self.entries.read().get(host_id).cloned()
    }

    pub fn host_ids(&self) -> Vec<HostId> {
        self.entries.read().keys().cloned().collect()
    }
}
