// SPDX-License-Identifier: MIT

//! Maps a directory service's own identity for an object (its distinguished
//! name or object GUID) to the stable `HostId` this appliance uses
//! everywhere downstream. A `HostId` is minted exactly once per external
//! identity and reused on every later discovery cycle that sees the same
//! object, so cooldowns, deploy state, and flap windows never get split
//! across two identities for what central and the directory agree is one
//! host.

use appliance_core::HostId;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct HostIdentityRegistry {
    by_external_id: RwLock<HashMap<String, HostId>>,
}

impl HostIdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_or_mint(&self, external_id: &str) -> HostId {
        if let Some(existing) = self.by_external_id.read().get(external_id) {
            return *existing;
        }
        let mut map = self.by_external_id.write();
        *map.entry(external_id.to_string()).or_insert_with(HostId::new)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
