// SPDX-License-Identifier: MIT

//! Orchestrates a discovery pass: enumerate, resolve missing addresses,
//! probe reachability, and return targets reachable-first.

use crate::identity::HostIdentityRegistry;
use crate::probe::probe_reachable;
use crate::query::{DirectoryQuery, DiscoveryError};
use appliance_core::{Target, TrustFlags};
use std::sync::Arc;
use tracing::warn;

pub struct DiscoveryResult {
    pub reachable: Vec<Target>,
    pub proxy_only: Vec<Target>,
}

impl DiscoveryResult {
    /// The combined set handed to downstream consumers: reachable targets
    /// first, proxy-only appended.
    pub fn ordered(self) -> Vec<Target> {
        let mut all = self.reachable;
        all.extend(self.proxy_only);
        all
    }
}

pub struct TargetDiscovery {
    query: Arc<dyn DirectoryQuery>,
    identities: Arc<HostIdentityRegistry>,
}

impl TargetDiscovery {
    pub fn new(query: Arc<dyn DirectoryQuery>, identities: Arc<HostIdentityRegistry>) -> Self {
        Self { query, identities }
    }

    pub async fn discover(&self) -> Result<DiscoveryResult, DiscoveryError> {
        let entries = self.query.enumerate().await?;
        let mut reachable = Vec::new();
        let mut proxy_only = Vec::new();

        for entry in entries {
            let address = match &entry.address {
                Some(address) => address.clone(),
                None => match self.query.resolve_address(&entry).await {
                    Ok(address) => address,
                    Err(err) => {
                        warn!(external_id = %entry.external_id, %err, "address resolution failed, skipping host");
                        continue;
                    }
                },
            };

            let host_id = self.identities.resolve_or_mint(&entry.external_id);
            let port = Target::default_port(entry.platform);
            let target = Target::new(host_id, address.clone(), port, entry.platform).with_trust(TrustFlags::default());

            if probe_reachable(&address, port).await {
                reachable.push(target);
            } else {
                proxy_only.push(target);
            }
        }

        Ok(DiscoveryResult { reachable, proxy_only })
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
