// SPDX-License-Identifier: MIT

//! The directory-service query seam. A concrete implementation runs the
//! prepared enumeration/address-resolution scripts through
//! `appliance-transport`'s remote executor against the directory server;
//! this crate only needs the parsed results.

use appliance_core::Platform;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("directory query failed: {0}")]
    QueryFailed(String),
    #[error("address resolution failed for {external_id}: {reason}")]
    AddressResolutionFailed { external_id: String, reason: String },
}

/// One raw object as the directory service's enumeration script reports it,
/// before a stable `HostId` has been assigned.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub external_id: String,
    pub hostname: String,
    /// Known address, if the enumeration script already resolved one.
    pub address: Option<String>,
    pub platform: Platform,
}

#[async_trait]
pub trait DirectoryQuery: Send + Sync {
    async fn enumerate(&self) -> Result<Vec<DirectoryEntry>, DiscoveryError>;

    /// Resolves a network address for an entry the enumeration script
    /// couldn't resolve directly.
    async fn resolve_address(&self, entry: &DirectoryEntry) -> Result<String, DiscoveryError>;
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
