// SPDX-License-Identifier: MIT

//! Side effects the router fans out to background tasks. The router never
//! awaits any of these — see [`crate::router::HealingRouter`]'s concurrency
//! note — it only constructs the future and hands it to a
//! [`appliance_core::BackgroundSpawner`].

use crate::router::Disposition;
use appliance_core::{HostId, Incident};
use async_trait::async_trait;

/// Telemetry, dashboard, and root-cause-fix side effects. Implemented by the
/// daemon binary, which has the wiring (HTTP client, directory-server
/// identity, one-shot registry) none of this crate needs to know about.
#[async_trait]
pub trait HealingSideEffects: Send + Sync {
    /// Posts a telemetry record for one finished incident disposition.
    async fn record_telemetry(&self, incident: &Incident, disposition: Disposition);

    /// `POST /incidents` / `POST /incidents/resolve` dual-write so the
    /// operator dashboard has a complete trail even when remediation
    /// succeeded silently.
    async fn notify_dashboard(&self, incident: &Incident, disposition: Disposition);

    /// Firewall-status-specific root-cause fix: runs a one-shot script on
    /// the directory server to correct the inherited group policy, gated so
    /// it runs at most once per directory server for the process lifetime,
    /// then forces a policy refresh on `host_id`. A no-op if this host's
    /// directory server already had its fix applied this run.
    async fn run_firewall_gpo_fix(&self, host_id: HostId);
}

/// Drops every side effect. Useful for tests and for a dry-run daemon that
/// hasn't wired a dashboard client yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSideEffects;

#[async_trait]
impl HealingSideEffects for NullSideEffects {
    async fn record_telemetry(&self, _incident: &Incident, _disposition: Disposition) {}
    async fn notify_dashboard(&self, _incident: &Incident, _disposition: Disposition) {}
    async fn run_firewall_gpo_fix(&self, _host_id: HostId) {}
}
