// SPDX-License-Identifier: MIT

//! Telemetry/dashboard POSTs and the firewall/GPO root-cause fix, run as
//! background side effects the router never awaits. The GPO fix is gated by
//! `OneShotRegistry` so one directory server is only ever nudged once per
//! process lifetime, then a plain policy refresh targets the affected host.

use appliance_core::{HostId, Incident, OneShotRegistry};
use appliance_router::{Disposition, HealingSideEffects};
use appliance_transport::executor::{ExecuteRequest, Phase, RemoteExecutor};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::credential_store::FleetRegistry;

const GPO_FIX_SCRIPT: &str = include_str!("../../scripts/gpo_firewall_fix.ps1");
const GPO_REFRESH_HOST_SCRIPT: &str = include_str!("../../scripts/gpo_refresh_host.ps1");
const GPO_FIX_ONESHOT_SCOPE: &str = "firewall-gpo-fix";

#[derive(Serialize)]
struct TelemetryRecord<'a> {
    incident_id: &'a str,
    host_id: String,
    check_id: &'a str,
    severity: String,
    disposition: &'static str,
    first_seen_epoch_ms: u64,
    flap_count: u32,
}

#[derive(Serialize)]
struct IncidentNotification<'a> {
    incident_id: &'a str,
    host_id: String,
    check_id: &'a str,
    disposition: &'static str,
    resolved: bool,
}

pub struct HttpSideEffects {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    direct: Arc<RemoteExecutor>,
    fleet: Arc<FleetRegistry>,
    one_shots: Arc<OneShotRegistry>,
    directory_server_id: HostId,
}

impl HttpSideEffects {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        direct: Arc<RemoteExecutor>,
        fleet: Arc<FleetRegistry>,
        one_shots: Arc<OneShotRegistry>,
        directory_server_id: HostId,
    ) -> Self {
        Self { http, base_url: base_url.into(), api_key: api_key.into(), direct, fleet, one_shots, directory_server_id }
    }

    async fn post(&self, path: &str, body: &impl Serialize) {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let result = self.http.post(&url).bearer_auth(&self.api_key).json(body).send().await;
        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(%url, status = %response.status(), "side-effect post rejected");
            }
            Err(err) => tracing::warn!(%url, error = %err, "side-effect post failed"),
            Ok(_) => {}
        }
    }
}

#[async_trait]
impl HealingSideEffects for HttpSideEffects {
    async fn record_telemetry(&self, incident: &Incident, disposition: Disposition) {
        let record = TelemetryRecord {
            incident_id: incident.id.0.as_str(),
            host_id: incident.host_id.to_string(),
            check_id: incident.check_id.as_str(),
            severity: incident.severity.to_string(),
            disposition: disposition.as_str(),
            first_seen_epoch_ms: incident.first_seen_epoch_ms,
            flap_count: incident.flap_count,
        };
        self.post("/api/telemetry", &record).await;
    }

    async fn notify_dashboard(&self, incident: &Incident, disposition: Disposition) {
        let resolved = matches!(disposition, Disposition::HealedL1 | Disposition::HealedL2);
        let path = if resolved { "/incidents/resolve" } else { "/incidents" };
        let notification = IncidentNotification {
            incident_id: incident.id.0.as_str(),
            host_id: incident.host_id.to_string(),
            check_id: incident.check_id.as_str(),
            disposition: disposition.as_str(),
            resolved,
        };
        self.post(path, &notification).await;
    }

    async fn run_firewall_gpo_fix(&self, host_id: HostId) {
        let Some((directory_target, directory_credential)) = self.fleet.get(&self.directory_server_id) else {
            tracing::warn!("no directory server target available for firewall GPO fix");
            return;
        };

        let scope = self.directory_server_id.to_string();
        let outcome = self.one_shots.run_once(GPO_FIX_ONESHOT_SCOPE, &scope, || {
            Ok::<(), std::convert::Infallible>(())
        });
        if matches!(outcome, Ok(None)) {
            tracing::debug!(%host_id, "firewall GPO fix already applied this run, skipping directory-server step");
        } else {
            let request = ExecuteRequest {
                target: &directory_target,
                credential: &directory_credential,
                script: GPO_FIX_SCRIPT,
                runbook_id: None,
                phase: Phase::Remediate,
                timeout: Duration::from_secs(60),
                max_retries: 1,
                backoff_base_s: 2,
            };
            let result = self.direct.execute(request).await;
            if !result.is_success() {
                tracing::warn!(%host_id, "directory server GPO fix failed");
                self.one_shots.invalidate(GPO_FIX_ONESHOT_SCOPE, &scope);
            }
        }

        if let Some((target, credential)) = self.fleet.get(&host_id) {
            let request = ExecuteRequest {
                target: &target,
                credential: &credential,
                script: GPO_REFRESH_HOST_SCRIPT,
                runbook_id: None,
                phase: Phase::Remediate,
                timeout: Duration::from_secs(60),
                max_retries: 1,
                backoff_base_s: 2,
            };
            let _ = self.direct.execute(request).await;
        }
    }
}
