// SPDX-License-Identifier: MIT

//! One method per order kind. Each returns the JSON result embedded in the
//! completion payload, or a human-readable failure message; `appliance-sync`
//! posts the completion either way.

use appliance_core::{Finding, HostId, OneShotRegistry};
use appliance_deploy::DeployOrchestrator;
use appliance_discovery::HostIdentityRegistry;
use appliance_router::HealingRouter;
use appliance_scanner::{EvidenceSigner, ScanOrchestrator, ScanTargets};
use appliance_storage::SigningKey;
use appliance_sync::{OrderHandlers, RebuildCoordinator};
use appliance_transport::executor::{ExecuteRequest, Phase, RemoteExecutor};
use appliance_wire::checkin::{ApplianceMode, SubscriptionState};
use appliance_wire::OrderDto;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::credential_store::FleetRegistry;
use crate::rules_loader::{self, RuleDirs};
use crate::AppClock;

/// Commands `collect_diagnostic` may run. Anything else is rejected before
/// it ever reaches a shell.
const DIAGNOSTIC_WHITELIST: &[&str] = &["ipconfig /all", "systeminfo", "Get-Service", "df -h", "uname -a", "journalctl -n 200"];

pub struct DaemonOrderHandlers {
    pub state_dir: PathBuf,
    pub rule_engine: Arc<appliance_rules::RuleEngine<AppClock>>,
    pub bundle_verifier: Arc<appliance_rules::BundleVerifier>,
    pub scan_orchestrator: Arc<ScanOrchestrator<AppClock>>,
    pub scan_targets: Arc<RwLock<ScanTargets>>,
    pub fleet: Arc<FleetRegistry>,
    pub evidence_signer: Arc<dyn EvidenceSigner>,
    pub deploy_orchestrator: Arc<DeployOrchestrator<AppClock>>,
    pub rebuild_coordinator: Arc<RebuildCoordinator<AppClock>>,
    pub direct_executor: Arc<RemoteExecutor>,
    pub local_shell: Arc<dyn appliance_scanner::LocalShell>,
    pub healing_router: Arc<HealingRouter<AppClock>>,
    pub identities: Arc<HostIdentityRegistry>,
    pub signing_key: Arc<SigningKey>,
    pub one_shots: Arc<OneShotRegistry>,
    pub scan_cancel: CancellationToken,
    pub checkin_requested: Arc<Notify>,
    pub mode_state: Arc<RwLock<(ApplianceMode, SubscriptionState)>>,
    pub http: reqwest::Client,
}

impl DaemonOrderHandlers {
    fn rule_dirs(&self) -> RuleDirs {
        RuleDirs::new(&self.state_dir)
    }

    fn reload_rules(&self) -> Result<usize, String> {
        let rules = rules_loader::load_all(&self.rule_dirs(), &self.bundle_verifier)?;
        let count = rules.len();
        self.rule_engine.reload(rules);
        Ok(count)
    }

    async fn run_direct(&self, host_id: HostId, script: &str) -> Result<String, String> {
        let Some((target, credential)) = self.fleet.get(&host_id) else {
            return Err(format!("no fleet entry for host {host_id}"));
        };
        let request = ExecuteRequest {
            target: &target,
            credential: &credential,
            script,
            runbook_id: None,
            phase: Phase::Custom,
            timeout: Duration::from_secs(60),
            max_retries: 1,
            backoff_base_s: 2,
        };
        let result = self.direct_executor.execute(request).await;
        if result.is_success() {
            Ok(result.std_out().unwrap_or_default().to_string())
        } else {
            Err(result.error_kind().map(|kind| kind.to_string()).unwrap_or_else(|| "execution failed".to_string()))
        }
    }

    fn host_id_param(params: &Value) -> Result<HostId, String> {
        params
            .get("host_id")
            .and_then(Value::as_str)
            .map(HostId::from)
            .ok_or_else(|| "missing host_id parameter".to_string())
    }
}

#[async_trait]
impl OrderHandlers for DaemonOrderHandlers {
    async fn force_checkin(&self) -> Result<Value, String> {
        self.checkin_requested.notify_one();
        Ok(json!({ "scheduled": true }))
    }

    async fn trigger_drift_scan(&self) -> Result<Value, String> {
        let targets = self.scan_targets.read();
        let credentials = self
            .fleet
            .host_ids()
            .into_iter()
            .filter_map(|host_id| self.fleet.get(&host_id).map(|(_, credential)| (host_id, credential)))
            .collect();
        let result = self.scan_orchestrator.run_cycle(&targets, &credentials, self.evidence_signer.as_ref(), &self.scan_cancel).await;
        Ok(json!({ "findings": result.findings.len(), "cancelled": result.cancelled }))
    }

    async fn sync_rules(&self, params: &Value) -> Result<Value, String> {
        write_bundle_file(&self.rule_dirs().synced, params)?;
        let count = self.reload_rules()?;
        Ok(json!({ "rule_count": count }))
    }

    async fn restart_agent(&self, params: &Value) -> Result<Value, String> {
        let host_id = Self::host_id_param(params)?;
        let output = self.run_direct(host_id, "Restart-Service -Name ApplianceAgent").await?;
        Ok(json!({ "restarted": true, "output": output }))
    }

    async fn rebuild_os(&self, order: &OrderDto) -> Result<Value, String> {
        let previous_system = order.params.get("previous_system").and_then(Value::as_str).unwrap_or("unknown");
        let flake_ref = order.params.get("flake_ref").and_then(Value::as_str).ok_or("missing flake_ref parameter")?;

        self.rebuild_coordinator.begin(order, previous_system, flake_ref).map_err(|err| err.to_string())?;

        let script = format!("nixos-rebuild switch --flake {flake_ref} && systemctl reboot");
        self.local_shell.run(&script, Duration::from_secs(600)).await?;
        Ok(json!({ "rebuild_started": true }))
    }

    async fn update_agent(&self, params: &Value) -> Result<Value, String> {
        let host_id = Self::host_id_param(params)?;
        let version = params.get("version").and_then(Value::as_str).unwrap_or("latest");
        let url = params.get("url").and_then(Value::as_str).ok_or("missing url parameter")?;

        let script = format!("Invoke-WebRequest -Uri \"{url}\" -OutFile \"C:\\Program Files\\ApplianceAgent\\agent.exe\"\nRestart-Service -Name ApplianceAgent");
        self.run_direct(host_id, &script).await?;
        Ok(json!({ "updated_to": version }))
    }

    async fn update_iso(&self, params: &Value) -> Result<Value, String> {
        let url = params.get("url").and_then(Value::as_str).ok_or("missing url parameter")?;
        let filename = params.get("filename").and_then(Value::as_str).unwrap_or("appliance.iso");

        let response = self.http.get(url).send().await.map_err(|err| err.to_string())?;
        let bytes = response.bytes().await.map_err(|err| err.to_string())?;
        let iso_dir = self.state_dir.join("iso");
        std::fs::create_dir_all(&iso_dir).map_err(|err| err.to_string())?;
        std::fs::write(iso_dir.join(filename), &bytes).map_err(|err| err.to_string())?;
        Ok(json!({ "bytes_written": bytes.len() }))
    }

    async fn collect_diagnostic(&self, params: &Value) -> Result<Value, String> {
        let command = params.get("command").and_then(Value::as_str).ok_or("missing command parameter")?;
        if !DIAGNOSTIC_WHITELIST.contains(&command) {
            return Err(format!("command {command:?} is not on the diagnostic whitelist"));
        }
        let output = self.local_shell.run(command, Duration::from_secs(30)).await?;
        Ok(json!({ "output": output }))
    }

    async fn sensor_lifecycle(&self, params: &Value) -> Result<Value, String> {
        let host_id = Self::host_id_param(params)?;
        let action = params.get("action").and_then(Value::as_str).unwrap_or("enable");
        let script = match action {
            "disable" => "Stop-Service -Name ApplianceAgent",
            _ => "Start-Service -Name ApplianceAgent",
        };
        self.run_direct(host_id, script).await?;
        Ok(json!({ "action": action }))
    }

    async fn promoted_rule_sync(&self, params: &Value) -> Result<Value, String> {
        let contents = params.get("yaml").and_then(Value::as_str).ok_or("missing yaml parameter")?;
        let name = params.get("name").and_then(Value::as_str).unwrap_or("promoted.yaml");
        let dirs = self.rule_dirs();
        std::fs::create_dir_all(&dirs.promoted).map_err(|err| err.to_string())?;
        std::fs::write(dirs.promoted.join(name), contents).map_err(|err| err.to_string())?;
        let count = self.reload_rules()?;
        Ok(json!({ "rule_count": count }))
    }

    async fn healing_run(&self, params: &Value) -> Result<Value, String> {
        let finding: Finding = serde_json::from_value(params.clone()).map_err(|err| err.to_string())?;
        let (mode, subscription) = *self.mode_state.read();
        let disposition = self.healing_router.route(finding, mode, subscription).await;
        Ok(json!({ "disposition": disposition.as_str() }))
    }

    async fn credential_refresh(&self, params: &Value) -> Result<Value, String> {
        let entries: Vec<appliance_wire::TargetDto> = serde_json::from_value(
            params.get("targets").cloned().ok_or("missing targets parameter")?,
        )
        .map_err(|err| err.to_string())?;

        let mut map = (*self.fleet.snapshot()).clone();
        let mut refreshed = 0usize;
        for dto in entries {
            if let Some((target, credential)) = appliance_sync::lift_target(dto, &self.identities) {
                map.insert(target.host_id, (target, credential));
                refreshed += 1;
            }
        }
        self.fleet.replace(map);
        Ok(json!({ "refreshed": refreshed }))
    }
}

fn write_bundle_file(dir: &std::path::Path, params: &Value) -> Result<(), String> {
    let bundle = params.get("bundle").ok_or("missing bundle parameter")?;
    std::fs::create_dir_all(dir).map_err(|err| err.to_string())?;
    let name = format!("synced-{}.json", params.get("bundle_id").and_then(Value::as_str).unwrap_or("latest"));
    let bytes = serde_json::to_vec(bundle).map_err(|err| err.to_string())?;
    std::fs::write(dir.join(name), bytes).map_err(|err| err.to_string())
}
