// SPDX-License-Identifier: MIT

//! Ties dispatch, parsing, and check mapping into one scan cycle: select
//! targets, probe each, parse and map to findings, and package the result
//! into a signed evidence bundle — honoring cancellation throughout.

use crate::checks::{linux_check_specs, windows_check_specs, CheckSpec};
use crate::dispatch::ScanDispatcher;
use crate::evidence::{EvidenceBundle, EvidenceSigner};
use crate::mapping::emit_findings;
use crate::parse::parse_probe_output;
use appliance_core::{Clock, Credential, ExecutionResult, Finding, HostId, Platform, Target};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// The comprehensive probe scripts run per platform. Script bodies
/// themselves are opaque to this crate, same as everywhere else a remote
/// script is submitted through `appliance-transport`.
pub struct ScanScripts {
    pub self_host: String,
    pub windows: String,
    pub linux: String,
}

pub struct ScanTargets {
    pub directory_server: Target,
    pub workstations: Vec<Target>,
}

pub struct ScanCycleResult {
    pub findings: Vec<Finding>,
    pub evidence: EvidenceBundle,
    /// True if a cancellation was observed mid-cycle; `findings` then holds
    /// only what was emitted before the cancellation took effect.
    pub cancelled: bool,
}

pub struct ScanOrchestrator<C: Clock> {
    dispatcher: Arc<ScanDispatcher>,
    scripts: ScanScripts,
    clock: C,
    self_host_id: HostId,
    /// The real OS family the appliance itself runs on, used to pick the
    /// right check contract for its own probe (its `Target`-facing platform
    /// tag is [`Platform::SelfHost`], which has no check contract of its own).
    self_host_platform: Platform,
}

impl<C: Clock> ScanOrchestrator<C> {
    pub fn new(dispatcher: Arc<ScanDispatcher>, scripts: ScanScripts, clock: C, self_host_id: HostId, self_host_platform: Platform) -> Self {
        Self { dispatcher, scripts, clock, self_host_id, self_host_platform }
    }

    pub async fn run_cycle(
        &self,
        targets: &ScanTargets,
        credentials: &HashMap<HostId, Credential>,
        signer: &dyn EvidenceSigner,
        cancel: &CancellationToken,
    ) -> ScanCycleResult {
        self.dispatcher.begin_cycle();
        let mut findings = Vec::new();
        let mut cancelled = false;

        if !cancel.is_cancelled() {
            findings.extend(self.scan_self().await);
        } else {
            cancelled = true;
        }

        if !cancelled && !cancel.is_cancelled() {
            if let Some(credential) = credentials.get(&targets.directory_server.host_id) {
                findings.extend(self.scan_directory_server(&targets.directory_server, credential).await);
            } else {
                warn!(host_id = %targets.directory_server.host_id, "no credential for directory server, skipping scan");
            }
        }

        if !cancelled {
            for workstation in &targets.workstations {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let Some(credential) = credentials.get(&workstation.host_id) else {
                    warn!(host_id = %workstation.host_id, "no credential for workstation, skipping scan");
                    continue;
                };
                findings.extend(self.scan_workstation(&targets.directory_server, workstation, credential).await);
            }
        }

        let evidence = self.package_evidence(findings.clone(), signer).await;
        ScanCycleResult { findings, evidence, cancelled }
    }

    async fn package_evidence(&self, findings: Vec<Finding>, signer: &dyn EvidenceSigner) -> EvidenceBundle {
        let now = self.clock.epoch_ms();
        let unsigned = EvidenceBundle::new(now, findings);
        let digest = unsigned.digest.clone();
        match unsigned.sign(signer).await {
            Ok(signed) => signed,
            Err(err) => {
                warn!(%err, %digest, "evidence bundle signing failed, posting unsigned");
                EvidenceBundle { signature: None, ..EvidenceBundle::new(now, Vec::new()) }
            }
        }
    }

    async fn scan_self(&self) -> Vec<Finding> {
        match self.dispatcher.run_self(&self.scripts.self_host).await {
            Ok(raw) => self.findings_from_raw(&raw, self.self_host_id, &self.check_specs(self.self_host_platform), Platform::SelfHost),
            Err(err) => {
                warn!(%err, "self-host probe failed, zero findings this cycle");
                Vec::new()
            }
        }
    }

    async fn scan_directory_server(&self, target: &Target, credential: &Credential) -> Vec<Finding> {
        let script = self.script_for(target.platform);
        let result = self.dispatcher.run_directory_server(target, credential, script).await;
        self.findings_from_result(result, target)
    }

    async fn scan_workstation(&self, proxy_target: &Target, target: &Target, credential: &Credential) -> Vec<Finding> {
        let script = self.script_for(target.platform);
        let result = self.dispatcher.run_workstation(proxy_target, target, credential, script).await;
        self.findings_from_result(result, target)
    }

    fn script_for(&self, platform: Platform) -> &str {
        match platform {
            Platform::Windows => &self.scripts.windows,
            Platform::Linux => &self.scripts.linux,
            Platform::SelfHost => &self.scripts.self_host,
        }
    }

    fn check_specs(&self, platform: Platform) -> Vec<CheckSpec> {
        match platform {
            Platform::Linux => linux_check_specs(),
            Platform::Windows | Platform::SelfHost => windows_check_specs(),
        }
    }

    fn findings_from_result(&self, result: ExecutionResult, target: &Target) -> Vec<Finding> {
        match result.std_out() {
            Some(raw) => self.findings_from_raw(raw, target.host_id, &self.check_specs(target.platform), target.platform),
            None => {
                warn!(host_id = %target.host_id, "probe execution failed, zero findings this cycle");
                Vec::new()
            }
        }
    }

    fn findings_from_raw(&self, raw: &str, host_id: HostId, specs: &[CheckSpec], report_platform: Platform) -> Vec<Finding> {
        match parse_probe_output(raw, report_platform) {
            Ok(captured) => emit_findings(specs, &captured, host_id, report_platform),
            Err(err) => {
                warn!(%host_id, %err, "probe output failed to parse, zero findings this cycle");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
