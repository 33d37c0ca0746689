// SPDX-License-Identifier: MIT

//! Dispatches a matched rule's lifted [`Action`] against the fleet. Plain
//! scripts and root-cause fixes both run through the same direct-then-proxy
//! path the drift scanner uses; `Escalate` and `ResetCounter` carry no
//! remote side effect of their own and report success so the router can
//! record the disposition.
//!
//! `Escalate`/`ResetCounter` having no remote action is a deliberate reading
//! of the open "what does a rule action actually execute" question: the
//! router already derives the L3 escalation and cooldown-reset behavior from
//! `Disposition`/`EngineOutcome`, so the executor's job for these two
//! variants is just to not fail.

use appliance_core::{Action, ErrorKind, ExecutionResult, HostId, Incident, Platform};
use appliance_rules::ActionExecutor;
use appliance_transport::executor::{ExecuteRequest, Phase, RemoteExecutor};
use appliance_transport::{ProxyExecutor, StickyFailureSet, TierCache};
use appliance_scanner::LocalShell;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::credential_store::FleetRegistry;

pub struct DaemonActionExecutor {
    fleet: Arc<FleetRegistry>,
    direct: Arc<RemoteExecutor>,
    proxy: Arc<ProxyExecutor>,
    tier_cache: Arc<TierCache>,
    sticky: Arc<StickyFailureSet>,
    local_shell: Arc<dyn LocalShell>,
    directory_server_id: HostId,
    self_host_id: HostId,
}

impl DaemonActionExecutor {
    pub fn new(
        fleet: Arc<FleetRegistry>,
        direct: Arc<RemoteExecutor>,
        proxy: Arc<ProxyExecutor>,
        tier_cache: Arc<TierCache>,
        sticky: Arc<StickyFailureSet>,
        local_shell: Arc<dyn LocalShell>,
        directory_server_id: HostId,
        self_host_id: HostId,
    ) -> Self {
        Self { fleet, direct, proxy, tier_cache, sticky, local_shell, directory_server_id, self_host_id }
    }

    async fn run_on_host(&self, host_id: HostId, script: &str) -> ExecutionResult {
        if host_id == self.self_host_id {
            return match self.local_shell.run(script, Duration::from_secs(120)).await {
                Ok(std_out) => ExecutionResult::success(std_out, 0),
                Err(message) => ExecutionResult::Failure { kind: ErrorKind::ScriptError, message, duration_ms: 0 },
            };
        }

        let Some((target, credential)) = self.fleet.get(&host_id) else {
            return ExecutionResult::Failure {
                kind: ErrorKind::NoRoute,
                message: format!("no fleet entry for host {host_id}"),
                duration_ms: 0,
            };
        };

        if self.sticky.is_marked(host_id) || target.platform != Platform::Linux {
            let directory_server = match self.fleet.get(&self.directory_server_id) {
                Some((proxy_target, _)) => proxy_target,
                None => {
                    return ExecutionResult::Failure {
                        kind: ErrorKind::NoRoute,
                        message: "directory server not in fleet registry".to_string(),
                        duration_ms: 0,
                    }
                }
            };
            let (result, tier) = self
                .proxy
                .execute_via_proxy(&directory_server, host_id, target.address.as_str(), &credential, script, Duration::from_secs(120))
                .await;
            if tier.is_none() {
                self.sticky.mark(host_id);
            }
            return result;
        }

        let request = ExecuteRequest {
            target: &target,
            credential: &credential,
            script,
            runbook_id: None,
            phase: Phase::Remediate,
            timeout: Duration::from_secs(120),
            max_retries: 2,
            backoff_base_s: 2,
        };
        let result = self.direct.execute(request).await;
        if let Some(kind) = result.error_kind() {
            if !kind.is_retryable() {
                self.sticky.mark(host_id);
                let _ = &self.tier_cache;
            }
        }
        result
    }
}

#[async_trait]
impl ActionExecutor for DaemonActionExecutor {
    async fn execute(&self, incident: &Incident, action: &Action) -> ExecutionResult {
        match action {
            Action::RunScript { script, params } => {
                let rendered = render_params(script, params);
                self.run_on_host(incident.host_id, &rendered).await
            }
            Action::RootCauseFix { command, explanation } => {
                let result = self.run_on_host(incident.host_id, command).await;
                tracing::info!(host_id = %incident.host_id, %explanation, "applied root cause fix");
                result
            }
            Action::Escalate { reason } => {
                tracing::info!(host_id = %incident.host_id, reason = ?reason, "rule requested escalation");
                ExecutionResult::success("ESCALATED", 0)
            }
            Action::ResetCounter => ExecutionResult::success("COUNTER_RESET", 0),
        }
    }
}

fn render_params(script: &str, params: &HashMap<String, String>) -> String {
    let mut rendered = script.to_string();
    for (key, value) in params {
        rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
    }
    rendered
}
