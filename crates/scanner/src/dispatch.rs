// SPDX-License-Identifier: MIT

//! Per-target probe dispatch: direct execution first, with workstations
//! falling through to the proxy executor on failure. The appliance's own
//! host runs its probe through a local shell rather than any transport.

use appliance_core::{Credential, ExecutionResult, Target};
use appliance_transport::{ExecuteRequest, Phase, ProxyExecutor, RemoteExecutor, StickyFailureSet, TierCache};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// The appliance's own probe execution path: no network transport involved.
#[async_trait]
pub trait LocalShell: Send + Sync {
    async fn run(&self, script: &str, timeout: Duration) -> Result<String, String>;
}

pub struct ScanDispatcher {
    direct: Arc<RemoteExecutor>,
    proxy: Arc<ProxyExecutor>,
    tier_cache: Arc<TierCache>,
    sticky: Arc<StickyFailureSet>,
    local_shell: Arc<dyn LocalShell>,
    timeout: Duration,
    max_retries: u32,
    backoff_base_s: u64,
}

impl ScanDispatcher {
    pub fn new(
        direct: Arc<RemoteExecutor>,
        proxy: Arc<ProxyExecutor>,
        tier_cache: Arc<TierCache>,
        sticky: Arc<StickyFailureSet>,
        local_shell: Arc<dyn LocalShell>,
        timeout: Duration,
    ) -> Self {
        Self { direct, proxy, tier_cache, sticky, local_shell, timeout, max_retries: 2, backoff_base_s: 2 }
    }

    /// Clears the per-cycle sticky-failure set. Called once at the start of
    /// every scan cycle so a target that failed direct execution last cycle
    /// gets a fresh attempt this cycle.
    pub fn begin_cycle(&self) {
        self.sticky.reset();
    }

    pub async fn run_self(&self, script: &str) -> Result<String, String> {
        self.local_shell.run(script, self.timeout).await
    }

    /// The directory server is itself the proxy's intermediary, so its own
    /// probe runs direct-only: there is nothing further to fall back to.
    pub async fn run_directory_server(&self, target: &Target, credential: &Credential, script: &str) -> ExecutionResult {
        self.direct.execute(self.request(target, credential, script)).await
    }

    /// Workstation probes run direct first; any failure (auth, timeout,
    /// unreachable) falls through to the proxy executor for the remainder
    /// of this cycle. A successful direct attempt clears the proxy tier
    /// cache for this host, since it demonstrates direct access works again.
    pub async fn run_workstation(&self, proxy_target: &Target, target: &Target, credential: &Credential, script: &str) -> ExecutionResult {
        if !self.sticky.is_marked(target.host_id) {
            let result = self.direct.execute(self.request(target, credential, script)).await;
            if result.is_success() {
                self.tier_cache.clear(target.host_id);
                return result;
            }
            self.sticky.mark(target.host_id);
        }

        let (result, _tier) = self
            .proxy
            .execute_via_proxy(proxy_target, target.host_id, &target.address, credential, script, self.timeout)
            .await;
        result
    }

    fn request<'a>(&self, target: &'a Target, credential: &'a Credential, script: &'a str) -> ExecuteRequest<'a> {
        ExecuteRequest {
            target,
            credential,
            script,
            runbook_id: None,
            phase: Phase::Probe,
            timeout: self.timeout,
            max_retries: self.max_retries,
            backoff_base_s: self.backoff_base_s,
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
