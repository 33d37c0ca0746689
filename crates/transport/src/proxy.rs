// SPDX-License-Identifier: MIT

//! C2: the proxy executor. Runs a script on a workstation through a trusted
//! intermediary (typically the directory server) when direct execution is
//! blocked, working through a five-tier authentication ladder.

use crate::error::TransportError;
use crate::session::{RemoteSession, SessionOutput};
use appliance_core::{Credential, ErrorKind, ExecutionResult, HostId, Target};
use async_trait::async_trait;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthTier {
    Kerberos,
    Negotiate,
    IpTrustThenNegotiate,
    CimBootstrap,
    SecondaryRpcBootstrap,
}

appliance_core::simple_display! {
    AuthTier {
        Kerberos => "kerberos",
        Negotiate => "negotiate",
        IpTrustThenNegotiate => "ip_trust_then_negotiate",
        CimBootstrap => "cim_bootstrap",
        SecondaryRpcBootstrap => "secondary_rpc_bootstrap",
    }
}

impl AuthTier {
    pub const ORDER: [AuthTier; 5] = [
        AuthTier::Kerberos,
        AuthTier::Negotiate,
        AuthTier::IpTrustThenNegotiate,
        AuthTier::CimBootstrap,
        AuthTier::SecondaryRpcBootstrap,
    ];

    /// Tiers that merely bootstrap remote management and must be followed by
    /// a retry of an earlier session tier rather than running the script
    /// themselves.
    pub fn is_bootstrap(self) -> bool {
        matches!(self, AuthTier::CimBootstrap | AuthTier::SecondaryRpcBootstrap)
    }
}

/// Per-workstation cache of tiers known to fail, so later cycles skip
/// straight past them. Cleared for a host once direct execution succeeds
/// again (the caller, typically the drift scanner, owns that decision).
#[derive(Debug, Default)]
pub struct TierCache {
    failing: RwLock<HashMap<HostId, HashSet<AuthTier>>>,
}

impl TierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_skip(&self, workstation: HostId, tier: AuthTier) -> bool {
        self.failing.read().get(&workstation).is_some_and(|tiers| tiers.contains(&tier))
    }

    pub fn mark_failing(&self, workstation: HostId, tier: AuthTier) {
        self.failing.write().entry(workstation).or_default().insert(tier);
    }

    pub fn clear(&self, workstation: HostId) {
        self.failing.write().remove(&workstation);
    }
}

/// The per-tier session-opening operations a proxy target can perform. A
/// concrete implementation speaks whatever management protocol the proxy's
/// directory-service role actually exposes; this crate only drives the
/// ladder and classifies outcomes.
#[async_trait]
pub trait ProxyAuthLadder: Send + Sync {
    async fn kerberos(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError>;
    async fn negotiate(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError>;
    async fn negotiate_via_ip_trust(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError>;
    async fn bootstrap_cim(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<(), TransportError>;
    async fn bootstrap_secondary_rpc(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<(), TransportError>;
}

pub struct ProxyExecutor {
    ladder: Arc<dyn ProxyAuthLadder>,
    tier_cache: Arc<TierCache>,
    settle_min: Duration,
    settle_max: Duration,
}

impl ProxyExecutor {
    pub fn new(ladder: Arc<dyn ProxyAuthLadder>, tier_cache: Arc<TierCache>) -> Self {
        Self { ladder, tier_cache, settle_min: Duration::from_secs(20), settle_max: Duration::from_secs(25) }
    }

    async fn settle(&self) {
        let jitter_ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.settle_min.as_millis() as u64..=self.settle_max.as_millis() as u64)
        };
        tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
    }

    async fn try_session_tiers(
        &self,
        proxy: &Target,
        workstation: HostId,
        workstation_id: &str,
        credential: &Credential,
        reasons: &mut Vec<String>,
    ) -> Option<(AuthTier, Box<dyn RemoteSession>)> {
        for tier in [AuthTier::Kerberos, AuthTier::Negotiate, AuthTier::IpTrustThenNegotiate] {
            if self.tier_cache.should_skip(workstation, tier) {
                continue;
            }
            let attempt = match tier {
                AuthTier::Kerberos => self.ladder.kerberos(proxy, workstation_id, credential).await,
                AuthTier::Negotiate => self.ladder.negotiate(proxy, workstation_id, credential).await,
                AuthTier::IpTrustThenNegotiate => self.ladder.negotiate_via_ip_trust(proxy, workstation_id, credential).await,
                _ => unreachable!(),
            };
            match attempt {
                Ok(session) => return Some((tier, session)),
                Err(err) => {
                    self.tier_cache.mark_failing(workstation, tier);
                    reasons.push(format!("{tier}: {err}"));
                }
            }
        }
        None
    }

    pub async fn execute_via_proxy(
        &self,
        proxy: &Target,
        workstation: HostId,
        workstation_id: &str,
        credential: &Credential,
        script: &str,
        timeout: Duration,
    ) -> (ExecutionResult, Option<AuthTier>) {
        let started = Instant::now();
        let mut reasons = Vec::new();

        if let Some((tier, session)) =
            self.try_session_tiers(proxy, workstation, workstation_id, credential, &mut reasons).await
        {
            return self.run_and_report(session, script, timeout, started, tier).await;
        }

        for (bootstrap_tier, skip) in [
            (AuthTier::CimBootstrap, self.tier_cache.should_skip(workstation, AuthTier::CimBootstrap)),
            (AuthTier::SecondaryRpcBootstrap, self.tier_cache.should_skip(workstation, AuthTier::SecondaryRpcBootstrap)),
        ] {
            if skip {
                continue;
            }
            let bootstrap = match bootstrap_tier {
                AuthTier::CimBootstrap => self.ladder.bootstrap_cim(proxy, workstation_id, credential).await,
                AuthTier::SecondaryRpcBootstrap => self.ladder.bootstrap_secondary_rpc(proxy, workstation_id, credential).await,
                _ => unreachable!(),
            };
            match bootstrap {
                Ok(()) => {
                    info!(%bootstrap_tier, "remote management bootstrapped, settling before retry");
                    self.settle().await;
                    if let Some((tier, session)) =
                        self.try_session_tiers(proxy, workstation, workstation_id, credential, &mut reasons).await
                    {
                        return self.run_and_report(session, script, timeout, started, tier).await;
                    }
                }
                Err(err) => {
                    self.tier_cache.mark_failing(workstation, bootstrap_tier);
                    reasons.push(format!("{bootstrap_tier}: {err}"));
                }
            }
        }

        warn!(%workstation, reasons = %reasons.join("; "), "proxy auth ladder exhausted");
        let result = ExecutionResult::Failure {
            kind: ErrorKind::AuthFailed,
            message: reasons.join("; "),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        (result, None)
    }

    async fn run_and_report(
        &self,
        session: Box<dyn RemoteSession>,
        script: &str,
        timeout: Duration,
        started: Instant,
        tier: AuthTier,
    ) -> (ExecutionResult, Option<AuthTier>) {
        match session.run_script(script, timeout).await {
            Ok(SessionOutput { std_out, .. }) => {
                (ExecutionResult::success(std_out, started.elapsed().as_millis() as u64), Some(tier))
            }
            Err(err) => (
                ExecutionResult::Failure { kind: err.kind, message: err.message, duration_ms: started.elapsed().as_millis() as u64 },
                Some(tier),
            ),
        }
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
