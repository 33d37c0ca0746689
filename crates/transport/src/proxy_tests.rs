// SPDX-License-Identifier: MIT

use super::*;
use crate::session::RemoteSession;
use appliance_core::Platform;
use std::sync::atomic::{AtomicBool, Ordering};

struct ScriptedSession;

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn run_script(&self, _script: &str, _timeout: Duration) -> Result<SessionOutput, TransportError> {
        Ok(SessionOutput { std_out: "installed".into(), exit_code: 0 })
    }
}

/// Tiers 1-3 always fail; CIM bootstrap succeeds and unlocks negotiate.
struct Ws02Ladder {
    bootstrapped: AtomicBool,
}

#[async_trait]
impl ProxyAuthLadder for Ws02Ladder {
    async fn kerberos(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        Err(TransportError::auth_failed("kerberos refused"))
    }

    async fn negotiate(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        if self.bootstrapped.load(Ordering::SeqCst) {
            Ok(Box::new(ScriptedSession))
        } else {
            Err(TransportError::auth_failed("negotiate refused"))
        }
    }

    async fn negotiate_via_ip_trust(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        Err(TransportError::auth_failed("ip trust negotiate refused"))
    }

    async fn bootstrap_cim(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<(), TransportError> {
        self.bootstrapped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn bootstrap_secondary_rpc(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<(), TransportError> {
        Ok(())
    }
}

fn proxy_target() -> Target {
    Target::new(appliance_core::HostId::new(), "dc01.example.local", 5985, Platform::Windows)
}

#[tokio::test]
async fn cim_bootstrap_tier_recovers_after_earlier_tiers_fail() {
    let ladder = Arc::new(Ws02Ladder { bootstrapped: AtomicBool::new(false) });
    let mut executor = ProxyExecutor::new(ladder, Arc::new(TierCache::new()));
    executor.settle_min = Duration::from_millis(1);
    executor.settle_max = Duration::from_millis(2);

    let proxy = proxy_target();
    let workstation = appliance_core::HostId::new();
    let credential = Credential::password("svc-appliance", "hunter2");

    let (result, tier) = executor
        .execute_via_proxy(&proxy, workstation, "WS02", &credential, "install.ps1", Duration::from_secs(5))
        .await;

    assert!(result.is_success());
    assert_eq!(tier, Some(AuthTier::Negotiate));
}

#[test]
fn tier_cache_scopes_by_workstation() {
    let cache = TierCache::new();
    let a = appliance_core::HostId::new();
    let b = appliance_core::HostId::new();
    cache.mark_failing(a, AuthTier::Kerberos);
    assert!(cache.should_skip(a, AuthTier::Kerberos));
    assert!(!cache.should_skip(b, AuthTier::Kerberos));
    cache.clear(a);
    assert!(!cache.should_skip(a, AuthTier::Kerberos));
}
