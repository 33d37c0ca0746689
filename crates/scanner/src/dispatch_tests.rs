// SPDX-License-Identifier: MIT

use super::*;
use appliance_core::{ErrorKind, HostId, Platform};
use appliance_transport::{
    ProxyAuthLadder, RemoteExecutorConfig, RemoteSession, SessionOpener, SessionOutput, TransportError,
};
use std::sync::atomic::{AtomicU32, Ordering};

struct AlwaysFailsDirect;

#[async_trait]
impl SessionOpener for AlwaysFailsDirect {
    async fn open(&self, _target: &Target, _credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        Err(TransportError::new(ErrorKind::Timeout, "simulated timeout"))
    }
}

struct StubSession(&'static str);

#[async_trait]
impl RemoteSession for StubSession {
    async fn run_script(&self, _script: &str, _timeout: Duration) -> Result<SessionOutput, TransportError> {
        Ok(SessionOutput { std_out: self.0.to_string(), exit_code: 0 })
    }
}

struct SucceedsOnNegotiate {
    calls: AtomicU32,
}

#[async_trait]
impl ProxyAuthLadder for SucceedsOnNegotiate {
    async fn kerberos(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        Err(TransportError::auth_failed("kerberos refused"))
    }
    async fn negotiate(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession("proxied output")))
    }
    async fn negotiate_via_ip_trust(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        Err(TransportError::auth_failed("unreachable"))
    }
    async fn bootstrap_cim(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<(), TransportError> {
        Err(TransportError::auth_failed("unreachable"))
    }
    async fn bootstrap_secondary_rpc(&self, _p: &Target, _w: &str, _c: &Credential) -> Result<(), TransportError> {
        Err(TransportError::auth_failed("unreachable"))
    }
}

struct EchoLocalShell;

#[async_trait]
impl LocalShell for EchoLocalShell {
    async fn run(&self, script: &str, _timeout: Duration) -> Result<String, String> {
        Ok(format!("ran: {script}"))
    }
}

fn workstation() -> Target {
    Target::new(HostId::new(), "10.0.1.5", Target::default_port(Platform::Windows), Platform::Windows)
}

fn proxy_target() -> Target {
    Target::new(HostId::new(), "10.0.1.1", Target::default_port(Platform::Windows), Platform::Windows)
}

fn dispatcher_with_failing_direct() -> (ScanDispatcher, Arc<SucceedsOnNegotiate>) {
    let direct = Arc::new(RemoteExecutor::new(Arc::new(AlwaysFailsDirect), RemoteExecutorConfig::default()));
    let ladder = Arc::new(SucceedsOnNegotiate { calls: AtomicU32::new(0) });
    let tier_cache = Arc::new(TierCache::new());
    let proxy = Arc::new(ProxyExecutor::new(ladder.clone(), tier_cache.clone()));
    let dispatcher = ScanDispatcher::new(
        direct,
        proxy,
        tier_cache,
        Arc::new(StickyFailureSet::new()),
        Arc::new(EchoLocalShell),
        Duration::from_millis(50),
    );
    (dispatcher, ladder)
}

#[tokio::test]
async fn self_host_runs_through_the_local_shell() {
    let (dispatcher, _) = dispatcher_with_failing_direct();
    let output = dispatcher.run_self("probe.ps1").await.unwrap();
    assert_eq!(output, "ran: probe.ps1");
}

#[tokio::test]
async fn workstation_falls_through_to_proxy_after_direct_failure() {
    let (dispatcher, ladder) = dispatcher_with_failing_direct();
    let result = dispatcher.run_workstation(&proxy_target(), &workstation(), &Credential::password("svc", "pw"), "probe.ps1").await;
    assert!(result.is_success());
    assert_eq!(ladder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_second_call_this_cycle_skips_direct_via_the_sticky_set() {
    let (dispatcher, ladder) = dispatcher_with_failing_direct();
    let credential = Credential::password("svc", "pw");
    let target = workstation();
    let proxy = proxy_target();

    dispatcher.run_workstation(&proxy, &target, &credential, "probe.ps1").await;
    dispatcher.run_workstation(&proxy, &target, &credential, "probe.ps1").await;

    assert_eq!(ladder.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn begin_cycle_clears_the_sticky_set_for_a_fresh_direct_attempt() {
    let (dispatcher, _) = dispatcher_with_failing_direct();
    let credential = Credential::password("svc", "pw");
    let target = workstation();
    let proxy = proxy_target();

    dispatcher.run_workstation(&proxy, &target, &credential, "probe.ps1").await;
    dispatcher.begin_cycle();
    // after reset, direct is attempted again (and fails again, falling through once more)
    let result = dispatcher.run_workstation(&proxy, &target, &credential, "probe.ps1").await;
    assert!(result.is_success());
}
