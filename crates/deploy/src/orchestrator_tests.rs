// SPDX-License-Identifier: MIT

use super::*;
use appliance_core::{FakeClock, Platform};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Default)]
struct ScriptedStage {
    already_running: bool,
    fail_stage: Option<&'static str>,
    verify_result: bool,
    calls: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl DeployStage for ScriptedStage {
    async fn create_install_dir(&self, _t: &Target, _c: &Credential) -> Result<(), DeployError> {
        self.calls.lock().push("create_install_dir");
        if self.fail_stage == Some("create_install_dir") {
            return Err(DeployError::StageFailed("denied".into()));
        }
        Ok(())
    }

    async fn deliver_binary(&self, _t: &Target, _c: &Credential, _b: &[u8]) -> Result<(), DeployError> {
        self.calls.lock().push("deliver_binary");
        Ok(())
    }

    async fn write_config(&self, _t: &Target, _c: &Credential, _addr: &str) -> Result<(), DeployError> {
        self.calls.lock().push("write_config");
        Ok(())
    }

    async fn register_service(&self, _t: &Target, _c: &Credential) -> Result<(), DeployError> {
        self.calls.lock().push("register_service");
        Ok(())
    }

    async fn verify_installed_and_running(&self, _t: &Target, _c: &Credential) -> Result<bool, DeployError> {
        Ok(self.verify_result)
    }

    async fn probe_already_running(&self, _t: &Target, _c: &Credential) -> Result<bool, DeployError> {
        Ok(self.already_running)
    }
}

fn sample_target() -> Target {
    Target::new(HostId::new(), "10.0.0.9", Target::default_port(Platform::Windows), Platform::Windows)
}

fn sample_credential() -> Credential {
    Credential::password("svc-appliance", "hunter2")
}

#[tokio::test]
async fn already_running_skips_the_pipeline() {
    let stage = Arc::new(ScriptedStage { already_running: true, ..Default::default() });
    let orchestrator = DeployOrchestrator::new(stage.clone(), Arc::new(DeployStateTable::new()), FakeClock::new(), "10.0.0.1:8443");
    let outcome = orchestrator.deploy(&sample_target(), &sample_credential(), b"binary").await;
    assert_eq!(outcome, DeployOutcome::AlreadyInstalled);
    assert!(stage.calls.lock().is_empty());
}

#[tokio::test]
async fn successful_pipeline_runs_all_four_stages_in_order() {
    let stage = Arc::new(ScriptedStage { verify_result: true, ..Default::default() });
    let orchestrator = DeployOrchestrator::new(stage.clone(), Arc::new(DeployStateTable::new()), FakeClock::new(), "10.0.0.1:8443");
    let outcome = orchestrator.deploy(&sample_target(), &sample_credential(), b"binary").await;
    assert_eq!(outcome, DeployOutcome::Installed);
    assert_eq!(
        *stage.calls.lock(),
        vec!["create_install_dir", "deliver_binary", "write_config", "register_service"]
    );
}

#[tokio::test]
async fn third_consecutive_failure_escalates() {
    let stage = Arc::new(ScriptedStage { fail_stage: Some("create_install_dir"), ..Default::default() });
    let states = Arc::new(DeployStateTable::new());
    let clock = FakeClock::new();
    let target = sample_target();
    let credential = sample_credential();

    for _ in 0..2 {
        let orchestrator = DeployOrchestrator::new(stage.clone(), states.clone(), clock.clone(), "10.0.0.1:8443");
        let outcome = orchestrator.deploy(&target, &credential, b"binary").await;
        assert_eq!(outcome, DeployOutcome::Failed { escalated: false, reason: "stage failed: denied".into() });
    }

    let orchestrator = DeployOrchestrator::new(stage, states, clock, "10.0.0.1:8443");
    let outcome = orchestrator.deploy(&target, &credential, b"binary").await;
    assert_eq!(outcome, DeployOutcome::Failed { escalated: true, reason: "stage failed: denied".into() });
}
