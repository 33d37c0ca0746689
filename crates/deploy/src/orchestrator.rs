// SPDX-License-Identifier: MIT

use crate::stage::{DeployError, DeployStage};
use crate::state::{DeployState, DeployStateTable};
use appliance_core::{Clock, Credential, HostId, Target};
use std::sync::Arc;
use tracing::{info, warn};

const MAX_FAILURES: u32 = 3;
const ESCALATION_BACKOFF_MS: u64 = 4 * 60 * 60 * 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    AlreadyInstalled,
    Installed,
    /// `escalated` is set once this failure pushed the host past
    /// `MAX_FAILURES`; the caller should raise an L3 incident when it is.
    Failed { escalated: bool, reason: String },
    Skipped { reason: String },
}

pub struct DeployOrchestrator<C: Clock> {
    stage: Arc<dyn DeployStage>,
    states: Arc<DeployStateTable>,
    clock: C,
    control_plane_address: String,
}

impl<C: Clock> DeployOrchestrator<C> {
    pub fn new(stage: Arc<dyn DeployStage>, states: Arc<DeployStateTable>, clock: C, control_plane_address: impl Into<String>) -> Self {
        Self { stage, states, clock, control_plane_address: control_plane_address.into() }
    }

    pub async fn deploy(&self, target: &Target, credential: &Credential, binary: &[u8]) -> DeployOutcome {
        let host_id = target.host_id;
        let now = self.clock.epoch_ms();
        let current = self.states.get(host_id);

        if !current.may_attempt(now) {
            return DeployOutcome::Skipped { reason: format!("deploy state {current:?} does not permit an attempt yet") };
        }

        match self.stage.probe_already_running(target, credential).await {
            Ok(true) => {
                self.states.set(host_id, DeployState::Installed { installed_epoch_ms: now });
                return DeployOutcome::AlreadyInstalled;
            }
            Ok(false) => {}
            Err(err) => warn!(%host_id, %err, "idempotency probe failed, proceeding with full pipeline"),
        }

        self.states.set(host_id, DeployState::Attempting);

        if let Err(err) = self.run_pipeline(target, credential, binary).await {
            return self.record_failure(host_id, now, err.to_string());
        }

        match self.stage.verify_installed_and_running(target, credential).await {
            Ok(true) => {
                self.states.set(host_id, DeployState::Installed { installed_epoch_ms: self.clock.epoch_ms() });
                info!(%host_id, "deploy verified installed and running");
                DeployOutcome::Installed
            }
            Ok(false) => self.record_failure(host_id, now, "post-deploy verification did not report running".into()),
            Err(err) => self.record_failure(host_id, now, err.to_string()),
        }
    }

    async fn run_pipeline(&self, target: &Target, credential: &Credential, binary: &[u8]) -> Result<(), DeployError> {
        self.stage.create_install_dir(target, credential).await?;
        self.stage.deliver_binary(target, credential, binary).await?;
        self.stage.write_config(target, credential, &self.control_plane_address).await?;
        self.stage.register_service(target, credential).await?;
        Ok(())
    }

    fn record_failure(&self, host_id: HostId, now: u64, reason: String) -> DeployOutcome {
        let next = self.states.record_failure(host_id, MAX_FAILURES, now, ESCALATION_BACKOFF_MS);
        let escalated = matches!(next, DeployState::Escalated { .. });
        if escalated {
            warn!(%host_id, %reason, "deploy escalated to L3 after repeated failure");
        }
        DeployOutcome::Failed { escalated, reason }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
