// SPDX-License-Identifier: MIT

//! Runs the five install-pipeline stages as scripted remote executions.
//! Binaries under the inline limit are base64-encoded straight into the
//! delivery script; larger ones are staged to the distribution point first
//! and fetched by the target with a short download script.

use appliance_core::{Credential, Target};
use appliance_deploy::{DeployError, DeployStage};
use appliance_transport::executor::{ExecuteRequest, Phase, RemoteExecutor};
use appliance_transport::staging::DistributionPoint;
use async_trait::async_trait;
use base64::Engine as _;
use std::sync::Arc;
use std::time::Duration;

const CREATE_INSTALL_DIR: &str = include_str!("../../scripts/deploy_create_install_dir.ps1");
const WRITE_CONFIG: &str = include_str!("../../scripts/deploy_write_config.ps1");
const REGISTER_SERVICE: &str = include_str!("../../scripts/deploy_register_service.ps1");
const PROBE_RUNNING: &str = include_str!("../../scripts/deploy_probe_running.ps1");
const FETCH_STAGED_BINARY: &str = include_str!("../../scripts/deploy_fetch_staged_binary.ps1");

pub struct ScriptedDeployStage {
    direct: Arc<RemoteExecutor>,
    distribution_point: Arc<DistributionPoint>,
    distribution_base_url: String,
}

impl ScriptedDeployStage {
    pub fn new(direct: Arc<RemoteExecutor>, distribution_point: Arc<DistributionPoint>, distribution_base_url: impl Into<String>) -> Self {
        Self { direct, distribution_point, distribution_base_url: distribution_base_url.into() }
    }

    async fn run(&self, target: &Target, credential: &Credential, script: &str) -> Result<String, DeployError> {
        let request = ExecuteRequest {
            target,
            credential,
            script,
            runbook_id: None,
            phase: Phase::Custom,
            timeout: Duration::from_secs(120),
            max_retries: 1,
            backoff_base_s: 2,
        };
        let result = self.direct.execute(request).await;
        if !result.is_success() {
            return Err(DeployError::StageFailed(
                result.error_kind().map(|kind| kind.to_string()).unwrap_or_else(|| "unknown failure".to_string()),
            ));
        }
        Ok(result.std_out().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl DeployStage for ScriptedDeployStage {
    async fn create_install_dir(&self, target: &Target, credential: &Credential) -> Result<(), DeployError> {
        self.run(target, credential, CREATE_INSTALL_DIR).await.map(|_| ())
    }

    async fn deliver_binary(&self, target: &Target, credential: &Credential, binary: &[u8]) -> Result<(), DeployError> {
        if DistributionPoint::should_stage_inline(binary.len()) {
            let encoded = base64::engine::general_purpose::STANDARD.encode(binary);
            let script = format!(
                "$bytes = [System.Convert]::FromBase64String(\"{encoded}\")\n\
                 [System.IO.File]::WriteAllBytes(\"C:\\Program Files\\ApplianceAgent\\agent.exe\", $bytes)\n"
            );
            self.run(target, credential, &script).await.map(|_| ())
        } else {
            let key = format!("agent-binaries/{}", target.host_id);
            self.distribution_point
                .ensure_staged(&key, binary)
                .await
                .map_err(DeployError::StageFailed)?;
            let url = format!("{}/{}", self.distribution_base_url.trim_end_matches('/'), key);
            let script = FETCH_STAGED_BINARY.replace("{{distribution_url}}", &url);
            self.run(target, credential, &script).await.map(|_| ())
        }
    }

    async fn write_config(&self, target: &Target, credential: &Credential, control_plane_address: &str) -> Result<(), DeployError> {
        let script = WRITE_CONFIG.replace("{{control_plane_address}}", control_plane_address);
        self.run(target, credential, &script).await.map(|_| ())
    }

    async fn register_service(&self, target: &Target, credential: &Credential) -> Result<(), DeployError> {
        self.run(target, credential, REGISTER_SERVICE).await.map(|_| ())
    }

    async fn verify_installed_and_running(&self, target: &Target, credential: &Credential) -> Result<bool, DeployError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let output = self.run(target, credential, PROBE_RUNNING).await?;
        Ok(parse_running_flag(&output))
    }

    async fn probe_already_running(&self, target: &Target, credential: &Credential) -> Result<bool, DeployError> {
        let output = self.run(target, credential, PROBE_RUNNING).await?;
        Ok(parse_running_flag(&output))
    }
}

fn parse_running_flag(output: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(output)
        .ok()
        .and_then(|value| value.get("running").and_then(|v| v.as_bool()))
        .unwrap_or(false)
}
