// SPDX-License-Identifier: MIT

//! The five pipeline stages, abstracted behind a trait since the concrete
//! install mechanics (binary transfer protocol, service manager) differ per
//! platform and are opaque to this crate.

use appliance_core::{Credential, Target};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("stage failed: {0}")]
    StageFailed(String),
    #[error(transparent)]
    Transport(#[from] appliance_transport::TransportError),
}

#[async_trait]
pub trait DeployStage: Send + Sync {
    async fn create_install_dir(&self, target: &Target, credential: &Credential) -> Result<(), DeployError>;

    async fn deliver_binary(&self, target: &Target, credential: &Credential, binary: &[u8]) -> Result<(), DeployError>;

    async fn write_config(&self, target: &Target, credential: &Credential, control_plane_address: &str) -> Result<(), DeployError>;

    async fn register_service(&self, target: &Target, credential: &Credential) -> Result<(), DeployError>;

    /// Queries whether the service reports installed-and-running, after a
    /// short settle delay.
    async fn verify_installed_and_running(&self, target: &Target, credential: &Credential) -> Result<bool, DeployError>;

    /// The zero-retry idempotency probe: is the service already running?
    async fn probe_already_running(&self, target: &Target, credential: &Credential) -> Result<bool, DeployError>;
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
