// SPDX-License-Identifier: MIT

//! The periodic checkin POST and the lifting of central's loosely-typed
//! `TargetDto` list into the typed `(Target, Credential)` pairs everything
//! downstream works with.

use crate::error::SyncError;
use appliance_core::{Credential, Target, TrustFlags};
use appliance_discovery::HostIdentityRegistry;
use appliance_wire::checkin::{CheckinRequest, CheckinResponse, TargetDto};
use std::time::Duration;

/// Lifts one `TargetDto` into a `(Target, Credential)` pair, minting or
/// reusing a stable `HostId` via the identity registry so this target never
/// gets a second identity on a later checkin.
///
/// Returns `None` for a DTO with neither a password nor a private key —
/// central sent a target this appliance cannot authenticate to, logged and
/// skipped rather than treated as a fatal checkin error.
pub fn lift_target(dto: TargetDto, registry: &HostIdentityRegistry) -> Option<(Target, Credential)> {
    let secret = if let Some(password) = dto.password {
        appliance_core::Secret::Password(password)
    } else if let Some(private_key) = dto.private_key {
        appliance_core::Secret::PrivateKey(private_key)
    } else {
        tracing::warn!(host_id = %dto.host_id, "target has no usable credential secret, skipping");
        return None;
    };

    let credential = Credential { username: dto.username, secret, privilege_escalation_secret: dto.privilege_escalation_secret };
    let host_id = registry.resolve_or_mint(&dto.host_id);
    let port = dto.port.unwrap_or_else(|| Target::default_port(dto.platform));
    let target = Target::new(host_id, dto.address, port, dto.platform).with_trust(TrustFlags { allow_self_signed: dto.allow_self_signed });
    Some((target, credential))
}

pub struct CheckinClient {
    http: reqwest::Client,
    endpoint: String,
    bearer_token: String,
}

impl CheckinClient {
    pub fn new(endpoint: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_else(|_| reqwest::Client::new());
        Self { http, endpoint: endpoint.into(), bearer_token: bearer_token.into() }
    }

    pub async fn checkin(&self, request: &CheckinRequest) -> Result<CheckinResponse, SyncError> {
        let response = self.http.post(&self.endpoint).bearer_auth(&self.bearer_token).json(request).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::ServerRejection(response.status()));
        }
        Ok(response.json::<CheckinResponse>().await?)
    }
}

#[cfg(test)]
#[path = "checkin_tests.rs"]
mod tests;
