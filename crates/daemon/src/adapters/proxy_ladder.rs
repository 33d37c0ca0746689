// SPDX-License-Identifier: MIT

//! Scripted five-tier proxy authentication ladder, driven through the same
//! tagged TCP handshake the direct transport uses, against the proxy's
//! address instead of the workstation's.

use super::session::open_tagged;
use appliance_core::{Credential, Platform, Target};
use appliance_transport::{ProxyAuthLadder, RemoteSession, ShellDialect, TransportError};
use async_trait::async_trait;

pub struct ScriptedProxyAuthLadder;

impl ScriptedProxyAuthLadder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScriptedProxyAuthLadder {
    fn default() -> Self {
        Self::new()
    }
}

fn dialect_for(proxy: &Target) -> ShellDialect {
    match proxy.platform {
        Platform::Windows => ShellDialect::PowerShell,
        _ => ShellDialect::Posix,
    }
}

#[async_trait]
impl ProxyAuthLadder for ScriptedProxyAuthLadder {
    async fn kerberos(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        open_tagged(&proxy.address, proxy.port, dialect_for(proxy), credential, "kerberos", Some(workstation_id)).await
    }

    async fn negotiate(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<Box<dyn RemoteSession>, TransportError> {
        open_tagged(&proxy.address, proxy.port, dialect_for(proxy), credential, "negotiate", Some(workstation_id)).await
    }

    async fn negotiate_via_ip_trust(
        &self,
        proxy: &Target,
        workstation_id: &str,
        credential: &Credential,
    ) -> Result<Box<dyn RemoteSession>, TransportError> {
        open_tagged(&proxy.address, proxy.port, dialect_for(proxy), credential, "ip_trust_then_negotiate", Some(workstation_id)).await
    }

    async fn bootstrap_cim(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<(), TransportError> {
        open_tagged(&proxy.address, proxy.port, dialect_for(proxy), credential, "bootstrap_cim", Some(workstation_id))
            .await
            .map(|_| ())
    }

    async fn bootstrap_secondary_rpc(&self, proxy: &Target, workstation_id: &str, credential: &Credential) -> Result<(), TransportError> {
        open_tagged(&proxy.address, proxy.port, dialect_for(proxy), credential, "secondary_rpc", Some(workstation_id))
            .await
            .map(|_| ())
    }
}
