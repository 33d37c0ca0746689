// SPDX-License-Identifier: MIT

//! Enumerates and resolves directory-server entries by running small named
//! scripts against it over the direct executor. Which script blob backs a
//! given id is an internal catalog lookup, not a protocol concern.

use appliance_core::{Credential, ErrorKind, ExecutionResult, Platform, Target};
use appliance_discovery::{DirectoryEntry, DirectoryQuery, DiscoveryError};
use appliance_transport::executor::{ExecuteRequest, Phase, RemoteExecutor};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const ENUMERATE_SCRIPT: &str = include_str!("../../scripts/directory_enumerate.ps1");
const RESOLVE_ADDRESS_SCRIPT: &str = include_str!("../../scripts/directory_resolve_address.ps1");

pub struct ScriptedDirectoryQuery {
    executor: Arc<RemoteExecutor>,
    directory_server: Target,
    credential: Credential,
}

impl ScriptedDirectoryQuery {
    pub fn new(executor: Arc<RemoteExecutor>, directory_server: Target, credential: Credential) -> Self {
        Self { executor, directory_server, credential }
    }

    fn discovery_error(result: ExecutionResult) -> DiscoveryError {
        match result {
            ExecutionResult::Failure { message, .. } => DiscoveryError::QueryFailed(message),
            ExecutionResult::Success { .. } => DiscoveryError::QueryFailed("unexpected success shape".to_string()),
        }
    }
}

#[async_trait]
impl DirectoryQuery for ScriptedDirectoryQuery {
    async fn enumerate(&self) -> Result<Vec<DirectoryEntry>, DiscoveryError> {
        let request = ExecuteRequest {
            target: &self.directory_server,
            credential: &self.credential,
            script: ENUMERATE_SCRIPT,
            runbook_id: None,
            phase: Phase::Custom,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            backoff_base_s: 2,
        };
        let result = self.executor.execute(request).await;
        match result {
            ExecutionResult::Success { output, .. } => {
                let raw = output.get("entries").cloned().unwrap_or(serde_json::Value::Array(vec![]));
                let array = raw.as_array().cloned().unwrap_or_default();
                array.into_iter().map(parse_directory_entry).collect()
            }
            failure => Err(Self::discovery_error(failure)),
        }
    }

    async fn resolve_address(&self, entry: &DirectoryEntry) -> Result<String, DiscoveryError> {
        let mut params = std::collections::HashMap::new();
        params.insert("external_id".to_string(), entry.external_id.clone());
        let script = RESOLVE_ADDRESS_SCRIPT.replace("{{external_id}}", &entry.external_id);
        let request = ExecuteRequest {
            target: &self.directory_server,
            credential: &self.credential,
            script: &script,
            runbook_id: None,
            phase: Phase::Custom,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            backoff_base_s: 2,
        };
        let _ = params;
        let result = self.executor.execute(request).await;
        match result {
            ExecutionResult::Success { output, .. } => output
                .get("address")
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .ok_or_else(|| DiscoveryError::QueryFailed(format!("no address resolved for {}", entry.external_id))),
            ExecutionResult::Failure { kind, message, .. } => {
                if kind == ErrorKind::DnsNotFound {
                    Err(DiscoveryError::AddressResolutionFailed { external_id: entry.external_id.clone(), reason: message })
                } else {
                    Err(DiscoveryError::QueryFailed(message))
                }
            }
        }
    }
}

fn parse_directory_entry(value: serde_json::Value) -> Result<DirectoryEntry, DiscoveryError> {
    let external_id = value
        .get("external_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DiscoveryError::QueryFailed("entry missing external_id".to_string()))?
        .to_string();
    let hostname = value.get("hostname").and_then(|v| v.as_str()).unwrap_or(&external_id).to_string();
    let address = value.get("address").and_then(|v| v.as_str()).map(str::to_string);
    let platform = match value.get("platform").and_then(|v| v.as_str()) {
        Some("windows") => Platform::Windows,
        Some("linux") => Platform::Linux,
        _ => Platform::Linux,
    };
    Ok(DirectoryEntry { external_id, hostname, address, platform })
}
