// SPDX-License-Identifier: MIT

//! Outcomes of a remote execution attempt (script run, probe dispatch, or
//! deploy step), and the transport-level error taxonomy they're classified
//! into so the deploy and healing pipelines can decide whether to retry.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Transport/remote-execution error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthFailed,
    Timeout,
    ConnectionRefused,
    NoRoute,
    DnsNotFound,
    TlsError,
    ScriptError,
    ServerError,
}

crate::simple_display! {
    ErrorKind {
        AuthFailed => "auth_failed",
        Timeout => "timeout",
        ConnectionRefused => "connection_refused",
        NoRoute => "no_route",
        DnsNotFound => "dns_not_found",
        TlsError => "tls_error",
        ScriptError => "script_error",
        ServerError => "server_error",
    }
}

impl ErrorKind {
    /// Whether this class of failure is worth retrying with backoff. Auth
    /// and DNS failures are treated as durable until something external
    /// changes; everything else gets the normal backoff ladder.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::AuthFailed | ErrorKind::DnsNotFound)
    }
}

/// The result of attempting one remote operation.
///
/// `output_hash` is the hex-encoded SHA-256 of `output["std_out"]`, computed
/// at capture time so a tampered completion payload can be detected later
/// without re-running the script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionResult {
    Success {
        /// Structured output map; always carries at least a `std_out` key.
        output: HashMap<String, serde_json::Value>,
        output_hash: String,
        duration_ms: u64,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        duration_ms: u64,
    },
}

impl ExecutionResult {
    pub fn success(std_out: impl Into<String>, duration_ms: u64) -> Self {
        let std_out = std_out.into();
        let output_hash = hash_output(&std_out);
        let mut output = HashMap::new();
        output.insert("std_out".to_string(), serde_json::Value::String(std_out));
        ExecutionResult::Success { output, output_hash, duration_ms }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ExecutionResult::Failure { kind, .. } => Some(*kind),
            ExecutionResult::Success { .. } => None,
        }
    }

    pub fn std_out(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success { output, .. } => output.get("std_out").and_then(|v| v.as_str()),
            ExecutionResult::Failure { .. } => None,
        }
    }
}

fn hash_output(std_out: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(std_out.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
