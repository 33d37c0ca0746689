// SPDX-License-Identifier: MIT

//! C1: the direct remote executor. One attempt opens a transport,
//! authenticates, submits the script, and drains output until exit or
//! timeout; failures are classified and retried according to the policy in
//! `ErrorKind::is_retryable`, never on auth failures.

use crate::backoff::backoff_duration;
use crate::session::SessionOpener;
use appliance_core::{Credential, ErrorKind, ExecutionResult, Target};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Detect,
    Remediate,
    Verify,
    Probe,
    Custom,
}

appliance_core::simple_display! {
    Phase {
        Detect => "detect",
        Remediate => "remediate",
        Verify => "verify",
        Probe => "probe",
        Custom => "custom",
    }
}

/// Parameters for one execution request, mirroring the C1 contract.
#[derive(Debug, Clone)]
pub struct ExecuteRequest<'a> {
    pub target: &'a Target,
    pub credential: &'a Credential,
    pub script: &'a str,
    pub runbook_id: Option<&'a str>,
    pub phase: Phase,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base_s: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct RemoteExecutorConfig {
    pub default_timeout: Duration,
    pub default_max_retries: u32,
    pub default_backoff_base_s: u64,
}

impl Default for RemoteExecutorConfig {
    fn default() -> Self {
        Self { default_timeout: Duration::from_secs(120), default_max_retries: 2, default_backoff_base_s: 2 }
    }
}

pub struct RemoteExecutor {
    opener: Arc<dyn SessionOpener>,
    config: RemoteExecutorConfig,
}

impl RemoteExecutor {
    pub fn new(opener: Arc<dyn SessionOpener>, config: RemoteExecutorConfig) -> Self {
        Self { opener, config }
    }

    /// Zero-retry form used by the deploy idempotency probe, so a probe that
    /// fails auth never consumes more than one attempt against the remote's
    /// account lockout counter.
    pub async fn execute_zero_retry(&self, req: ExecuteRequest<'_>) -> ExecutionResult {
        self.execute(ExecuteRequest { max_retries: 0, ..req }).await
    }

    #[instrument(skip(self, req), fields(host = %req.target.host_id, phase = %req.phase))]
    pub async fn execute(&self, req: ExecuteRequest<'_>) -> ExecutionResult {
        let started = Instant::now();
        let mut last_kind = ErrorKind::ServerError;
        let mut last_message = String::new();

        for attempt in 1..=(req.max_retries + 1) {
            let attempt_started = Instant::now();
            let outcome = tokio::time::timeout(req.timeout, self.attempt_once(&req)).await;

            match outcome {
                Ok(Ok(output)) => {
                    return ExecutionResult::success(output.std_out, started.elapsed().as_millis() as u64);
                }
                Ok(Err(err)) => {
                    last_kind = err.kind;
                    last_message = err.message;
                }
                Err(_) => {
                    last_kind = ErrorKind::Timeout;
                    last_message = format!("no completion within {:?}", req.timeout);
                }
            }

            if last_kind == ErrorKind::AuthFailed {
                // Sticky for the cycle: the caller (scanner/deploy) is responsible
                // for not retrying this target's direct path again this cycle.
                break;
            }
            if !last_kind.is_retryable() || attempt > req.max_retries {
                break;
            }

            let wait = backoff_duration(req.backoff_base_s, attempt);
            warn!(attempt, ?wait, elapsed = ?attempt_started.elapsed(), kind = %last_kind, "remote execution attempt failed, retrying");
            tokio::time::sleep(wait).await;
        }

        ExecutionResult::Failure { kind: last_kind, message: last_message, duration_ms: started.elapsed().as_millis() as u64 }
    }

    async fn attempt_once(&self, req: &ExecuteRequest<'_>) -> Result<crate::session::SessionOutput, crate::error::TransportError> {
        let session = self.opener.open(req.target, req.credential).await?;
        session.run_script(req.script, req.timeout).await
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
