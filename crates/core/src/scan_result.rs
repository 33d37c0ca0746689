// SPDX-License-Identifier: MIT

//! Raw probe results, keyed by `(target, scan_kind, timestamp)`. Transient:
//! a `ScanResult` lives only long enough for the drift scanner to parse it
//! into findings, and is never persisted.

use crate::execution::ErrorKind;
use crate::probe::ProbeState;
use crate::target::HostId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    Windows,
    Linux,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub host_id: HostId,
    pub scan_kind: ScanKind,
    pub epoch_ms: u64,
    pub duration_ms: u64,
    /// The raw text the probe returned, preamble and all, kept around for
    /// diagnostics when parsing fails.
    pub raw_output: String,
    /// Present when `raw_output` parsed successfully.
    pub parsed: Option<ProbeState>,
    pub error: Option<ErrorKind>,
}

impl ScanResult {
    pub fn parsed(
        host_id: HostId,
        scan_kind: ScanKind,
        epoch_ms: u64,
        duration_ms: u64,
        raw_output: String,
        parsed: ProbeState,
    ) -> Self {
        Self { host_id, scan_kind, epoch_ms, duration_ms, raw_output, parsed: Some(parsed), error: None }
    }

    pub fn failed(
        host_id: HostId,
        scan_kind: ScanKind,
        epoch_ms: u64,
        duration_ms: u64,
        raw_output: String,
        error: ErrorKind,
    ) -> Self {
        Self { host_id, scan_kind, epoch_ms, duration_ms, raw_output, parsed: None, error: Some(error) }
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed.is_some()
    }
}

#[cfg(test)]
#[path = "scan_result_tests.rs"]
mod tests;
