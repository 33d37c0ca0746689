// SPDX-License-Identifier: MIT

//! Findings: the normalized drift record the healing router consumes.

use crate::target::{HostId, Platform};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_str_id! {
    /// Identifier for a single check within a probe's state contract
    /// (e.g. `"firewall_status"`, `"ssh_hardening"`). Assigned by the probe
    /// script's own output contract, not generated locally.
    pub struct CheckId;
}

/// Drift severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// A normalized drift record.
///
/// Invariant: every finding maps to exactly one `(host_id, check_id)` pair.
/// The drift scanner deduplicates at emission, so by the time a `Finding`
/// reaches the healing router there is at most one per pair per scan cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub host_id: HostId,
    pub check_id: CheckId,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
    pub compliance_tag: Option<String>,
    pub severity: Severity,
    pub platform: Platform,
    #[serde(default)]
    pub details: HashMap<String, serde_json::Value>,
}

impl Finding {
    pub fn new(
        host_id: HostId,
        check_id: impl Into<CheckId>,
        severity: Severity,
        platform: Platform,
        expected: serde_json::Value,
        actual: serde_json::Value,
    ) -> Self {
        Self {
            host_id,
            check_id: check_id.into(),
            expected,
            actual,
            compliance_tag: None,
            severity,
            platform,
            details: HashMap::new(),
        }
    }

    /// The `(host, check)` key findings are deduplicated and cooled down on.
    pub fn dedup_key(&self) -> (HostId, String) {
        (self.host_id, self.check_id.0.clone())
    }

    pub fn with_compliance_tag(mut self, tag: impl Into<String>) -> Self {
        self.compliance_tag = Some(tag.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
#[path = "finding_tests.rs"]
mod tests;
