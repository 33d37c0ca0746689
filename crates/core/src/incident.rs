// SPDX-License-Identifier: MIT

//! Incidents: a finding lifted into the healing router's working set, with
//! the bookkeeping the router needs to gate, cool down, and escalate it.

use crate::finding::{CheckId, Finding, Severity};
use crate::target::{HostId, Platform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An incident identifier, deterministic in `(host_id, check_id, epoch_ms)` so
/// that replaying the same finding at the same instant never mints two
/// identities for what is logically one event. Unlike [`crate::define_id!`]
/// ids this is computed, not randomly generated, and unlike
/// [`crate::define_str_id!`] ids it isn't assigned by anything external —
/// it's derived locally from data the router already has on hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub String);

impl IncidentId {
    pub fn derive(host_id: HostId, check_id: &CheckId, epoch_ms: u64) -> Self {
        Self(format!("inc-{host_id}-{}-{epoch_ms}", check_id.as_str()))
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An incident in progress: a finding that has entered the healing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub host_id: HostId,
    pub check_id: CheckId,
    pub platform: Platform,
    pub severity: Severity,
    pub finding: Finding,
    pub first_seen_epoch_ms: u64,
    /// Consecutive match count within the flap window; reset when the window
    /// elapses without a repeat match.
    pub flap_count: u32,
}

impl Incident {
    pub fn from_finding(finding: Finding, epoch_ms: u64) -> Self {
        let id = IncidentId::derive(finding.host_id, &finding.check_id, epoch_ms);
        Self {
            id,
            host_id: finding.host_id,
            check_id: finding.check_id.clone(),
            platform: finding.platform,
            severity: finding.severity,
            finding,
            first_seen_epoch_ms: epoch_ms,
            flap_count: 1,
        }
    }

    pub fn dedup_key(&self) -> (HostId, String) {
        (self.host_id, self.check_id.0.clone())
    }
}

#[cfg(test)]
#[path = "incident_tests.rs"]
mod tests;
