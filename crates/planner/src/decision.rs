// SPDX-License-Identifier: MIT

//! The planner's decision payload and the executability rule the router
//! applies to it.

use appliance_core::RunbookId;
use appliance_wire::checkin::ApplianceMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const EXECUTABLE_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// What the router should do with a decision once the appliance's current
/// mode is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerRouting {
    /// Dispatch the recommended action via the right transport.
    AutoApply,
    /// Funnel to L3 with the plan attached as a human-approval artifact,
    /// either because the decision itself wasn't confident/clean enough or
    /// because the appliance is in manual mode and nothing auto-applies.
    ApprovalArtifact,
}

/// What the remote planner recommends for one incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerDecision {
    pub recommended_action: String,
    #[serde(default)]
    pub action_params: HashMap<String, serde_json::Value>,
    pub confidence: f64,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub escalate_to_l3: bool,
    pub reasoning: String,
    #[serde(default)]
    pub runbook_id: Option<RunbookId>,
}

impl PlannerDecision {
    /// True when the decision can be auto-applied without a human in the
    /// loop, ignoring the appliance's mode. Callers in manual mode must
    /// still funnel executable decisions to L3 as an approval artifact.
    pub fn is_executable(&self) -> bool {
        !self.escalate_to_l3 && self.confidence >= EXECUTABLE_CONFIDENCE_THRESHOLD && !self.requires_approval
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
