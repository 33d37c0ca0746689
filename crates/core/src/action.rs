// SPDX-License-Identifier: MIT

//! The healing action sum type. Rules and planner decisions both bottom out
//! in one of these instead of passing a free-form action name plus a
//! loosely-typed params map past the point where they're decoded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Run a named remediation script on the target, with string params.
    RunScript {
        script: String,
        #[serde(default)]
        params: HashMap<String, String>,
    },
    /// Hand the incident to the planner (L2) or, if the planner itself
    /// declines, to a human (L3).
    Escalate {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Clear a rule's flap counter for this host/check without taking any
    /// corrective action — used when a rule decides the repeat matches were
    /// transient.
    ResetCounter,
    /// A planner-authored fix outside the builtin script catalog: a shell
    /// command plus an explanation, only ever reached through L2/L3 approval.
    RootCauseFix {
        command: String,
        explanation: String,
    },
}

impl Action {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Action::RunScript { .. } => "run_script",
            Action::Escalate { .. } => "escalate",
            Action::ResetCounter => "reset_counter",
            Action::RootCauseFix { .. } => "root_cause_fix",
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
