// SPDX-License-Identifier: MIT

//! Built-in rules, loaded first and never overridden by later provenance
//! layers (collisions by id are never resolved here — everything loaded is
//! kept, sorted by priority). These are deliberately narrow: enough to heal
//! the checks the comprehensive probe's contract names, with runbook ids the
//! embedded script registry resolves (out of scope for this crate).

use appliance_core::{Condition, Operator, Provenance, Rule, Severity};
use serde_json::Value;
use std::collections::HashMap;

fn run_script_params(script_id: &str) -> HashMap<String, Value> {
    HashMap::from([("script".to_string(), Value::String(script_id.to_string()))])
}

pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "L1-FW-001".into(),
            name: "Re-enable host firewall".to_string(),
            conditions: vec![Condition::new("check_id", Operator::Eq, Value::String("firewall_status".into()))],
            action: "run_script".to_string(),
            action_params: run_script_params("RB-WIN-SEC-001"),
            severity_filter: vec![Severity::High, Severity::Critical],
            priority: 100,
            cooldown_seconds: 600,
            max_retries: 1,
            enabled: true,
            provenance: Provenance::Builtin,
            signature_verified: true,
        },
        Rule {
            id: "L1-DEF-001".into(),
            name: "Restart endpoint protection service".to_string(),
            conditions: vec![Condition::new("check_id", Operator::Eq, Value::String("endpoint_protection_status".into()))],
            action: "run_script".to_string(),
            action_params: run_script_params("RB-WIN-SEC-002"),
            severity_filter: vec![],
            priority: 110,
            cooldown_seconds: 600,
            max_retries: 1,
            enabled: true,
            provenance: Provenance::Builtin,
            signature_verified: true,
        },
        Rule {
            id: "L1-SSH-001".into(),
            name: "Disable SSH root login".to_string(),
            conditions: vec![Condition::new("check_id", Operator::Eq, Value::String("ssh_root_login_disabled".into()))],
            action: "run_script".to_string(),
            action_params: run_script_params("RB-LNX-SEC-001"),
            severity_filter: vec![],
            priority: 120,
            cooldown_seconds: 600,
            max_retries: 1,
            enabled: true,
            provenance: Provenance::Builtin,
            signature_verified: true,
        },
    ]
}

#[cfg(test)]
#[path = "builtin_tests.rs"]
mod tests;
