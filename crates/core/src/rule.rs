// SPDX-License-Identifier: MIT

//! Rule definitions consumed by the L1 rule engine.

use crate::finding::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_str_id! {
    /// Unique rule identifier, assigned by whoever authored the rule
    /// (built-in, operator, or the central rules bundle) — e.g. `"L1-FW-001"`.
    pub struct RuleId;
}

/// Condition comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Contains,
    Regex,
    Gt,
    Lt,
    In,
    NotIn,
    Exists,
}

/// A single rule condition. Conditions within a rule conjoin (AND).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted field path into the incident data map, e.g. `"details.drift_detected"`.
    pub field: String,
    pub operator: Operator,
    /// Absent for `Exists`, which only tests presence of `field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparand: Option<serde_json::Value>,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, comparand: serde_json::Value) -> Self {
        Self { field: field.into(), operator, comparand: Some(comparand) }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self { field: field.into(), operator: Operator::Exists, comparand: None }
    }
}

/// Where a rule came from. Determines load order, never overrides by id
/// collision (all rules are kept, disambiguated by priority).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Builtin,
    Custom,
    Synced,
    Promoted,
}

crate::simple_display! {
    Provenance {
        Builtin => "builtin",
        Custom => "custom",
        Synced => "synced",
        Promoted => "promoted",
    }
}

/// A deterministic healing rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub action: String,
    #[serde(default)]
    pub action_params: HashMap<String, serde_json::Value>,
    /// Allow-list of severities this rule applies to; empty means "all".
    #[serde(default)]
    pub severity_filter: Vec<Severity>,
    /// Lower priority value is checked first; first match wins.
    pub priority: i64,
    pub cooldown_seconds: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub provenance: Provenance,
    /// Set once the bundle this rule arrived in has passed signature
    /// verification (see `appliance-rules`'s verifier). Builtin/custom rules
    /// are never synced bundles, so this is always `true` for them.
    #[serde(default = "default_true")]
    pub signature_verified: bool,
}

fn default_true() -> bool {
    true
}

impl Rule {
    pub fn matches_severity(&self, severity: Severity) -> bool {
        self.severity_filter.is_empty() || self.severity_filter.contains(&severity)
    }
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
