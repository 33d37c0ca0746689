// SPDX-License-Identifier: MIT

//! Condition matching against an incident lifted into a JSON view. Rules
//! address incident data through dotted field paths (`"finding.actual"`,
//! `"check_id"`); the extractor walks whatever shape `serde_json::to_value`
//! produces for an [`appliance_core::Incident`] rather than a hand-maintained
//! field table, so every serializable field on the incident is addressable.

use appliance_core::{compare_values, Condition};
use serde_json::Value;

/// Walks `field_path` (dot-separated) into `root`, returning `None` as soon
/// as a segment is missing or the current value isn't an object.
pub fn extract_field<'a>(root: &'a Value, field_path: &str) -> Option<&'a Value> {
    field_path.split('.').try_fold(root, |current, segment| current.get(segment))
}

/// All conditions conjoin (AND); an empty condition list matches everything.
pub fn matches_conditions(conditions: &[Condition], incident_json: &Value) -> bool {
    conditions
        .iter()
        .all(|condition| {
            let actual = extract_field(incident_json, &condition.field);
            compare_values(condition.operator, actual, condition.comparand.as_ref())
        })
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
