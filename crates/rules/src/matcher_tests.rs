// SPDX-License-Identifier: MIT

use super::*;
use appliance_core::Operator;
use serde_json::json;
use yare::parameterized;

#[test]
fn extract_field_walks_nested_path() {
    let root = json!({"finding": {"details": {"drift_detected": true}}});
    assert_eq!(extract_field(&root, "finding.details.drift_detected"), Some(&Value::Bool(true)));
}

#[test]
fn extract_field_missing_segment_is_none() {
    let root = json!({"finding": {}});
    assert_eq!(extract_field(&root, "finding.details.drift_detected"), None);
}

#[parameterized(
    all_match = { vec![Condition::new("a", Operator::Eq, json!(1)), Condition::new("b", Operator::Eq, json!("x"))], true },
    one_fails = { vec![Condition::new("a", Operator::Eq, json!(1)), Condition::new("b", Operator::Eq, json!("y"))], false },
    empty_matches_everything = { vec![], true },
)]
fn conjunction_semantics(conditions: Vec<Condition>, expected: bool) {
    let incident_json = json!({"a": 1, "b": "x"});
    assert_eq!(matches_conditions(&conditions, &incident_json), expected);
}

#[test]
fn exists_condition_needs_no_comparand() {
    let conditions = vec![Condition::exists("compliance_tag")];
    assert!(matches_conditions(&conditions, &json!({"compliance_tag": "firewall"})));
    assert!(!matches_conditions(&conditions, &json!({})));
}
