// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn kind_name_matches_variant() {
    let action = Action::RunScript { script: "reset_firewall.ps1".into(), params: HashMap::new() };
    assert_eq!(action.kind_name(), "run_script");
    assert_eq!(Action::ResetCounter.kind_name(), "reset_counter");
}

#[test]
fn run_script_roundtrips_through_json() {
    let mut params = HashMap::new();
    params.insert("profile".to_string(), "domain".to_string());
    let action = Action::RunScript { script: "reset_firewall.ps1".into(), params };
    let encoded = serde_json::to_string(&action).unwrap();
    let decoded: Action = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.kind_name(), "run_script");
}

#[test]
fn tag_field_selects_the_variant() {
    let encoded = serde_json::json!({"kind": "escalate", "reason": "unknown drift shape"});
    let action: Action = serde_json::from_value(encoded).unwrap();
    assert_eq!(action.kind_name(), "escalate");
}
