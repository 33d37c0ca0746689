// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn platform_matches_variant() {
    let state = ProbeState::Windows { checks: HashMap::new() };
    assert_eq!(state.platform(), Platform::Windows);
}

#[test]
fn get_reads_through_to_the_inner_map() {
    let mut checks = HashMap::new();
    checks.insert("ssh_hardening".to_string(), json!(true));
    let state = ProbeState::Linux { checks };
    assert_eq!(state.get("ssh_hardening"), Some(&json!(true)));
    assert_eq!(state.get("missing"), None);
}

#[test]
fn scalar_is_wrapped_into_single_element_array() {
    assert_eq!(coerce_scalar_to_array(json!("enabled")), json!(["enabled"]));
}

#[test]
fn array_passes_through_unchanged() {
    assert_eq!(coerce_scalar_to_array(json!(["a", "b"])), json!(["a", "b"]));
}
