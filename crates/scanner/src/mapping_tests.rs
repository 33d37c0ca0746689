// SPDX-License-Identifier: MIT

use super::*;
use crate::checks::windows_check_specs;
use appliance_core::HostId;
use serde_json::json;

fn compliant_windows_state() -> HashMap<String, Value> {
    HashMap::from([
        ("firewall_status".to_string(), json!("enabled")),
        ("endpoint_protection_status".to_string(), json!("running")),
        ("patch_service_status".to_string(), json!("running")),
        ("audit_logging_enabled".to_string(), json!(true)),
        ("privileged_user_count".to_string(), json!(2)),
        ("unexpected_scheduled_task_count".to_string(), json!(0)),
        ("disk_encryption_enabled".to_string(), json!(true)),
        ("legacy_protocols_disabled".to_string(), json!(true)),
        ("password_policy_min_length".to_string(), json!(16)),
        ("dns_matches_baseline".to_string(), json!(true)),
        ("network_profile".to_string(), json!("domain")),
        ("directory_services_running".to_string(), json!(true)),
    ])
}

#[test]
fn a_fully_compliant_state_yields_no_findings() {
    let findings = emit_findings(&windows_check_specs(), &compliant_windows_state(), HostId::new(), Platform::Windows);
    assert!(findings.is_empty());
}

#[test]
fn a_single_drifted_field_yields_exactly_one_finding() {
    let mut state = compliant_windows_state();
    state.insert("firewall_status".to_string(), json!("disabled"));
    let findings = emit_findings(&windows_check_specs(), &state, HostId::new(), Platform::Windows);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].check_id.as_str(), "firewall_status");
    assert_eq!(findings[0].actual, json!("disabled"));
}

#[test]
fn a_missing_field_is_treated_as_drift_with_a_null_actual() {
    let mut state = compliant_windows_state();
    state.remove("disk_encryption_enabled");
    let findings = emit_findings(&windows_check_specs(), &state, HostId::new(), Platform::Windows);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].check_id.as_str(), "disk_encryption_enabled");
    assert_eq!(findings[0].actual, Value::Null);
}

#[test]
fn numeric_threshold_checks_compare_the_right_direction() {
    let mut state = compliant_windows_state();
    state.insert("privileged_user_count".to_string(), json!(9));
    let findings = emit_findings(&windows_check_specs(), &state, HostId::new(), Platform::Windows);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].check_id.as_str(), "privileged_user_count");
}
