// SPDX-License-Identifier: MIT

//! The deterministic state-value-to-finding mapping: one [`CheckSpec`] per
//! field the comprehensive probe reports, describing what "compliant" looks
//! like for that field. Evaluating a spec against captured data yields a
//! pass or a [`appliance_core::Finding`] — never an error; an absent or
//! malformed field is itself drift, not a scanner fault.

use appliance_core::{Operator, Severity};
use serde_json::Value;

/// One field's compliance expectation.
#[derive(Debug, Clone)]
pub struct CheckSpec {
    pub check_id: &'static str,
    pub operator: Operator,
    pub expected: Value,
    pub severity: Severity,
    pub control: &'static str,
    /// True for fields whose compliant value is an array the remote shell
    /// may have collapsed to a bare scalar.
    pub expect_array: bool,
}

macro_rules! check {
    ($id:literal, $op:expr, $expected:expr, $severity:expr, $control:literal) => {
        CheckSpec { check_id: $id, operator: $op, expected: $expected, severity: $severity, control: $control, expect_array: false }
    };
    ($id:literal, $op:expr, $expected:expr, $severity:expr, $control:literal, array) => {
        CheckSpec { check_id: $id, operator: $op, expected: $expected, severity: $severity, control: $control, expect_array: true }
    };
}

/// The comprehensive Windows probe's check contract.
pub fn windows_check_specs() -> Vec<CheckSpec> {
    vec![
        check!("firewall_status", Operator::Eq, Value::String("enabled".into()), Severity::High, "firewall"),
        check!("endpoint_protection_status", Operator::Eq, Value::String("running".into()), Severity::Critical, "endpoint-protection"),
        check!("patch_service_status", Operator::Eq, Value::String("running".into()), Severity::Medium, "patch-management"),
        check!("audit_logging_enabled", Operator::Eq, Value::Bool(true), Severity::Medium, "audit-logging"),
        check!("privileged_user_count", Operator::Lt, Value::from(5), Severity::High, "privileged-access"),
        check!("unexpected_scheduled_task_count", Operator::Eq, Value::from(0), Severity::Medium, "scheduled-tasks"),
        check!("disk_encryption_enabled", Operator::Eq, Value::Bool(true), Severity::Critical, "disk-encryption"),
        check!("legacy_protocols_disabled", Operator::Eq, Value::Bool(true), Severity::High, "protocol-hardening"),
        check!("password_policy_min_length", Operator::Gt, Value::from(13), Severity::Medium, "password-policy"),
        check!("dns_matches_baseline", Operator::Eq, Value::Bool(true), Severity::High, "dns-integrity"),
        check!("network_profile", Operator::Eq, Value::String("domain".into()), Severity::Low, "network-profile"),
        check!("directory_services_running", Operator::Eq, Value::Bool(true), Severity::Critical, "directory-services"),
    ]
}

/// The comprehensive Linux probe's check contract.
pub fn linux_check_specs() -> Vec<CheckSpec> {
    vec![
        check!("firewall_rules_enforced", Operator::Eq, Value::Bool(true), Severity::High, "firewall"),
        check!("ssh_root_login_disabled", Operator::Eq, Value::Bool(true), Severity::Critical, "ssh-hardening"),
        check!("failed_service_count", Operator::Eq, Value::from(0), Severity::Medium, "service-health"),
        check!("disk_used_percent", Operator::Lt, Value::from(90), Severity::Medium, "disk-pressure"),
        check!("unexpected_setuid_count", Operator::Eq, Value::from(0), Severity::High, "setuid-inventory"),
        check!("kernel_hardening_applied", Operator::Eq, Value::Bool(true), Severity::High, "kernel-hardening"),
        check!("unexpected_open_port_count", Operator::Eq, Value::from(0), Severity::High, "open-ports"),
        check!("cert_days_until_expiry", Operator::Gt, Value::from(14), Severity::Medium, "certificate-expiry"),
    ]
}

#[cfg(test)]
#[path = "checks_tests.rs"]
mod tests;
