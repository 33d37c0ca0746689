// SPDX-License-Identifier: MIT

use super::*;
use crate::target::HostId;
use serde_json::json;

#[test]
fn dedup_key_is_stable_across_clones() {
    let host = HostId::new();
    let finding = Finding::new(
        host,
        "firewall_status",
        Severity::High,
        Platform::Windows,
        json!(true),
        json!(false),
    );
    let other = finding.clone();
    assert_eq!(finding.dedup_key(), other.dedup_key());
}

#[test]
fn severity_ordering_places_critical_highest() {
    assert!(Severity::Critical > Severity::High);
    assert!(Severity::High > Severity::Medium);
    assert!(Severity::Medium > Severity::Low);
}
