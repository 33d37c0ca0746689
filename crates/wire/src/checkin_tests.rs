// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn subscription_state_gates_healing() {
    assert!(SubscriptionState::Active.healing_allowed());
    assert!(SubscriptionState::Trialing.healing_allowed());
    assert!(SubscriptionState::Unknown.healing_allowed());
    assert!(!SubscriptionState::Suspended.healing_allowed());
}

#[test]
fn checkin_response_roundtrips_through_json() {
    let response = CheckinResponse {
        appliance_id: "app-1".into(),
        server_public_key: None,
        pending_orders: Vec::new(),
        targets: Vec::new(),
        enabled_runbooks: vec!["RB-WIN-SEC-001".into()],
        mode: ApplianceMode::Auto,
        subscription_state: SubscriptionState::Active,
        trigger_drift_scan: false,
    };
    let encoded = serde_json::to_string(&response).unwrap();
    let decoded: CheckinResponse = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.appliance_id, "app-1");
    assert_eq!(decoded.mode, ApplianceMode::Auto);
}
