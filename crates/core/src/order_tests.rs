// SPDX-License-Identifier: MIT

use super::*;

fn sample_order() -> Order {
    Order {
        id: OrderId::from("ord-1"),
        kind: OrderKind::SyncRules,
        nonce: 7,
        payload: serde_json::json!({"bundle_url": "https://example.invalid/bundle"}),
        signature: "deadbeef".into(),
        issued_epoch_ms: 1_700_000_000_000,
    }
}

#[test]
fn canonical_payload_is_stable_across_calls() {
    let order = sample_order();
    assert_eq!(order.canonical_payload(), order.canonical_payload());
}

#[test]
fn canonical_payload_changes_with_nonce() {
    let mut order = sample_order();
    let before = order.canonical_payload();
    order.nonce += 1;
    assert_ne!(before, order.canonical_payload());
}
