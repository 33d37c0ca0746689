// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn failure_payload_omits_result() {
    let payload = CompletionPayload::failure("unknown order type");
    let encoded = serde_json::to_value(&payload).unwrap();
    assert!(encoded.get("result").is_none());
    assert_eq!(encoded["success"], false);
}

#[test]
fn success_payload_carries_result() {
    let payload = CompletionPayload::success(serde_json::json!({"installed": true}));
    assert!(payload.success);
    assert_eq!(payload.result.unwrap()["installed"], true);
}
