// SPDX-License-Identifier: MIT

use super::*;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::json;

fn sample_wire_bytes(signed: bool, signing_key: &SigningKey) -> Vec<u8> {
    let rules = json!([{
        "id": "L1-SYNCED-001",
        "name": "synced rule",
        "conditions": [],
        "action": "run_script",
        "action_params": {},
        "severity_filter": [],
        "priority": 50,
        "cooldown_seconds": 300,
        "max_retries": 0,
        "enabled": true,
        "provenance": "synced",
        "signature_verified": false,
    }]);
    let canonical = serde_json::to_vec(&rules).unwrap();
    let signature = signed.then(|| hex::encode(signing_key.sign(&canonical).to_bytes()));

    serde_json::to_vec(&json!({"rules": rules, "signature": signature})).unwrap()
}

#[test]
fn valid_bundle_loads_with_signature_verified() {
    let signing_key = SigningKey::from_bytes(&[3u8; 32]);
    let verifier = BundleVerifier::new();
    verifier.set_public_key_hex(&hex::encode(signing_key.verifying_key().to_bytes())).unwrap();

    let bytes = sample_wire_bytes(true, &signing_key);
    let rules = load_bundle(&bytes, &verifier).unwrap();

    assert_eq!(rules.len(), 1);
    assert!(rules[0].signature_verified);
    assert_eq!(rules[0].provenance, Provenance::Synced);
}

#[test]
fn tampered_bundle_is_rejected_entirely() {
    let signing_key = SigningKey::from_bytes(&[3u8; 32]);
    let other_key = SigningKey::from_bytes(&[9u8; 32]);
    let verifier = BundleVerifier::new();
    verifier.set_public_key_hex(&hex::encode(signing_key.verifying_key().to_bytes())).unwrap();

    let bytes = sample_wire_bytes(true, &other_key);
    assert!(matches!(load_bundle(&bytes, &verifier), Err(LoadBundleError::Verify(_))));
}

#[test]
fn unsigned_bundle_loads_unverified_when_no_key_known() {
    let signing_key = SigningKey::from_bytes(&[3u8; 32]);
    let verifier = BundleVerifier::new();

    let bytes = sample_wire_bytes(false, &signing_key);
    let rules = load_bundle(&bytes, &verifier).unwrap();

    assert_eq!(rules.len(), 1);
    assert!(!rules[0].signature_verified);
}
