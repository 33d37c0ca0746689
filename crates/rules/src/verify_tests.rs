// SPDX-License-Identifier: MIT

use super::*;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::json;

fn keypair() -> (SigningKey, String) {
    let signing_key = SigningKey::from_bytes(&[7u8; 32]);
    let public_hex = hex::encode(signing_key.verifying_key().to_bytes());
    (signing_key, public_hex)
}

#[test]
fn unsigned_accepted_while_no_key_known() {
    let verifier = BundleVerifier::new();
    let payload = json!({"rules": []});
    assert_eq!(verifier.verify(&payload, None).unwrap(), false);
}

#[test]
fn unsigned_accepted_but_logged_once_key_known() {
    let (_signing_key, public_hex) = keypair();
    let verifier = BundleVerifier::new();
    verifier.set_public_key_hex(&public_hex).unwrap();

    let payload = json!({"rules": []});
    assert_eq!(verifier.verify(&payload, None).unwrap(), false);
}

#[test]
fn valid_signature_verifies_true() {
    let (signing_key, public_hex) = keypair();
    let verifier = BundleVerifier::new();
    verifier.set_public_key_hex(&public_hex).unwrap();

    let payload = json!({"rules": [{"id": "L1-FW-001"}]});
    let canonical = serde_json::to_vec(&payload).unwrap();
    let signature = signing_key.sign(&canonical);
    let signature_hex = hex::encode(signature.to_bytes());

    assert_eq!(verifier.verify(&payload, Some(&signature_hex)).unwrap(), true);
}

#[test]
fn tampered_payload_fails_verification() {
    let (signing_key, public_hex) = keypair();
    let verifier = BundleVerifier::new();
    verifier.set_public_key_hex(&public_hex).unwrap();

    let signed_payload = json!({"rules": [{"id": "L1-FW-001"}]});
    let canonical = serde_json::to_vec(&signed_payload).unwrap();
    let signature = signing_key.sign(&canonical);
    let signature_hex = hex::encode(signature.to_bytes());

    let tampered = json!({"rules": [{"id": "L1-FW-002"}]});
    assert!(matches!(verifier.verify(&tampered, Some(&signature_hex)), Err(VerifyError::SignatureMismatch)));
}

#[test]
fn malformed_signature_hex_is_rejected() {
    let (_signing_key, public_hex) = keypair();
    let verifier = BundleVerifier::new();
    verifier.set_public_key_hex(&public_hex).unwrap();

    let payload = json!({"rules": []});
    assert!(matches!(verifier.verify(&payload, Some("not-hex")), Err(VerifyError::InvalidSignature(_))));
}

#[test]
fn malformed_public_key_is_rejected_at_set_time() {
    let verifier = BundleVerifier::new();
    assert!(matches!(verifier.set_public_key_hex("zz"), Err(VerifyError::InvalidPublicKey(_))));
}
