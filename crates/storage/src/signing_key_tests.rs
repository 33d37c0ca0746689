use super::*;
use tempfile::tempdir;

#[test]
fn generates_and_persists_a_key_on_first_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keys").join("signing.key");

    let key = SigningKey::load_or_generate(&path).unwrap();

    assert!(path.exists());
    assert_eq!(key.public_key_hex().len(), 64);
}

#[test]
fn reloading_the_same_path_yields_the_same_key() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("signing.key");

    let first = SigningKey::load_or_generate(&path).unwrap();
    let second = SigningKey::load_or_generate(&path).unwrap();

    assert_eq!(first.public_key_hex(), second.public_key_hex());
}

#[test]
fn sign_produces_a_verifiable_signature() {
    use ed25519_dalek::{Verifier, VerifyingKey};

    let dir = tempdir().unwrap();
    let key = SigningKey::load_or_generate(dir.path().join("signing.key")).unwrap();

    let digest = b"evidence-bundle-digest";
    let signature_hex = key.sign(digest);

    let public_bytes: [u8; 32] = hex::decode(key.public_key_hex()).unwrap().try_into().unwrap();
    let verifying_key = VerifyingKey::from_bytes(&public_bytes).unwrap();
    let sig_bytes: [u8; 64] = hex::decode(signature_hex).unwrap().try_into().unwrap();
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);

    assert!(verifying_key.verify(digest, &signature).is_ok());
}

#[test]
fn rejects_a_corrupt_key_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("signing.key");
    std::fs::write(&path, "not hex at all!!").unwrap();

    assert!(SigningKey::load_or_generate(&path).is_err());
}

#[cfg(unix)]
#[test]
fn persists_the_key_with_owner_only_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("signing.key");
    SigningKey::load_or_generate(&path).unwrap();

    let meta = std::fs::metadata(&path).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o600);
}
