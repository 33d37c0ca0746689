// SPDX-License-Identifier: MIT

//! C11: the rule-bundle/order verifier. Holds an Ed25519 public key received
//! from central on first checkin and checks detached signatures over a
//! canonical-JSON payload.
//!
//! Canonical JSON here is `serde_json::to_vec` on a `Value` directly: this
//! workspace never enables `serde_json`'s `preserve_order` feature, so its
//! `Map` is backed by a `BTreeMap` and every object serializes with sorted
//! keys already, matching the sorted-keys/deterministic-separator contract
//! the signer uses.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use parking_lot::RwLock;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid public key encoding: {0}")]
    InvalidPublicKey(String),
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),
    #[error("signature does not verify against the known public key")]
    SignatureMismatch,
    #[error("failed to serialize payload for verification: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Holds the server's public key, if known yet. Unset until the first
/// central checkin response carries one (see `appliance-sync`).
#[derive(Default)]
pub struct BundleVerifier {
    public_key: RwLock<Option<VerifyingKey>>,
}

impl BundleVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_public_key_hex(&self, hex_key: &str) -> Result<(), VerifyError> {
        let bytes = hex::decode(hex_key).map_err(|err| VerifyError::InvalidPublicKey(err.to_string()))?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| VerifyError::InvalidPublicKey("expected 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&array).map_err(|err| VerifyError::InvalidPublicKey(err.to_string()))?;
        *self.public_key.write() = Some(key);
        Ok(())
    }

    pub fn has_known_key(&self) -> bool {
        self.public_key.read().is_some()
    }

    /// `Ok(true)` — a known key checked the signature and it matched.
    /// `Ok(false)` — accepted without a completed check: either no key is
    /// known yet, or a key is known but the bundle arrived unsigned (rollout
    /// phase: logged, not yet rejected).
    /// `Err` — a known key's signature check on a present signature failed;
    /// the caller must not load anything from this payload.
    pub fn verify(&self, payload: &Value, signature_hex: Option<&str>) -> Result<bool, VerifyError> {
        let guard = self.public_key.read();
        let Some(key) = guard.as_ref() else {
            return Ok(false);
        };

        let Some(signature_hex) = signature_hex else {
            tracing::warn!("payload arrived unsigned while a server public key is known; accepting during rollout");
            return Ok(false);
        };

        let canonical = serde_json::to_vec(payload)?;
        let sig_bytes = hex::decode(signature_hex).map_err(|err| VerifyError::InvalidSignature(err.to_string()))?;
        let sig_array: [u8; 64] = sig_bytes.try_into().map_err(|_| VerifyError::InvalidSignature("expected 64 bytes".into()))?;
        let signature = Signature::from_bytes(&sig_array);

        key.verify(&canonical, &signature).map_err(|_| VerifyError::SignatureMismatch)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
