// SPDX-License-Identifier: MIT

//! Decoding and verifying a signed synced rule bundle from central. The
//! signature covers the canonical JSON of the bundle's `rules` array; a
//! bundle whose signature fails verification (a known key rejects it) is
//! never loaded, per the testable invariant that no rule from a failed
//! bundle ever reaches the active rule set.

use crate::verify::{BundleVerifier, VerifyError};
use appliance_core::{Provenance, Rule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleBundleWire {
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadBundleError {
    #[error("failed to parse rule bundle: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("bundle signature rejected: {0}")]
    Verify(#[from] VerifyError),
}

/// Parses `bytes` as a [`RuleBundleWire`], verifies its signature, and
/// returns the contained rules tagged `Provenance::Synced` with
/// `signature_verified` reflecting whether a known key actually checked out
/// the signature (as opposed to being accepted unverified pre-rollout).
pub fn load_bundle(bytes: &[u8], verifier: &BundleVerifier) -> Result<Vec<Rule>, LoadBundleError> {
    let wire: RuleBundleWire = serde_json::from_slice(bytes)?;
    let payload = serde_json::to_value(&wire.rules)?;
    let verified = verifier.verify(&payload, wire.signature.as_deref())?;

    let mut rules = wire.rules;
    for rule in &mut rules {
        rule.provenance = Provenance::Synced;
        rule.signature_verified = verified;
    }
    Ok(rules)
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
