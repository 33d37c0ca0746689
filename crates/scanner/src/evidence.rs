// SPDX-License-Identifier: MIT

//! Packaging a scan cycle's findings into a signed evidence bundle for
//! posting to central. Signing mechanics (which key, which algorithm) are
//! the central sync client's concern; this crate only shapes the bundle and
//! computes the digest the signer signs over.

use appliance_core::Finding;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[async_trait]
pub trait EvidenceSigner: Send + Sync {
    async fn sign(&self, digest: &[u8]) -> Result<String, String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub scan_epoch_ms: u64,
    pub findings: Vec<Finding>,
    pub digest: String,
    pub signature: Option<String>,
}

impl EvidenceBundle {
    /// Builds the bundle's canonical digest (SHA-256 over the
    /// `serde_json`-serialized finding set) ahead of signing.
    pub fn new(scan_epoch_ms: u64, findings: Vec<Finding>) -> Self {
        let digest = digest_findings(&findings);
        Self { scan_epoch_ms, findings, digest, signature: None }
    }

    pub async fn sign(mut self, signer: &dyn EvidenceSigner) -> Result<Self, String> {
        let signature = signer.sign(self.digest.as_bytes()).await?;
        self.signature = Some(signature);
        Ok(self)
    }
}

fn digest_findings(findings: &[Finding]) -> String {
    let bytes = serde_json::to_vec(findings).unwrap_or_default();
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
#[path = "evidence_tests.rs"]
mod tests;
