// SPDX-License-Identifier: MIT

//! Thin adapter wiring the appliance's own Ed25519 key into the scanner's
//! evidence-signing seam.

use appliance_scanner::EvidenceSigner;
use appliance_storage::SigningKey;
use async_trait::async_trait;
use std::sync::Arc;

pub struct DaemonEvidenceSigner {
    key: Arc<SigningKey>,
}

impl DaemonEvidenceSigner {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self { key }
    }
}

#[async_trait]
impl EvidenceSigner for DaemonEvidenceSigner {
    async fn sign(&self, digest: &[u8]) -> Result<String, String> {
        Ok(self.key.sign(digest))
    }
}
