// SPDX-License-Identifier: MIT

//! Large-payload staging to a shared distribution point. Scripts and agent
//! binaries that don't fit comfortably through the remote-shell transport's
//! command-line limit are uploaded once and fetched by targets at run time.
//! Staging is idempotent: re-uploading the same bytes is a no-op once a
//! SHA-256 compare confirms the staged copy matches.

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Above this size a payload is staged to the distribution point instead of
/// being sent inline (chunked base-64) through the transport.
pub const INLINE_PAYLOAD_LIMIT_BYTES: usize = 400 * 1024;

#[async_trait::async_trait]
pub trait DistributionPointUploader: Send + Sync {
    async fn upload(&self, key: &str, payload: &[u8]) -> Result<(), String>;
}

/// Tracks what's already staged at the distribution point, keyed by a
/// stable name, so repeated deploy attempts never re-upload unchanged bytes.
pub struct DistributionPoint {
    uploader: std::sync::Arc<dyn DistributionPointUploader>,
    staged_hashes: RwLock<HashMap<String, String>>,
}

impl DistributionPoint {
    pub fn new(uploader: std::sync::Arc<dyn DistributionPointUploader>) -> Self {
        Self { uploader, staged_hashes: RwLock::new(HashMap::new()) }
    }

    pub fn should_stage_inline(payload_len: usize) -> bool {
        payload_len < INLINE_PAYLOAD_LIMIT_BYTES
    }

    /// Stages `payload` under `key` unless a prior call already staged bytes
    /// with the same hash.
    pub async fn ensure_staged(&self, key: &str, payload: &[u8]) -> Result<(), String> {
        let hash = hex::encode(Sha256::digest(payload));
        if self.staged_hashes.read().get(key) == Some(&hash) {
            return Ok(());
        }
        self.uploader.upload(key, payload).await?;
        self.staged_hashes.write().insert(key.to_string(), hash);
        Ok(())
    }
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
