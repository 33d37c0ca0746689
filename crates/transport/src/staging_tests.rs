// SPDX-License-Identifier: MIT

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct CountingUploader {
    uploads: AtomicU32,
}

#[async_trait::async_trait]
impl DistributionPointUploader for CountingUploader {
    async fn upload(&self, _key: &str, _payload: &[u8]) -> Result<(), String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn restaging_identical_bytes_is_a_no_op() {
    let uploader = Arc::new(CountingUploader { uploads: AtomicU32::new(0) });
    let dp = DistributionPoint::new(uploader.clone());
    dp.ensure_staged("agent.exe", b"payload").await.unwrap();
    dp.ensure_staged("agent.exe", b"payload").await.unwrap();
    assert_eq!(uploader.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn changed_bytes_trigger_a_restage() {
    let uploader = Arc::new(CountingUploader { uploads: AtomicU32::new(0) });
    let dp = DistributionPoint::new(uploader.clone());
    dp.ensure_staged("agent.exe", b"v1").await.unwrap();
    dp.ensure_staged("agent.exe", b"v2").await.unwrap();
    assert_eq!(uploader.uploads.load(Ordering::SeqCst), 2);
}

#[test]
fn inline_threshold_matches_the_400kb_boundary() {
    assert!(DistributionPoint::should_stage_inline(399 * 1024));
    assert!(!DistributionPoint::should_stage_inline(400 * 1024));
}
