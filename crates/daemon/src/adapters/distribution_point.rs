// SPDX-License-Identifier: MIT

//! Stages large binaries to a directory served back out by the agent file
//! server, so a target's fetch script just hits this same daemon over HTTP.

use appliance_transport::staging::DistributionPointUploader;
use async_trait::async_trait;
use std::path::PathBuf;

pub struct FilesystemDistributionPointUploader {
    root: PathBuf,
}

impl FilesystemDistributionPointUploader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl DistributionPointUploader for FilesystemDistributionPointUploader {
    async fn upload(&self, key: &str, payload: &[u8]) -> Result<(), String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| err.to_string())?;
        }
        tokio::fs::write(&path, payload).await.map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_writes_bytes_under_the_key_path() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = FilesystemDistributionPointUploader::new(dir.path().to_path_buf());
        uploader.upload("agent-binaries/hst-1", b"payload").await.unwrap();
        let written = tokio::fs::read(dir.path().join("agent-binaries/hst-1")).await.unwrap();
        assert_eq!(written, b"payload");
    }
}
