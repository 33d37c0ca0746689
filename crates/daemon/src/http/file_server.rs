// SPDX-License-Identifier: MIT

//! Serves the local agent binary directory under `/agent/*`: the binary
//! itself, a `VERSION` sidecar, and a memoized `/agent/version.json`
//! manifest. The manifest is recomputed only when the binary's mtime
//! changes, so repeated heartbeat-triggered reads don't re-hash on
//! every request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tower_http::services::ServeDir;

#[derive(Clone, Serialize)]
pub struct VersionManifest {
    pub version: String,
    pub sha256: String,
    pub size: u64,
    pub filename: String,
    pub updated_at: DateTime<Utc>,
}

struct ManifestCache {
    mtime: Option<SystemTime>,
    manifest: Option<VersionManifest>,
}

pub struct AgentFileServer {
    agent_dir: PathBuf,
    binary_name: String,
    cache: Mutex<ManifestCache>,
}

impl AgentFileServer {
    pub fn new(agent_dir: PathBuf, binary_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { agent_dir, binary_name: binary_name.into(), cache: Mutex::new(ManifestCache { mtime: None, manifest: None }) })
    }

    fn version(&self) -> std::io::Result<String> {
        std::fs::read_to_string(self.agent_dir.join("VERSION")).map(|value| value.trim().to_string())
    }

    fn manifest(&self) -> Option<VersionManifest> {
        let binary_path = self.agent_dir.join(&self.binary_name);
        let metadata = std::fs::metadata(&binary_path).ok()?;
        let mtime = metadata.modified().ok()?;

        let mut cache = self.cache.lock();
        if cache.mtime == Some(mtime) {
            if let Some(manifest) = &cache.manifest {
                return Some(manifest.clone());
            }
        }

        let bytes = std::fs::read(&binary_path).ok()?;
        let sha256 = hex::encode(Sha256::digest(&bytes));
        let manifest = VersionManifest {
            version: self.version().unwrap_or_else(|_| "unknown".to_string()),
            sha256,
            size: metadata.len(),
            filename: self.binary_name.clone(),
            updated_at: Utc::now(),
        };
        cache.mtime = Some(mtime);
        cache.manifest = Some(manifest.clone());
        Some(manifest)
    }
}

pub fn router(server: Arc<AgentFileServer>) -> Router {
    let static_files = ServeDir::new(&server.agent_dir);
    Router::new()
        .route("/agent/version.json", get(version_json))
        .nest_service("/agent", static_files)
        .with_state(server)
}

async fn version_json(State(server): State<Arc<AgentFileServer>>) -> impl IntoResponse {
    match server.manifest() {
        Some(manifest) => Json(manifest).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
