// SPDX-License-Identifier: MIT

//! C10: the state persistor. Atomically persists the small slice of runtime
//! state that must survive a crash — the fleet's Linux targets, the current
//! mode flag, and the subscription state — to `daemon_state.json`. Write
//! sequence is always serialize -> write to a temp path -> rename over the
//! final path, so a reader never observes a half-written file; the file is
//! restricted to owner-only permissions.

use appliance_core::Target;
use appliance_wire::checkin::{ApplianceMode, SubscriptionState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("failed to parse daemon state: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The crash-recoverable runtime state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonState {
    pub linux_targets: Vec<Target>,
    pub mode: ApplianceMode,
    pub subscription: SubscriptionState,
    pub updated_epoch_ms: u64,
}

impl DaemonState {
    pub fn new(linux_targets: Vec<Target>, mode: ApplianceMode, subscription: SubscriptionState, updated_epoch_ms: u64) -> Self {
        Self { linux_targets, mode, subscription, updated_epoch_ms }
    }
}

/// Persists [`DaemonState`] under `<state_dir>/daemon_state.json`.
pub struct StatePersistor {
    path: PathBuf,
}

impl StatePersistor {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self { path: state_dir.as_ref().join("daemon_state.json") }
    }

    /// Loads the last-persisted state. Returns `Ok(None)` when no snapshot
    /// exists yet (first boot) — only a parse failure is an error.
    pub fn load(&self) -> Result<Option<DaemonState>, StateError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateError::Read { path: self.path.clone(), source }),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Serializes `state` and atomically replaces the snapshot file:
    /// write to a sibling temp path, then rename over the final path.
    pub fn save(&self, state: &DaemonState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StateError::Write { path: parent.to_path_buf(), source })?;
        }

        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        write_owner_only(&tmp_path, &bytes).map_err(|source| StateError::Write { path: tmp_path.clone(), source })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| StateError::Write { path: self.path.clone(), source })?;
        Ok(())
    }
}

#[cfg(unix)]
fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = OpenOptions::new().create(true).write(true).truncate(true).mode(0o600).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
