// SPDX-License-Identifier: MIT

//! Two-phase rebuild markers: an OS-level update is applied tentatively
//! ("test"), confirmed by a post-restart checkin, and only then persisted or
//! rolled back. `appliance-sync` drives the state transitions; this module
//! only owns the three marker files under `<state_dir>/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("failed to parse marker at {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Written alongside `.rebuild-in-progress` so the order can be completed
/// (success/failure posted back to central) after the scheduled restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRebuildOrder {
    pub order_id: String,
    pub completion_url: String,
    pub flake_ref: String,
    pub issued_epoch_ms: u64,
}

/// Written when the rebuild is activated in test mode, before the
/// self-restart is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct InProgressMarker {
    previous_system: String,
    started_epoch_ms: u64,
}

/// Written once `CompletePendingRebuild` confirms the new system survived a
/// checkin after restart. An external watchdog reads this file to decide
/// whether to persist the new generation or roll back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedMarker {
    pub verified_at: DateTime<Utc>,
}

pub struct RebuildMarkers {
    in_progress_path: PathBuf,
    pending_order_path: PathBuf,
    verified_path: PathBuf,
}

impl RebuildMarkers {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        let state_dir = state_dir.as_ref();
        Self {
            in_progress_path: state_dir.join(".rebuild-in-progress"),
            pending_order_path: state_dir.join(".pending-rebuild-order"),
            verified_path: state_dir.join(".rebuild-verified"),
        }
    }

    /// Phase one: the rebuild-os order has been activated in test mode.
    /// Records the previous system pointer (for rollback) and the pending
    /// order so it can be completed after the scheduled restart.
    pub fn begin(&self, previous_system: &str, pending: &PendingRebuildOrder, now_epoch_ms: u64) -> Result<(), MarkerError> {
        let marker = InProgressMarker { previous_system: previous_system.to_string(), started_epoch_ms: now_epoch_ms };
        write_json(&self.in_progress_path, &marker)?;
        write_json(&self.pending_order_path, pending)?;
        Ok(())
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress_path.exists()
    }

    /// Reads the pending order left by [`Self::begin`], if a rebuild was in
    /// flight when the process last stopped.
    pub fn read_pending(&self) -> Result<Option<PendingRebuildOrder>, MarkerError> {
        read_json(&self.pending_order_path)
    }

    /// Phase two: the post-restart checkin succeeded. Writes the verified
    /// marker (for the external watchdog) and removes the two staging
    /// markers so a crash loop can't replay completion twice.
    pub fn complete(&self, verified_at: DateTime<Utc>) -> Result<(), MarkerError> {
        write_json(&self.verified_path, &VerifiedMarker { verified_at })?;
        remove_if_present(&self.in_progress_path)?;
        remove_if_present(&self.pending_order_path)?;
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), MarkerError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| MarkerError::Write { path: parent.to_path_buf(), source })?;
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| MarkerError::Parse { path: path.to_path_buf(), source })?;
    std::fs::write(path, bytes).map_err(|source| MarkerError::Write { path: path.to_path_buf(), source })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, MarkerError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|source| MarkerError::Parse { path: path.to_path_buf(), source })?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(MarkerError::Read { path: path.to_path_buf(), source }),
    }
}

fn remove_if_present(path: &Path) -> Result<(), MarkerError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MarkerError::Write { path: path.to_path_buf(), source }),
    }
}

#[cfg(test)]
#[path = "markers_tests.rs"]
mod tests;
