// SPDX-License-Identifier: MIT

//! Two-phase `rebuild-os` order handling: activating the order leaves a
//! pending marker and a test configuration in place, then schedules a
//! self-restart; completion happens on the *next* startup, once a checkin
//! has actually succeeded against the new configuration.

use appliance_core::Clock;
use appliance_storage::{MarkerError, PendingRebuildOrder, RebuildMarkers};
use appliance_wire::OrderDto;
use chrono::Utc;
use tracing::info;

/// What the caller should do after [`RebuildCoordinator::begin`] returns.
/// The actual "apply a test configuration and schedule a restart" step is
/// system-specific and lives in the daemon binary; this only records the
/// marker that makes the second phase possible.
pub struct RebuildCoordinator<C: Clock> {
    markers: RebuildMarkers,
    clock: C,
}

impl<C: Clock> RebuildCoordinator<C> {
    pub fn new(markers: RebuildMarkers, clock: C) -> Self {
        Self { markers, clock }
    }

    /// Phase one, invoked by the `rebuild-os` order handler before the
    /// caller applies the new system and schedules its self-restart.
    pub fn begin(&self, order: &OrderDto, previous_system: &str, flake_ref: &str) -> Result<(), MarkerError> {
        let pending = PendingRebuildOrder {
            order_id: order.id.clone(),
            completion_url: order.completion_url.clone(),
            flake_ref: flake_ref.to_string(),
            issued_epoch_ms: order.issued_epoch_ms,
        };
        self.markers.begin(previous_system, &pending, self.clock.epoch_ms())
    }

    /// Called once at daemon startup, before the first checkin. If a
    /// rebuild was pending when the process last stopped, returns the order
    /// to complete once this startup's checkin confirms the new system is
    /// reachable; `None` means this was an ordinary restart.
    pub fn pending_order(&self) -> Result<Option<PendingRebuildOrder>, MarkerError> {
        if !self.markers.is_in_progress() {
            return Ok(None);
        }
        self.markers.read_pending()
    }

    /// Phase two: the post-restart checkin succeeded. Writes the verified
    /// marker an external watchdog reads to persist the new generation, and
    /// clears the staging markers so a crash loop can't replay this twice.
    pub fn complete(&self) -> Result<(), MarkerError> {
        info!("rebuild verified by post-restart checkin, writing verified marker");
        self.markers.complete(Utc::now())
    }
}

#[cfg(test)]
#[path = "rebuild_tests.rs"]
mod tests;
