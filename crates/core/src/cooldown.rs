// SPDX-License-Identifier: MIT

//! Cooldown and flap-window bookkeeping for the healing router.

use crate::target::HostId;
use serde::{Deserialize, Serialize};

/// Tracks the last healing attempt for a `(host, check)` pair, and how many
/// times it has repeated inside the current flap window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub last_action_epoch_ms: u64,
    pub cooldown_until_epoch_ms: u64,
    /// Repeat matches seen inside the active flap window.
    pub flap_count: u32,
    pub flap_window_start_epoch_ms: u64,
}

impl CooldownEntry {
    pub fn new(now_epoch_ms: u64, cooldown_seconds: u64) -> Self {
        Self {
            last_action_epoch_ms: now_epoch_ms,
            cooldown_until_epoch_ms: now_epoch_ms + cooldown_seconds * 1_000,
            flap_count: 1,
            flap_window_start_epoch_ms: now_epoch_ms,
        }
    }

    pub fn is_cooling_down(&self, now_epoch_ms: u64) -> bool {
        now_epoch_ms < self.cooldown_until_epoch_ms
    }

    /// Records a repeat match, extending the flap window tally or starting a
    /// new window if the prior one already expired.
    pub fn record_repeat(&mut self, now_epoch_ms: u64, flap_window_seconds: u64) {
        let window_elapsed = now_epoch_ms.saturating_sub(self.flap_window_start_epoch_ms) > flap_window_seconds * 1_000;
        if window_elapsed {
            self.flap_window_start_epoch_ms = now_epoch_ms;
            self.flap_count = 1;
        } else {
            self.flap_count += 1;
        }
        self.last_action_epoch_ms = now_epoch_ms;
    }

    pub fn is_flapping(&self, flap_threshold: u32) -> bool {
        self.flap_count >= flap_threshold
    }

    pub fn extend_cooldown(&mut self, now_epoch_ms: u64, extended_cooldown_seconds: u64) {
        self.cooldown_until_epoch_ms = now_epoch_ms + extended_cooldown_seconds * 1_000;
    }

    pub fn refresh(&mut self, now_epoch_ms: u64, cooldown_seconds: u64) {
        self.last_action_epoch_ms = now_epoch_ms;
        self.cooldown_until_epoch_ms = now_epoch_ms + cooldown_seconds * 1_000;
    }
}

/// Composite key cooldown state is indexed by: one rule's cooldown clock per
/// host, per check.
pub type CooldownKey = (HostId, String, crate::rule::RuleId);

#[cfg(test)]
#[path = "cooldown_tests.rs"]
mod tests;
