// SPDX-License-Identifier: MIT

//! The router's own (host, check) cooldown/flap table. Deliberately
//! separate from the rule engine's (rule, host, check) cooldown table in
//! `appliance-rules`: a host flapping on one check must not be silenced by
//! which rule happened to match it, and the flap escalation this table
//! tracks operates above rule matching entirely.

use appliance_core::{Clock, CooldownEntry, HostId};
use parking_lot::Mutex;
use std::collections::HashMap;

pub const DEFAULT_COOLDOWN_SECONDS: u64 = 600;
pub const FLAP_COOLDOWN_SECONDS: u64 = 3_600;
pub const DEFAULT_FLAP_THRESHOLD: u32 = 3;
pub const DEFAULT_FLAP_WINDOW_SECONDS: u64 = 1_800;

#[derive(Debug, Clone, Copy)]
pub struct CooldownPolicy {
    pub default_cooldown_seconds: u64,
    pub flap_cooldown_seconds: u64,
    pub flap_threshold: u32,
    pub flap_window_seconds: u64,
    /// Entries untouched for longer than this are evicted the next time the
    /// table is swept. Must be at least 2x `flap_cooldown_seconds`.
    pub cleanup_after_seconds: u64,
    /// Sweep for eviction once the table grows past this many entries.
    pub cleanup_size_threshold: usize,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            default_cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            flap_cooldown_seconds: FLAP_COOLDOWN_SECONDS,
            flap_threshold: DEFAULT_FLAP_THRESHOLD,
            flap_window_seconds: DEFAULT_FLAP_WINDOW_SECONDS,
            cleanup_after_seconds: FLAP_COOLDOWN_SECONDS * 2,
            cleanup_size_threshold: 10_000,
        }
    }
}

type CooldownKey = (HostId, String);

/// First occurrence for a pair always allows. Later occurrences inside the
/// current window are suppressed; `flap_threshold` suppressions inside
/// `flap_window_seconds` widen the pair's own window to the flap cooldown.
pub struct HealingCooldownTable<C: Clock> {
    policy: CooldownPolicy,
    clock: C,
    entries: Mutex<HashMap<CooldownKey, CooldownEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    Allow,
    Suppress,
}

impl<C: Clock> HealingCooldownTable<C> {
    pub fn new(policy: CooldownPolicy, clock: C) -> Self {
        Self { policy, clock, entries: Mutex::new(HashMap::new()) }
    }

    /// Checks and records in one step, so no two callers can both observe
    /// "allowed" for the same pair inside one window.
    pub fn check_and_record(&self, host_id: HostId, check_id: &str) -> CooldownDecision {
        let now = self.clock.epoch_ms();
        let key = (host_id, check_id.to_string());
        let mut entries = self.entries.lock();

        self.maybe_sweep(&mut entries, now);

        match entries.get_mut(&key) {
            None => {
                entries.insert(key, CooldownEntry::new(now, self.policy.default_cooldown_seconds));
                CooldownDecision::Allow
            }
            Some(entry) => {
                if entry.is_cooling_down(now) {
                    entry.record_repeat(now, self.policy.flap_window_seconds);
                    if entry.is_flapping(self.policy.flap_threshold) {
                        entry.extend_cooldown(now, self.policy.flap_cooldown_seconds);
                    }
                    CooldownDecision::Suppress
                } else {
                    entry.refresh(now, self.policy.default_cooldown_seconds);
                    CooldownDecision::Allow
                }
            }
        }
    }

    fn maybe_sweep(&self, entries: &mut HashMap<CooldownKey, CooldownEntry>, now: u64) {
        if entries.len() <= self.policy.cleanup_size_threshold {
            return;
        }
        let cleanup_after_ms = self.policy.cleanup_after_seconds * 1_000;
        entries.retain(|_, entry| now.saturating_sub(entry.last_action_epoch_ms) < cleanup_after_ms);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "cooldown_tests.rs"]
mod tests;
