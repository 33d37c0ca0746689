// SPDX-License-Identifier: MIT

//! Exponential backoff for remote-executor retries: `base * 2^(attempt-1)`,
//! bounded to a sane ceiling so a high retry budget can't wedge a scan cycle.

use std::time::Duration;

const MAX_BACKOFF_SECS: u64 = 60;

/// `attempt` is 1-indexed: the wait *before* attempt 2, 3, ...
pub fn backoff_duration(base_s: u64, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(10);
    let secs = base_s.saturating_mul(1u64 << exp).min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
