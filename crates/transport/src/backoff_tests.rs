// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn first_retry_waits_base_duration() {
    assert_eq!(backoff_duration(2, 1), Duration::from_secs(2));
}

#[test]
fn doubles_per_attempt() {
    assert_eq!(backoff_duration(2, 2), Duration::from_secs(4));
    assert_eq!(backoff_duration(2, 3), Duration::from_secs(8));
}

#[test]
fn is_bounded_to_the_ceiling() {
    assert_eq!(backoff_duration(10, 10), Duration::from_secs(MAX_BACKOFF_SECS));
}
