// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn unseen_by_default() {
    let table = DeployStateTable::new();
    assert_eq!(table.get(HostId::new()), DeployState::Unseen);
}

#[test]
fn escalates_after_reaching_max_failures() {
    let table = DeployStateTable::new();
    let host = HostId::new();
    table.record_failure(host, 3, 0, 14_400_000);
    table.record_failure(host, 3, 0, 14_400_000);
    let third = table.record_failure(host, 3, 0, 14_400_000);
    assert_eq!(third, DeployState::Escalated { backoff_until_epoch_ms: 14_400_000 });
}

#[test]
fn installed_state_blocks_further_attempts() {
    let state = DeployState::Installed { installed_epoch_ms: 1_000 };
    assert!(!state.may_attempt(2_000));
}

#[test]
fn escalated_state_unblocks_after_backoff_window() {
    let state = DeployState::Escalated { backoff_until_epoch_ms: 10_000 };
    assert!(!state.may_attempt(5_000));
    assert!(state.may_attempt(10_000));
}
