// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn auth_failed_is_not_retryable() {
    assert!(!ErrorKind::AuthFailed.is_retryable());
    assert!(!ErrorKind::DnsNotFound.is_retryable());
}

#[test]
fn timeout_is_retryable() {
    assert!(ErrorKind::Timeout.is_retryable());
    assert!(ErrorKind::ConnectionRefused.is_retryable());
}

#[test]
fn error_kind_is_none_on_success() {
    let result = ExecutionResult::success("ok", 12);
    assert!(result.is_success());
    assert_eq!(result.error_kind(), None);
    assert_eq!(result.std_out(), Some("ok"));
}

#[test]
fn output_hash_is_deterministic() {
    let a = ExecutionResult::success("same output", 1);
    let b = ExecutionResult::success("same output", 2);
    let (ExecutionResult::Success { output_hash: hash_a, .. }, ExecutionResult::Success { output_hash: hash_b, .. }) = (&a, &b) else {
        unreachable!()
    };
    assert_eq!(hash_a, hash_b);
}

#[test]
fn error_kind_is_some_on_failure() {
    let result = ExecutionResult::Failure {
        kind: ErrorKind::Timeout,
        message: "connect timed out".into(),
        duration_ms: 3_000,
    };
    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ErrorKind::Timeout));
}
