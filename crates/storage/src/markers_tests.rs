use super::*;
use tempfile::tempdir;

fn sample_pending() -> PendingRebuildOrder {
    PendingRebuildOrder {
        order_id: "ord-123".into(),
        completion_url: "https://central.example/api/orders/ord-123/complete".into(),
        flake_ref: "github:acme/fleet#prod".into(),
        issued_epoch_ms: 1_700_000_000_000,
    }
}

#[test]
fn not_in_progress_before_begin() {
    let dir = tempdir().unwrap();
    let markers = RebuildMarkers::new(dir.path());
    assert!(!markers.is_in_progress());
    assert_eq!(markers.read_pending().unwrap(), None);
}

#[test]
fn begin_writes_both_staging_markers() {
    let dir = tempdir().unwrap();
    let markers = RebuildMarkers::new(dir.path());
    let pending = sample_pending();

    markers.begin("/nix/store/prev-system", &pending, 1_700_000_000_000).unwrap();

    assert!(markers.is_in_progress());
    assert_eq!(markers.read_pending().unwrap(), Some(pending));
}

#[test]
fn complete_writes_verified_marker_and_clears_staging() {
    let dir = tempdir().unwrap();
    let markers = RebuildMarkers::new(dir.path());
    markers.begin("/nix/store/prev-system", &sample_pending(), 1_700_000_000_000).unwrap();

    let verified_at = chrono::DateTime::parse_from_rfc3339("2026-07-27T12:00:00Z").unwrap().with_timezone(&chrono::Utc);
    markers.complete(verified_at).unwrap();

    assert!(!markers.is_in_progress());
    assert_eq!(markers.read_pending().unwrap(), None);
    assert!(dir.path().join(".rebuild-verified").exists());
}

#[test]
fn complete_is_idempotent_when_staging_markers_are_already_gone() {
    let dir = tempdir().unwrap();
    let markers = RebuildMarkers::new(dir.path());

    let verified_at = chrono::Utc::now();
    assert!(markers.complete(verified_at).is_ok());
    assert!(markers.complete(verified_at).is_ok());
}
