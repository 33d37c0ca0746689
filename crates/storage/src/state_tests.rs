use super::*;
use appliance_core::{Platform, Target};
use appliance_wire::checkin::{ApplianceMode, SubscriptionState};
use tempfile::tempdir;
use yare::parameterized;

fn sample_state() -> DaemonState {
    DaemonState::new(
        vec![Target::new(appliance_core::HostId::new(), "10.0.0.5", 22, Platform::Linux)],
        ApplianceMode::Auto,
        SubscriptionState::Active,
        1_700_000_000_000,
    )
}

#[test]
fn load_returns_none_when_no_snapshot_exists_yet() {
    let dir = tempdir().unwrap();
    let persistor = StatePersistor::new(dir.path());
    assert_eq!(persistor.load().unwrap(), None);
}

#[test]
fn save_then_load_round_trips_bit_exact() {
    let dir = tempdir().unwrap();
    let persistor = StatePersistor::new(dir.path());
    let state = sample_state();

    persistor.save(&state).unwrap();
    let loaded = persistor.load().unwrap().unwrap();

    assert_eq!(loaded, state);
}

#[test]
fn save_overwrites_a_prior_snapshot() {
    let dir = tempdir().unwrap();
    let persistor = StatePersistor::new(dir.path());

    persistor.save(&sample_state()).unwrap();
    let mut second = sample_state();
    second.mode = ApplianceMode::Manual;
    second.updated_epoch_ms = 1_700_000_001_000;
    persistor.save(&second).unwrap();

    assert_eq!(persistor.load().unwrap().unwrap(), second);
}

#[test]
fn parse_failure_on_a_corrupt_file_is_an_error_not_a_none() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("daemon_state.json"), b"not json").unwrap();
    let persistor = StatePersistor::new(dir.path());

    assert!(persistor.load().is_err());
}

#[test]
fn save_creates_the_state_directory_if_missing() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("nested").join("state");
    let persistor = StatePersistor::new(&nested);

    persistor.save(&sample_state()).unwrap();

    assert!(persistor.load().unwrap().is_some());
}

#[cfg(unix)]
#[test]
fn save_restricts_the_snapshot_to_owner_only_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let persistor = StatePersistor::new(dir.path());
    persistor.save(&sample_state()).unwrap();

    let meta = std::fs::metadata(dir.path().join("daemon_state.json")).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o600);
}

#[parameterized(
    auto = { ApplianceMode::Auto },
    manual = { ApplianceMode::Manual },
    disabled = { ApplianceMode::Disabled },
)]
fn every_mode_round_trips(mode: ApplianceMode) {
    let dir = tempdir().unwrap();
    let persistor = StatePersistor::new(dir.path());
    let mut state = sample_state();
    state.mode = mode;

    persistor.save(&state).unwrap();

    assert_eq!(persistor.load().unwrap().unwrap().mode, mode);
}
