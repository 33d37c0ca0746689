use super::*;
use serial_test::serial;
use std::io::Write as _;

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn clear_env() {
    for key in ["HEALING_DRY_RUN", "STATE_DIR", "LOG_LEVEL", "L2_API_KEY", "L2_ENABLED"] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn missing_required_fields_fails_to_parse() {
    clear_env();
    let file = write_yaml("state_dir: /tmp/x\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
#[serial]
fn defaults_to_dry_run_when_unspecified() {
    clear_env();
    let file = write_yaml("site_id: site-1\napi_key: abc123\n");
    let config = Config::load(file.path()).unwrap();
    assert!(config.healing_dry_run);
    assert!(!config.l2_enabled);
    assert_eq!(config.scan_interval, std::time::Duration::from_secs(15 * 60));
}

#[test]
#[serial]
fn yaml_can_disable_dry_run() {
    clear_env();
    let file = write_yaml("site_id: site-1\napi_key: abc123\nhealing_dry_run: false\n");
    let config = Config::load(file.path()).unwrap();
    assert!(!config.healing_dry_run);
}

#[test]
#[serial]
fn env_override_wins_over_yaml_for_dry_run() {
    clear_env();
    std::env::set_var("HEALING_DRY_RUN", "false");
    let file = write_yaml("site_id: site-1\napi_key: abc123\nhealing_dry_run: true\n");
    let config = Config::load(file.path()).unwrap();
    assert!(!config.healing_dry_run);
    clear_env();
}

#[test]
#[serial]
fn l2_api_key_implicitly_enables_planner() {
    clear_env();
    let file = write_yaml("site_id: site-1\napi_key: abc123\nl2_api_key: sekret\n");
    let config = Config::load(file.path()).unwrap();
    assert!(config.l2_enabled);
    assert_eq!(config.l2_api_key.as_deref(), Some("sekret"));
}

#[test]
#[serial]
fn l2_api_key_env_override_also_enables_planner() {
    clear_env();
    std::env::set_var("L2_API_KEY", "from-env");
    let file = write_yaml("site_id: site-1\napi_key: abc123\n");
    let config = Config::load(file.path()).unwrap();
    assert!(config.l2_enabled);
    assert_eq!(config.l2_api_key.as_deref(), Some("from-env"));
    clear_env();
}

#[test]
#[serial]
fn l2_enabled_env_override_wins_even_without_api_key() {
    clear_env();
    std::env::set_var("L2_ENABLED", "true");
    let file = write_yaml("site_id: site-1\napi_key: abc123\n");
    let config = Config::load(file.path()).unwrap();
    assert!(config.l2_enabled);
    clear_env();
}

#[test]
#[serial]
fn log_level_is_uppercased_and_env_wins() {
    clear_env();
    std::env::set_var("LOG_LEVEL", "debug");
    let file = write_yaml("site_id: site-1\napi_key: abc123\nlog_level: warn\n");
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.log_level, "DEBUG");
    clear_env();
}

#[test]
#[serial]
fn state_dir_env_override_wins_over_yaml() {
    clear_env();
    std::env::set_var("STATE_DIR", "/env/state");
    let file = write_yaml("site_id: site-1\napi_key: abc123\nstate_dir: /yaml/state\n");
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.state_dir, std::path::PathBuf::from("/env/state"));
    clear_env();
}

#[test]
#[serial]
fn invalid_bool_env_override_is_rejected() {
    clear_env();
    std::env::set_var("HEALING_DRY_RUN", "maybe");
    let file = write_yaml("site_id: site-1\napi_key: abc123\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidHealingDryRun(_)));
    clear_env();
}

#[test]
#[serial]
fn bad_duration_string_is_rejected() {
    clear_env();
    let file = write_yaml("site_id: site-1\napi_key: abc123\nscan_interval: not-a-duration\n");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Duration { field: "scan_interval", .. }));
}
