// SPDX-License-Identifier: MIT

//! Loads the daemon's `Config` from a YAML file plus the five environment
//! overrides named in the persisted-state/external-interfaces contract:
//! `HEALING_DRY_RUN`, `STATE_DIR`, `LOG_LEVEL`, `L2_API_KEY`, `L2_ENABLED`.
//! Durations are authored as human strings (`"15m"`, `"30s"`) and parsed via
//! `duration-str`, never hand-rolled suffix parsing.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_yaml::Error },
    #[error("invalid duration for {field} ({value:?}): {message}")]
    Duration { field: &'static str, value: String, message: String },
    #[error("HEALING_DRY_RUN must be a boolean, got {0:?}")]
    InvalidHealingDryRun(String),
    #[error("L2_ENABLED must be a boolean, got {0:?}")]
    InvalidL2Enabled(String),
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    site_id: String,
    api_key: String,
    #[serde(default = "default_central_base_url")]
    central_base_url: String,
    #[serde(default)]
    state_dir: Option<String>,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    healing_dry_run: Option<bool>,
    #[serde(default)]
    l2_enabled: bool,
    #[serde(default)]
    l2_api_key: Option<String>,
    #[serde(default = "default_scan_interval")]
    scan_interval: String,
    #[serde(default = "default_checkin_interval")]
    checkin_interval: String,
    #[serde(default = "default_shutdown_grace")]
    shutdown_grace: String,
    #[serde(default = "default_agent_rpc_port")]
    agent_rpc_port: u16,
    #[serde(default = "default_file_server_port")]
    agent_file_server_port: u16,
    #[serde(default)]
    control_plane_address: Option<String>,
    #[serde(default)]
    planner: RawPlannerConfig,
    #[serde(default)]
    directory_server: RawDirectoryServerConfig,
}

#[derive(Debug, Deserialize)]
struct RawDirectoryServerConfig {
    /// External identifier handed to `HostIdentityRegistry::resolve_or_mint`
    /// so the directory server's `HostId` stays stable across restarts.
    #[serde(default = "default_directory_server_external_id")]
    external_id: String,
    #[serde(default)]
    address: String,
    #[serde(default = "default_directory_server_port")]
    port: u16,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    private_key_pem: Option<String>,
    #[serde(default = "default_discovery_interval")]
    discovery_interval: String,
}

impl Default for RawDirectoryServerConfig {
    fn default() -> Self {
        Self {
            external_id: default_directory_server_external_id(),
            address: String::new(),
            port: default_directory_server_port(),
            username: String::new(),
            password: None,
            private_key_pem: None,
            discovery_interval: default_discovery_interval(),
        }
    }
}

fn default_directory_server_external_id() -> String {
    "directory-server".to_string()
}
fn default_directory_server_port() -> u16 {
    5985
}
fn default_discovery_interval() -> String {
    "30m".to_string()
}

#[derive(Debug, Deserialize)]
struct RawPlannerConfig {
    #[serde(default = "default_planner_endpoint")]
    endpoint: String,
    #[serde(default = "default_daily_spend_cap_usd")]
    daily_spend_cap_usd: f64,
    #[serde(default = "default_calls_per_hour_cap")]
    calls_per_hour_cap: u32,
    #[serde(default = "default_concurrent_calls_cap")]
    concurrent_calls_cap: u32,
    #[serde(default = "default_call_cost_usd")]
    call_cost_usd: f64,
}

impl Default for RawPlannerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_planner_endpoint(),
            daily_spend_cap_usd: default_daily_spend_cap_usd(),
            calls_per_hour_cap: default_calls_per_hour_cap(),
            concurrent_calls_cap: default_concurrent_calls_cap(),
            call_cost_usd: default_call_cost_usd(),
        }
    }
}

fn default_central_base_url() -> String {
    "https://central.example.com".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_scan_interval() -> String {
    "15m".to_string()
}
fn default_checkin_interval() -> String {
    "5m".to_string()
}
fn default_shutdown_grace() -> String {
    "30s".to_string()
}
fn default_agent_rpc_port() -> u16 {
    7443
}
fn default_file_server_port() -> u16 {
    7080
}
fn default_planner_endpoint() -> String {
    "https://central.example.com/api/plan".to_string()
}
fn default_daily_spend_cap_usd() -> f64 {
    25.0
}
fn default_calls_per_hour_cap() -> u32 {
    60
}
fn default_concurrent_calls_cap() -> u32 {
    4
}
fn default_call_cost_usd() -> f64 {
    0.02
}

/// The directory server the appliance talks to for both C3 discovery and the
/// proxy-only remediation path. Unlike workstations (discovered or pushed
/// from central), this target is a configured sentinel known upfront.
#[derive(Debug, Clone)]
pub struct DirectoryServerConfig {
    pub external_id: String,
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub private_key_pem: Option<String>,
    pub discovery_interval: Duration,
}

/// Budget-gate knobs plus the planner endpoint, lifted straight into
/// `appliance_planner::BudgetLimits` by the daemon's wiring.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub endpoint: String,
    pub daily_spend_cap_usd: f64,
    pub calls_per_hour_cap: u32,
    pub concurrent_calls_cap: u32,
    pub call_cost_usd: f64,
}

/// The daemon's fully-resolved configuration: YAML file plus environment
/// overrides, durations and paths already parsed.
#[derive(Debug, Clone)]
pub struct Config {
    pub site_id: String,
    pub api_key: String,
    pub central_base_url: String,
    pub state_dir: PathBuf,
    pub log_level: String,
    /// `nil ⇒ dry-run`: absent a `HEALING_DRY_RUN` override or a YAML value,
    /// this defaults to `true` so a fresh appliance never takes corrective
    /// action until dry-run is explicitly disabled.
    pub healing_dry_run: bool,
    pub l2_enabled: bool,
    pub l2_api_key: Option<String>,
    pub scan_interval: Duration,
    pub checkin_interval: Duration,
    pub shutdown_grace: Duration,
    pub agent_rpc_port: u16,
    pub agent_file_server_port: u16,
    pub control_plane_address: String,
    pub planner: PlannerConfig,
    pub directory_server: DirectoryServerConfig,
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    duration_str::parse(value)
        .map_err(|message| ConfigError::Duration { field, value: value.to_string(), message })
}

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let raw: RawConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let state_dir = match std::env::var("STATE_DIR").ok() {
            Some(dir) => PathBuf::from(dir),
            None => raw.state_dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/var/lib/appliance")),
        };

        let log_level = std::env::var("LOG_LEVEL").unwrap_or(raw.log_level).to_uppercase();

        let healing_dry_run = match std::env::var("HEALING_DRY_RUN").ok() {
            Some(value) => parse_bool_env(&value).ok_or(ConfigError::InvalidHealingDryRun(value))?,
            None => raw.healing_dry_run.unwrap_or(true),
        };

        let l2_api_key = std::env::var("L2_API_KEY").ok().or(raw.l2_api_key);

        let l2_enabled = match std::env::var("L2_ENABLED").ok() {
            Some(value) => parse_bool_env(&value).ok_or(ConfigError::InvalidL2Enabled(value))?,
            None => raw.l2_enabled || l2_api_key.is_some(),
        };

        let control_plane_address = raw.control_plane_address.unwrap_or_else(|| raw.central_base_url.clone());

        Ok(Self {
            site_id: raw.site_id,
            api_key: raw.api_key,
            central_base_url: raw.central_base_url,
            state_dir,
            log_level,
            healing_dry_run,
            l2_enabled,
            l2_api_key,
            scan_interval: parse_duration("scan_interval", &raw.scan_interval)?,
            checkin_interval: parse_duration("checkin_interval", &raw.checkin_interval)?,
            shutdown_grace: parse_duration("shutdown_grace", &raw.shutdown_grace)?,
            agent_rpc_port: raw.agent_rpc_port,
            agent_file_server_port: raw.agent_file_server_port,
            control_plane_address,
            planner: PlannerConfig {
                endpoint: raw.planner.endpoint,
                daily_spend_cap_usd: raw.planner.daily_spend_cap_usd,
                calls_per_hour_cap: raw.planner.calls_per_hour_cap,
                concurrent_calls_cap: raw.planner.concurrent_calls_cap,
                call_cost_usd: raw.planner.call_cost_usd,
            },
            directory_server: DirectoryServerConfig {
                external_id: raw.directory_server.external_id,
                address: raw.directory_server.address,
                port: raw.directory_server.port,
                username: raw.directory_server.username,
                password: raw.directory_server.password,
                private_key_pem: raw.directory_server.private_key_pem,
                discovery_interval: parse_duration("directory_server.discovery_interval", &raw.directory_server.discovery_interval)?,
            },
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
