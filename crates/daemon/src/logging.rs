// SPDX-License-Identifier: MIT

//! Tracing subscriber setup. `LOG_LEVEL` (or the config file's `log_level`)
//! is uppercased before being treated as an `EnvFilter` directive, falling
//! back to `"info"` when absent or unparsable.

use tracing_subscriber::EnvFilter;

pub fn init(log_level: &str) {
    let directive = if log_level.trim().is_empty() { "info".to_string() } else { log_level.to_lowercase() };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
