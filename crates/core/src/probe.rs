// SPDX-License-Identifier: MIT

//! The decoded shape of a probe script's reported state, lifted out of raw
//! JSON into a real enum as soon as the drift scanner reads it off the wire.
//! Everything past this module works with [`ProbeState`], never with loose
//! `serde_json::Value` maps.

use crate::target::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One check's raw reported value, after scalar-to-array coercion has
/// already normalized single values into one-element arrays where the check
/// contract expects a list (some probe scripts emit `"enabled"` where others
/// emit `["enabled"]` for the same check).
pub type CheckValue = serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum ProbeState {
    Windows { checks: HashMap<String, CheckValue> },
    Linux { checks: HashMap<String, CheckValue> },
}

impl ProbeState {
    pub fn platform(&self) -> Platform {
        match self {
            ProbeState::Windows { .. } => Platform::Windows,
            ProbeState::Linux { .. } => Platform::Linux,
        }
    }

    pub fn checks(&self) -> &HashMap<String, CheckValue> {
        match self {
            ProbeState::Windows { checks } | ProbeState::Linux { checks } => checks,
        }
    }

    pub fn get(&self, check_id: &str) -> Option<&CheckValue> {
        self.checks().get(check_id)
    }
}

/// Coerces a scalar JSON value into a single-element array, leaving arrays
/// and everything else untouched. Applied while decoding a probe's raw
/// output, before it's wrapped into a [`ProbeState`].
pub fn coerce_scalar_to_array(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Array(_) => value,
        other => serde_json::Value::Array(vec![other]),
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
