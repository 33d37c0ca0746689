// SPDX-License-Identifier: MIT

//! Preamble-tolerant JSON parsing of probe output.
//!
//! Remote shells sometimes prepend banner text, deprecation warnings, or a
//! login-of-the-day to stdout before the script's actual JSON payload. The
//! probe's output contract is JSON-only, so parsing finds the first `{` and
//! parses from there rather than requiring a clean first byte. The result is
//! wrapped into a [`ProbeState`] tagged with the platform the scan targeted,
//! so everything downstream of this module works with a real enum instead
//! of a loose value map.

use appliance_core::{Platform, ProbeState};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no '{{' found in probe output")]
    NoOpeningBrace,
    #[error("probe output top level is not a JSON object")]
    NotAnObject,
    #[error("probe output failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a probe script's raw stdout, tolerating any preamble before the
/// first `{`. `contract_platform` picks which check contract the resulting
/// [`ProbeState`] is tagged with; the appliance's own self-host probe passes
/// its real OS family here, since [`Platform::SelfHost`] has no contract.
pub fn parse_probe_output(raw: &str, contract_platform: Platform) -> Result<ProbeState, ParseError> {
    let start = raw.find('{').ok_or(ParseError::NoOpeningBrace)?;
    let value: Value = serde_json::from_str(&raw[start..])?;
    let Value::Object(map) = value else { return Err(ParseError::NotAnObject) };
    let checks = map.into_iter().collect();

    Ok(match contract_platform {
        Platform::Linux => ProbeState::Linux { checks },
        Platform::Windows | Platform::SelfHost => ProbeState::Windows { checks },
    })
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
