// SPDX-License-Identifier: MIT

//! Applies [`crate::checks::CheckSpec`]s against a parsed probe's state,
//! producing the finding set for one target.

use crate::checks::CheckSpec;
use appliance_core::{coerce_scalar_to_array, compare_values, Finding, HostId, Platform, ProbeState};
use serde_json::Value;

/// Evaluates every spec against `state`, returning one [`Finding`] per
/// field that isn't in compliance. A field absent from `state` is treated
/// as drift (actual = `null`) rather than skipped, since a probe that
/// silently failed to report a field is itself worth flagging.
pub fn emit_findings(specs: &[CheckSpec], state: &ProbeState, host_id: HostId, platform: Platform) -> Vec<Finding> {
    specs
        .iter()
        .filter_map(|spec| {
            let raw = state.get(spec.check_id);
            let actual = match raw {
                Some(value) if spec.expect_array => coerce_scalar_to_array(value.clone()),
                Some(value) => value.clone(),
                None => Value::Null,
            };

            let compliant = raw.is_some() && compare_values(spec.operator, Some(&actual), Some(&spec.expected));
            if compliant {
                return None;
            }

            Some(
                Finding::new(host_id, spec.check_id, spec.severity, platform, spec.expected.clone(), actual)
                    .with_compliance_tag(spec.control),
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
