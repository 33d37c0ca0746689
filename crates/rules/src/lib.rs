// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! appliance-rules: the L1 rule engine (C6) and the signed rule-bundle
//! verifier (C11). Rules arrive from four sources — built-in, a custom
//! directory, a signed synced bundle from central, and a promoted directory
//! of learned rules — and are never deduplicated by id; all are kept and
//! disambiguated purely by priority order.

pub mod builtin;
pub mod bundle;
pub mod engine;
pub mod load;
pub mod matcher;
pub mod verify;

pub use builtin::builtin_rules;
pub use bundle::{load_bundle, LoadBundleError, RuleBundleWire};
pub use engine::{lift_action, ActionExecutor, DryRunExecutor, EngineOutcome, RuleEngine};
pub use load::{load_yaml_dir, LoadError};
pub use matcher::{extract_field, matches_conditions};
pub use verify::{BundleVerifier, VerifyError};
