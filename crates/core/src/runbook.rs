// SPDX-License-Identifier: MIT

//! A runbook is a trio of scripts (detect, remediate, verify) identified by
//! a stable id (e.g. `"RB-WIN-SEC-001"`). The scripts themselves — and the
//! registry that resolves an id to its three blobs — are out of scope here;
//! this crate only carries the id far enough for the executor to log it and
//! for the central allow-list to gate which runbooks may run.

crate::define_str_id! {
    pub struct RunbookId;
}

#[cfg(test)]
#[path = "runbook_tests.rs"]
mod tests;
