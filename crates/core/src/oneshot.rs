// SPDX-License-Identifier: MIT

//! A single keyed-by-`(operation, scope)` load-or-store registry, replacing
//! the scattered ad-hoc "have we already done this" boolean flags a naive
//! port of the original would carry one of for every idempotent setup step
//! (staging an agent once per host, fixing a GPO once per domain, and so
//! on). One registry, one invalidation path.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Marks one (operation, scope) pair as done, or not yet done.
#[derive(Debug, Default)]
pub struct OneShotRegistry {
    done: RwLock<HashMap<(String, String), bool>>,
}

impl OneShotRegistry {
    pub fn new() -> Self {
        Self { done: RwLock::new(HashMap::new()) }
    }

    pub fn is_done(&self, operation: &str, scope: &str) -> bool {
        self.done.read().get(&(operation.to_string(), scope.to_string())).copied().unwrap_or(false)
    }

    pub fn mark_done(&self, operation: impl Into<String>, scope: impl Into<String>) {
        self.done.write().insert((operation.into(), scope.into()), true);
    }

    /// Invalidates a prior `mark_done`, forcing the operation to run again
    /// the next time it's attempted. Called when a downstream step that
    /// depended on the one-shot having succeeded itself fails, since that
    /// implies the one-shot's effect didn't actually stick.
    pub fn invalidate(&self, operation: &str, scope: &str) {
        self.done.write().remove(&(operation.to_string(), scope.to_string()));
    }

    /// Runs `f` only if `(operation, scope)` hasn't been marked done, marking
    /// it done on success. Returns `Ok(None)` without calling `f` if it was
    /// already done.
    pub fn run_once<T, E>(
        &self,
        operation: &str,
        scope: &str,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<Option<T>, E> {
        if self.is_done(operation, scope) {
            return Ok(None);
        }
        let result = f()?;
        self.mark_done(operation, scope);
        Ok(Some(result))
    }
}

#[cfg(test)]
#[path = "oneshot_tests.rs"]
mod tests;
