// SPDX-License-Identifier: MIT

//! Seam for fire-and-forget side effects (telemetry posts, dashboard
//! incident writes, root-cause fixes) that the healing router and central
//! sync dispatch without ever awaiting them. The pool itself — bounded
//! concurrency, and a shutdown drain bounded by a time budget — is owned by
//! the daemon binary; this crate only defines the trait so library crates
//! can depend on "a place to fire a background task" without depending on
//! `appliance-daemon`.

use std::future::Future;
use std::pin::Pin;

pub type BackgroundFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Accepts fire-and-forget work. Implementations bound concurrency and
/// track outstanding tasks for a graceful-shutdown drain; callers never
/// learn when (or whether) a spawned task actually ran.
pub trait BackgroundSpawner: Send + Sync {
    fn spawn(&self, task: BackgroundFuture);
}

/// Discards every task without running it; used in tests that don't care
/// whether fire-and-forget side effects actually happen.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpawner;

impl BackgroundSpawner for NullSpawner {
    fn spawn(&self, _task: BackgroundFuture) {}
}

#[cfg(test)]
#[path = "background_tests.rs"]
mod tests;
