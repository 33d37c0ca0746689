// SPDX-License-Identifier: MIT

//! Graceful shutdown: a `CancellationToken` fans out to tickers and RPC
//! servers, then the drain bound from config gives in-flight work a chance
//! to finish before the process exits.

use crate::background::TaskPool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace: Duration) -> Self {
        Self { token: CancellationToken::new(), grace }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Waits for SIGINT/SIGTERM (via ctrl_c, portable across platforms in
    /// this shape) and cancels the shared token.
    pub async fn wait_for_signal(&self) {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        self.trigger();
    }

    /// Drains the task pool within the configured grace period, logging if
    /// work was still outstanding when the bound was hit.
    pub async fn drain(&self, pool: &TaskPool) {
        let drained = pool.drain(self.grace).await;
        if !drained {
            tracing::warn!(outstanding = pool.outstanding(), "shutdown grace period elapsed with tasks still running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_cancels_the_token() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let token = coordinator.token();
        assert!(!token.is_cancelled());
        coordinator.trigger();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn drain_completes_promptly_when_pool_is_idle() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let pool = TaskPool::new(2, tokio::runtime::Handle::current());
        coordinator.drain(&pool).await;
    }
}
