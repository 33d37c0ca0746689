// SPDX-License-Identifier: MIT

//! Bounded-concurrency `BackgroundSpawner` with a drain bound so shutdown can
//! wait for in-flight healing/order work without hanging forever.

use appliance_core::{BackgroundFuture, BackgroundSpawner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    outstanding: Arc<AtomicUsize>,
    idle: Arc<Notify>,
    handle: tokio::runtime::Handle,
}

impl TaskPool {
    pub fn new(max_concurrency: usize, handle: tokio::runtime::Handle) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            outstanding: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
            handle,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Waits until no tasks are outstanding, or `timeout` elapses.
    pub async fn drain(&self, timeout: Duration) -> bool {
        if self.outstanding() == 0 {
            return true;
        }
        tokio::time::timeout(timeout, async {
            while self.outstanding() > 0 {
                self.idle.notified().await;
            }
        })
        .await
        .is_ok()
    }
}

impl BackgroundSpawner for TaskPool {
    fn spawn(&self, task: BackgroundFuture) {
        let semaphore = self.semaphore.clone();
        let outstanding = self.outstanding.clone();
        let idle = self.idle.clone();
        outstanding.fetch_add(1, Ordering::SeqCst);
        self.handle.spawn(async move {
            let permit = semaphore.acquire_owned().await;
            task.await;
            drop(permit);
            if outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
                idle.notify_waiters();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[tokio::test]
    async fn drains_after_spawned_tasks_complete() {
        let pool = TaskPool::new(4, tokio::runtime::Handle::current());
        let counter = Arc::new(AtomicU32::new(0));
        for _ in 0..8 {
            let counter = counter.clone();
            pool.spawn(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        let drained = pool.drain(Duration::from_secs(2)).await;
        assert!(drained);
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn drain_times_out_if_task_never_finishes() {
        let pool = TaskPool::new(1, tokio::runtime::Handle::current());
        pool.spawn(Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }));
        let drained = pool.drain(Duration::from_millis(20)).await;
        assert!(!drained);
    }
}
