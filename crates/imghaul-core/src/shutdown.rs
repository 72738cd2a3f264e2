//! Cooperative cancellation and the encode+write shutdown barrier.
//!
//! Cancellation is a monotonic false-to-true flag checked by the
//! dispatcher before each read and by workers between jobs; nothing is
//! preempted mid-job. The busy counter tracks workers inside the
//! encode+write critical section, the only region a graceful shutdown
//! waits for: it is what guarantees that a file observed at a target path
//! is either a complete JPEG or absent.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Shared shutdown state: the cancellation flag plus the critical-section
/// counter and its wakeup primitive.
#[derive(Debug, Default)]
pub struct Shutdown {
    cancelled: AtomicBool,
    busy: AtomicUsize,
    idle: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the cancellation flag. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Enter the encode+write critical section. The returned guard
    /// decrements the counter when dropped, on every exit path including
    /// failure.
    pub fn enter_critical(self: &Arc<Self>) -> CriticalGuard {
        self.busy.fetch_add(1, Ordering::AcqRel);
        CriticalGuard {
            shutdown: Arc::clone(self),
        }
    }

    /// Number of workers currently inside the critical section.
    pub fn busy_count(&self) -> usize {
        self.busy.load(Ordering::Acquire)
    }

    /// Wait until no worker is inside the critical section.
    ///
    /// Used by the shutdown path after raising cancellation: once this
    /// returns, every in-flight disk write has completed and the process
    /// may terminate without leaving a truncated file behind.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // register interest before re-checking, so a decrement between
            // the check and the await cannot be missed
            notified.as_mut().enable();
            if self.busy.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// RAII guard for the critical section.
pub struct CriticalGuard {
    shutdown: Arc<Shutdown>,
}

impl Drop for CriticalGuard {
    fn drop(&mut self) {
        if self.shutdown.busy.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shutdown.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_cancel_is_idempotent_and_monotonic() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_cancelled());
        shutdown.cancel();
        assert!(shutdown.is_cancelled());
        shutdown.cancel();
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let shutdown = Arc::new(Shutdown::new());
        let guard = shutdown.enter_critical();
        assert_eq!(shutdown.busy_count(), 1);
        drop(guard);
        assert_eq!(shutdown.busy_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_idle() {
        let shutdown = Arc::new(Shutdown::new());
        timeout(Duration::from_secs(1), shutdown.wait_idle())
            .await
            .expect("wait_idle should not block when nothing is busy");
    }

    #[tokio::test]
    async fn test_wait_idle_blocks_until_all_guards_drop() {
        let shutdown = Arc::new(Shutdown::new());
        let a = shutdown.enter_critical();
        let b = shutdown.enter_critical();

        // With guards live, wait_idle must not complete
        assert!(
            timeout(Duration::from_millis(50), shutdown.wait_idle())
                .await
                .is_err()
        );

        drop(a);
        assert!(
            timeout(Duration::from_millis(50), shutdown.wait_idle())
                .await
                .is_err()
        );

        let waiter = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move { shutdown.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(b);

        timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should complete once the last guard drops")
            .unwrap();
    }

    #[tokio::test]
    async fn test_guard_released_across_threads() {
        let shutdown = Arc::new(Shutdown::new());
        let handle = {
            let shutdown = Arc::clone(&shutdown);
            tokio::task::spawn_blocking(move || {
                let _guard = shutdown.enter_critical();
                std::thread::sleep(Duration::from_millis(30));
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(shutdown.busy_count(), 1);
        timeout(Duration::from_secs(1), shutdown.wait_idle())
            .await
            .expect("wait_idle should observe the blocking guard drop");
        handle.await.unwrap();
    }
}
