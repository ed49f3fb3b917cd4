//! Shutdown coordination for the service.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::lifecycle::signals::ShutdownSignal;

/// Where the process is in its shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Accepting and serving connections.
    Running,
    /// Listener closed, waiting for in-flight connections.
    Draining,
    /// Drain finished or the grace period elapsed.
    Stopped,
}

impl ShutdownState {
    const RUNNING: u8 = 0;
    const DRAINING: u8 = 1;
    const STOPPED: u8 = 2;

    fn from_u8(value: u8) -> Self {
        match value {
            Self::RUNNING => Self::Running,
            Self::DRAINING => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every connection finished within the grace period.
    Graceful,
    /// The grace period elapsed and the remaining connections were closed.
    Forced { aborted: u64 },
}

/// Coordinator for graceful shutdown.
///
/// Owns the root cancellation token. Any number of tasks may wait on it, but
/// only [`ShutdownCoordinator::trigger`] cancels it, and only once.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    token: CancellationToken,
    state: AtomicU8,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator in the `Running` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token observing the shutdown signal.
    ///
    /// Cancelling the returned token does not affect the coordinator.
    pub fn subscribe(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// Resolves once shutdown has been triggered.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + '_ {
        self.inner.token.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Move from `Running` to `Draining` and cancel the root token.
    ///
    /// Returns `false` when shutdown was already triggered; nothing changes then.
    pub fn trigger(&self, signal: ShutdownSignal) -> bool {
        let transitioned = self
            .inner
            .state
            .compare_exchange(
                ShutdownState::RUNNING,
                ShutdownState::DRAINING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();

        if transitioned {
            tracing::warn!(%signal, "system call: {signal}, shutting down");
            self.inner.token.cancel();
        }
        transitioned
    }

    /// Record that the drain phase has ended.
    pub fn mark_stopped(&self) {
        self.inner
            .state
            .store(ShutdownState::STOPPED, Ordering::SeqCst);
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn starts_running() {
        let shutdown = ShutdownCoordinator::new();
        assert_eq!(shutdown.state(), ShutdownState::Running);
        assert!(!shutdown.is_cancelled());
    }

    #[test]
    fn triggers_exactly_once() {
        let shutdown = ShutdownCoordinator::new();
        assert!(shutdown.trigger(ShutdownSignal::Terminate));
        assert!(!shutdown.trigger(ShutdownSignal::Interrupt));
        assert_eq!(shutdown.state(), ShutdownState::Draining);
        assert!(shutdown.is_cancelled());

        shutdown.mark_stopped();
        assert!(!shutdown.trigger(ShutdownSignal::Terminate));
        assert_eq!(shutdown.state(), ShutdownState::Stopped);
    }

    #[tokio::test]
    async fn wakes_every_waiter() {
        let shutdown = ShutdownCoordinator::new();
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let token = shutdown.subscribe();
                tokio::spawn(async move { token.cancelled().await })
            })
            .collect();

        shutdown.trigger(ShutdownSignal::Interrupt);
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter not woken")
                .unwrap();
        }

        // Late subscribers observe the cancellation too.
        assert!(shutdown.subscribe().is_cancelled());
        shutdown.cancelled().await;
    }

    #[test]
    fn subscribers_cannot_cancel_the_root() {
        let shutdown = ShutdownCoordinator::new();
        shutdown.subscribe().cancel();
        assert!(!shutdown.is_cancelled());
        assert_eq!(shutdown.state(), ShutdownState::Running);
    }
}
