use std::fmt;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    stopped: AtomicBool,
    active: AtomicUsize,
    stop_notify: Notify,
    drain_notify: Notify,
}

/// coordinates graceful shutdown between the accept loop and its signal
/// handler: the first stop request lets in-flight connections finish and
/// stops accepting new ones; callers decide how long to wait for drain.
#[derive(Clone, Default)]
pub struct Shutdown(Arc<Inner>);

impl fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutdown")
            .field("stopped", &self.is_stopped())
            .field("active_connections", &self.active_connections())
            .finish()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// request a stop. idempotent; wakes anyone awaiting [`Self::stopped`].
    pub fn stop(&self) {
        if !self.0.stopped.swap(true, Ordering::SeqCst) {
            self.0.stop_notify.notify_waiters();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.0.stopped.load(Ordering::SeqCst)
    }

    /// resolves once [`Self::stop`] has been called.
    pub async fn stopped(&self) {
        // enroll before checking the flag, or a `stop()` landing between the
        // check and the await would never wake us: `Notify` carries no
        // permit for waiters that show up after `notify_waiters()` runs.
        let notified = self.0.stop_notify.notified();
        if self.is_stopped() {
            return;
        }
        notified.await;
    }

    pub fn active_connections(&self) -> usize {
        self.0.active.load(Ordering::SeqCst)
    }

    /// marks one connection in flight; dropping the guard marks it finished.
    pub fn guard(&self) -> ConnectionGuard {
        self.0.active.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard(Arc::clone(&self.0))
    }

    /// wait for in-flight connections to finish, up to `timeout`.
    pub async fn drain(&self, timeout: Duration) {
        let wait = async {
            loop {
                let notified = self.0.drain_notify.notified();
                if self.active_connections() == 0 {
                    break;
                }
                notified.await;
            }
        };
        let _ = tokio::time::timeout(timeout, wait).await;
    }

    /// install SIGINT/SIGTERM/SIGQUIT handling: the first signal requests a
    /// graceful stop, a second forces an immediate exit.
    #[cfg(unix)]
    pub fn register_signals(&self) {
        use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
        use signal_hook_tokio::Signals;
        use tokio_stream::StreamExt;

        let shutdown = self.clone();
        let Ok(signals) = Signals::new([SIGINT, SIGTERM, SIGQUIT]) else {
            log::warn!("failed to install signal handlers, graceful shutdown on signal disabled");
            return;
        };

        tokio::spawn(async move {
            let mut signals = signals.fuse();
            while signals.next().await.is_some() {
                if shutdown.is_stopped() {
                    log::warn!("second interrupt, shutting down immediately");
                    std::process::exit(1);
                }
                log::info!("shutting down gracefully, interrupt again to force");
                shutdown.stop();
            }
        });
    }

    #[cfg(not(unix))]
    pub fn register_signals(&self) {
        log::debug!("signal-based shutdown is only wired up on unix");
    }
}

/// dropping this decrements the active connection count and, if it reaches
/// zero, wakes anyone in [`Shutdown::drain`].
pub struct ConnectionGuard(Arc<Inner>);

impl fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionGuard").finish()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.0.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.drain_notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_wakes_pending_waiters() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_stopped());
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.stopped().await });
        shutdown.stop();
        handle.await.unwrap();
        assert!(shutdown.is_stopped());
    }

    #[tokio::test]
    async fn stopped_returns_immediately_if_already_stopped() {
        let shutdown = Shutdown::new();
        shutdown.stop();
        tokio::time::timeout(Duration::from_millis(50), shutdown.stopped())
            .await
            .expect("stopped() should resolve without waiting");
    }

    #[tokio::test]
    async fn guard_tracks_active_connections_and_drain_unblocks_at_zero() {
        let shutdown = Shutdown::new();
        let guard = shutdown.guard();
        assert_eq!(shutdown.active_connections(), 1);
        drop(guard);
        assert_eq!(shutdown.active_connections(), 0);
        shutdown.drain(Duration::from_millis(50)).await;
    }
}
