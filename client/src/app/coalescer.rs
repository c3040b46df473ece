//! Refresh coalescer
//!
//! Likes change far more often than posts. Each change only says "something
//! moved", so bursts are collapsed into one refresh per window instead of a
//! refetch per event.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Window during which refresh triggers are merged
pub const REFRESH_COALESCE_WINDOW: Duration = Duration::from_secs(1);

/// Cheap handle for firing triggers from other tasks
#[derive(Debug, Clone)]
pub struct CoalescerHandle {
    triggers: mpsc::UnboundedSender<()>,
}

impl CoalescerHandle {
    pub fn trigger(&self) {
        if self.triggers.send(()).is_err() {
            tracing::trace!("Refresh coalescer already stopped");
        }
    }
}

/// Runs `action` once per window after the first trigger in that window.
/// The background task stops when the coalescer is dropped.
#[derive(Debug)]
pub struct RefreshCoalescer {
    handle: CoalescerHandle,
    task: JoinHandle<()>,
}

impl RefreshCoalescer {
    pub fn spawn<F, Fut>(window: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (triggers, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(window).await;

                let mut absorbed = 1usize;
                while rx.try_recv().is_ok() {
                    absorbed += 1;
                }
                tracing::debug!("Coalesced {} refresh triggers", absorbed);

                action().await;
            }
        });

        Self {
            handle: CoalescerHandle { triggers },
            task,
        }
    }

    pub fn trigger(&self) {
        self.handle.trigger();
    }

    pub fn handle(&self) -> CoalescerHandle {
        self.handle.clone()
    }
}

impl Drop for RefreshCoalescer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
