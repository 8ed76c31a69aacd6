//! Background work started from bus listeners.
//!
//! Listeners run synchronously, so a listener that needs the network spawns
//! a task here. Keeping the handles lets the page wait for outstanding work
//! and abort it on teardown.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
pub struct Background {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Tasks not yet finished.
    pub fn pending(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until every task, including tasks spawned while waiting, has
    /// finished.
    pub async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.handles.lock());
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                if let Err(e) = handle.await {
                    if e.is_panic() {
                        tracing::error!(error = %e, "Background task panicked");
                    }
                }
            }
        }
    }

    pub fn abort_all(&self) -> usize {
        let handles = std::mem::take(&mut *self.handles.lock());
        let count = handles.len();
        for handle in handles {
            handle.abort();
        }
        count
    }
}
