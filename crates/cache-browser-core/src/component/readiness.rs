//! Readiness signals.
//!
//! A component publishes readiness once, when it finishes binding and
//! listening. Dependents await the signal with a bounded budget instead of
//! polling for the component's existence.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default readiness budget.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// One-shot readiness flag for a named component.
#[derive(Clone)]
pub struct Readiness {
    name: Arc<str>,
    tx: Arc<watch::Sender<bool>>,
}

impl Readiness {
    pub fn new(name: &str) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            name: Arc::from(name),
            tx: Arc::new(tx),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flip the flag. Subsequent calls are no-ops.
    pub fn mark_ready(&self) {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once ready, or fail with [`Error::ReadyTimeout`] after `timeout`.
    pub async fn wait(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.tx.subscribe();
        let timed_out = || Error::ReadyTimeout {
            component: self.name.to_string(),
            waited: timeout,
        };
        let outcome = tokio::time::timeout(timeout, rx.wait_for(|ready| *ready))
            .await
            .map(|waited| waited.is_ok());
        match outcome {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(timed_out()),
        }
    }
}

impl std::fmt::Debug for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readiness")
            .field("name", &self.name)
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Readiness flags for every component of a page, keyed by name.
///
/// Flags are created on first reference, so a dependent may start waiting
/// before the component it depends on has been constructed.
#[derive(Clone, Default)]
pub struct ReadinessBoard {
    flags: Arc<RwLock<HashMap<String, Readiness>>>,
}

impl ReadinessBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the flag for `name`.
    pub fn handle(&self, name: &str) -> Readiness {
        if let Some(flag) = self.flags.read().get(name) {
            return flag.clone();
        }
        self.flags
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Readiness::new(name))
            .clone()
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.flags
            .read()
            .get(name)
            .map(Readiness::is_ready)
            .unwrap_or(false)
    }

    pub async fn wait_for(&self, name: &str, timeout: Duration) -> Result<()> {
        self.handle(name).wait(timeout).await
    }

    /// Names of every component that has announced readiness.
    pub fn ready_components(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .flags
            .read()
            .values()
            .filter(|flag| flag.is_ready())
            .map(|flag| flag.name().to_string())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let flag = Readiness::new("file-tree");
        let err = flag.wait(Duration::from_secs(10)).await.unwrap_err();
        match err {
            Error::ReadyTimeout { component, waited } => {
                assert_eq!(component, "file-tree");
                assert_eq!(waited, Duration::from_secs(10));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wait_resolves_when_marked() {
        let board = ReadinessBoard::new();
        let waiter = {
            let board = board.clone();
            tokio::spawn(async move { board.wait_for("top-nav", Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;
        board.handle("top-nav").mark_ready();

        assert!(waiter.await.unwrap().is_ok());
        assert!(board.is_ready("top-nav"));
        assert_eq!(board.ready_components(), vec!["top-nav"]);
    }

    #[tokio::test]
    async fn test_already_ready_resolves_immediately() {
        let flag = Readiness::new("x");
        flag.mark_ready();
        flag.mark_ready();
        assert!(flag.wait(Duration::from_millis(1)).await.is_ok());
    }
}
