//! Per-test teardown actions.
//!
//! Each test invocation owns a stack of cleanup actions scoped to exactly
//! that invocation. The scheduler resets the registry before every test and
//! runs it after the body resolves, success or failure, so no action ever
//! leaks across tests.

use crate::log::{LogChannel, LogKind};
use crate::result::ArnesResult;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::mem;
use std::sync::Mutex;

/// A cleanup action: an asynchronous, zero-argument unit of work
pub type CleanupAction = Box<dyn FnOnce() -> BoxFuture<'static, ArnesResult<()>> + Send>;

/// Registry of cleanup actions for the current test invocation.
///
/// Actions run in registration (FIFO) order.
#[derive(Default)]
pub struct CleanupRegistry {
    actions: Mutex<Vec<CleanupAction>>,
}

impl std::fmt::Debug for CleanupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

impl CleanupRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an action onto the current test's cleanup stack
    pub fn register<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ArnesResult<()>> + Send + 'static,
    {
        self.actions
            .lock()
            .expect("cleanup mutex poisoned")
            .push(Box::new(move || action().boxed()));
    }

    /// Drop all pending actions without running them
    pub fn reset(&self) {
        self.actions.lock().expect("cleanup mutex poisoned").clear();
    }

    /// Number of pending actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.lock().expect("cleanup mutex poisoned").len()
    }

    /// Whether no actions are pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty the stack and await each action in registration order.
    ///
    /// A failing action is surfaced as a FAIL log record and never prevents
    /// the remaining actions from running.
    pub async fn run_all(&self, logs: &LogChannel) {
        let actions = mem::take(&mut *self.actions.lock().expect("cleanup mutex poisoned"));
        for action in actions {
            if let Err(err) = action().await {
                logs.record(LogKind::Fail, format!("cleanup failed: {err}"));
            }
        }
    }
}
