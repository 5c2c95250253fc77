//! Per-test context handed to every test function.
//!
//! Instead of ambient globals, each test body receives a [`TestContext`]
//! carrying the assertion facade, diagnostic logging, cleanup registration,
//! condition waiting, navigation, and the action simulator. Cloning is
//! cheap; all contexts of one harness share the same state.

use crate::action::ActionSimulator;
use crate::cleanup::CleanupRegistry;
use crate::frame::Frame;
use crate::log::{LogChannel, LogKind};
use crate::navigation::NavigationSynchronizer;
use crate::result::ArnesResult;
use crate::wait::{ConditionWaiter, WaitOptions};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Context for one test invocation
#[derive(Clone)]
pub struct TestContext {
    logs: Arc<LogChannel>,
    cleanups: Arc<CleanupRegistry>,
    frame: Arc<dyn Frame>,
    wait_defaults: WaitOptions,
}

impl Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("wait_defaults", &self.wait_defaults)
            .finish_non_exhaustive()
    }
}

impl TestContext {
    pub(crate) fn new(
        logs: Arc<LogChannel>,
        cleanups: Arc<CleanupRegistry>,
        frame: Arc<dyn Frame>,
        wait_defaults: WaitOptions,
    ) -> Self {
        Self {
            logs,
            cleanups,
            frame,
            wait_defaults,
        }
    }

    /// The shared log channel
    #[must_use]
    pub fn logs(&self) -> &LogChannel {
        &self.logs
    }

    /// The nested frame under test
    #[must_use]
    pub fn frame(&self) -> &Arc<dyn Frame> {
        &self.frame
    }

    // =========================================================================
    // ASSERTIONS
    // =========================================================================

    /// PASS if `condition` is true, FAIL otherwise
    pub fn ok(&self, condition: bool, msg: &str) {
        if condition {
            self.logs.pass(msg);
        } else {
            self.logs.fail(msg);
        }
    }

    /// PASS if the two values are equal by strict value identity.
    ///
    /// No deep-structural or float-tolerant comparison; values needing
    /// structural comparison must be pre-serialized into primitives.
    pub fn is<T: PartialEq + Debug>(&self, actual: &T, expected: &T, msg: &str) {
        if actual == expected {
            self.logs.pass(msg);
        } else {
            self.logs
                .fail(format!("{msg} - Got {actual:?}, expected {expected:?}"));
        }
    }

    /// PASS if the two values are not equal
    pub fn is_not<T: PartialEq + Debug>(&self, actual: &T, unexpected: &T, msg: &str) {
        if actual == unexpected {
            self.logs
                .fail(format!("{msg} - Didn't expect {actual:?}, but got it"));
        } else {
            self.logs.pass(msg);
        }
    }

    /// Record diagnostic narration
    pub fn info(&self, msg: &str) {
        self.logs.info(msg);
    }

    /// Record verbose diagnostic narration
    pub fn debug(&self, msg: &str) {
        self.logs.debug(msg);
    }

    // =========================================================================
    // CLEANUP
    // =========================================================================

    /// Register an action to run at the end of the current test, regardless
    /// of its outcome. Actions run in registration order.
    pub fn register_cleanup<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ArnesResult<()>> + Send + 'static,
    {
        self.cleanups.register(action);
    }

    // =========================================================================
    // WAITING
    // =========================================================================

    /// Poll `predicate` with the harness default interval and bound
    pub async fn wait_for<F>(&self, predicate: F, description: &str) -> ArnesResult<()>
    where
        F: FnMut() -> ArnesResult<bool> + Send,
    {
        let options = self.wait_defaults;
        self.wait_for_with(predicate, description, &options).await
    }

    /// Poll `predicate` with explicit options
    pub async fn wait_for_with<F>(
        &self,
        predicate: F,
        description: &str,
        options: &WaitOptions,
    ) -> ArnesResult<()>
    where
        F: FnMut() -> ArnesResult<bool> + Send,
    {
        ConditionWaiter::new(Arc::clone(&self.logs))
            .wait_for(predicate, description, options)
            .await
    }

    /// Wait until the element becomes shown
    pub async fn wait_for_shown(&self, selector: &str, description: &str) -> ArnesResult<()> {
        let frame = Arc::clone(&self.frame);
        let selector = selector.to_string();
        self.wait_for(move || frame.is_shown(&selector), description)
            .await
    }

    /// Resolve after `duration` of event-loop time
    pub async fn sleep(&self, duration: Duration) {
        crate::wait::sleep(duration).await;
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Load a page in the nested frame and wait for full readiness
    pub async fn load_path(&self, path: &str) -> ArnesResult<()> {
        self.navigation().load_path(path).await
    }

    /// Resolve once the next navigation has fully completed
    pub fn wait_for_load(&self) -> impl Future<Output = ArnesResult<()>> + Send {
        self.navigation().wait_for_load()
    }

    fn navigation(&self) -> NavigationSynchronizer {
        NavigationSynchronizer::new(Arc::clone(&self.frame), Arc::clone(&self.logs))
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Simulator for user interaction with the nested frame
    #[must_use]
    pub fn actions(&self) -> ActionSimulator<'_> {
        ActionSimulator::new(self.frame.as_ref(), &self.logs)
    }
}
