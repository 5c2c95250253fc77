//! Test scheduling and the external-driver surface.
//!
//! One [`Harness`] exists per page load. It owns the log channel, the test
//! queue, and the cleanup registry; the external driver talks to it through
//! [`Harness::load_test`] (script injection) and [`Harness::drain_logs`]
//! (pull-based log retrieval).
//!
//! The run policy is deliberate: a test body's unhandled failure aborts the
//! remaining tests in that run. Tests routinely depend on shared frame state
//! set up by earlier tests, and continuing after a failure produces a
//! cascade of confusing follow-on failures instead of one clean signal. The
//! failing test's own cleanups still run before the run stops.

use crate::cleanup::CleanupRegistry;
use crate::config::HarnessConfig;
use crate::context::TestContext;
use crate::frame::Frame;
use crate::log::{LogChannel, LogKind, LogRecord};
use crate::navigation::LocationTracker;
use crate::result::{ArnesError, ArnesResult};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::mem;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// A registered test body
pub type TestBody = Box<dyn FnOnce(TestContext) -> BoxFuture<'static, ArnesResult<()>> + Send>;

/// A named test function queued for execution.
///
/// Identity is queue position; duplicates are permitted and run
/// independently.
pub struct TestCase {
    name: String,
    body: TestBody,
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TestCase {
    /// Create a test case from an async function of the context
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(TestContext) -> Fut + Send + 'static,
        Fut: Future<Output = ArnesResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(move |ctx| body(ctx).boxed()),
        }
    }

    /// Test name, as reported in SUBTEST records
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Loads an injected test script, registering its tests into the harness.
///
/// The production implementation appends a script tag and resolves once the
/// script has executed; tests use in-process registrars.
#[async_trait]
pub trait TestLoader: Send + Sync {
    /// Load the script at `path`, registering tests via
    /// [`Harness::add_test`]
    async fn load(&self, path: &str, harness: &Harness) -> ArnesResult<()>;
}

/// The in-page harness: log relay, test queue, and cleanup stack.
///
/// Created fresh per page load. The test queue is cleared after each full
/// run, so loading another test file starts an independent run; the cleanup
/// stack is cleared after each individual test.
pub struct Harness {
    config: HarnessConfig,
    logs: Arc<LogChannel>,
    cleanups: Arc<CleanupRegistry>,
    frame: Arc<dyn Frame>,
    tests: Mutex<Vec<TestCase>>,
    tracker: Mutex<Option<LocationTracker>>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("queued_tests", &self.test_count())
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Create a harness driving `frame` with default configuration
    #[must_use]
    pub fn new(frame: Arc<dyn Frame>) -> Self {
        Self::with_config(frame, HarnessConfig::default())
    }

    /// Create a harness with explicit configuration
    #[must_use]
    pub fn with_config(frame: Arc<dyn Frame>, config: HarnessConfig) -> Self {
        Self {
            config,
            logs: Arc::new(LogChannel::new()),
            cleanups: Arc::new(CleanupRegistry::new()),
            frame,
            tests: Mutex::new(Vec::new()),
            tracker: Mutex::new(None),
        }
    }

    /// The shared log channel
    #[must_use]
    pub fn logs(&self) -> &LogChannel {
        &self.logs
    }

    /// Drain all buffered log records for the external driver.
    ///
    /// Repeated calls never repeat previously returned records.
    #[must_use]
    pub fn drain_logs(&self) -> Vec<LogRecord> {
        self.logs.drain()
    }

    /// Queue a test function. Valid any time before [`Harness::run`].
    pub fn add_test<F, Fut>(&self, name: impl Into<String>, body: F)
    where
        F: FnOnce(TestContext) -> Fut + Send + 'static,
        Fut: Future<Output = ArnesResult<()>> + Send + 'static,
    {
        self.add_test_case(TestCase::new(name, body));
    }

    /// Queue an already-built test case
    pub fn add_test_case(&self, case: TestCase) {
        self.tests.lock().expect("test queue poisoned").push(case);
    }

    /// Number of currently queued tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.lock().expect("test queue poisoned").len()
    }

    /// Context handed to each test body
    #[must_use]
    pub fn context(&self) -> TestContext {
        TestContext::new(
            Arc::clone(&self.logs),
            Arc::clone(&self.cleanups),
            Arc::clone(&self.frame),
            *self.config.wait_options(),
        )
    }

    /// Run all queued tests sequentially and clear the queue.
    ///
    /// Each test gets a SUBTEST record, entering/leaving INFO narration, and
    /// its cleanups run whether or not the body succeeded. An unhandled
    /// failure (error return or panic) is reported as FAIL plus STACK and
    /// aborts the remaining tests in this run.
    pub async fn run(&self) {
        let tests = mem::take(&mut *self.tests.lock().expect("test queue poisoned"));

        for TestCase { name, body } in tests {
            self.logs.record(LogKind::Subtest, name.as_str());
            self.logs
                .record(LogKind::Info, format!("Entering test {name}"));

            self.cleanups.reset();
            let body = body(self.context());
            let outcome = AssertUnwindSafe(body).catch_unwind().await;
            self.cleanups.run_all(&self.logs).await;

            match outcome {
                Ok(Ok(())) => {
                    self.logs
                        .record(LogKind::Info, format!("Leaving test {name}"));
                }
                Ok(Err(err)) => {
                    self.logs.record(LogKind::Fail, err.to_string());
                    self.logs.record(LogKind::Stack, error_stack(&err));
                    break;
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    self.logs.record(LogKind::Fail, message.clone());
                    self.logs
                        .record(LogKind::Stack, format!("panicked: {message}"));
                    break;
                }
            }
        }
    }

    /// Load a test file and run everything it registers.
    ///
    /// A path without the configured test-root prefix produces a FAIL
    /// record and is otherwise a no-op, so the external driver always gets
    /// a log-based signal. On the happy path the run is bracketed by
    /// TEST_START and TEST_END records; a loader error is reported as FAIL
    /// (the registered tests, if any, do not run) but TEST_END is still
    /// emitted so the driver never stalls waiting for it.
    pub async fn load_test(&self, path: &str, loader: &dyn TestLoader) {
        if !path.starts_with(self.config.test_root_prefix()) {
            self.logs
                .record(LogKind::Fail, format!("Unsupported test path {path}"));
            return;
        }

        self.logs.record(LogKind::TestStart, path);
        match loader.load(path, self).await {
            Ok(()) => self.run().await,
            Err(err) => self.logs.record(LogKind::Fail, err.to_string()),
        }
        self.logs.record(LogKind::TestEnd, path);
    }

    /// Receiver mirroring the nested document's location.
    ///
    /// Spawns the location tracker on first use; requires a tokio runtime.
    #[must_use]
    pub fn location_display(&self) -> watch::Receiver<String> {
        let mut tracker = self.tracker.lock().expect("tracker poisoned");
        tracker
            .get_or_insert_with(|| {
                LocationTracker::spawn(
                    Arc::clone(&self.frame),
                    self.config.history_refresh_delay(),
                )
            })
            .display()
    }
}

/// Render an error and its source chain for a STACK record
fn error_stack(err: &ArnesError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Best-effort description of a panic payload
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MockFrame;

    fn harness() -> Harness {
        Harness::new(Arc::new(MockFrame::new()))
    }

    fn kinds(records: &[LogRecord]) -> Vec<LogKind> {
        records.iter().map(|r| r.kind).collect()
    }

    #[tokio::test]
    async fn runs_tests_in_registration_order() {
        let harness = harness();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["alpha", "beta"] {
            let order = Arc::clone(&order);
            harness.add_test(name, move |_ctx| async move {
                order.lock().unwrap().push(name);
                Ok(())
            });
        }
        assert_eq!(harness.test_count(), 2);

        harness.run().await;
        assert_eq!(*order.lock().unwrap(), vec!["alpha", "beta"]);
        assert_eq!(harness.test_count(), 0);

        let records = harness.drain_logs();
        assert_eq!(
            kinds(&records),
            vec![
                LogKind::Subtest,
                LogKind::Info,
                LogKind::Info,
                LogKind::Subtest,
                LogKind::Info,
                LogKind::Info,
            ]
        );
        assert_eq!(records[0].message, "alpha");
        assert_eq!(records[1].message, "Entering test alpha");
        assert_eq!(records[2].message, "Leaving test alpha");
    }

    #[tokio::test]
    async fn cleanups_run_before_next_test_begins() {
        let harness = harness();
        let events = Arc::new(Mutex::new(Vec::new()));

        {
            let events = Arc::clone(&events);
            harness.add_test("uses_cleanup", move |ctx| async move {
                let inner = Arc::clone(&events);
                ctx.register_cleanup(move || async move {
                    inner.lock().unwrap().push("cleanup");
                    Ok(())
                });
                events.lock().unwrap().push("body");
                Ok(())
            });
        }
        {
            let events = Arc::clone(&events);
            harness.add_test("second", move |_ctx| async move {
                events.lock().unwrap().push("second body");
                Ok(())
            });
        }

        harness.run().await;
        assert_eq!(
            *events.lock().unwrap(),
            vec!["body", "cleanup", "second body"]
        );
    }

    #[tokio::test]
    async fn failing_test_still_runs_cleanups_and_aborts_run() {
        let harness = harness();
        let events = Arc::new(Mutex::new(Vec::new()));

        {
            let events = Arc::clone(&events);
            harness.add_test("fails", move |ctx| async move {
                let inner = Arc::clone(&events);
                ctx.register_cleanup(move || async move {
                    inner.lock().unwrap().push("cleanup ran");
                    Ok(())
                });
                Err(ArnesError::test_failure("boom"))
            });
        }
        {
            let events = Arc::clone(&events);
            harness.add_test("never_reached", move |_ctx| async move {
                events.lock().unwrap().push("should not run");
                Ok(())
            });
        }

        harness.run().await;
        assert_eq!(*events.lock().unwrap(), vec!["cleanup ran"]);

        let records = harness.drain_logs();
        assert_eq!(
            kinds(&records),
            vec![LogKind::Subtest, LogKind::Info, LogKind::Fail, LogKind::Stack]
        );
        assert_eq!(records[2].message, "boom");
    }

    #[tokio::test]
    async fn panicking_test_is_contained() {
        let harness = harness();
        harness.add_test("panics", |_ctx| async {
            panic!("unexpected state");
        });
        harness.add_test("after", |ctx| async move {
            ctx.ok(true, "should not appear");
            Ok(())
        });

        harness.run().await;

        let records = harness.drain_logs();
        assert_eq!(
            kinds(&records),
            vec![LogKind::Subtest, LogKind::Info, LogKind::Fail, LogKind::Stack]
        );
        assert_eq!(records[2].message, "unexpected state");
        assert!(records[3].message.contains("panicked"));
    }

    #[tokio::test]
    async fn queue_is_cleared_even_after_abort() {
        let harness = harness();
        harness.add_test("fails", |_ctx| async {
            Err(ArnesError::test_failure("boom"))
        });
        harness.add_test("skipped", |_ctx| async { Ok(()) });

        harness.run().await;
        assert_eq!(harness.test_count(), 0);

        // a later, independent run starts clean
        let _ = harness.drain_logs();
        harness.add_test("fresh", |_ctx| async { Ok(()) });
        harness.run().await;
        let records = harness.drain_logs();
        assert_eq!(records[0].kind, LogKind::Subtest);
        assert_eq!(records[0].message, "fresh");
    }

    #[tokio::test]
    async fn duplicate_registrations_run_independently() {
        let harness = harness();
        let count = Arc::new(Mutex::new(0u32));
        for _ in 0..2 {
            let count = Arc::clone(&count);
            harness.add_test("same_name", move |_ctx| async move {
                *count.lock().unwrap() += 1;
                Ok(())
            });
        }

        harness.run().await;
        assert_eq!(*count.lock().unwrap(), 2);
    }

    struct RegistrarLoader;

    #[async_trait]
    impl TestLoader for RegistrarLoader {
        async fn load(&self, _path: &str, harness: &Harness) -> ArnesResult<()> {
            harness.add_test("loaded_test", |ctx| async move {
                ctx.ok(true, "registered by loader");
                Ok(())
            });
            Ok(())
        }
    }

    struct BrokenLoader;

    #[async_trait]
    impl TestLoader for BrokenLoader {
        async fn load(&self, path: &str, _harness: &Harness) -> ArnesResult<()> {
            Err(ArnesError::loader(format!("script error in {path}")))
        }
    }

    #[tokio::test]
    async fn load_test_brackets_run_with_markers() {
        let harness = harness();
        harness
            .load_test("tests/webtest/test_Sanity.js", &RegistrarLoader)
            .await;

        let records = harness.drain_logs();
        assert_eq!(
            kinds(&records),
            vec![
                LogKind::TestStart,
                LogKind::Subtest,
                LogKind::Info,
                LogKind::Pass,
                LogKind::Info,
                LogKind::TestEnd,
            ]
        );
        assert_eq!(records[0].message, "tests/webtest/test_Sanity.js");
        assert_eq!(records[5].message, "tests/webtest/test_Sanity.js");
    }

    #[tokio::test]
    async fn malformed_path_yields_fail_record_only() {
        let harness = harness();
        harness.load_test("elsewhere/test.js", &RegistrarLoader).await;

        let records = harness.drain_logs();
        assert_eq!(kinds(&records), vec![LogKind::Fail]);
        assert_eq!(records[0].message, "Unsupported test path elsewhere/test.js");
        assert_eq!(harness.test_count(), 0);
    }

    #[tokio::test]
    async fn loader_error_reports_fail_but_closes_the_run() {
        let harness = harness();
        harness
            .load_test("tests/webtest/test_Broken.js", &BrokenLoader)
            .await;

        let records = harness.drain_logs();
        assert_eq!(
            kinds(&records),
            vec![LogKind::TestStart, LogKind::Fail, LogKind::TestEnd]
        );
        assert!(records[1].message.contains("script error"));
    }
}
