//! Bounded condition polling.
//!
//! [`ConditionWaiter`] polls a fallible predicate at a fixed interval up to
//! a bound, converting eventual truth or timeout into a PASS or FAIL log
//! record. A timeout resolves rather than failing the caller; a broken
//! predicate propagates its error so it stays distinguishable from
//! "condition not yet met".

use crate::log::{LogChannel, LogKind};
use crate::result::ArnesResult;
use std::sync::Arc;
use std::time::Duration;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default number of polls before giving up (~5 seconds at 100ms)
pub const DEFAULT_MAX_TRIES: u32 = 50;

/// Options for a wait operation
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Polling interval in milliseconds
    pub interval_ms: u64,
    /// Number of polls before giving up
    pub max_tries: u32,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_tries: DEFAULT_MAX_TRIES,
        }
    }
}

impl WaitOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polling interval in milliseconds
    #[must_use]
    pub const fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the poll bound
    #[must_use]
    pub const fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Interval as a Duration
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Polls predicates on behalf of test bodies, reporting into a log channel.
#[derive(Debug, Clone)]
pub struct ConditionWaiter {
    logs: Arc<LogChannel>,
}

impl ConditionWaiter {
    /// Create a waiter reporting into `logs`
    #[must_use]
    pub fn new(logs: Arc<LogChannel>) -> Self {
        Self { logs }
    }

    /// Poll `predicate` until it returns `Ok(true)` or the bound is hit.
    ///
    /// `Ok(true)` records a PASS with `description` and resolves
    /// immediately. An `Err` from the predicate abandons the wait and
    /// propagates. After `max_tries` failed polls a FAIL naming the try
    /// count is recorded and the wait resolves `Ok(())` — a timeout is
    /// terminal but non-fatal, the calling test decides whether to go on.
    ///
    /// Polls check-then-sleep: a predicate true on poll k resolves after
    /// k-1 intervals.
    pub async fn wait_for<F>(
        &self,
        mut predicate: F,
        description: &str,
        options: &WaitOptions,
    ) -> ArnesResult<()>
    where
        F: FnMut() -> ArnesResult<bool> + Send,
    {
        self.logs
            .record(LogKind::Debug, format!("Waiting for condition: {description}"));

        for _ in 0..options.max_tries {
            if predicate()? {
                self.logs.record(LogKind::Pass, description);
                return Ok(());
            }
            tokio::time::sleep(options.interval()).await;
        }

        self.logs.record(
            LogKind::Fail,
            format!(
                "{description} - timed out after {} tries.",
                options.max_tries
            ),
        );
        Ok(())
    }
}

/// Resolve after `duration` of event-loop time has passed.
///
/// Prefer [`ConditionWaiter::wait_for`]; fixed sleeps make tests slow and
/// timing-sensitive.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
