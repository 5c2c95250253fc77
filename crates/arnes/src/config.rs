//! Harness configuration.

use crate::wait::WaitOptions;
use std::time::Duration;

/// Required prefix for injected test script paths
pub const DEFAULT_TEST_ROOT_PREFIX: &str = "tests/webtest/";

/// Delay between a history mutation and the location display refresh.
///
/// State propagation inside the nested document is asynchronous, so the
/// display is refreshed a beat after push/replace rather than immediately.
pub const HISTORY_REFRESH_DELAY_MS: u64 = 10;

/// Configuration for a [`Harness`](crate::Harness) instance
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    test_root_prefix: String,
    history_refresh_delay_ms: u64,
    wait: WaitOptions,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_root_prefix: DEFAULT_TEST_ROOT_PREFIX.to_string(),
            history_refresh_delay_ms: HISTORY_REFRESH_DELAY_MS,
            wait: WaitOptions::default(),
        }
    }
}

impl HarnessConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the required prefix for injected test paths
    #[must_use]
    pub fn with_test_root_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.test_root_prefix = prefix.into();
        self
    }

    /// Set the history refresh delay in milliseconds
    #[must_use]
    pub fn with_history_refresh_delay(mut self, delay_ms: u64) -> Self {
        self.history_refresh_delay_ms = delay_ms;
        self
    }

    /// Set the default wait options used by test contexts
    #[must_use]
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Required prefix for injected test paths
    #[must_use]
    pub fn test_root_prefix(&self) -> &str {
        &self.test_root_prefix
    }

    /// History refresh delay as a Duration
    #[must_use]
    pub const fn history_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.history_refresh_delay_ms)
    }

    /// Default wait options
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }
}
