//! Log relay between test bodies and the external driver.
//!
//! Every signal the harness produces (assertion outcomes, diagnostics,
//! run boundaries) is a [`LogRecord`] appended to a [`LogChannel`]. The
//! external driver polls [`LogChannel::drain`] to pull records exactly
//! once; each `record` call is also mirrored to `tracing` for local
//! observability, independent of the drain semantics.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Classification of a log record, as consumed by the external driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogKind {
    /// Assertion passed
    Pass,
    /// Assertion failed, or a run-level failure
    Fail,
    /// Diagnostic narration
    Info,
    /// Verbose diagnostic narration
    Debug,
    /// Exception trace accompanying a FAIL
    Stack,
    /// Start of a single test function
    Subtest,
    /// Start of a test file run
    TestStart,
    /// End of a test file run
    TestEnd,
}

impl LogKind {
    /// Wire name of this kind, as the external driver sees it
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Stack => "STACK",
            Self::Subtest => "SUBTEST",
            Self::TestStart => "TEST_START",
            Self::TestEnd => "TEST_END",
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single structured log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Record classification
    pub kind: LogKind,
    /// Human-readable message
    pub message: String,
}

impl LogRecord {
    /// Create a new record
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Append-only queue of log records, drainable exactly once per drain call.
///
/// Interior mutability lets the channel be shared by `Arc` between the
/// scheduler, test contexts, and the waiter. The scheduler guarantees a
/// single in-flight test, so no cross-context ordering is promised beyond
/// append order.
#[derive(Debug, Default)]
pub struct LogChannel {
    records: Mutex<Vec<LogRecord>>,
}

impl LogChannel {
    /// Create an empty channel
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record, mirroring it to the diagnostic output
    pub fn record(&self, kind: LogKind, message: impl Into<String>) {
        let record = LogRecord::new(kind, message);
        match record.kind {
            LogKind::Fail | LogKind::Stack => {
                tracing::error!(kind = %record.kind, "{}", record.message);
            }
            LogKind::Debug => tracing::debug!(kind = %record.kind, "{}", record.message),
            _ => tracing::info!(kind = %record.kind, "{}", record.message),
        }
        self.records.lock().expect("log mutex poisoned").push(record);
    }

    /// Record a PASS
    pub fn pass(&self, message: impl Into<String>) {
        self.record(LogKind::Pass, message);
    }

    /// Record a FAIL
    pub fn fail(&self, message: impl Into<String>) {
        self.record(LogKind::Fail, message);
    }

    /// Record diagnostic narration
    pub fn info(&self, message: impl Into<String>) {
        self.record(LogKind::Info, message);
    }

    /// Record verbose diagnostic narration
    pub fn debug(&self, message: impl Into<String>) {
        self.record(LogKind::Debug, message);
    }

    /// Return all buffered records in append order and empty the store.
    ///
    /// No record is ever returned by more than one drain call.
    #[must_use]
    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock().expect("log mutex poisoned"))
    }

    /// Number of currently buffered records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().expect("log mutex poisoned").len()
    }

    /// Whether the channel holds no buffered records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn kind_wire_names() {
        assert_eq!(LogKind::Pass.as_str(), "PASS");
        assert_eq!(LogKind::Stack.as_str(), "STACK");
        assert_eq!(LogKind::TestStart.as_str(), "TEST_START");
        assert_eq!(LogKind::TestEnd.as_str(), "TEST_END");
        assert_eq!(format!("{}", LogKind::Subtest), "SUBTEST");
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&LogKind::TestStart).unwrap();
        assert_eq!(json, "\"TEST_START\"");
        let back: LogKind = serde_json::from_str("\"FAIL\"").unwrap();
        assert_eq!(back, LogKind::Fail);
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = LogRecord::new(LogKind::Pass, "ok");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"kind":"PASS","message":"ok"}"#);
    }

    #[test]
    fn drain_returns_records_in_call_order() {
        let channel = LogChannel::new();
        channel.record(LogKind::Info, "first");
        channel.record(LogKind::Pass, "second");
        channel.record(LogKind::Debug, "third");

        let drained = channel.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].message, "first");
        assert_eq!(drained[1].message, "second");
        assert_eq!(drained[2].message, "third");
    }

    #[test]
    fn second_drain_is_empty() {
        let channel = LogChannel::new();
        channel.pass("once");
        assert_eq!(channel.drain().len(), 1);
        assert!(channel.drain().is_empty());
    }

    #[test]
    fn records_after_drain_are_fresh() {
        let channel = LogChannel::new();
        channel.info("before");
        let _ = channel.drain();
        channel.info("after");

        let drained = channel.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, "after");
    }

    #[test]
    fn wrappers_use_expected_kinds() {
        let channel = LogChannel::new();
        channel.pass("p");
        channel.fail("f");
        channel.info("i");
        channel.debug("d");

        let kinds: Vec<LogKind> = channel.drain().into_iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![LogKind::Pass, LogKind::Fail, LogKind::Info, LogKind::Debug]
        );
    }

    fn kind_strategy() -> impl Strategy<Value = LogKind> {
        prop::sample::select(vec![
            LogKind::Pass,
            LogKind::Fail,
            LogKind::Info,
            LogKind::Debug,
            LogKind::Stack,
            LogKind::Subtest,
            LogKind::TestStart,
            LogKind::TestEnd,
        ])
    }

    proptest! {
        #[test]
        fn drain_is_exactly_once_and_ordered(
            entries in prop::collection::vec((kind_strategy(), ".{0,20}"), 0..50)
        ) {
            let channel = LogChannel::new();
            for (kind, message) in &entries {
                channel.record(*kind, message.clone());
            }

            let drained = channel.drain();
            prop_assert_eq!(drained.len(), entries.len());
            for (record, (kind, message)) in drained.iter().zip(&entries) {
                prop_assert_eq!(record.kind, *kind);
                prop_assert_eq!(&record.message, message);
            }
            prop_assert!(channel.drain().is_empty());
        }
    }
}
