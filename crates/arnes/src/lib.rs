//! Arnés: in-page test-orchestration harness.
//!
//! An external test-runner process injects test scripts into a page under
//! test; the scripts drive a nested navigable frame to simulate user
//! interaction, and every pass/fail/debug signal flows into a drainable log
//! stream the runner polls for reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      ARNES Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐     ┌─────────────┐     ┌────────────────┐      │
//! │   │ External   │────►│  Harness    │────►│  Nested frame  │      │
//! │   │ driver     │     │  (scheduler │     │  (Frame trait) │      │
//! │   │ load/drain │◄────│  + logs)    │     │                │      │
//! │   └────────────┘     └─────────────┘     └────────────────┘      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tests run strictly one at a time on the host event loop; each test's
//! cleanup actions run before the next test starts, and one unhandled
//! failure aborts the rest of the run (fail-fast) while the log stream
//! carries the full story to the driver.
//!
//! # Example
//!
//! ```
//! use arnes::{Harness, MockFrame};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let frame = Arc::new(MockFrame::new());
//! let harness = Harness::new(frame);
//!
//! harness.add_test("sanity", |ctx| async move {
//!     ctx.is(&(1 + 1), &2, "arithmetic holds");
//!     Ok(())
//! });
//! harness.run().await;
//!
//! let logs = harness.drain_logs();
//! assert!(logs.iter().any(|r| r.kind == arnes::LogKind::Pass));
//! # }
//! ```

#![warn(missing_docs)]

mod action;
mod cleanup;
mod config;
mod context;
mod frame;
mod harness;
mod log;
mod navigation;
mod result;
mod wait;

pub use action::ActionSimulator;
pub use cleanup::{CleanupAction, CleanupRegistry};
pub use config::{HarnessConfig, DEFAULT_TEST_ROOT_PREFIX, HISTORY_REFRESH_DELAY_MS};
pub use context::TestContext;
pub use frame::{
    DomEvent, DomEventKind, EventWaiter, Frame, HistoryEvent, MockElement, MockFrame,
};
pub use harness::{Harness, TestBody, TestCase, TestLoader};
pub use log::{LogChannel, LogKind, LogRecord};
pub use navigation::{LocationTracker, NavigationSynchronizer, HISTORY_REFRESH_DELAY};
pub use result::{ArnesError, ArnesResult};
pub use wait::{sleep, ConditionWaiter, WaitOptions, DEFAULT_MAX_TRIES, DEFAULT_POLL_INTERVAL_MS};
