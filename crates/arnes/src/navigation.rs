//! Navigation synchronization for the nested frame.
//!
//! A page is only safe to interact with after both the frame's load event
//! and the content's subsequent pageshow event have fired: page UI (context
//! menus in particular) arms itself on pageshow, and resolving on load alone
//! produces flaky interactions. [`NavigationSynchronizer`] encodes that
//! two-phase wait; [`LocationTracker`] mirrors the nested document's
//! location into a watch channel, refreshing a beat after each history
//! mutation.

use crate::config::HISTORY_REFRESH_DELAY_MS;
use crate::frame::Frame;
use crate::log::{LogChannel, LogKind};
use crate::result::ArnesResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Delay between a history mutation and the location refresh
pub const HISTORY_REFRESH_DELAY: Duration = Duration::from_millis(HISTORY_REFRESH_DELAY_MS);

/// Awaits full readiness of the nested frame after navigation.
#[derive(Clone)]
pub struct NavigationSynchronizer {
    frame: Arc<dyn Frame>,
    logs: Arc<LogChannel>,
}

impl std::fmt::Debug for NavigationSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationSynchronizer").finish_non_exhaustive()
    }
}

impl NavigationSynchronizer {
    /// Create a synchronizer for `frame`, narrating into `logs`
    #[must_use]
    pub fn new(frame: Arc<dyn Frame>, logs: Arc<LogChannel>) -> Self {
        Self { frame, logs }
    }

    /// Resolve once the next navigation has fully completed.
    ///
    /// The load subscription is created before this returns, so callers can
    /// obtain the future, trigger navigation, and then await it without a
    /// race. The pageshow subscription is created only after the load event
    /// resolves; subscribing earlier can attach to the outgoing document and
    /// miss the signal. If only the load event ever fires, the future stays
    /// pending.
    pub fn wait_for_load(&self) -> impl Future<Output = ArnesResult<()>> + Send {
        self.logs.record(LogKind::Debug, "Waiting for load");
        let load = self.frame.on_load();
        let frame = Arc::clone(&self.frame);
        let logs = Arc::clone(&self.logs);

        async move {
            load.wait().await?;
            logs.record(LogKind::Debug, "Observed load event");

            let pageshow = frame.on_pageshow();
            pageshow.wait().await?;
            logs.record(LogKind::Debug, "Observed pageshow event");
            Ok(())
        }
    }

    /// Set the frame's navigation target and resolve after full readiness
    pub async fn load_path(&self, path: &str) -> ArnesResult<()> {
        let ready = self.wait_for_load();

        self.logs.record(LogKind::Debug, format!("Loading {path}"));
        self.frame.navigate(path);

        ready.await
    }
}

/// Mirrors the nested document's location into a watch channel.
///
/// Consumes the frame's history-event stream; after each push/replace,
/// waits [`HISTORY_REFRESH_DELAY`] before reading the location, since state
/// propagation inside the nested document is asynchronous. Also refreshes
/// on every frame load.
#[derive(Debug)]
pub struct LocationTracker {
    rx: watch::Receiver<String>,
    handle: JoinHandle<()>,
}

impl LocationTracker {
    /// Spawn the tracker task for `frame`
    #[must_use]
    pub fn spawn(frame: Arc<dyn Frame>, delay: Duration) -> Self {
        let (tx, rx) = watch::channel(frame.location());
        let mut history = frame.history_events();

        let handle = tokio::spawn(async move {
            loop {
                let load = frame.on_load();
                tokio::select! {
                    event = history.recv() => {
                        if event.is_none() {
                            break;
                        }
                        tokio::time::sleep(delay).await;
                        if tx.send(frame.location()).is_err() {
                            break;
                        }
                    }
                    result = load.wait() => {
                        if result.is_err() || tx.send(frame.location()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { rx, handle }
    }

    /// Receiver carrying the latest observed location
    #[must_use]
    pub fn display(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
