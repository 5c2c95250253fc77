//! Abstraction over the nested navigable frame.
//!
//! The [`Frame`] trait is the single seam between the harness core and the
//! browser environment: navigation, one-shot load/pageshow subscriptions, a
//! history-mutation event stream, and the DOM operations the action
//! simulator needs. Swapping implementations keeps the scheduling and
//! log-relay core testable without a browser.
//!
//! [`MockFrame`] is the in-memory implementation used by unit tests; it
//! records every dispatched event for verification and lets tests fire
//! load/pageshow/history events manually.

use crate::result::{ArnesError, ArnesResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EVENTS
// =============================================================================

/// Kind of synthetic DOM event dispatched at an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomEventKind {
    /// Text input event
    Input,
    /// Form control change event
    Change,
    /// Mouse click event
    Click,
}

/// A synthetic DOM event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    /// Event kind
    pub kind: DomEventKind,
    /// Whether the event bubbles up the tree
    pub bubbles: bool,
}

impl DomEvent {
    /// A bubbling input event, as a real keystroke would produce
    #[must_use]
    pub const fn input() -> Self {
        Self {
            kind: DomEventKind::Input,
            bubbles: true,
        }
    }

    /// A bubbling change event
    #[must_use]
    pub const fn change() -> Self {
        Self {
            kind: DomEventKind::Change,
            bubbles: true,
        }
    }

    /// A bubbling click event
    #[must_use]
    pub const fn click() -> Self {
        Self {
            kind: DomEventKind::Click,
            bubbles: true,
        }
    }
}

/// History mutation performed by the nested document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEvent {
    /// `pushState`-equivalent navigation
    Push,
    /// `replaceState`-equivalent navigation
    Replace,
}

/// One-shot subscription to a frame event.
///
/// The subscription is live from the moment the waiter is created, so a
/// caller can subscribe before triggering navigation and never miss a
/// quickly-firing event.
#[derive(Debug)]
pub struct EventWaiter {
    rx: oneshot::Receiver<()>,
}

impl EventWaiter {
    /// Create a sender/waiter pair
    #[must_use]
    pub fn pair() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Resolve once the event fires.
    ///
    /// Fails with [`ArnesError::FrameClosed`] if the frame goes away
    /// without firing.
    pub async fn wait(self) -> ArnesResult<()> {
        self.rx.await.map_err(|_| ArnesError::FrameClosed)
    }
}

// =============================================================================
// FRAME TRAIT
// =============================================================================

/// The nested navigable surface the harness drives.
pub trait Frame: Send + Sync {
    /// Set the frame's navigation target. Returns immediately; readiness is
    /// observed via [`Frame::on_load`] and [`Frame::on_pageshow`].
    fn navigate(&self, path: &str);

    /// Subscribe to the frame's next load-completion event
    fn on_load(&self) -> EventWaiter;

    /// Subscribe to the current content's next pageshow event.
    ///
    /// Subscribe only after a load event has been observed; an earlier
    /// subscription can attach to a stale document.
    fn on_pageshow(&self) -> EventWaiter;

    /// Subscribe to history mutations performed by the nested document
    fn history_events(&self) -> mpsc::UnboundedReceiver<HistoryEvent>;

    /// Current location of the nested document
    fn location(&self) -> String;

    /// Assign a form element's value
    fn set_value(&self, selector: &str, value: &str) -> ArnesResult<()>;

    /// Read a checkbox's checked state
    fn is_checked(&self, selector: &str) -> ArnesResult<bool>;

    /// Set a checkbox's checked state
    fn set_checked(&self, selector: &str, checked: bool) -> ArnesResult<()>;

    /// Whether the element is currently shown
    fn is_shown(&self, selector: &str) -> ArnesResult<bool>;

    /// Dispatch a synthetic event at the element
    fn dispatch(&self, selector: &str, event: DomEvent) -> ArnesResult<()>;
}

// =============================================================================
// MOCK FRAME
// =============================================================================

/// Element state held by [`MockFrame`]
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// Current value
    pub value: String,
    /// Checkbox state
    pub checked: bool,
    /// Whether the element is shown
    pub shown: bool,
}

impl MockElement {
    /// A shown element with empty value
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: String::new(),
            checked: false,
            shown: true,
        }
    }

    /// Set the initial value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the initial checked state
    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.shown = false;
        self
    }
}

#[derive(Debug, Default)]
struct MockFrameState {
    location: String,
    elements: HashMap<String, MockElement>,
    navigations: Vec<String>,
    dispatched: Vec<(String, DomEvent)>,
    load_waiters: Vec<oneshot::Sender<()>>,
    pageshow_waiters: Vec<oneshot::Sender<()>>,
    history_subscribers: Vec<mpsc::UnboundedSender<HistoryEvent>>,
    auto_complete: bool,
}

/// In-memory frame double for unit testing.
#[derive(Debug, Default)]
pub struct MockFrame {
    inner: Mutex<MockFrameState>,
}

impl MockFrame {
    /// Create an empty mock frame
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When enabled, load/pageshow subscriptions resolve immediately,
    /// so navigation-awaiting tests need no manual event firing.
    pub fn set_auto_complete(&self, enabled: bool) {
        self.lock().auto_complete = enabled;
    }

    /// Add an element reachable by `selector`
    pub fn insert_element(&self, selector: impl Into<String>, element: MockElement) {
        self.lock().elements.insert(selector.into(), element);
    }

    /// Snapshot of an element's current state
    #[must_use]
    pub fn element(&self, selector: &str) -> Option<MockElement> {
        self.lock().elements.get(selector).cloned()
    }

    /// Toggle an element's visibility
    pub fn set_shown(&self, selector: &str, shown: bool) {
        if let Some(element) = self.lock().elements.get_mut(selector) {
            element.shown = shown;
        }
    }

    /// Fire the frame load event to all pending subscribers
    pub fn fire_load(&self) {
        for tx in self.lock().load_waiters.drain(..) {
            let _ = tx.send(());
        }
    }

    /// Fire the content pageshow event to all pending subscribers
    pub fn fire_pageshow(&self) {
        for tx in self.lock().pageshow_waiters.drain(..) {
            let _ = tx.send(());
        }
    }

    /// Emit a history mutation to all subscribers
    pub fn emit_history(&self, event: HistoryEvent) {
        self.lock()
            .history_subscribers
            .retain(|tx| tx.send(event).is_ok());
    }

    /// Paths passed to [`Frame::navigate`], in call order
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Events dispatched via [`Frame::dispatch`], in call order
    #[must_use]
    pub fn dispatched(&self) -> Vec<(String, DomEvent)> {
        self.lock().dispatched.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockFrameState> {
        self.inner.lock().expect("mock frame mutex poisoned")
    }

    fn with_element<T>(
        &self,
        selector: &str,
        f: impl FnOnce(&mut MockElement) -> T,
    ) -> ArnesResult<T> {
        let mut state = self.lock();
        state
            .elements
            .get_mut(selector)
            .map(f)
            .ok_or_else(|| ArnesError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}

impl Frame for MockFrame {
    fn navigate(&self, path: &str) {
        let mut state = self.lock();
        state.navigations.push(path.to_string());
        state.location = path.to_string();
    }

    fn on_load(&self) -> EventWaiter {
        let (tx, waiter) = EventWaiter::pair();
        let mut state = self.lock();
        if state.auto_complete {
            let _ = tx.send(());
        } else {
            state.load_waiters.push(tx);
        }
        waiter
    }

    fn on_pageshow(&self) -> EventWaiter {
        let (tx, waiter) = EventWaiter::pair();
        let mut state = self.lock();
        if state.auto_complete {
            let _ = tx.send(());
        } else {
            state.pageshow_waiters.push(tx);
        }
        waiter
    }

    fn history_events(&self) -> mpsc::UnboundedReceiver<HistoryEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().history_subscribers.push(tx);
        rx
    }

    fn location(&self) -> String {
        self.lock().location.clone()
    }

    fn set_value(&self, selector: &str, value: &str) -> ArnesResult<()> {
        self.with_element(selector, |element| {
            element.value = value.to_string();
        })
    }

    fn is_checked(&self, selector: &str) -> ArnesResult<bool> {
        self.with_element(selector, |element| element.checked)
    }

    fn set_checked(&self, selector: &str, checked: bool) -> ArnesResult<()> {
        self.with_element(selector, |element| {
            element.checked = checked;
        })
    }

    fn is_shown(&self, selector: &str) -> ArnesResult<bool> {
        self.with_element(selector, |element| element.shown)
    }

    fn dispatch(&self, selector: &str, event: DomEvent) -> ArnesResult<()> {
        if !self.lock().elements.contains_key(selector) {
            return Err(ArnesError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        self.lock().dispatched.push((selector.to_string(), event));
        Ok(())
    }
}
