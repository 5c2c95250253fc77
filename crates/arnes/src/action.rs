//! Simulated user interaction with the nested frame.
//!
//! Each action mutates the target element and dispatches the bubbling
//! synthetic event a real interaction would produce, so reactive listeners
//! on the page under test observe the change exactly as they would for a
//! keystroke or click. No focus/hover chains are emulated.

use crate::frame::{DomEvent, Frame};
use crate::log::LogChannel;
use crate::result::ArnesResult;

/// Drives form elements in the nested frame
pub struct ActionSimulator<'a> {
    frame: &'a dyn Frame,
    logs: &'a LogChannel,
}

impl std::fmt::Debug for ActionSimulator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSimulator").finish_non_exhaustive()
    }
}

impl<'a> ActionSimulator<'a> {
    /// Create a simulator over `frame`, narrating into `logs`
    #[must_use]
    pub fn new(frame: &'a dyn Frame, logs: &'a LogChannel) -> Self {
        Self { frame, logs }
    }

    /// Set a text input's value, dispatching a bubbling input event
    pub fn set_text(&self, selector: &str, text: &str) -> ArnesResult<()> {
        self.logs.debug(format!("Setting text {text}"));
        self.frame.set_value(selector, text)?;
        self.frame.dispatch(selector, DomEvent::input())
    }

    /// Flip a checkbox's state, dispatching a bubbling change event
    pub fn toggle_checkbox(&self, selector: &str) -> ArnesResult<()> {
        self.logs.debug("Toggling checkbox");
        let checked = self.frame.is_checked(selector)?;
        self.frame.set_checked(selector, !checked)?;
        self.frame.dispatch(selector, DomEvent::change())
    }

    /// Dispatch a bubbling click event at the element
    pub fn click(&self, selector: &str) -> ArnesResult<()> {
        self.logs.debug("Clicking");
        self.frame.dispatch(selector, DomEvent::click())
    }

    /// Select an option by value, dispatching a bubbling change event
    pub fn select_option(&self, selector: &str, value: &str) -> ArnesResult<()> {
        self.logs.debug(format!("Selecting value {value}"));
        self.frame.set_value(selector, value)?;
        self.frame.dispatch(selector, DomEvent::change())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{DomEventKind, MockElement, MockFrame};
    use crate::log::LogKind;
    use crate::result::ArnesError;

    fn setup() -> (MockFrame, LogChannel) {
        let frame = MockFrame::new();
        frame.insert_element("#query", MockElement::new());
        frame.insert_element("#case", MockElement::new());
        (frame, LogChannel::new())
    }

    #[test]
    fn set_text_assigns_value_and_dispatches_input() {
        let (frame, logs) = setup();
        ActionSimulator::new(&frame, &logs)
            .set_text("#query", "Object.is")
            .unwrap();

        assert_eq!(frame.element("#query").unwrap().value, "Object.is");
        let dispatched = frame.dispatched();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].1.kind, DomEventKind::Input);
        assert!(dispatched[0].1.bubbles);
    }

    #[test]
    fn toggle_checkbox_flips_state_and_dispatches_change() {
        let (frame, logs) = setup();
        let actions = ActionSimulator::new(&frame, &logs);

        actions.toggle_checkbox("#case").unwrap();
        assert!(frame.element("#case").unwrap().checked);

        actions.toggle_checkbox("#case").unwrap();
        assert!(!frame.element("#case").unwrap().checked);

        let kinds: Vec<DomEventKind> =
            frame.dispatched().into_iter().map(|(_, ev)| ev.kind).collect();
        assert_eq!(kinds, vec![DomEventKind::Change, DomEventKind::Change]);
    }

    #[test]
    fn click_dispatches_without_mutating() {
        let (frame, logs) = setup();
        ActionSimulator::new(&frame, &logs).click("#query").unwrap();

        assert_eq!(frame.element("#query").unwrap().value, "");
        assert_eq!(frame.dispatched()[0].1.kind, DomEventKind::Click);
    }

    #[test]
    fn select_option_assigns_value_and_dispatches_change() {
        let (frame, logs) = setup();
        ActionSimulator::new(&frame, &logs)
            .select_option("#query", "beta")
            .unwrap();

        assert_eq!(frame.element("#query").unwrap().value, "beta");
        assert_eq!(frame.dispatched()[0].1.kind, DomEventKind::Change);
    }

    #[test]
    fn missing_element_propagates() {
        let (frame, logs) = setup();
        let err = ActionSimulator::new(&frame, &logs)
            .set_text("#ghost", "x")
            .unwrap_err();
        assert!(matches!(err, ArnesError::ElementNotFound { .. }));
    }

    #[test]
    fn every_action_narrates_a_debug_record() {
        let (frame, logs) = setup();
        let actions = ActionSimulator::new(&frame, &logs);
        actions.set_text("#query", "a").unwrap();
        actions.click("#case").unwrap();

        assert!(logs.drain().iter().all(|r| r.kind == LogKind::Debug));
    }
}
