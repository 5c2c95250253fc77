//! Result and error types for Arnés.

use thiserror::Error;

/// Result type for harness operations
pub type ArnesResult<T> = Result<T, ArnesError>;

/// Errors that can occur in the harness
#[derive(Debug, Error)]
pub enum ArnesError {
    /// A test body gave up with an unhandled failure
    #[error("{message}")]
    TestFailure {
        /// Error message
        message: String,
    },

    /// A wait predicate itself is broken (as opposed to "condition not met")
    #[error("predicate error: {message}")]
    Predicate {
        /// Error message
        message: String,
    },

    /// The frame went away while an event subscription was pending
    #[error("frame closed before the awaited event fired")]
    FrameClosed,

    /// No element matches the given selector
    #[error("no element matches selector {selector}")]
    ElementNotFound {
        /// The selector that matched nothing
        selector: String,
    },

    /// Simulated user action failed
    #[error("action failed: {message}")]
    Action {
        /// Error message
        message: String,
    },

    /// Test script could not be loaded
    #[error("failed to load script: {message}")]
    Loader {
        /// Error message
        message: String,
    },

    /// Cleanup action failed
    #[error("cleanup failed: {message}")]
    Cleanup {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArnesError {
    /// Create a test failure with the given description
    pub fn test_failure(message: impl Into<String>) -> Self {
        Self::TestFailure {
            message: message.into(),
        }
    }

    /// Create a predicate error
    pub fn predicate(message: impl Into<String>) -> Self {
        Self::Predicate {
            message: message.into(),
        }
    }

    /// Create a loader error
    pub fn loader(message: impl Into<String>) -> Self {
        Self::Loader {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_is_bare_message() {
        let err = ArnesError::test_failure("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn element_not_found_names_selector() {
        let err = ArnesError::ElementNotFound {
            selector: "#query".to_string(),
        };
        assert_eq!(err.to_string(), "no element matches selector #query");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ArnesError = io.into();
        assert!(matches!(err, ArnesError::Io(_)));
    }
}
