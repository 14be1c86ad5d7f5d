//! Unified error types for the e2e harness

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the e2e harness
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// HTTP discovery endpoint errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// No browser session could be obtained; the test cannot run
    #[error("Session acquisition failed: {0}")]
    SessionAcquisition(String),

    /// The session was already released
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Element never appeared within the wait bound
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Element appeared but never reached the awaited condition
    #[error("Interaction timeout: {0}")]
    InteractionTimeout(String),

    /// Element disappeared between lookup and interaction
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// Navigation failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Evidence could not be written
    #[error("Evidence capture failed: {0}")]
    EvidenceCapture(String),

    /// A required configuration value is absent
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// A configuration value is present but unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A test expectation did not hold
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    /// The test body ran past `test.timeout` and was abandoned
    #[error("Test timed out: {0}")]
    TestTimeout(String),

    /// The test asked to be skipped
    #[error("Skipped: {0}")]
    Skipped(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new HTTP error
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Error::Http(msg.into())
    }

    /// Create a new session acquisition error
    pub fn session_acquisition<S: Into<String>>(msg: S) -> Self {
        Error::SessionAcquisition(msg.into())
    }

    /// Create a new session closed error
    pub fn session_closed<S: Into<String>>(id: S) -> Self {
        Error::SessionClosed(id.into())
    }

    /// Create a new element not found error
    pub fn element_not_found<S: Into<String>>(msg: S) -> Self {
        Error::ElementNotFound(msg.into())
    }

    /// Create a new interaction timeout error
    pub fn interaction_timeout<S: Into<String>>(msg: S) -> Self {
        Error::InteractionTimeout(msg.into())
    }

    /// Create a new stale element error
    pub fn stale_element<S: Into<String>>(msg: S) -> Self {
        Error::StaleElement(msg.into())
    }

    /// Create a new navigation failed error
    pub fn navigation_failed<S: Into<String>>(msg: S) -> Self {
        Error::NavigationFailed(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new evidence capture error
    pub fn evidence_capture<S: Into<String>>(msg: S) -> Self {
        Error::EvidenceCapture(msg.into())
    }

    /// Create a new configuration missing error
    pub fn configuration_missing<S: Into<String>>(key: S) -> Self {
        Error::ConfigurationMissing(key.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new assertion failure
    pub fn assertion<S: Into<String>>(msg: S) -> Self {
        Error::AssertionFailed(msg.into())
    }

    /// Create a new test timeout error
    pub fn test_timeout<S: Into<String>>(msg: S) -> Self {
        Error::TestTimeout(msg.into())
    }

    /// Create a new skip request
    pub fn skipped<S: Into<String>>(reason: S) -> Self {
        Error::Skipped(reason.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error means the browser environment itself is unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::SessionAcquisition(_) | Error::SessionClosed(_))
    }

    /// Whether a poll may retry after this error
    ///
    /// Evaluations fail while the page swaps documents ("Execution context
    /// was destroyed"); the next probe usually succeeds.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Cdp(_) | Error::ScriptExecutionFailed(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_taxonomy_prefix() {
        let err = Error::element_not_found("css `#missing` after 20000ms");
        assert_eq!(
            err.to_string(),
            "Element not found: css `#missing` after 20000ms"
        );

        let err = Error::configuration_missing("E2E_INVITE_TOKEN");
        assert_eq!(err.to_string(), "Configuration missing: E2E_INVITE_TOKEN");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::session_acquisition("no chrome").is_fatal());
        assert!(!Error::element_not_found("x").is_fatal());
        assert!(!Error::evidence_capture("disk full").is_fatal());
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::cdp("Execution context was destroyed.").is_transient());
        assert!(Error::script_execution_failed("document is null").is_transient());
        assert!(!Error::session_closed("s1").is_transient());
        assert!(!Error::websocket("reset").is_transient());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
