//! Unified error types for Veristep

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Veristep
///
/// Every variant aborts the scenario that produced it; there is no
/// log-and-continue path. The single navigation retry is handled inside
/// the action executor before a `NavigationFailed` surfaces.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors (artifact writes, profile directories)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser session could not be created; fatal, never retried
    #[error("Session startup failed: {0}")]
    Startup(String),

    /// Session used after it was closed
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Zero elements matched a query
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// More than one element matched a query with no ordinal
    #[error("Ambiguous match: {0}")]
    AmbiguousMatch(String),

    /// A wait deadline elapsed; the message carries the last observed state
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Page failed to load, including the one escalated retry
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// An asserted condition was false at check time
    #[error("Assertion failed: {message}; last seen: {diagnostic}")]
    AssertionFailed { message: String, diagnostic: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

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

    /// Create a new startup error
    pub fn startup<S: Into<String>>(msg: S) -> Self {
        Error::Startup(msg.into())
    }

    /// Create a new session closed error
    pub fn session_closed<S: Into<String>>(msg: S) -> Self {
        Error::SessionClosed(msg.into())
    }

    /// Create a new element not found error
    pub fn element_not_found<S: Into<String>>(msg: S) -> Self {
        Error::ElementNotFound(msg.into())
    }

    /// Create a new ambiguous match error
    pub fn ambiguous_match<S: Into<String>>(msg: S) -> Self {
        Error::AmbiguousMatch(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new navigation failed error
    pub fn navigation_failed<S: Into<String>>(msg: S) -> Self {
        Error::NavigationFailed(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new assertion failure with its diagnostic snapshot
    pub fn assertion_failed<S: Into<String>, D: Into<String>>(message: S, diagnostic: D) -> Self {
        Error::AssertionFailed {
            message: message.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Short kind tag used in step reports and summary lines
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::WebSocket(_) => "websocket",
            Error::Cdp(_) => "cdp",
            Error::Serialization(_) => "serialization",
            Error::Startup(_) => "startup",
            Error::SessionClosed(_) => "session_closed",
            Error::ElementNotFound(_) => "not_found",
            Error::AmbiguousMatch(_) => "ambiguous_match",
            Error::Timeout(_) => "timeout",
            Error::NavigationFailed(_) => "navigation",
            Error::ScriptExecutionFailed(_) => "script",
            Error::AssertionFailed { .. } => "assertion",
            Error::Configuration(_) => "configuration",
            Error::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_carries_context() {
        let err =
            Error::timeout("condition visible not met after 10000ms; last state: 0 matching elements");
        assert!(err.to_string().contains("0 matching elements"));
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_assertion_display_includes_diagnostic() {
        let err = Error::assertion_failed("item count is 3", "visible text: \"List full\"");
        let text = err.to_string();
        assert!(text.contains("item count is 3"));
        assert!(text.contains("List full"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), "io");
    }
}
