//! Result and error types for Conducir.

use thiserror::Error;

/// Result type for Conducir operations
pub type ConducirResult<T> = Result<T, ConducirError>;

/// Errors that can occur in Conducir
#[derive(Debug, Error)]
pub enum ConducirError {
    /// The DESIRED capability override variable holds malformed JSON
    #[error("Malformed DESIRED capability JSON: {message}")]
    DesiredParse {
        /// Error message
        message: String,
    },

    /// The BROWSERKEY probe variable holds malformed JSON
    #[error("Malformed BROWSERKEY JSON: {message}")]
    BrowserKeyParse {
        /// Error message
        message: String,
    },

    /// Environment alias is not in the alias table
    #[error("Unknown environment alias '{name}'. Known aliases: stage, production, static")]
    UnknownEnvironment {
        /// Alias that failed to resolve
        name: String,
    },

    /// Base URL override is not an absolute http(s) URL
    #[error("Invalid base URL '{url}': expected an absolute http(s) URL")]
    InvalidBaseUrl {
        /// URL that failed validation
        url: String,
    },

    /// Viewport name is not in the viewport table
    #[error("Unknown viewport '{name}'. Known viewports: small, medium, large, xlarge, xxlarge")]
    UnknownViewport {
        /// Name that failed to resolve
        name: String,
    },

    /// Session acquisition failed
    #[error("Failed to acquire browser session at {endpoint}: {message}")]
    SessionInit {
        /// Automation endpoint that was unreachable
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Session release failed
    #[error("Failed to release browser session: {message}")]
    SessionClose {
        /// Error message
        message: String,
    },

    /// Reporting the aggregated run status to the remote grid failed
    #[error("Failed to report job status: {message}")]
    ReportFailed {
        /// Error message
        message: String,
    },

    /// Lifecycle operation called in the wrong state
    #[error("Invalid session state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
