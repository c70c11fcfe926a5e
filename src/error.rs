//! Error types for the metasearch library.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
///
/// Only configuration errors and caller cancellation ever reach the caller of
/// [`MetaSearch::search`](crate::MetaSearch::search); every per-engine error
/// is turned into an unresponsive-engine diagnostic instead.
#[derive(Error, Debug)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("Engine '{engine}' returned HTTP status {status}")]
    HttpStatus { engine: String, status: u16 },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Engine is temporarily suspended.
    #[error("Engine '{0}' is suspended: {1}")]
    EngineSuspended(String, String),

    /// Search timeout exceeded.
    #[error("Search timeout exceeded")]
    Timeout,

    /// The caller cancelled the search.
    #[error("Search was cancelled")]
    Cancelled,

    /// An engine with the same name is already registered.
    #[error("Engine '{0}' is already registered")]
    DuplicateEngine(String),

    /// An engine with the same shortcut is already registered.
    #[error("Shortcut '{shortcut}' is already used by engine '{engine}'")]
    DuplicateShortcut { shortcut: String, engine: String },

    /// A plugin with the same id is already registered.
    #[error("Plugin '{0}' is already registered")]
    DuplicatePlugin(String),

    /// No engine registered under this name.
    #[error("Engine '{0}' not found")]
    EngineNotFound(String),

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Returns true for errors raised while registering engines or plugins.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEngine(_)
                | Self::DuplicateShortcut { .. }
                | Self::DuplicatePlugin(_)
                | Self::Config(_)
        )
    }
}
