//! Error types for the directory client.

use numscan_scanner::LookupError;
use thiserror::Error;

/// Errors raised while building a [`crate::DirectoryClient`].
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Base URL cannot be used
    #[error("invalid directory URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// HTTP client construction failed
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type alias for directory client construction.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Map a transport-level failure onto the scanner's lookup error.
pub(crate) fn lookup_error(err: &reqwest::Error) -> LookupError {
    if err.is_decode() {
        LookupError::Decode(err.to_string())
    } else {
        LookupError::Transport(err.to_string())
    }
}
