//! Error types for icsmirror.

use thiserror::Error;

/// Failures reported by a remote calendar service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode remote response: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Result type alias for calls into a remote calendar service.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that abort a sync run.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Failed to list synced events: {0}")]
    IndexBuild(#[source] RemoteError),
}

/// Result type alias for icsmirror core operations.
pub type CoreResult<T> = Result<T, CoreError>;
