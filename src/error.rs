// src/error.rs
//! Error kinds surfaced by the Mixto client, platform adapters and importers.
//!
//! Every failure is terminal for the operation that produced it. Nothing in
//! this crate retries; the binary prints the error and exits with status 1.

use thiserror::Error;

/// Result type alias using MixtoError
pub type Result<T> = std::result::Result<T, MixtoError>;

#[derive(Debug, Error)]
pub enum MixtoError {
    /// Missing or unreadable configuration (host, api key, workspace)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote host could not be reached or the body could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Mixto answered with a status above 300
    #[error("bad response from Mixto ({status}): {body}")]
    BadResponse { status: u16, body: String },

    /// A commit was attempted without an entry id
    #[error("entry id is missing")]
    MissingEntryId,

    /// A third-party scoring platform answered with a non-2xx status
    #[error("{platform} request failed ({status}): {body}")]
    PlatformRequest {
        platform: String,
        status: u16,
        body: String,
    },

    /// Malformed local input
    #[error("validation error: {0}")]
    Validation(String),

    /// Batch entry creation did not return 200
    #[error("failed to add entries ({status}): {body}")]
    BatchImport { status: u16, body: String },

    /// The operator declined a confirmation prompt
    #[error("aborted by operator")]
    Aborted,

    /// GraphQL response carried errors or no data
    #[error("graphql error: {0}")]
    GraphQl(String),

    /// A response body was not the JSON shape we expected
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local writeup ledger failure
    #[error("ledger error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MixtoError {
    /// True for errors caused by configuration rather than a remote call
    pub fn is_configuration(&self) -> bool {
        matches!(self, MixtoError::Configuration(_))
    }

    /// HTTP status attached to the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            MixtoError::BadResponse { status, .. }
            | MixtoError::BatchImport { status, .. }
            | MixtoError::PlatformRequest { status, .. } => Some(*status),
            MixtoError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_exposed() {
        let err = MixtoError::BadResponse {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("404"));

        let err = MixtoError::PlatformRequest {
            platform: "CTFd".to_string(),
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().starts_with("CTFd request failed"));

        assert_eq!(MixtoError::MissingEntryId.status(), None);
    }

    #[test]
    fn test_configuration_kind() {
        assert!(MixtoError::Configuration("host".to_string()).is_configuration());
        assert!(!MixtoError::Aborted.is_configuration());
    }
}
