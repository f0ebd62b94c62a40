//! Error types for the DormLink client.

/// Error types for session and API operations.
///
/// Storage failures never surface here; storage degrades to "no value"
/// so a broken backing store resolves into an unauthenticated session
/// instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid access token: {0}")]
    TokenDecode(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server returned {status} for {path}")]
    Api {
        status: reqwest::StatusCode,
        path: String,
    },

    #[error("Session expired")]
    SessionExpired,
}

pub type Result<T> = std::result::Result<T, Error>;
