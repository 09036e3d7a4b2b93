//! Store error types.
//!
//! These errors represent failures when calling the external record and
//! document stores. The gate and wizard treat any of them as a generic
//! retry-later condition, but the variants let callers log and classify
//! without string matching.

use thiserror::Error;

/// Errors that can occur when calling an external store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (expired or invalid access token).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The spreadsheet, folder, or file was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl StoreError {
    /// Returns `true` if this error is permanent and retrying the same
    /// call cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            StoreError::AuthenticationFailed(_) | StoreError::NotFound(_)
        )
    }
}
