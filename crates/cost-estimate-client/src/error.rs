//! Client error types.

/// Errors that can occur when using the cost estimate client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// A claim line could not be estimated.
    #[error("claim line {claim_line_id}: {code} - {message}")]
    ClaimLine {
        /// The failing claim line.
        claim_line_id: String,
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// Input field at fault, if reported.
        field: Option<String>,
    },

    /// The member has no accumulators on file.
    #[error("member not found: {message}")]
    MemberNotFound {
        /// Error message.
        message: String,
    },

    /// Balances kept changing while the estimate was committed.
    #[error("version conflict: {message}")]
    VersionConflict {
        /// Error message.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
