//! Error types for accumulator storage.

use cost_estimate_core::CostShareError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No accumulator record for the member.
    #[error("not found")]
    NotFound,

    /// The record changed since it was loaded.
    #[error("version conflict: expected={expected}, actual={actual}")]
    VersionConflict {
        /// Version the caller loaded.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The deltas do not fit the stored accumulators.
    #[error(transparent)]
    Ledger(#[from] CostShareError),
}
