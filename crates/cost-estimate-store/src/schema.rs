//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Accumulator records, keyed by `member_id`.
    pub const ACCUMULATORS: &str = "accumulators";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::ACCUMULATORS]
}
