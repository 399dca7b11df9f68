//! Accumulator storage for cost estimates.
//!
//! This crate owns the durable side of a member's accumulators. The engine in
//! `cost-estimate-core` only computes deltas; they are written back here.
//!
//! # Versioning
//!
//! Every record carries a version. [`AccumulatorStore::load`] returns it and
//! [`AccumulatorStore::commit`] only succeeds if it has not moved, so two
//! concurrent estimates for the same member cannot both apply against the
//! same balances. The loser gets `StoreError::VersionConflict` and reloads.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, for development and tests
//! - `RocksStore`: `RocksDB` with CBOR values (feature `rocksdb-backend`)
//!
//! # Example
//!
//! ```no_run
//! use cost_estimate_core::{AccumulatorCode, AccumulatorLevel, AccumulatorState, Money};
//! use cost_estimate_store::{AccumulatorStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let member = "M-1".parse().unwrap();
//!
//! let snapshot = store
//!     .replace(
//!         &member,
//!         vec![AccumulatorState::new(
//!             AccumulatorCode::Deductible,
//!             AccumulatorLevel::Individual,
//!             Money::from_units(500),
//!             Money::ZERO,
//!         )],
//!     )
//!     .unwrap();
//! assert_eq!(snapshot.version, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
#[cfg(feature = "rocksdb-backend")]
pub mod keys;
pub mod memory;
mod record;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use record::AccumulatorSnapshot;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use cost_estimate_core::{
    AccumulatorDelta, AccumulatorLedger, AccumulatorState, MemberId, ValueBasis,
};

/// Storage for member accumulators.
///
/// Implementations must be safe to share across request handlers and must make
/// the version check and write in [`AccumulatorStore::commit`] atomic.
pub trait AccumulatorStore: Send + Sync {
    /// Load a member's accumulators.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn load(&self, member_id: &MemberId) -> Result<Option<AccumulatorSnapshot>>;

    /// Replace a member's accumulators unconditionally.
    ///
    /// Used when balances are loaded from the external accumulator source.
    /// Bumps the version.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn replace(
        &self,
        member_id: &MemberId,
        accumulators: Vec<AccumulatorState>,
    ) -> Result<AccumulatorSnapshot>;

    /// Apply deltas if the record is still at `expected_version`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the member has no record.
    /// - `StoreError::VersionConflict` if the record moved.
    /// - `StoreError::Ledger` if a delta names an unknown accumulator or would
    ///   leave a balance out of range.
    fn commit(
        &self,
        member_id: &MemberId,
        expected_version: u64,
        deltas: &[AccumulatorDelta],
        basis: ValueBasis,
    ) -> Result<AccumulatorSnapshot>;

    /// Delete a member's accumulators.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the member has no record.
    fn delete(&self, member_id: &MemberId) -> Result<()>;
}

/// Sort rows into precedence order, dropping earlier duplicates.
pub(crate) fn normalize(accumulators: Vec<AccumulatorState>) -> Vec<AccumulatorState> {
    let mut by_key = std::collections::BTreeMap::new();
    for state in accumulators {
        by_key.insert(state.key(), state);
    }
    by_key.into_values().collect()
}

/// Advance `current` by `deltas` and check the result.
pub(crate) fn apply_deltas(
    current: &[AccumulatorState],
    deltas: &[AccumulatorDelta],
    basis: ValueBasis,
) -> Result<Vec<AccumulatorState>> {
    let mut next = current.to_vec();

    for delta in deltas {
        let state = next
            .iter_mut()
            .find(|s| s.code == delta.code && s.level == delta.level)
            .ok_or_else(|| cost_estimate_core::CostShareError::AccumulatorNotFound {
                code: delta.code.clone(),
                level: delta.level,
            })?;
        state.calculated_value = basis.advance(state.calculated_value, delta.applied_value);
    }

    // range check
    AccumulatorLedger::new(next.iter().cloned(), basis)?;
    Ok(next)
}
