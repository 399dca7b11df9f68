//! In-memory accumulator store.
//!
//! Suitable for development and tests; nothing survives a restart.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use cost_estimate_core::{AccumulatorDelta, AccumulatorState, MemberId, ValueBasis};

use crate::error::{Result, StoreError};
use crate::{apply_deltas, normalize, AccumulatorSnapshot, AccumulatorStore};

/// Process-local store backed by a locked map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<MemberId, AccumulatorSnapshot>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("lock poisoned".to_string())
}

impl AccumulatorStore for MemoryStore {
    fn load(&self, member_id: &MemberId) -> Result<Option<AccumulatorSnapshot>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(member_id).cloned())
    }

    fn replace(
        &self,
        member_id: &MemberId,
        accumulators: Vec<AccumulatorState>,
    ) -> Result<AccumulatorSnapshot> {
        let mut records = self.records.write().map_err(poisoned)?;
        let version = records.get(member_id).map_or(0, |r| r.version) + 1;

        let snapshot = AccumulatorSnapshot {
            member_id: member_id.clone(),
            version,
            updated_at: Utc::now(),
            accumulators: normalize(accumulators),
        };
        records.insert(member_id.clone(), snapshot.clone());

        tracing::debug!(member_id = %member_id, version, "Replaced accumulators");
        Ok(snapshot)
    }

    fn commit(
        &self,
        member_id: &MemberId,
        expected_version: u64,
        deltas: &[AccumulatorDelta],
        basis: ValueBasis,
    ) -> Result<AccumulatorSnapshot> {
        let mut records = self.records.write().map_err(poisoned)?;
        let current = records.get(member_id).ok_or(StoreError::NotFound)?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        let snapshot = AccumulatorSnapshot {
            member_id: member_id.clone(),
            version: current.version + 1,
            updated_at: Utc::now(),
            accumulators: apply_deltas(&current.accumulators, deltas, basis)?,
        };
        records.insert(member_id.clone(), snapshot.clone());

        tracing::debug!(
            member_id = %member_id,
            version = snapshot.version,
            "Committed accumulator deltas"
        );
        Ok(snapshot)
    }

    fn delete(&self, member_id: &MemberId) -> Result<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        records
            .remove(member_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cost_estimate_core::{AccumulatorCode, AccumulatorLevel, AppliedValueType, Money};

    fn member() -> MemberId {
        "M-100".parse().unwrap()
    }

    fn rows() -> Vec<AccumulatorState> {
        vec![AccumulatorState::new(
            AccumulatorCode::Deductible,
            AccumulatorLevel::Individual,
            Money::from_units(500),
            Money::from_units(100),
        )]
    }

    fn delta(applied: i64) -> AccumulatorDelta {
        AccumulatorDelta {
            code: AccumulatorCode::Deductible,
            level: AccumulatorLevel::Individual,
            remaining_value: Money::ZERO,
            applied_value: Money::from_units(applied),
            applied_value_type: AppliedValueType::Amount,
        }
    }

    #[test]
    fn replace_and_load() {
        let store = MemoryStore::new();
        assert!(store.load(&member()).unwrap().is_none());

        let first = store.replace(&member(), rows()).unwrap();
        let second = store.replace(&member(), rows()).unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);

        let loaded = store.load(&member()).unwrap().unwrap();
        assert_eq!(loaded.accumulators, rows());
    }

    #[test]
    fn commit_checks_version() {
        let store = MemoryStore::new();
        let snapshot = store.replace(&member(), rows()).unwrap();

        let committed = store
            .commit(&member(), snapshot.version, &[delta(40)], ValueBasis::Consumed)
            .unwrap();
        assert_eq!(committed.version, 2);
        assert_eq!(committed.accumulators[0].calculated_value, Money::from_units(140));

        // stale version
        let err = store
            .commit(&member(), snapshot.version, &[delta(40)], ValueBasis::Consumed)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn commit_unknown_member() {
        let store = MemoryStore::new();
        let err = store
            .commit(&member(), 1, &[], ValueBasis::Consumed)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn delete_removes_record() {
        let store = MemoryStore::new();
        store.replace(&member(), rows()).unwrap();
        store.delete(&member()).unwrap();
        assert!(store.load(&member()).unwrap().is_none());
        assert!(matches!(store.delete(&member()), Err(StoreError::NotFound)));
    }
}
