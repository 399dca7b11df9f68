//! `RocksDB` storage implementation.
//!
//! Records are CBOR-encoded under the `accumulators` column family. A
//! process-wide write lock serializes the read-check-write of `replace`,
//! `commit` and `delete`; reads go straight to the database.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use cost_estimate_core::{AccumulatorDelta, AccumulatorState, MemberId, ValueBasis};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::record::StoredRecord;
use crate::schema::{all_column_families, cf};
use crate::{apply_deltas, normalize, AccumulatorSnapshot, AccumulatorStore};

/// RocksDB-backed accumulator store.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_record(&self, member_id: &MemberId) -> Result<Option<StoredRecord>> {
        let cf = self.cf(cf::ACCUMULATORS)?;
        let key = keys::accumulator_key(member_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_snapshot(&self, snapshot: &AccumulatorSnapshot) -> Result<()> {
        let cf = self.cf(cf::ACCUMULATORS)?;
        let key = keys::accumulator_key(&snapshot.member_id);
        let value = Self::serialize(&StoredRecord::from_snapshot(snapshot))?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".to_string()))
    }
}

impl AccumulatorStore for RocksStore {
    fn load(&self, member_id: &MemberId) -> Result<Option<AccumulatorSnapshot>> {
        self.get_record(member_id)?
            .map(|record| record.into_snapshot(member_id.clone()))
            .transpose()
    }

    fn replace(
        &self,
        member_id: &MemberId,
        accumulators: Vec<AccumulatorState>,
    ) -> Result<AccumulatorSnapshot> {
        let _guard = self.lock()?;
        let version = self.get_record(member_id)?.map_or(0, |r| r.version) + 1;

        let snapshot = AccumulatorSnapshot {
            member_id: member_id.clone(),
            version,
            updated_at: Utc::now(),
            accumulators: normalize(accumulators),
        };
        self.put_snapshot(&snapshot)?;

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
        let _guard = self.lock()?;
        let current = self
            .get_record(member_id)?
            .ok_or(StoreError::NotFound)?
            .into_snapshot(member_id.clone())?;

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
        self.put_snapshot(&snapshot)?;

        tracing::debug!(
            member_id = %member_id,
            version = snapshot.version,
            "Committed accumulator deltas"
        );
        Ok(snapshot)
    }

    fn delete(&self, member_id: &MemberId) -> Result<()> {
        let _guard = self.lock()?;
        let cf = self.cf(cf::ACCUMULATORS)?;
        let key = keys::accumulator_key(member_id);

        // Check if the record exists
        if self.get_record(member_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}
