//! Stored form of a member's accumulators.
//!
//! Amounts are kept as decimal strings so a stored balance reads back exactly;
//! the API's JSON number encoding is not used here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cost_estimate_core::{AccumulatorCode, AccumulatorLevel, AccumulatorState, MemberId, Money};

use crate::error::{Result, StoreError};

/// A member's accumulators at one version.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorSnapshot {
    /// Owner of the accumulators.
    pub member_id: MemberId,
    /// Incremented on every write; starts at 1.
    pub version: u64,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
    /// Balances in precedence order.
    pub accumulators: Vec<AccumulatorState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRow {
    code: String,
    level: String,
    limit_value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit_type: Option<String>,
    calculated_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    pub(crate) version: u64,
    pub(crate) updated_at: DateTime<Utc>,
    rows: Vec<StoredRow>,
}

impl StoredRecord {
    pub(crate) fn from_snapshot(snapshot: &AccumulatorSnapshot) -> Self {
        let rows = snapshot
            .accumulators
            .iter()
            .map(|state| StoredRow {
                code: state.code.as_str().to_string(),
                level: state.level.as_str().to_string(),
                limit_value: state.limit_value.amount(),
                limit_type: state.limit_type.clone(),
                calculated_value: state.calculated_value.amount(),
            })
            .collect();

        Self {
            version: snapshot.version,
            updated_at: snapshot.updated_at,
            rows,
        }
    }

    pub(crate) fn into_snapshot(self, member_id: MemberId) -> Result<AccumulatorSnapshot> {
        let accumulators = self
            .rows
            .into_iter()
            .map(|row| {
                let level = row
                    .level
                    .parse::<AccumulatorLevel>()
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                let code = match row.code.parse::<AccumulatorCode>() {
                    Ok(code) => code,
                    Err(never) => match never {},
                };
                Ok(AccumulatorState {
                    code,
                    level,
                    limit_value: Money::try_new(row.limit_value)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                    limit_type: row.limit_type,
                    calculated_value: Money::try_new(row.calculated_value)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AccumulatorSnapshot {
            member_id,
            version: self.version,
            updated_at: self.updated_at,
            accumulators,
        })
    }
}
