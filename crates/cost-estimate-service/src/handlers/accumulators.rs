//! Member accumulator handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cost_estimate_core::{AccumulatorLedger, AccumulatorState, CostShareError, MemberId, Money};
use cost_estimate_store::AccumulatorSnapshot;

use crate::error::ApiError;
use crate::handlers::{load_snapshot, parse_member_id};
use crate::response::{AccumulatorEntry, ResponseAssembler};
use crate::state::AppState;

/// Current balances of a member.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorsResponse {
    /// The member.
    pub member_id: MemberId,
    /// Record version, for optimistic concurrency.
    pub version: u64,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
    /// How `calculatedValue` is interpreted.
    pub value_basis: String,
    /// Balances in precedence order.
    pub accumulators: Vec<AccumulatorState>,
}

impl AccumulatorsResponse {
    fn new(snapshot: AccumulatorSnapshot, state: &AppState) -> Self {
        Self {
            member_id: snapshot.member_id,
            version: snapshot.version,
            updated_at: snapshot.updated_at,
            value_basis: state.config.estimator.value_basis.as_str().to_string(),
            accumulators: snapshot.accumulators,
        }
    }
}

/// Replace balances request.
#[derive(Debug, Deserialize)]
pub struct ReplaceAccumulatorsRequest {
    /// New balances.
    pub accumulators: Vec<AccumulatorState>,
}

/// Ledger preview request.
#[derive(Debug, Deserialize)]
pub struct ApplyCostRequest {
    /// Cost to run through the accumulators.
    pub cost: Money,
}

/// Ledger preview response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCostResponse {
    /// The member.
    pub member_id: MemberId,
    /// Version the preview was computed against.
    pub version: u64,
    /// Cost left after the accumulators absorbed their part.
    pub remaining_cost: Money,
    /// Per-accumulator outcome.
    pub accumulators: Vec<AccumulatorEntry>,
}

/// Get a member's current balances.
pub async fn get_accumulators(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<String>,
) -> Result<Json<AccumulatorsResponse>, ApiError> {
    let member_id = parse_member_id(&member_id)?;
    let snapshot = load_snapshot(&state, &member_id)?;
    Ok(Json(AccumulatorsResponse::new(snapshot, &state)))
}

/// Replace a member's balances with data from the accumulator source.
pub async fn replace_accumulators(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<String>,
    Json(body): Json<ReplaceAccumulatorsRequest>,
) -> Result<Json<AccumulatorsResponse>, ApiError> {
    let member_id = parse_member_id(&member_id)?;

    // Out-of-range balances are bad input here, not a ledger defect
    AccumulatorLedger::new(body.accumulators.iter().cloned(), state.config.estimator.value_basis)
        .map_err(|e| match e {
            CostShareError::LedgerInvariantViolation { .. } => ApiError::Unprocessable {
                code: "invalid_accumulator",
                message: e.to_string(),
                details: Some(serde_json::json!({ "field": "accumulators" })),
            },
            other => other.into(),
        })?;

    let snapshot = state.store.replace(&member_id, body.accumulators)?;

    tracing::info!(
        member_id = %member_id,
        version = snapshot.version,
        accumulators = snapshot.accumulators.len(),
        "Accumulators replaced"
    );

    Ok(Json(AccumulatorsResponse::new(snapshot, &state)))
}

/// Preview the ledger waterfall for a cost without persisting anything.
pub async fn apply_cost(
    State(state): State<Arc<AppState>>,
    Path(member_id): Path<String>,
    Json(body): Json<ApplyCostRequest>,
) -> Result<Json<ApplyCostResponse>, ApiError> {
    let member_id = parse_member_id(&member_id)?;
    let snapshot = load_snapshot(&state, &member_id)?;

    let ledger = AccumulatorLedger::new(
        snapshot.accumulators.iter().cloned(),
        state.config.estimator.value_basis,
    )?;
    let application = ledger.apply(body.cost)?;

    tracing::debug!(
        member_id = %member_id,
        cost = %body.cost,
        remaining_cost = %application.remaining_cost,
        "Ledger preview computed"
    );

    Ok(Json(ApplyCostResponse {
        member_id,
        version: snapshot.version,
        remaining_cost: application.remaining_cost.rounded(),
        accumulators: ResponseAssembler.accumulators(&snapshot.accumulators, &application.deltas),
    }))
}
