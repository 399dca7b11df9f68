//! Cost estimate handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use cost_estimate_core::{AccumulatorLedger, ClaimLine, Estimate, EstimateId, MemberId};
use cost_estimate_store::StoreError;

use crate::error::ApiError;
use crate::handlers::{load_snapshot, parse_member_id};
use crate::response::{EstimateResponse, LineContext, ResponseAssembler};
use crate::state::AppState;

/// Most claim lines accepted in one request.
const MAX_CLAIM_LINES: usize = 100;

/// Cost estimate request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    /// Member the estimate is for.
    pub member_id: String,
    /// Persist the new balances (default: preview only).
    #[serde(default)]
    pub commit: bool,
    /// Claim lines, estimated in order.
    pub claim_lines: Vec<ClaimLineRequest>,
}

/// One claim line in request format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLineRequest {
    /// Line data used by the engine.
    #[serde(flatten)]
    pub line: ClaimLine,
    /// Service descriptor, echoed unchanged.
    #[serde(default)]
    pub service: Option<Value>,
    /// Provider descriptor, echoed unchanged.
    #[serde(default)]
    pub provider_info: Option<Value>,
}

/// Estimate member and insurer cost for a set of claim lines.
///
/// With `commit`, the load → estimate → commit cycle is retried on version
/// conflicts up to `commit_max_retries` times.
pub async fn create_estimate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let member_id = parse_member_id(&body.member_id)?;

    if body.claim_lines.is_empty() {
        return Err(ApiError::BadRequest("claimLines must not be empty".into()));
    }
    if body.claim_lines.len() > MAX_CLAIM_LINES {
        return Err(ApiError::BadRequest(format!(
            "at most {MAX_CLAIM_LINES} claim lines per request"
        )));
    }

    tracing::debug!(
        member_id = %member_id,
        claim_lines = body.claim_lines.len(),
        commit = body.commit,
        "Processing cost estimate"
    );

    let lines: Vec<ClaimLine> = body.claim_lines.iter().map(|l| l.line.clone()).collect();
    let basis = state.config.estimator.value_basis;
    let max_retries = state.config.commit_max_retries;

    let mut attempt = 0;
    let (estimate, version, committed) = loop {
        let snapshot = load_snapshot(&state, &member_id)?;
        let ledger = AccumulatorLedger::new(snapshot.accumulators.iter().cloned(), basis)?;
        let estimate = state.estimator.estimate(&lines, &ledger)?;

        if !body.commit {
            break (estimate, snapshot.version, false);
        }

        match state
            .store
            .commit(&member_id, snapshot.version, &estimate.deltas, basis)
        {
            Ok(next) => break (estimate, next.version, true),
            Err(StoreError::VersionConflict { expected, actual }) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    member_id = %member_id,
                    expected,
                    actual,
                    attempt,
                    "Accumulators changed during estimate, retrying"
                );
            }
            Err(e) => return Err(e.into()),
        }
    };

    tracing::info!(
        member_id = %member_id,
        claim_lines = lines.len(),
        committed,
        version,
        "Cost estimate completed"
    );

    Ok(Json(assemble(&member_id, &body, &estimate, version, committed)))
}

fn assemble(
    member_id: &MemberId,
    request: &EstimateRequest,
    estimate: &Estimate,
    version: u64,
    committed: bool,
) -> EstimateResponse {
    let assembler = ResponseAssembler;
    let claim_lines = estimate
        .lines
        .iter()
        .zip(&request.claim_lines)
        .map(|(line, input)| {
            let context = LineContext {
                service: input.service.clone(),
                provider_info: input.provider_info.clone(),
            };
            assembler.claim_line(line, context)
        })
        .collect();

    EstimateResponse {
        estimate_id: EstimateId::generate(),
        member_id: member_id.clone(),
        committed,
        version,
        claim_lines,
    }
}
