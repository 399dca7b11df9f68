//! Request and response types for the cost estimate client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cost_estimate_core::{
    AccumulatorState, AppliedValueType, BenefitCoverage, ClaimLine, EstimateId, MemberId, Money,
    NetworkRate, Percent,
};

/// Cost estimate request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    /// Member the estimate is for.
    pub member_id: MemberId,
    /// Persist the new balances instead of previewing.
    pub commit: bool,
    /// Claim lines, estimated in order.
    pub claim_lines: Vec<ClaimLineInput>,
}

/// One claim line with optional descriptors echoed back by the service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLineInput {
    /// Line data used by the engine.
    #[serde(flatten)]
    pub line: ClaimLine,
    /// Service descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Value>,
    /// Provider descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_info: Option<Value>,
}

impl ClaimLineInput {
    /// Wrap a claim line without descriptors.
    #[must_use]
    pub fn new(line: ClaimLine) -> Self {
        Self {
            line,
            service: None,
            provider_info: None,
        }
    }
}

/// Cost estimate response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    /// Identifier of this estimate.
    pub estimate_id: EstimateId,
    /// The member.
    pub member_id: MemberId,
    /// Whether the new balances were persisted.
    pub committed: bool,
    /// Accumulator record version the response reflects.
    pub version: u64,
    /// Per-line results, in request order.
    pub claim_lines: Vec<ClaimLineResult>,
}

/// Result for one claim line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLineResult {
    /// Identifier of the claim line.
    pub claim_line_id: String,
    /// Service descriptor, as sent.
    #[serde(default)]
    pub service: Option<Value>,
    /// Provider descriptor, as sent.
    #[serde(default)]
    pub provider_info: Option<Value>,
    /// The coverage that was applied.
    pub coverage: BenefitCoverage,
    /// The rate that was used.
    pub cost: NetworkRate,
    /// Member/insurer split.
    pub health_claim_line: HealthClaimLine,
    /// Accumulators as of the start of the line.
    #[serde(default)]
    pub accumulators: Vec<AccumulatorResult>,
}

/// Member/insurer split of one claim line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthClaimLine {
    /// Copay applied.
    #[serde(default)]
    pub amount_copay: Option<Money>,
    /// Coinsurance applied.
    #[serde(default)]
    pub coinsurance: Option<Percent>,
    /// What the member pays.
    #[serde(default)]
    pub amount_responsibility: Option<Money>,
    /// Member share as a percentage, for percentage rates.
    #[serde(default)]
    pub percent_responsibility: Option<Percent>,
    /// What the plan pays.
    #[serde(default)]
    pub amount_payable: Option<Money>,
}

/// One accumulator and what a calculation did to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorResult {
    /// Balance before the calculation.
    pub accumulator: AccumulatorState,
    /// Calculation outcome.
    pub accumulator_calculation: AccumulatorCalculation,
}

/// Calculation outcome for one accumulator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorCalculation {
    /// Headroom after the calculation.
    pub remaining_value: Money,
    /// Portion absorbed.
    pub applied_value: Money,
    /// Unit of `applied_value`.
    pub applied_value_type: AppliedValueType,
}

/// A member's balances.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorsResponse {
    /// The member.
    pub member_id: MemberId,
    /// Record version.
    pub version: u64,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
    /// How `calculatedValue` is interpreted (`consumed` or `remaining`).
    pub value_basis: String,
    /// Balances.
    pub accumulators: Vec<AccumulatorState>,
}

/// Replace balances request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReplaceAccumulatorsRequest<'a> {
    pub accumulators: &'a [AccumulatorState],
}

/// Ledger preview request.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct ApplyCostRequest {
    pub cost: Money,
}

/// Ledger preview response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCostResponse {
    /// The member.
    pub member_id: MemberId,
    /// Version the preview was computed against.
    pub version: u64,
    /// Cost left after the accumulators absorbed their part.
    pub remaining_cost: Money,
    /// Per-accumulator outcome.
    pub accumulators: Vec<AccumulatorResult>,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Active coverage selection policy.
    pub selection_policy: String,
    /// Accumulator value basis.
    pub value_basis: String,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
}
