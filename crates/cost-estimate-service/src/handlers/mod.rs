//! API handlers.

pub mod accumulators;
pub mod estimates;
pub mod health;

use cost_estimate_core::MemberId;
use cost_estimate_store::AccumulatorSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a member ID from a request.
pub(crate) fn parse_member_id(raw: &str) -> Result<MemberId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid member ID: {e}")))
}

/// Load a member's accumulators, or 404.
pub(crate) fn load_snapshot(
    state: &AppState,
    member_id: &MemberId,
) -> Result<AccumulatorSnapshot, ApiError> {
    state
        .store
        .load(member_id)?
        .ok_or_else(|| ApiError::NotFound(format!("No accumulators for member {member_id}")))
}
