//! Response assembly.
//!
//! Maps estimator output into the external response shape. All amounts are
//! rounded to cents here and nowhere earlier. Optional fields are omitted
//! when absent rather than reported as zero.

use serde::Serialize;
use serde_json::Value;

use cost_estimate_core::{
    AccumulatorDelta, AccumulatorState, AppliedValueType, BenefitCoverage, CostType, EstimateId,
    LineEstimate, MemberId, Money, NetworkRate, Percent,
};

/// Selected coverage as reported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageView {
    /// Whether the service is covered.
    pub is_service_covered: bool,
    /// Plan payment cap for the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_coverage_amount: Option<Money>,
    /// Fixed copay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_share_copay: Option<Money>,
    /// Coinsurance percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_share_coinsurance: Option<Percent>,
    /// Benefit the coverage belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit_code: Option<String>,
}

/// Rate as reported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostView {
    /// In-network rate value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_network_cost: Option<Money>,
    /// Out-of-network rate value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_of_network_cost: Option<Money>,
    /// Unit of the in-network value.
    pub in_network_cost_type: CostType,
}

/// Member/insurer split as reported.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthClaimLineView {
    /// Copay applied to the line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_copay: Option<Money>,
    /// Coinsurance applied to the line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coinsurance: Option<Percent>,
    /// What the member pays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_responsibility: Option<Money>,
    /// Member share as a percentage, for percentage rates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_responsibility: Option<Percent>,
    /// What the plan pays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_payable: Option<Money>,
}

/// Outcome of the calculation for one accumulator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorCalculationView {
    /// Headroom after the calculation.
    pub remaining_value: Money,
    /// Portion absorbed by the accumulator.
    pub applied_value: Money,
    /// Unit of `applied_value`.
    pub applied_value_type: AppliedValueType,
}

/// One accumulator before and during the calculation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorEntry {
    /// Balance before the calculation.
    pub accumulator: AccumulatorState,
    /// What the calculation did to it.
    pub accumulator_calculation: AccumulatorCalculationView,
}

/// One claim line of an estimate response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLineView {
    /// Identifier of the claim line.
    pub claim_line_id: String,
    /// Service descriptor, echoed from the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Value>,
    /// Provider descriptor, echoed from the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_info: Option<Value>,
    /// The coverage that was applied.
    pub coverage: CoverageView,
    /// The rate that was used.
    pub cost: CostView,
    /// Member/insurer split.
    pub health_claim_line: HealthClaimLineView,
    /// Accumulators as of the start of this line.
    pub accumulators: Vec<AccumulatorEntry>,
}

/// Response of `POST /v1/cost-estimates`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    /// Identifier of this estimate.
    pub estimate_id: EstimateId,
    /// The member the estimate is for.
    pub member_id: MemberId,
    /// Whether the new balances were persisted.
    pub committed: bool,
    /// Accumulator record version the response reflects.
    pub version: u64,
    /// Per-line results, in request order.
    pub claim_lines: Vec<ClaimLineView>,
}

/// Echoed request descriptors for one claim line.
#[derive(Debug, Clone, Default)]
pub struct LineContext {
    /// `service` from the request.
    pub service: Option<Value>,
    /// `providerInfo` from the request.
    pub provider_info: Option<Value>,
}

/// Builds responses from estimator output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Assemble one claim line.
    #[must_use]
    pub fn claim_line(&self, line: &LineEstimate, context: LineContext) -> ClaimLineView {
        let split = line.cost_share.rounded();

        ClaimLineView {
            claim_line_id: line.claim_line_id.clone(),
            service: context.service,
            provider_info: context.provider_info,
            coverage: coverage_view(&line.coverage),
            cost: cost_view(&line.rate),
            health_claim_line: HealthClaimLineView {
                amount_copay: split.copay,
                coinsurance: split.coinsurance,
                amount_responsibility: split.member_pays,
                percent_responsibility: split.percent_responsibility,
                amount_payable: split.insurer_pays,
            },
            accumulators: self.accumulators(&line.accumulators, &line.deltas),
        }
    }

    /// Pair each delta with the balance it was computed from.
    #[must_use]
    pub fn accumulators(
        &self,
        before: &[AccumulatorState],
        deltas: &[AccumulatorDelta],
    ) -> Vec<AccumulatorEntry> {
        deltas
            .iter()
            .filter_map(|delta| {
                let state = before
                    .iter()
                    .find(|s| s.code == delta.code && s.level == delta.level)?;
                let delta = delta.rounded();
                Some(AccumulatorEntry {
                    accumulator: rounded_state(state),
                    accumulator_calculation: AccumulatorCalculationView {
                        remaining_value: delta.remaining_value,
                        applied_value: delta.applied_value,
                        applied_value_type: delta.applied_value_type,
                    },
                })
            })
            .collect()
    }
}

fn coverage_view(coverage: &BenefitCoverage) -> CoverageView {
    CoverageView {
        is_service_covered: coverage.is_service_covered,
        max_coverage_amount: coverage.max_coverage_amount.map(Money::rounded),
        cost_share_copay: coverage.cost_share_copay.map(Money::rounded),
        cost_share_coinsurance: coverage.cost_share_coinsurance,
        benefit_code: coverage.benefit_code.clone(),
    }
}

fn cost_view(rate: &NetworkRate) -> CostView {
    CostView {
        in_network_cost: rate.in_network_cost.map(Money::rounded),
        out_of_network_cost: rate.out_of_network_cost.map(Money::rounded),
        in_network_cost_type: rate.in_network_cost_type,
    }
}

fn rounded_state(state: &AccumulatorState) -> AccumulatorState {
    AccumulatorState {
        limit_value: state.limit_value.rounded(),
        calculated_value: state.calculated_value.rounded(),
        ..state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cost_estimate_core::{
        AccumulatorCode, AccumulatorLevel, CostShareResult, ResolvedRate,
    };
    use rust_decimal_macros::dec;

    fn line() -> LineEstimate {
        let state = AccumulatorState::new(
            AccumulatorCode::Deductible,
            AccumulatorLevel::Individual,
            Money::from_units(500),
            Money::from_units(500),
        );
        LineEstimate {
            claim_line_id: "L1".into(),
            coverage: BenefitCoverage::coinsurance(Percent::try_new(dec!(20)).unwrap()),
            rate: NetworkRate::in_network_amount(Money::from_units(100)),
            resolved_rate: ResolvedRate {
                value: Money::from_units(100),
                cost_type: CostType::Amount,
            },
            cost_share: CostShareResult {
                coinsurance: Some(Percent::try_new(dec!(20)).unwrap()),
                member_pays: Some(Money::from_decimal(dec!(20.004))),
                insurer_pays: Some(Money::from_decimal(dec!(79.996))),
                ..CostShareResult::default()
            },
            accumulators: vec![state],
            deltas: vec![AccumulatorDelta {
                code: AccumulatorCode::Deductible,
                level: AccumulatorLevel::Individual,
                remaining_value: Money::ZERO,
                applied_value: Money::ZERO,
                applied_value_type: AppliedValueType::Amount,
            }],
        }
    }

    #[test]
    fn claim_line_shape() {
        let view = ResponseAssembler.claim_line(&line(), LineContext::default());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["healthClaimLine"]["amountResponsibility"], 20.0);
        assert_eq!(json["healthClaimLine"]["amountPayable"], 80.0);
        assert!(json["healthClaimLine"].get("amountCopay").is_none());
        assert!(json["healthClaimLine"].get("percentResponsibility").is_none());
        assert!(json.get("service").is_none());

        assert_eq!(json["coverage"]["costShareCoinsurance"], 20.0);
        assert!(json["coverage"].get("costShareCopay").is_none());
        assert_eq!(json["cost"]["inNetworkCostType"], "amount");

        let entry = &json["accumulators"][0];
        assert_eq!(entry["accumulator"]["code"], "Deductible");
        assert_eq!(entry["accumulator"]["level"], "Individual");
        assert_eq!(entry["accumulatorCalculation"]["appliedValue"], 0.0);
        assert_eq!(entry["accumulatorCalculation"]["appliedValueType"], "amount");
    }

    #[test]
    fn echoes_descriptors() {
        let context = LineContext {
            service: Some(serde_json::json!({"code": "99213"})),
            provider_info: Some(serde_json::json!({"npi": "1234567890"})),
        };
        let view = ResponseAssembler.claim_line(&line(), context);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["service"]["code"], "99213");
        assert_eq!(json["providerInfo"]["npi"], "1234567890");
    }
}
