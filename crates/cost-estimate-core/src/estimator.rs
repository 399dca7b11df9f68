//! Multi-line cost estimates.
//!
//! The estimator runs select → resolve → compute for each claim line of a
//! request against one working copy of the member's ledger, so later lines
//! see what earlier lines consumed. If any line fails the whole estimate
//! fails and the caller's ledger is left as it was.

use serde::{Deserialize, Serialize};

use crate::accumulator::{AccumulatorDelta, AccumulatorState, ValueBasis};
use crate::calculator::{CostCalculator, CostShareResult};
use crate::coverage::BenefitCoverage;
use crate::error::{ClaimLineError, CostShareError};
use crate::ledger::AccumulatorLedger;
use crate::rate::{NetworkRate, NetworkStatus, RateResolver, ResolvedRate};
use crate::selector::{CoverageSelector, PolicyKind, SelectionContext};

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Coverage selection policy.
    pub selection_policy: PolicyKind,
    /// Interpretation of `calculatedValue`.
    pub value_basis: ValueBasis,
}

/// One claim line as submitted for estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLine {
    /// Caller-assigned identifier, echoed in results and errors.
    pub claim_line_id: String,
    /// Network status of the rendering provider.
    pub network_status: NetworkStatus,
    /// Coverage candidates; absent when the benefits lookup returned nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverages: Option<Vec<BenefitCoverage>>,
    /// Provider rate; absent when the rate lookup returned nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<NetworkRate>,
}

/// Result for one claim line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineEstimate {
    /// Identifier of the claim line.
    pub claim_line_id: String,
    /// The coverage that was applied.
    pub coverage: BenefitCoverage,
    /// The rate as submitted.
    pub rate: NetworkRate,
    /// The rate value for the line's network status.
    pub resolved_rate: ResolvedRate,
    /// Unrounded cost split.
    pub cost_share: CostShareResult,
    /// Accumulator balances before this line.
    pub accumulators: Vec<AccumulatorState>,
    /// What this line did to each accumulator.
    pub deltas: Vec<AccumulatorDelta>,
}

/// Result of a whole request.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    /// Per-line results, in request order.
    pub lines: Vec<LineEstimate>,
    /// Net change across all lines, for committing.
    pub deltas: Vec<AccumulatorDelta>,
    /// The ledger after all lines.
    pub ledger: AccumulatorLedger,
}

impl Estimate {
    /// Accumulator balances to persist.
    #[must_use]
    pub fn next_states(&self) -> Vec<AccumulatorState> {
        self.ledger.states().cloned().collect()
    }
}

/// Runs cost-share calculations for claim lines.
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    selector: CoverageSelector,
    resolver: RateResolver,
    calculator: CostCalculator,
}

impl CostEstimator {
    /// Create an estimator with the given selector.
    #[must_use]
    pub fn new(selector: CoverageSelector) -> Self {
        Self {
            selector,
            resolver: RateResolver,
            calculator: CostCalculator,
        }
    }

    /// Create an estimator from settings.
    #[must_use]
    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self::new(CoverageSelector::new(config.selection_policy.build()))
    }

    /// Name of the active coverage selection policy.
    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.selector.policy_name()
    }

    /// Estimate one claim line, charging `ledger`.
    ///
    /// `ledger` is only updated if the line succeeds.
    ///
    /// # Errors
    ///
    /// Returns the line's [`CostShareError`] wrapped with its id.
    pub fn estimate_line(
        &self,
        line: &ClaimLine,
        ledger: &mut AccumulatorLedger,
    ) -> Result<LineEstimate, ClaimLineError> {
        self.try_line(line, ledger)
            .map_err(|source| ClaimLineError::new(&line.claim_line_id, source))
    }

    fn try_line(
        &self,
        line: &ClaimLine,
        ledger: &mut AccumulatorLedger,
    ) -> Result<LineEstimate, CostShareError> {
        let coverages = line
            .coverages
            .as_deref()
            .ok_or(CostShareError::MissingCoverage)?;
        let rate = line.rate.as_ref().ok_or(CostShareError::MissingRate);
        let resolved = rate
            .clone()
            .and_then(|rate| self.resolver.resolve(rate, line.network_status));

        // coverage is selected before rate errors surface, so a line with
        // nothing covered reports that rather than a missing rate
        let context = SelectionContext::new(line.network_status, resolved.as_ref().ok().copied());
        let coverage = self.selector.select(coverages, &context)?;
        let rate = rate?;
        let resolved_rate = resolved?;

        let mut working = ledger.clone();
        let cost_share = self.calculator.compute(coverage, &resolved_rate, &mut working)?;
        let deltas = working.deltas_since(ledger)?;
        let accumulators = ledger.states().cloned().collect();
        *ledger = working;

        Ok(LineEstimate {
            claim_line_id: line.claim_line_id.clone(),
            coverage: coverage.clone(),
            rate: rate.clone(),
            resolved_rate,
            cost_share,
            accumulators,
            deltas,
        })
    }

    /// Estimate every claim line in order against `ledger`.
    ///
    /// # Errors
    ///
    /// Fails on the first claim line that fails.
    pub fn estimate(
        &self,
        lines: &[ClaimLine],
        ledger: &AccumulatorLedger,
    ) -> Result<Estimate, ClaimLineError> {
        let mut working = ledger.clone();
        let lines = lines
            .iter()
            .map(|line| self.estimate_line(line, &mut working))
            .collect::<Result<Vec<_>, _>>()?;

        let deltas = working
            .deltas_since(ledger)
            .map_err(|source| ClaimLineError::new("*", source))?;

        Ok(Estimate {
            lines,
            deltas,
            ledger: working,
        })
    }
}
