//! Member/insurer cost split for one claim line.

use serde::{Deserialize, Serialize};

use crate::accumulator::AccumulatorCode;
use crate::coverage::{BenefitCoverage, CostShare};
use crate::error::Result;
use crate::ledger::AccumulatorLedger;
use crate::money::{Money, Percent};
use crate::rate::ResolvedRate;

/// Cost-share outcome of one claim line.
///
/// Amounts are unrounded; call [`CostShareResult::rounded`] before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostShareResult {
    /// Copay of the selected coverage, when a copay applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copay: Option<Money>,

    /// Coinsurance of the selected coverage, when coinsurance applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinsurance: Option<Percent>,

    /// What the member pays. Unset for percentage rates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_pays: Option<Money>,

    /// What the plan pays. Unset for percentage rates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurer_pays: Option<Money>,

    /// Member responsibility as a percentage. Set only for percentage rates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_responsibility: Option<Percent>,
}

impl CostShareResult {
    /// Copy with amounts rounded to the minor unit.
    ///
    /// The member share is rounded and the insurer gets the rest of the
    /// rounded total, so the two still add up to the rounded cost.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let (member_pays, insurer_pays) = match (self.member_pays, self.insurer_pays) {
            (Some(member), Some(insurer)) => {
                let member_rounded = member.rounded();
                let total_rounded = (member + insurer).rounded();
                (
                    Some(member_rounded),
                    Some(total_rounded.saturating_sub(member_rounded)),
                )
            }
            (member, insurer) => (member.map(Money::rounded), insurer.map(Money::rounded)),
        };

        Self {
            member_pays,
            insurer_pays,
            copay: self.copay.map(Money::rounded),
            ..*self
        }
    }
}

/// Splits a claim line's cost between member and insurer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostCalculator;

impl CostCalculator {
    /// Compute the cost share of `coverage` at `rate`, charging `ledger`.
    ///
    /// Percentage rates carry no absolute cost and leave the ledger alone.
    ///
    /// # Errors
    ///
    /// - `CostShareError::AccumulatorNotFound` if the coverage references an
    ///   accumulator the member does not have.
    /// - `CostShareError::InvalidCoverageState` if the coverage has neither a
    ///   copay nor a coinsurance.
    /// - `CostShareError::InvalidAmount` if a percentage rate exceeds 100.
    /// - `CostShareError::LedgerInvariantViolation` from the ledger.
    pub fn compute(
        &self,
        coverage: &BenefitCoverage,
        rate: &ResolvedRate,
        ledger: &mut AccumulatorLedger,
    ) -> Result<CostShareResult> {
        ledger.require(&coverage.related_accumulators)?;
        let rule = coverage.cost_share()?;

        match rate.amount() {
            Some(cost) => split_amount(cost, coverage, rule, ledger),
            None => percent_responsibility(rate, rule),
        }
    }
}

fn reported_rule(rule: CostShare) -> CostShareResult {
    match rule {
        CostShare::Copay(copay) => CostShareResult {
            copay: Some(copay),
            ..CostShareResult::default()
        },
        CostShare::Coinsurance(pct) => CostShareResult {
            coinsurance: Some(pct),
            ..CostShareResult::default()
        },
    }
}

/// Percentage rates: the rate value is the member's share and nothing is
/// charged to the accumulators.
fn percent_responsibility(rate: &ResolvedRate, rule: CostShare) -> Result<CostShareResult> {
    let percent = Percent::try_new(rate.value.amount())?;
    Ok(CostShareResult {
        percent_responsibility: Some(percent),
        ..reported_rule(rule)
    })
}

/// Amount rates.
///
/// The member share (deductible portion plus copay or coinsurance) is
/// settled first and capped by the OOP max; the deductible is credited with
/// no more than that capped share. The plan pays the rest up to its `Limit`
/// and `maxCoverageAmount`; anything past either is owed by the member.
fn split_amount(
    cost: Money,
    coverage: &BenefitCoverage,
    rule: CostShare,
    ledger: &mut AccumulatorLedger,
) -> Result<CostShareResult> {
    let (deductible, share) = match rule {
        CostShare::Copay(copay) => {
            let owed = copay.min(cost);
            // copays count toward the deductible without changing what is owed
            let deductible = ledger
                .absorbable(&AccumulatorCode::Deductible, owed)?
                .unwrap_or(Money::ZERO);
            (deductible, owed)
        }
        CostShare::Coinsurance(pct) => {
            let deductible = ledger
                .absorbable(&AccumulatorCode::Deductible, cost)?
                .unwrap_or(Money::ZERO);
            (deductible, deductible + pct.of(cost - deductible))
        }
    };

    let share = ledger
        .absorbable(&AccumulatorCode::OopMax, share)?
        .unwrap_or(share);
    ledger.absorb(&AccumulatorCode::Deductible, deductible.min(share))?;
    ledger.absorb(&AccumulatorCode::OopMax, share)?;

    let plan_portion = cost - share;
    let covered = ledger
        .absorb(&AccumulatorCode::Limit, plan_portion)?
        .unwrap_or(plan_portion);

    let mut member = share + (plan_portion - covered);
    let mut insurer = covered;
    if let Some(max) = coverage.max_coverage_amount {
        if insurer > max {
            member += insurer - max;
            insurer = max;
        }
    }

    Ok(CostShareResult {
        member_pays: Some(member),
        insurer_pays: Some(insurer),
        ..reported_rule(rule)
    })
}
