//! Coverage selection.
//!
//! The benefits source may return several coverages for one service. Which
//! one applies is a business rule, so it lives behind the
//! [`SelectionPolicy`] trait and is chosen by name in configuration:
//!
//! 1. **`first_eligible`**: first covered entry in input order.
//! 2. **`prefer_copay`** (default): first covered copay-bearing entry, else the
//!    first covered entry.
//! 3. **`lowest_member_cost`**: covered entry with the lowest estimated member
//!    share for the resolved amount; ties and entries that cannot be priced
//!    fall back to input order.
//!
//! Ineligible entries (`isServiceCovered == false`) never reach a policy.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coverage::BenefitCoverage;
use crate::error::{CostShareError, Result};
use crate::money::Money;
use crate::rate::{NetworkStatus, ResolvedRate};

/// What a policy may look at besides the coverages themselves.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext {
    /// Network status of the claim line.
    pub network: NetworkStatus,
    /// The rate resolved for that network status, if any.
    pub rate: Option<ResolvedRate>,
}

impl SelectionContext {
    /// Create a context.
    #[must_use]
    pub const fn new(network: NetworkStatus, rate: Option<ResolvedRate>) -> Self {
        Self { network, rate }
    }
}

/// A rule for choosing one coverage among eligible candidates.
pub trait SelectionPolicy: fmt::Debug + Send + Sync {
    /// Name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Index into `eligible` of the chosen coverage.
    ///
    /// `eligible` is never empty. Implementations must be deterministic.
    fn choose(&self, eligible: &[&BenefitCoverage], context: &SelectionContext) -> usize;
}

/// First eligible entry wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstEligible;

impl SelectionPolicy for FirstEligible {
    fn name(&self) -> &'static str {
        PolicyKind::FirstEligible.as_str()
    }

    fn choose(&self, _eligible: &[&BenefitCoverage], _context: &SelectionContext) -> usize {
        0
    }
}

/// Copay-bearing entries win over coinsurance-only ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferCopay;

impl SelectionPolicy for PreferCopay {
    fn name(&self) -> &'static str {
        PolicyKind::PreferCopay.as_str()
    }

    fn choose(&self, eligible: &[&BenefitCoverage], _context: &SelectionContext) -> usize {
        eligible.iter().position(|c| c.has_copay()).unwrap_or(0)
    }
}

/// The entry with the lowest estimated member share wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestMemberCost;

impl LowestMemberCost {
    /// Rough member share ignoring accumulators; `None` if it cannot be priced.
    fn estimate(coverage: &BenefitCoverage, cost: Option<Money>) -> Option<Money> {
        if let Some(copay) = coverage.cost_share_copay {
            return Some(cost.map_or(copay, |c| copay.min(c)));
        }
        let coinsurance = coverage.cost_share_coinsurance?;
        cost.map(|c| coinsurance.of(c))
    }
}

impl SelectionPolicy for LowestMemberCost {
    fn name(&self) -> &'static str {
        PolicyKind::LowestMemberCost.as_str()
    }

    fn choose(&self, eligible: &[&BenefitCoverage], context: &SelectionContext) -> usize {
        let cost = context.rate.and_then(|r| r.amount());

        let mut best: Option<(usize, Money)> = None;
        for (index, coverage) in eligible.iter().enumerate() {
            let Some(estimate) = Self::estimate(coverage, cost) else {
                continue;
            };
            if best.map_or(true, |(_, lowest)| estimate < lowest) {
                best = Some((index, estimate));
            }
        }

        best.map_or(0, |(index, _)| index)
    }
}

/// Built-in policies, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// See [`FirstEligible`].
    FirstEligible,
    /// See [`PreferCopay`].
    #[default]
    PreferCopay,
    /// See [`LowestMemberCost`].
    LowestMemberCost,
}

impl PolicyKind {
    /// Name used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FirstEligible => "first_eligible",
            Self::PreferCopay => "prefer_copay",
            Self::LowestMemberCost => "lowest_member_cost",
        }
    }

    /// Instantiate the policy.
    #[must_use]
    pub fn build(self) -> Arc<dyn SelectionPolicy> {
        match self {
            Self::FirstEligible => Arc::new(FirstEligible),
            Self::PreferCopay => Arc::new(PreferCopay),
            Self::LowestMemberCost => Arc::new(LowestMemberCost),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_eligible" => Ok(Self::FirstEligible),
            "prefer_copay" => Ok(Self::PreferCopay),
            "lowest_member_cost" => Ok(Self::LowestMemberCost),
            other => Err(format!("unknown coverage selection policy: {other}")),
        }
    }
}

/// Applies a [`SelectionPolicy`] to the eligible coverages of a claim line.
#[derive(Debug, Clone)]
pub struct CoverageSelector {
    policy: Arc<dyn SelectionPolicy>,
}

impl CoverageSelector {
    /// Create a selector around a policy.
    #[must_use]
    pub fn new(policy: Arc<dyn SelectionPolicy>) -> Self {
        Self { policy }
    }

    /// Name of the active policy.
    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Pick the coverage that applies.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::NoCoverageSelectable` if `coverages` is empty
    /// or none of them covers the service.
    pub fn select<'a>(
        &self,
        coverages: &'a [BenefitCoverage],
        context: &SelectionContext,
    ) -> Result<&'a BenefitCoverage> {
        let eligible: Vec<&BenefitCoverage> =
            coverages.iter().filter(|c| c.is_service_covered).collect();

        if eligible.is_empty() {
            return Err(CostShareError::NoCoverageSelectable {
                candidates: coverages.len(),
            });
        }

        let index = self.policy.choose(&eligible, context);
        eligible
            .get(index)
            .copied()
            .ok_or(CostShareError::NoCoverageSelectable {
                candidates: coverages.len(),
            })
    }
}

impl Default for CoverageSelector {
    fn default() -> Self {
        Self::new(PolicyKind::default().build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Percent;
    use crate::rate::CostType;
    use rust_decimal_macros::dec;

    fn in_network(cost: Option<i64>) -> SelectionContext {
        SelectionContext::new(
            NetworkStatus::In,
            cost.map(|c| ResolvedRate {
                value: Money::from_units(c),
                cost_type: CostType::Amount,
            }),
        )
    }

    fn coinsurance(points: i64) -> BenefitCoverage {
        BenefitCoverage::coinsurance(Percent::try_new(points.into()).unwrap())
    }

    #[test]
    fn empty_list_is_not_selectable() {
        let selector = CoverageSelector::default();
        let err = selector.select(&[], &in_network(None)).unwrap_err();
        assert_eq!(err, CostShareError::NoCoverageSelectable { candidates: 0 });
    }

    #[test]
    fn all_uncovered_is_not_selectable() {
        let selector = CoverageSelector::default();
        let coverages = vec![BenefitCoverage::not_covered(), BenefitCoverage::not_covered()];
        let err = selector.select(&coverages, &in_network(None)).unwrap_err();
        assert_eq!(err, CostShareError::NoCoverageSelectable { candidates: 2 });
    }

    #[test]
    fn first_eligible_skips_uncovered() {
        let selector = CoverageSelector::new(PolicyKind::FirstEligible.build());
        let coverages = vec![
            BenefitCoverage::not_covered().with_benefit_code("A"),
            coinsurance(20).with_benefit_code("B"),
            BenefitCoverage::copay(Money::from_units(30)).with_benefit_code("C"),
        ];

        let chosen = selector.select(&coverages, &in_network(None)).unwrap();
        assert_eq!(chosen.benefit_code.as_deref(), Some("B"));
    }

    #[test]
    fn prefer_copay_picks_copay_entry() {
        let selector = CoverageSelector::default();
        assert_eq!(selector.policy_name(), "prefer_copay");

        let coverages = vec![
            coinsurance(20).with_benefit_code("B"),
            BenefitCoverage::copay(Money::from_units(30)).with_benefit_code("C"),
        ];

        let chosen = selector.select(&coverages, &in_network(None)).unwrap();
        assert_eq!(chosen.benefit_code.as_deref(), Some("C"));
    }

    #[test]
    fn prefer_copay_falls_back_to_first() {
        let selector = CoverageSelector::default();
        let coverages = vec![
            coinsurance(30).with_benefit_code("X"),
            coinsurance(10).with_benefit_code("Y"),
        ];

        let chosen = selector.select(&coverages, &in_network(None)).unwrap();
        assert_eq!(chosen.benefit_code.as_deref(), Some("X"));
    }

    #[test]
    fn lowest_member_cost_compares_estimates() {
        let selector = CoverageSelector::new(PolicyKind::LowestMemberCost.build());
        let coverages = vec![
            BenefitCoverage::copay(Money::from_units(40)).with_benefit_code("copay"),
            coinsurance(20).with_benefit_code("coins"),
        ];

        // 20% of 100 = 20 < 40
        let chosen = selector.select(&coverages, &in_network(Some(100))).unwrap();
        assert_eq!(chosen.benefit_code.as_deref(), Some("coins"));

        // 20% of 500 = 100 > 40
        let chosen = selector.select(&coverages, &in_network(Some(500))).unwrap();
        assert_eq!(chosen.benefit_code.as_deref(), Some("copay"));
    }

    #[test]
    fn lowest_member_cost_without_amount_prices_copay_only() {
        let selector = CoverageSelector::new(PolicyKind::LowestMemberCost.build());
        let coverages = vec![
            coinsurance(5).with_benefit_code("coins"),
            BenefitCoverage::copay(Money::from_units(40)).with_benefit_code("copay"),
        ];

        let chosen = selector.select(&coverages, &in_network(None)).unwrap();
        assert_eq!(chosen.benefit_code.as_deref(), Some("copay"));
    }

    #[test]
    fn lowest_member_cost_ties_keep_input_order() {
        let selector = CoverageSelector::new(PolicyKind::LowestMemberCost.build());
        let coverages = vec![
            coinsurance(20).with_benefit_code("first"),
            BenefitCoverage::copay(Money::from_decimal(dec!(20))).with_benefit_code("second"),
        ];

        let chosen = selector.select(&coverages, &in_network(Some(100))).unwrap();
        assert_eq!(chosen.benefit_code.as_deref(), Some("first"));
    }

    #[test]
    fn policy_kind_parsing() {
        assert_eq!("prefer-copay".parse::<PolicyKind>(), Ok(PolicyKind::PreferCopay));
        assert_eq!(
            "LOWEST_MEMBER_COST".parse::<PolicyKind>(),
            Ok(PolicyKind::LowestMemberCost)
        );
        assert!("random".parse::<PolicyKind>().is_err());
    }
}
