//! Benefit coverage types.

use serde::{Deserialize, Serialize};

use crate::accumulator::AccumulatorKey;
use crate::error::{CostShareError, Result};
use crate::money::{Money, Percent};

/// One coverage candidate returned by the benefits source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitCoverage {
    /// Whether the service is covered at all.
    pub is_service_covered: bool,

    /// Maximum amount the plan pays for the service, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_coverage_amount: Option<Money>,

    /// Fixed copay owed by the member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_share_copay: Option<Money>,

    /// Coinsurance owed by the member after the deductible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_share_coinsurance: Option<Percent>,

    /// Benefit the coverage belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_code: Option<String>,

    /// Accumulators this coverage is tracked against.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_accumulators: Vec<AccumulatorKey>,
}

/// The member cost-share rule of a coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostShare {
    /// Fixed amount per service.
    Copay(Money),
    /// Percentage of post-deductible cost.
    Coinsurance(Percent),
}

impl BenefitCoverage {
    /// A covered copay benefit.
    #[must_use]
    pub fn copay(amount: Money) -> Self {
        Self {
            cost_share_copay: Some(amount),
            ..Self::covered()
        }
    }

    /// A covered coinsurance benefit.
    #[must_use]
    pub fn coinsurance(percent: Percent) -> Self {
        Self {
            cost_share_coinsurance: Some(percent),
            ..Self::covered()
        }
    }

    /// A covered benefit with no cost share set.
    #[must_use]
    pub fn covered() -> Self {
        Self {
            is_service_covered: true,
            max_coverage_amount: None,
            cost_share_copay: None,
            cost_share_coinsurance: None,
            benefit_code: None,
            related_accumulators: Vec::new(),
        }
    }

    /// A benefit that does not cover the service.
    #[must_use]
    pub fn not_covered() -> Self {
        Self {
            is_service_covered: false,
            ..Self::covered()
        }
    }

    /// Set the benefit code.
    #[must_use]
    pub fn with_benefit_code(mut self, code: impl Into<String>) -> Self {
        self.benefit_code = Some(code.into());
        self
    }

    /// Set the maximum coverage amount.
    #[must_use]
    pub fn with_max_coverage(mut self, amount: Money) -> Self {
        self.max_coverage_amount = Some(amount);
        self
    }

    /// Whether a fixed copay applies.
    #[must_use]
    pub fn has_copay(&self) -> bool {
        self.cost_share_copay.is_some()
    }

    /// The cost-share rule. A copay takes precedence over coinsurance.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::InvalidCoverageState` if neither is set.
    pub fn cost_share(&self) -> Result<CostShare> {
        match (self.cost_share_copay, self.cost_share_coinsurance) {
            (Some(copay), _) => Ok(CostShare::Copay(copay)),
            (None, Some(coinsurance)) => Ok(CostShare::Coinsurance(coinsurance)),
            (None, None) => Err(CostShareError::InvalidCoverageState),
        }
    }
}
