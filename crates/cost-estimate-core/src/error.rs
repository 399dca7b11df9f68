//! Error types for the cost-sharing engine.

use crate::accumulator::{AccumulatorCode, AccumulatorLevel};
use crate::money::Money;
use crate::rate::NetworkStatus;

/// Result type for cost-sharing operations.
pub type Result<T> = std::result::Result<T, CostShareError>;

/// Errors raised while computing a cost share.
///
/// None of these are transient: they describe missing or inconsistent
/// upstream data, or a defect in the ledger arithmetic.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CostShareError {
    /// No coverage in the candidate list is eligible.
    #[error("no selectable coverage among {candidates} candidate(s)")]
    NoCoverageSelectable {
        /// Number of candidates that were considered.
        candidates: usize,
    },

    /// The rate has no value for the requested network status.
    #[error("no {network} rate available")]
    RateUnavailable {
        /// The network status that was requested.
        network: NetworkStatus,
    },

    /// A covered service carries neither a copay nor a coinsurance.
    #[error("covered service has neither costShareCopay nor costShareCoinsurance")]
    InvalidCoverageState,

    /// The claim line carries no coverage list.
    #[error("claim line has no coverage data")]
    MissingCoverage,

    /// The claim line carries no rate.
    #[error("claim line has no rate data")]
    MissingRate,

    /// A referenced accumulator has no backing record.
    #[error("accumulator not found: {code} / {level}")]
    AccumulatorNotFound {
        /// Accumulator code.
        code: AccumulatorCode,
        /// Accumulator level.
        level: AccumulatorLevel,
    },

    /// A remaining value fell outside `[0, limitValue]`.
    #[error(
        "ledger invariant violated for {code} / {level}: remaining={remaining}, limit={limit}"
    )]
    LedgerInvariantViolation {
        /// Accumulator code.
        code: AccumulatorCode,
        /// Accumulator level.
        level: AccumulatorLevel,
        /// The offending remaining value.
        remaining: Money,
        /// The accumulator limit.
        limit: Money,
    },

    /// An input amount or percentage is out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl CostShareError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoCoverageSelectable { .. } => "no_coverage_selectable",
            Self::RateUnavailable { .. } => "rate_unavailable",
            Self::InvalidCoverageState => "invalid_coverage_state",
            Self::MissingCoverage => "missing_coverage",
            Self::MissingRate => "missing_rate",
            Self::AccumulatorNotFound { .. } => "accumulator_not_found",
            Self::LedgerInvariantViolation { .. } => "ledger_invariant_violation",
            Self::InvalidAmount(_) => "invalid_amount",
        }
    }

    /// The request field the error points at.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NoCoverageSelectable { .. } | Self::MissingCoverage => "coverages",
            Self::RateUnavailable { .. } | Self::MissingRate => "rate",
            Self::InvalidCoverageState => "coverages.costShare",
            Self::AccumulatorNotFound { .. } => "coverages.relatedAccumulators",
            Self::LedgerInvariantViolation { .. } => "accumulators",
            Self::InvalidAmount(_) => "amount",
        }
    }

    /// Whether the error indicates a defect rather than bad input.
    #[must_use]
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::LedgerInvariantViolation { .. })
    }
}

/// A cost-share failure attributed to one claim line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("claim line {claim_line_id}: {source}")]
pub struct ClaimLineError {
    /// The offending claim line.
    pub claim_line_id: String,
    /// What went wrong.
    #[source]
    pub source: CostShareError,
}

impl ClaimLineError {
    /// Attribute an error to a claim line.
    #[must_use]
    pub fn new(claim_line_id: impl Into<String>, source: CostShareError) -> Self {
        Self {
            claim_line_id: claim_line_id.into(),
            source,
        }
    }
}
