//! Cost-sharing calculation engine.
//!
//! Given benefit coverages, provider rates and a member's accumulator
//! balances, this crate computes what the member and the insurer pay for a
//! claim line and how the balances move:
//!
//! - **Selection**: `CoverageSelector`, `SelectionPolicy`, `PolicyKind`
//! - **Rates**: `NetworkRate`, `RateResolver`, `ResolvedRate`
//! - **Accumulators**: `AccumulatorState`, `AccumulatorDelta`, `AccumulatorLedger`
//! - **Calculation**: `CostCalculator`, `CostShareResult`
//! - **Estimates**: `CostEstimator`, `ClaimLine`, `Estimate`
//!
//! # Money
//!
//! Amounts are `rust_decimal::Decimal`, never binary floats. Intermediate
//! values keep full precision and are rounded half-up to cents only when
//! reported (see [`round_money`]).
//!
//! # Accumulator basis
//!
//! Upstream feeds disagree on whether `calculatedValue` is consumed or
//! remaining balance. [`ValueBasis::Consumed`] (the default) treats a
//! `500 / 500` deductible as met; [`ValueBasis::Remaining`] treats a
//! `3000 / 3000` OOP max as untouched, which is what a zero-cost line
//! reporting `remainingValue = 3000` expects.
//!
//! Nothing here performs I/O; persistence lives in `cost-estimate-store`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod accumulator;
pub mod calculator;
pub mod coverage;
pub mod error;
pub mod estimator;
pub mod ids;
pub mod ledger;
pub mod money;
pub mod rate;
pub mod selector;

pub use accumulator::{
    AccumulatorCode, AccumulatorDelta, AccumulatorKey, AccumulatorLevel, AccumulatorState,
    AppliedValueType, UnknownLevel, ValueBasis,
};
pub use calculator::{CostCalculator, CostShareResult};
pub use coverage::{BenefitCoverage, CostShare};
pub use error::{ClaimLineError, CostShareError, Result};
pub use estimator::{ClaimLine, CostEstimator, Estimate, EstimatorConfig, LineEstimate};
pub use ids::{EstimateId, IdError, MemberId, MAX_MEMBER_ID_LEN};
pub use ledger::{AccumulatorLedger, LedgerApplication};
pub use money::{round_money, Money, Percent, MINOR_UNIT_SCALE};
pub use rate::{CostType, NetworkRate, NetworkStatus, RateResolver, ResolvedRate};
pub use selector::{
    CoverageSelector, FirstEligible, LowestMemberCost, PolicyKind, PreferCopay, SelectionContext,
    SelectionPolicy,
};
