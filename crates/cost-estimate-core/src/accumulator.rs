//! Accumulator types.
//!
//! An accumulator is a plan-year running balance (deductible, plan limit,
//! out-of-pocket maximum) scoped to an individual or a family. Balances are
//! keyed by `(code, level)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Accumulator code.
///
/// Variant order is the ledger precedence: deductible first, then plan
/// limits, then the out-of-pocket maximum. Unknown codes sort last and are
/// never charged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccumulatorCode {
    /// Plan deductible.
    Deductible,
    /// Plan-specific benefit limit.
    Limit,
    /// Out-of-pocket maximum.
    OopMax,
    /// Any other code reported upstream.
    Other(String),
}

impl AccumulatorCode {
    /// Codes charged by the ledger, in precedence order.
    pub const PRECEDENCE: [Self; 3] = [Self::Deductible, Self::Limit, Self::OopMax];

    /// Canonical label used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deductible => "Deductible",
            Self::Limit => "Limit",
            Self::OopMax => "OOP Max",
            Self::Other(code) => code,
        }
    }
}

impl FromStr for AccumulatorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Ok(match normalized.as_str() {
            "deductible" => Self::Deductible,
            "limit" => Self::Limit,
            "oopmax" | "outofpocketmax" | "outofpocketmaximum" => Self::OopMax,
            _ => Self::Other(s.trim().to_string()),
        })
    }
}

impl TryFrom<String> for AccumulatorCode {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccumulatorCode> for String {
    fn from(code: AccumulatorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for AccumulatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulator scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccumulatorLevel {
    /// The member alone.
    Individual,
    /// The member's family.
    Family,
}

impl AccumulatorLevel {
    /// Canonical label used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Family => "Family",
        }
    }
}

/// Error returned when an accumulator level cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown accumulator level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for AccumulatorLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" | "ind" | "i" => Ok(Self::Individual),
            "family" | "fam" | "f" => Ok(Self::Family),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for AccumulatorLevel {
    type Error = UnknownLevel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccumulatorLevel> for String {
    fn from(level: AccumulatorLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for AccumulatorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map key for one accumulator row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccumulatorKey {
    /// Accumulator code.
    pub code: AccumulatorCode,
    /// Accumulator level.
    pub level: AccumulatorLevel,
}

impl AccumulatorKey {
    /// Create a key.
    #[must_use]
    pub const fn new(code: AccumulatorCode, level: AccumulatorLevel) -> Self {
        Self { code, level }
    }
}

impl fmt::Display for AccumulatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.code, self.level)
    }
}

/// How an applied value is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedValueType {
    /// A money amount.
    Amount,
    /// A count of services (visits, days).
    Counter,
}

/// What `calculatedValue` means in the upstream accumulator feed.
///
/// The two sample balances in circulation disagree, and no single basis
/// reads both of them as intended:
///
/// - `Consumed` reads a deductible of `limitValue = 500, calculatedValue = 500`
///   as fully met (headroom 0), so a 100 coinsurance line splits 20 / 80.
/// - `Remaining` reads an OOP max of `limitValue = 3000, calculatedValue = 3000`
///   as untouched, so a zero-cost line reports `remainingValue = 3000`.
///   Under `Consumed` the same row is exhausted and reports 0.
///
/// Pick the basis that matches the feed being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueBasis {
    /// `calculatedValue` is the balance already consumed. Matches the met
    /// deductible sample (500 of 500).
    #[default]
    Consumed,
    /// `calculatedValue` is the balance still remaining. Matches the OOP max
    /// sample whose zero-cost line leaves `remainingValue = 3000`.
    Remaining,
}

impl ValueBasis {
    /// Headroom (remaining value) of an accumulator under this basis.
    ///
    /// May be out of range for inconsistent upstream data; the ledger checks.
    #[must_use]
    pub fn headroom(self, limit: Money, calculated: Money) -> Money {
        match self {
            Self::Consumed => limit - calculated,
            Self::Remaining => calculated,
        }
    }

    /// The `calculatedValue` to persist after `applied` has been consumed.
    #[must_use]
    pub fn advance(self, calculated: Money, applied: Money) -> Money {
        match self {
            Self::Consumed => calculated + applied,
            Self::Remaining => calculated - applied,
        }
    }

    /// Name used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Consumed => "consumed",
            Self::Remaining => "remaining",
        }
    }
}

impl FromStr for ValueBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consumed" => Ok(Self::Consumed),
            "remaining" => Ok(Self::Remaining),
            other => Err(format!("unknown accumulator value basis: {other}")),
        }
    }
}

/// One accumulator balance as read from the accumulator store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorState {
    /// Accumulator code.
    pub code: AccumulatorCode,
    /// Individual or family.
    pub level: AccumulatorLevel,
    /// Plan-year limit.
    pub limit_value: Money,
    /// Limit unit, `"amount"` or `"counter"`; usually set only for plan limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_type: Option<String>,
    /// Balance at read time, interpreted per [`ValueBasis`].
    pub calculated_value: Money,
}

impl AccumulatorState {
    /// Create an amount-typed accumulator.
    #[must_use]
    pub fn new(
        code: AccumulatorCode,
        level: AccumulatorLevel,
        limit_value: Money,
        calculated_value: Money,
    ) -> Self {
        Self {
            code,
            level,
            limit_value,
            limit_type: None,
            calculated_value,
        }
    }

    /// Set the limit type.
    #[must_use]
    pub fn with_limit_type(mut self, limit_type: impl Into<String>) -> Self {
        self.limit_type = Some(limit_type.into());
        self
    }

    /// The map key of this accumulator.
    #[must_use]
    pub fn key(&self) -> AccumulatorKey {
        AccumulatorKey::new(self.code.clone(), self.level)
    }

    /// Unit of applied values for this accumulator.
    #[must_use]
    pub fn applied_value_type(&self) -> AppliedValueType {
        match &self.limit_type {
            Some(t) if t.trim().eq_ignore_ascii_case("counter") => AppliedValueType::Counter,
            _ => AppliedValueType::Amount,
        }
    }
}

/// Outcome of one calculation for one accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorDelta {
    /// Accumulator code.
    pub code: AccumulatorCode,
    /// Accumulator level.
    pub level: AccumulatorLevel,
    /// Headroom after the calculation.
    pub remaining_value: Money,
    /// Portion of this calculation absorbed by the accumulator.
    pub applied_value: Money,
    /// Unit of `applied_value`.
    pub applied_value_type: AppliedValueType,
}

impl AccumulatorDelta {
    /// The map key of this delta.
    #[must_use]
    pub fn key(&self) -> AccumulatorKey {
        AccumulatorKey::new(self.code.clone(), self.level)
    }

    /// Copy with values rounded to the minor currency unit.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            remaining_value: self.remaining_value.rounded(),
            applied_value: self.applied_value.rounded(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_parsing_is_lenient() {
        assert_eq!("OOP Max".parse::<AccumulatorCode>(), Ok(AccumulatorCode::OopMax));
        assert_eq!("oop_max".parse::<AccumulatorCode>(), Ok(AccumulatorCode::OopMax));
        assert_eq!("DEDUCTIBLE".parse::<AccumulatorCode>(), Ok(AccumulatorCode::Deductible));
        assert_eq!(
            "Lifetime Max".parse::<AccumulatorCode>(),
            Ok(AccumulatorCode::Other("Lifetime Max".into()))
        );
    }

    #[test]
    fn code_precedence_order() {
        assert!(AccumulatorCode::Deductible < AccumulatorCode::Limit);
        assert!(AccumulatorCode::Limit < AccumulatorCode::OopMax);
        assert!(AccumulatorCode::OopMax < AccumulatorCode::Other("x".into()));
    }

    #[test]
    fn level_parsing() {
        assert_eq!("Family".parse::<AccumulatorLevel>(), Ok(AccumulatorLevel::Family));
        assert_eq!(" individual ".parse::<AccumulatorLevel>(), Ok(AccumulatorLevel::Individual));
        assert!("household".parse::<AccumulatorLevel>().is_err());
    }

    #[test]
    fn state_deserializes_source_sample() {
        let json = r#"{"code":"OOP Max","level":"Individual","limitValue":3000.0,"calculatedValue":3000.0}"#;
        let state: AccumulatorState = serde_json::from_str(json).unwrap();

        assert_eq!(state.code, AccumulatorCode::OopMax);
        assert_eq!(state.level, AccumulatorLevel::Individual);
        assert_eq!(state.limit_value, Money::from_units(3000));
        assert!(state.limit_type.is_none());
        assert_eq!(state.applied_value_type(), AppliedValueType::Amount);
    }

    #[test]
    fn counter_limit_type() {
        let state = AccumulatorState::new(
            AccumulatorCode::Limit,
            AccumulatorLevel::Individual,
            Money::from_units(20),
            Money::from_units(3),
        )
        .with_limit_type("Counter");
        assert_eq!(state.applied_value_type(), AppliedValueType::Counter);
    }

    #[test]
    fn basis_headroom_and_advance() {
        let limit = Money::from_units(500);
        let calc = Money::from_units(200);

        assert_eq!(ValueBasis::Consumed.headroom(limit, calc), Money::from_units(300));
        assert_eq!(ValueBasis::Remaining.headroom(limit, calc), Money::from_units(200));
        assert_eq!(ValueBasis::Consumed.advance(calc, Money::from_units(50)), Money::from_units(250));
        assert_eq!(ValueBasis::Remaining.advance(calc, Money::from_units(50)), Money::from_units(150));
    }

    #[test]
    fn sample_balances_read_per_basis() {
        let met_deductible = (Money::from_units(500), Money::from_units(500));
        let oop_sample = (Money::from_units(3000), Money::from_units(3000));

        assert_eq!(ValueBasis::Consumed.headroom(met_deductible.0, met_deductible.1), Money::ZERO);
        assert_eq!(ValueBasis::Consumed.headroom(oop_sample.0, oop_sample.1), Money::ZERO);
        assert_eq!(ValueBasis::Remaining.headroom(oop_sample.0, oop_sample.1), Money::from_units(3000));
        assert_eq!(ValueBasis::default(), ValueBasis::Consumed);
    }
}
