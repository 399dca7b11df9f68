//! Fixed-point money and percentage types.
//!
//! All amounts are `rust_decimal::Decimal`. Intermediate results keep full
//! precision; [`round_money`] is applied only when a value is reported.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::CostShareError;

/// Number of decimal places in the minor currency unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Round a decimal to the minor currency unit, half-up.
///
/// Midpoints round away from zero, which is half-up for the non-negative
/// amounts this crate deals in.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Wire form shared by [`Money`] and [`Percent`]: a JSON number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
struct WireDecimal(#[serde(with = "rust_decimal::serde::float")] Decimal);

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "WireDecimal", into = "WireDecimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal without validation.
    ///
    /// Used for intermediate arithmetic; inputs crossing the API boundary go
    /// through [`Money::try_new`].
    #[must_use]
    pub const fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// Create an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::InvalidAmount` if `value` is negative.
    pub fn try_new(value: Decimal) -> Result<Self, CostShareError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CostShareError::InvalidAmount(format!(
                "amount must not be negative: {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Whole units, handy for tests and counters.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is strictly below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Subtract, flooring at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// This amount rounded to the minor currency unit.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self(round_money(self.0))
    }
}

impl TryFrom<WireDecimal> for Money {
    type Error = CostShareError;

    fn try_from(value: WireDecimal) -> Result<Self, Self::Error> {
        Self::try_new(value.0)
    }
}

impl From<Money> for WireDecimal {
    fn from(value: Money) -> Self {
        Self(value.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A percentage expressed in points: `20` means 20 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireDecimal", into = "WireDecimal")]
pub struct Percent(Decimal);

impl Percent {
    /// Create a percentage in `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::InvalidAmount` if the value is out of range.
    pub fn try_new(points: Decimal) -> Result<Self, CostShareError> {
        if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
            return Err(CostShareError::InvalidAmount(format!(
                "percent must be within 0..=100: {points}"
            )));
        }
        Ok(Self(points))
    }

    /// The value in percentage points.
    #[must_use]
    pub const fn points(&self) -> Decimal {
        self.0
    }

    /// The value as a fraction of one.
    #[must_use]
    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// This percentage of `amount`, unrounded.
    #[must_use]
    pub fn of(&self, amount: Money) -> Money {
        amount * self.fraction()
    }
}

impl TryFrom<WireDecimal> for Percent {
    type Error = CostShareError;

    fn try_from(value: WireDecimal) -> Result<Self, Self::Error> {
        Self::try_new(value.0)
    }
}

impl From<Percent> for WireDecimal {
    fn from(value: Percent) -> Self {
        Self(value.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
