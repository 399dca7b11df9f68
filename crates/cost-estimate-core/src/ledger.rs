//! Accumulator ledger.
//!
//! The ledger holds a member's accumulator balances keyed by `(code, level)`
//! and charges amounts against them. Levels of the same code are charged
//! together: the tighter headroom caps both, so a family cap is never
//! exceeded while the individual cap has room, and vice versa.
//!
//! # Precedence
//!
//! Codes are charged in the order deductible, plan limit, out-of-pocket
//! maximum. A deductible payment is also credited toward the OOP max.
//!
//! # Counters
//!
//! Accumulators with `limitType == "counter"` count services rather than
//! money. A non-zero charge consumes one unit; once a counter is exhausted the
//! code absorbs nothing further.
//!
//! The ledger never persists anything. Callers take the deltas (or the
//! post-charge ledger) and commit them through the accumulator store.

use std::collections::BTreeMap;

use crate::accumulator::{
    AccumulatorCode, AccumulatorDelta, AccumulatorKey, AccumulatorState, AppliedValueType,
    ValueBasis,
};
use crate::error::{CostShareError, Result};
use crate::money::Money;

/// A member's accumulator balances, keyed by `(code, level)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorLedger {
    basis: ValueBasis,
    entries: BTreeMap<AccumulatorKey, AccumulatorState>,
}

/// Result of charging a cost through the ledger waterfall.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerApplication {
    /// Cost no accumulator absorbed; flows on to the member/insurer split.
    pub remaining_cost: Money,
    /// One delta per accumulator, in precedence order.
    pub deltas: Vec<AccumulatorDelta>,
    /// The ledger after the charge.
    pub ledger: AccumulatorLedger,
}

impl AccumulatorLedger {
    /// Build a ledger from accumulator rows.
    ///
    /// A repeated `(code, level)` replaces the earlier row.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::LedgerInvariantViolation` if any row's
    /// headroom is outside `[0, limitValue]`.
    pub fn new(
        states: impl IntoIterator<Item = AccumulatorState>,
        basis: ValueBasis,
    ) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for state in states {
            checked_headroom(basis, &state)?;
            entries.insert(state.key(), state);
        }
        Ok(Self { basis, entries })
    }

    /// An empty ledger.
    #[must_use]
    pub fn empty(basis: ValueBasis) -> Self {
        Self {
            basis,
            entries: BTreeMap::new(),
        }
    }

    /// How `calculatedValue` is interpreted.
    #[must_use]
    pub const fn basis(&self) -> ValueBasis {
        self.basis
    }

    /// Number of accumulator rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows in precedence order.
    pub fn states(&self) -> impl Iterator<Item = &AccumulatorState> {
        self.entries.values()
    }

    /// Look up one row.
    #[must_use]
    pub fn get(&self, key: &AccumulatorKey) -> Option<&AccumulatorState> {
        self.entries.get(key)
    }

    /// Current headroom of one row.
    #[must_use]
    pub fn headroom(&self, key: &AccumulatorKey) -> Option<Money> {
        self.entries
            .get(key)
            .map(|s| self.basis.headroom(s.limit_value, s.calculated_value))
    }

    /// Check that every key has a backing row.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::AccumulatorNotFound` for the first missing key.
    pub fn require<'a>(&self, keys: impl IntoIterator<Item = &'a AccumulatorKey>) -> Result<()> {
        for key in keys {
            if !self.entries.contains_key(key) {
                return Err(CostShareError::AccumulatorNotFound {
                    code: key.code.clone(),
                    level: key.level,
                });
            }
        }
        Ok(())
    }

    /// How much of `proposed` every level of `code` could take right now.
    ///
    /// Returns `None` if the member has no accumulator with that code. Amount
    /// levels cap the charge at the smallest headroom; an exhausted counter
    /// level closes the code.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::LedgerInvariantViolation` if a headroom is out
    /// of range.
    pub fn absorbable(&self, code: &AccumulatorCode, proposed: Money) -> Result<Option<Money>> {
        let mut present = false;
        let mut amount_cap: Option<Money> = None;
        let mut counters_open = true;

        for state in self.entries.values().filter(|s| &s.code == code) {
            present = true;
            let headroom = checked_headroom(self.basis, state)?;
            match state.applied_value_type() {
                AppliedValueType::Amount => {
                    amount_cap = Some(amount_cap.map_or(headroom, |cap| cap.min(headroom)));
                }
                AppliedValueType::Counter => {
                    if headroom < Money::from_units(1) {
                        counters_open = false;
                    }
                }
            }
        }

        if !present {
            return Ok(None);
        }
        if !counters_open || proposed.is_zero() || proposed.is_negative() {
            return Ok(Some(Money::ZERO));
        }

        Ok(Some(amount_cap.map_or(proposed, |cap| proposed.min(cap))))
    }

    /// Charge up to `proposed` against every level of `code`.
    ///
    /// Returns the amount absorbed (see [`AccumulatorLedger::absorbable`]), or
    /// `None` if the member has no accumulator with that code. Counter levels
    /// consume one unit per non-zero charge.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::LedgerInvariantViolation` if a headroom leaves
    /// `[0, limitValue]`.
    pub fn absorb(&mut self, code: &AccumulatorCode, proposed: Money) -> Result<Option<Money>> {
        let Some(applied) = self.absorbable(code, proposed)? else {
            return Ok(None);
        };
        if applied.is_zero() {
            return Ok(Some(Money::ZERO));
        }

        let basis = self.basis;
        for state in self.entries.values_mut().filter(|s| &s.code == code) {
            let step = match state.applied_value_type() {
                AppliedValueType::Amount => applied,
                AppliedValueType::Counter => Money::from_units(1),
            };
            state.calculated_value = basis.advance(state.calculated_value, step);
            checked_headroom(basis, state)?;
        }

        Ok(Some(applied))
    }

    /// Run `cost` through the accumulators in precedence order.
    ///
    /// The deductible absorbs first, the plan limit absorbs from what is
    /// left, and the OOP max is credited with the deductible absorption plus
    /// whatever it takes from the flow. The deductible never takes more than
    /// the OOP max can still be credited with. Returns the cost nothing
    /// absorbed.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::LedgerInvariantViolation` if a headroom leaves
    /// `[0, limitValue]`.
    pub fn charge(&mut self, cost: Money) -> Result<Money> {
        let mut flow = cost;

        let deductible_cap = self
            .absorbable(&AccumulatorCode::OopMax, flow)?
            .unwrap_or(flow);
        let deductible = self
            .absorb(&AccumulatorCode::Deductible, deductible_cap)?
            .unwrap_or(Money::ZERO);
        flow = flow.saturating_sub(deductible);

        let limit = self
            .absorb(&AccumulatorCode::Limit, flow)?
            .unwrap_or(Money::ZERO);
        flow = flow.saturating_sub(limit);

        if let Some(oop) = self.absorb(&AccumulatorCode::OopMax, deductible + flow)? {
            flow = flow.saturating_sub(oop.saturating_sub(deductible));
        }

        Ok(flow)
    }

    /// Charge `cost` on a copy of this ledger and report the deltas.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::LedgerInvariantViolation` if a headroom leaves
    /// `[0, limitValue]`.
    pub fn apply(&self, cost: Money) -> Result<LedgerApplication> {
        let mut ledger = self.clone();
        let remaining_cost = ledger.charge(cost)?;
        let deltas = ledger.deltas_since(self)?;
        Ok(LedgerApplication {
            remaining_cost,
            deltas,
            ledger,
        })
    }

    /// Per-accumulator deltas between `earlier` and this ledger.
    ///
    /// # Errors
    ///
    /// - `CostShareError::AccumulatorNotFound` if a row has no counterpart in
    ///   `earlier`.
    /// - `CostShareError::LedgerInvariantViolation` if a headroom is out of
    ///   range or grew.
    pub fn deltas_since(&self, earlier: &Self) -> Result<Vec<AccumulatorDelta>> {
        self.entries
            .iter()
            .map(|(key, state)| {
                let before = earlier.entries.get(key).ok_or_else(|| {
                    CostShareError::AccumulatorNotFound {
                        code: key.code.clone(),
                        level: key.level,
                    }
                })?;

                let headroom_before = checked_headroom(earlier.basis, before)?;
                let remaining = checked_headroom(self.basis, state)?;
                if remaining > headroom_before {
                    return Err(violation(state, remaining));
                }

                Ok(AccumulatorDelta {
                    code: key.code.clone(),
                    level: key.level,
                    remaining_value: remaining,
                    applied_value: headroom_before - remaining,
                    applied_value_type: state.applied_value_type(),
                })
            })
            .collect()
    }

    /// Deltas showing nothing applied, for calculations that bypass the ledger.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::LedgerInvariantViolation` if a headroom is out
    /// of range.
    pub fn untouched_deltas(&self) -> Result<Vec<AccumulatorDelta>> {
        self.deltas_since(self)
    }
}

fn violation(state: &AccumulatorState, remaining: Money) -> CostShareError {
    CostShareError::LedgerInvariantViolation {
        code: state.code.clone(),
        level: state.level,
        remaining,
        limit: state.limit_value,
    }
}

/// Headroom of `state`, which must lie in `[0, limitValue]`.
fn checked_headroom(basis: ValueBasis, state: &AccumulatorState) -> Result<Money> {
    let headroom = basis.headroom(state.limit_value, state.calculated_value);
    if headroom.is_negative() || headroom > state.limit_value {
        return Err(violation(state, headroom));
    }
    Ok(headroom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::AccumulatorLevel::{Family, Individual};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn units(n: i64) -> Money {
        Money::from_units(n)
    }

    fn row(code: AccumulatorCode, level: crate::AccumulatorLevel, limit: i64, calc: i64) -> AccumulatorState {
        AccumulatorState::new(code, level, units(limit), units(calc))
    }

    fn delta_for<'a>(
        deltas: &'a [AccumulatorDelta],
        code: &AccumulatorCode,
        level: crate::AccumulatorLevel,
    ) -> &'a AccumulatorDelta {
        deltas
            .iter()
            .find(|d| &d.code == code && d.level == level)
            .unwrap()
    }

    #[test]
    fn oop_family_coupling_caps_at_tighter_level() {
        // individual remaining 50, family remaining 200
        let ledger = AccumulatorLedger::new(
            [
                row(AccumulatorCode::OopMax, Individual, 1000, 950),
                row(AccumulatorCode::OopMax, Family, 3000, 2800),
            ],
            ValueBasis::Consumed,
        )
        .unwrap();

        let result = ledger.apply(units(100)).unwrap();

        assert_eq!(result.remaining_cost, units(50));
        let ind = delta_for(&result.deltas, &AccumulatorCode::OopMax, Individual);
        let fam = delta_for(&result.deltas, &AccumulatorCode::OopMax, Family);
        assert_eq!(ind.applied_value, units(50));
        assert_eq!(ind.remaining_value, Money::ZERO);
        assert_eq!(fam.applied_value, units(50));
        assert_eq!(fam.remaining_value, units(150));
    }

    #[test]
    fn source_sample_with_zero_cost_keeps_balances() {
        let ledger = AccumulatorLedger::new(
            [
                row(AccumulatorCode::OopMax, Individual, 3000, 3000),
                row(AccumulatorCode::OopMax, Family, 9000, 9000),
            ],
            ValueBasis::Remaining,
        )
        .unwrap();

        let result = ledger.apply(Money::ZERO).unwrap();

        for delta in &result.deltas {
            assert_eq!(delta.applied_value, Money::ZERO);
        }
        assert_eq!(
            delta_for(&result.deltas, &AccumulatorCode::OopMax, Individual).remaining_value,
            units(3000)
        );
        assert_eq!(
            delta_for(&result.deltas, &AccumulatorCode::OopMax, Family).remaining_value,
            units(9000)
        );
    }

    #[test]
    fn deductible_is_credited_toward_oop() {
        let ledger = AccumulatorLedger::new(
            [
                row(AccumulatorCode::Deductible, Individual, 500, 470),
                row(AccumulatorCode::OopMax, Individual, 2000, 1950),
            ],
            ValueBasis::Consumed,
        )
        .unwrap();

        let result = ledger.apply(units(100)).unwrap();

        // deductible takes 30, OOP is credited 30 and takes 20 more of the flow
        let ded = delta_for(&result.deltas, &AccumulatorCode::Deductible, Individual);
        let oop = delta_for(&result.deltas, &AccumulatorCode::OopMax, Individual);
        assert_eq!(ded.applied_value, units(30));
        assert_eq!(oop.applied_value, units(50));
        assert_eq!(oop.remaining_value, Money::ZERO);
        assert_eq!(result.remaining_cost, units(50));
    }

    #[test]
    fn deductible_is_held_to_oop_headroom() {
        let ledger = AccumulatorLedger::new(
            [
                row(AccumulatorCode::Deductible, Individual, 500, 0),
                row(AccumulatorCode::OopMax, Individual, 1000, 990),
            ],
            ValueBasis::Consumed,
        )
        .unwrap();

        let result = ledger.apply(units(100)).unwrap();

        let ded = delta_for(&result.deltas, &AccumulatorCode::Deductible, Individual);
        let oop = delta_for(&result.deltas, &AccumulatorCode::OopMax, Individual);
        assert_eq!(ded.applied_value, units(10));
        assert_eq!(oop.applied_value, units(10));
        assert_eq!(result.remaining_cost, units(90));
    }

    #[test]
    fn absorbable_leaves_ledger_alone() {
        let ledger = AccumulatorLedger::new(
            [
                row(AccumulatorCode::OopMax, Individual, 1000, 950),
                row(AccumulatorCode::OopMax, Family, 3000, 2800),
            ],
            ValueBasis::Consumed,
        )
        .unwrap();

        assert_eq!(
            ledger.absorbable(&AccumulatorCode::OopMax, units(100)).unwrap(),
            Some(units(50))
        );
        assert_eq!(ledger.absorbable(&AccumulatorCode::Limit, units(100)).unwrap(), None);
        assert!(ledger
            .deltas_since(&ledger)
            .unwrap()
            .iter()
            .all(|d| d.applied_value.is_zero()));
    }

    #[test]
    fn exhausted_deductible_passes_cost_on() {
        let ledger = AccumulatorLedger::new(
            [row(AccumulatorCode::Deductible, Individual, 500, 500)],
            ValueBasis::Consumed,
        )
        .unwrap();

        let result = ledger.apply(units(100)).unwrap();

        assert_eq!(result.remaining_cost, units(100));
        assert_eq!(result.deltas[0].applied_value, Money::ZERO);
        assert_eq!(result.deltas[0].remaining_value, Money::ZERO);
    }

    #[test]
    fn counter_limit_consumes_one_unit() {
        let mut ledger = AccumulatorLedger::new(
            [row(AccumulatorCode::Limit, Individual, 20, 19).with_limit_type("counter")],
            ValueBasis::Consumed,
        )
        .unwrap();
        let before = ledger.clone();

        let absorbed = ledger.absorb(&AccumulatorCode::Limit, units(250)).unwrap();
        assert_eq!(absorbed, Some(units(250)));

        let deltas = ledger.deltas_since(&before).unwrap();
        assert_eq!(deltas[0].applied_value, units(1));
        assert_eq!(deltas[0].applied_value_type, AppliedValueType::Counter);

        // exhausted now
        let absorbed = ledger.absorb(&AccumulatorCode::Limit, units(250)).unwrap();
        assert_eq!(absorbed, Some(Money::ZERO));
    }

    #[test]
    fn absent_code_absorbs_nothing() {
        let mut ledger = AccumulatorLedger::empty(ValueBasis::Consumed);
        assert_eq!(
            ledger.absorb(&AccumulatorCode::Deductible, units(10)).unwrap(),
            None
        );
        assert_eq!(ledger.charge(units(10)).unwrap(), units(10));
    }

    #[test]
    fn other_codes_are_carried_untouched() {
        let ledger = AccumulatorLedger::new(
            [row(AccumulatorCode::Other("Lifetime Max".into()), Individual, 100, 0)],
            ValueBasis::Consumed,
        )
        .unwrap();

        let result = ledger.apply(units(40)).unwrap();
        assert_eq!(result.remaining_cost, units(40));
        assert_eq!(result.deltas[0].applied_value, Money::ZERO);
    }

    #[test]
    fn out_of_range_input_is_rejected() {
        let err = AccumulatorLedger::new(
            [row(AccumulatorCode::Deductible, Individual, 500, 600)],
            ValueBasis::Consumed,
        )
        .unwrap_err();
        assert!(matches!(err, CostShareError::LedgerInvariantViolation { .. }));

        let err = AccumulatorLedger::new(
            [row(AccumulatorCode::Deductible, Individual, 500, 600)],
            ValueBasis::Remaining,
        )
        .unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn require_reports_missing_key() {
        let ledger = AccumulatorLedger::new(
            [row(AccumulatorCode::Deductible, Individual, 500, 0)],
            ValueBasis::Consumed,
        )
        .unwrap();

        let present = AccumulatorKey::new(AccumulatorCode::Deductible, Individual);
        let missing = AccumulatorKey::new(AccumulatorCode::Deductible, Family);
        assert!(ledger.require([&present]).is_ok());
        assert_eq!(
            ledger.require([&present, &missing]),
            Err(CostShareError::AccumulatorNotFound {
                code: AccumulatorCode::Deductible,
                level: Family
            })
        );
    }

    fn cents(n: i64) -> Money {
        Money::from_decimal(Decimal::new(n, 2))
    }

    fn arb_row(code: AccumulatorCode, level: crate::AccumulatorLevel) -> impl Strategy<Value = AccumulatorState> {
        (0i64..1_000_000)
            .prop_flat_map(|limit| (Just(limit), 0..=limit))
            .prop_map(move |(limit, consumed)| {
                AccumulatorState::new(code.clone(), level, cents(limit), cents(consumed))
            })
    }

    fn arb_ledger() -> impl Strategy<Value = AccumulatorLedger> {
        (
            arb_row(AccumulatorCode::Deductible, Individual),
            arb_row(AccumulatorCode::Deductible, Family),
            arb_row(AccumulatorCode::OopMax, Individual),
            arb_row(AccumulatorCode::OopMax, Family),
            any::<bool>(),
        )
            .prop_map(|(di, df, oi, of, with_family)| {
                let rows = if with_family {
                    vec![di, df, oi, of]
                } else {
                    vec![di, oi]
                };
                AccumulatorLedger::new(rows, ValueBasis::Consumed).unwrap()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn deltas_stay_in_range(ledger in arb_ledger(), cost in 0i64..2_000_000) {
            let result = ledger.apply(cents(cost)).unwrap();

            prop_assert!(result.remaining_cost <= cents(cost));
            for delta in &result.deltas {
                let state = ledger.get(&delta.key()).unwrap();
                prop_assert!(!delta.remaining_value.is_negative());
                prop_assert!(delta.remaining_value <= state.limit_value);
                prop_assert!(!delta.applied_value.is_negative());
                prop_assert_eq!(
                    delta.applied_value,
                    ledger.headroom(&delta.key()).unwrap() - delta.remaining_value
                );
            }
        }

        #[test]
        fn levels_of_one_code_move_together(ledger in arb_ledger(), cost in 0i64..2_000_000) {
            let result = ledger.apply(cents(cost)).unwrap();

            for code in AccumulatorCode::PRECEDENCE {
                let applied: Vec<Money> = result
                    .deltas
                    .iter()
                    .filter(|d| d.code == code)
                    .map(|d| d.applied_value)
                    .collect();
                prop_assert!(applied.windows(2).all(|w| w[0] == w[1]));
            }
        }

        #[test]
        fn deductible_never_outruns_oop_credit(ledger in arb_ledger(), cost in 0i64..2_000_000) {
            let result = ledger.apply(cents(cost)).unwrap();

            let ded = result.deltas.iter().find(|d| d.code == AccumulatorCode::Deductible).unwrap();
            let oop = result.deltas.iter().find(|d| d.code == AccumulatorCode::OopMax).unwrap();
            prop_assert!(ded.applied_value <= oop.applied_value);
        }

        #[test]
        fn zero_cost_on_post_state_applies_nothing(ledger in arb_ledger(), cost in 0i64..2_000_000) {
            let first = ledger.apply(cents(cost)).unwrap();
            let second = first.ledger.apply(Money::ZERO).unwrap();

            prop_assert_eq!(second.remaining_cost, Money::ZERO);
            for delta in &second.deltas {
                prop_assert_eq!(delta.applied_value, Money::ZERO);
            }
        }
    }
}
