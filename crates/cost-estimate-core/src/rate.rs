//! Network rates and their resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CostShareError, Result};
use crate::money::Money;

/// Whether the rendering provider is in the member's network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    /// In-network.
    #[serde(alias = "inNetwork", alias = "in_network", alias = "INN")]
    In,
    /// Out-of-network.
    #[serde(alias = "outOfNetwork", alias = "out_of_network", alias = "ONN", alias = "OON")]
    Out,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "in-network",
            Self::Out => "out-of-network",
        })
    }
}

/// How a rate value is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostType {
    /// An absolute amount.
    Amount,
    /// A percentage; no absolute cost is known.
    Percent,
}

/// Provider rate data for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRate {
    /// In-network rate value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_network_cost: Option<Money>,

    /// Out-of-network rate value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_network_cost: Option<Money>,

    /// Unit of the in-network value.
    pub in_network_cost_type: CostType,

    /// Unit of the out-of-network value; defaults to the in-network type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_network_cost_type: Option<CostType>,
}

impl NetworkRate {
    /// An in-network amount rate.
    #[must_use]
    pub fn in_network_amount(cost: Money) -> Self {
        Self {
            in_network_cost: Some(cost),
            out_of_network_cost: None,
            in_network_cost_type: CostType::Amount,
            out_of_network_cost_type: None,
        }
    }

    /// An in-network percentage rate.
    #[must_use]
    pub fn in_network_percent(points: Money) -> Self {
        Self {
            in_network_cost: Some(points),
            out_of_network_cost: None,
            in_network_cost_type: CostType::Percent,
            out_of_network_cost_type: None,
        }
    }

    /// Set the out-of-network value.
    #[must_use]
    pub fn with_out_of_network(mut self, cost: Money, cost_type: Option<CostType>) -> Self {
        self.out_of_network_cost = Some(cost);
        self.out_of_network_cost_type = cost_type;
        self
    }
}

/// The rate selected for one network status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    /// The raw value; an amount or percentage points depending on `cost_type`.
    pub value: Money,
    /// How `value` is expressed.
    pub cost_type: CostType,
}

impl ResolvedRate {
    /// The absolute cost, if this rate is an amount.
    #[must_use]
    pub fn amount(&self) -> Option<Money> {
        match self.cost_type {
            CostType::Amount => Some(self.value),
            CostType::Percent => None,
        }
    }
}

/// Picks the rate value matching a claim's network status.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateResolver;

impl RateResolver {
    /// Resolve `rate` for `network`.
    ///
    /// # Errors
    ///
    /// Returns `CostShareError::RateUnavailable` if the rate has no value for
    /// the requested network status.
    pub fn resolve(&self, rate: &NetworkRate, network: NetworkStatus) -> Result<ResolvedRate> {
        let (value, cost_type) = match network {
            NetworkStatus::In => (rate.in_network_cost, rate.in_network_cost_type),
            NetworkStatus::Out => (
                rate.out_of_network_cost,
                rate.out_of_network_cost_type
                    .unwrap_or(rate.in_network_cost_type),
            ),
        };

        value
            .map(|value| ResolvedRate { value, cost_type })
            .ok_or(CostShareError::RateUnavailable { network })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_in_network_amount() {
        let rate = NetworkRate::in_network_amount(Money::from_units(100));
        let resolved = RateResolver.resolve(&rate, NetworkStatus::In).unwrap();

        assert_eq!(resolved.value, Money::from_units(100));
        assert_eq!(resolved.cost_type, CostType::Amount);
        assert_eq!(resolved.amount(), Some(Money::from_units(100)));
    }

    #[test]
    fn out_of_network_inherits_cost_type() {
        let rate = NetworkRate::in_network_percent(Money::from_units(20))
            .with_out_of_network(Money::from_units(40), None);
        let resolved = RateResolver.resolve(&rate, NetworkStatus::Out).unwrap();

        assert_eq!(resolved.value, Money::from_units(40));
        assert_eq!(resolved.cost_type, CostType::Percent);
        assert_eq!(resolved.amount(), None);
    }

    #[test]
    fn missing_network_value_is_unavailable() {
        let rate = NetworkRate::in_network_amount(Money::from_units(100));
        let err = RateResolver.resolve(&rate, NetworkStatus::Out).unwrap_err();

        assert_eq!(
            err,
            CostShareError::RateUnavailable {
                network: NetworkStatus::Out
            }
        );
    }

    #[test]
    fn deserializes_contract_fields() {
        let json = r#"{"inNetworkCost":20,"inNetworkCostType":"percent"}"#;
        let rate: NetworkRate = serde_json::from_str(json).unwrap();

        assert_eq!(rate.in_network_cost_type, CostType::Percent);
        assert!(rate.out_of_network_cost.is_none());
    }
}
