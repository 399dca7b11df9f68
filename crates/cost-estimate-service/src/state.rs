//! Application state.

use std::sync::Arc;

use cost_estimate_core::CostEstimator;
use cost_estimate_store::AccumulatorStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The accumulator storage backend.
    pub store: Arc<dyn AccumulatorStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Cost-sharing engine built from `config.estimator`.
    pub estimator: Arc<CostEstimator>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn AccumulatorStore>, config: ServiceConfig) -> Self {
        let estimator = Arc::new(CostEstimator::from_config(&config.estimator));

        tracing::info!(
            selection_policy = estimator.policy_name(),
            value_basis = config.estimator.value_basis.as_str(),
            "Cost estimator configured"
        );

        Self {
            store,
            config,
            estimator,
        }
    }
}
