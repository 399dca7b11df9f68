//! Common test utilities for cost estimate integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use cost_estimate_core::{AccumulatorState, MemberId};
use cost_estimate_service::{create_router, AppState, ServiceConfig};
use cost_estimate_store::{AccumulatorStore, MemoryStore};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server, for seeding and inspection.
    pub store: Arc<dyn AccumulatorStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: Option<TempDir>,
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a harness with custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store: Arc<dyn AccumulatorStore> = Arc::new(MemoryStore::new());
        Self::build(store, config, None)
    }

    /// Create a harness around an existing store.
    pub fn with_store(store: Arc<dyn AccumulatorStore>, config: ServiceConfig) -> Self {
        Self::build(store, config, None)
    }

    /// Create a harness backed by a fresh `RocksDB` database.
    #[cfg(feature = "rocksdb-backend")]
    pub fn rocks() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = cost_estimate_store::RocksStore::open(temp_dir.path())
            .expect("Failed to open store");

        let mut config = test_config();
        config.data_dir = temp_dir.path().to_string_lossy().to_string();

        Self::build(Arc::new(store), config, Some(temp_dir))
    }

    fn build(
        store: Arc<dyn AccumulatorStore>,
        config: ServiceConfig,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Seed a member's balances directly in the store.
    pub fn seed(&self, member_id: &str, accumulators: Value) {
        let member_id: MemberId = member_id.parse().expect("valid member id");
        let states: Vec<AccumulatorState> =
            serde_json::from_value(accumulators).expect("valid accumulators");
        self.store
            .replace(&member_id, states)
            .expect("Failed to seed accumulators");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration used by the harness.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        ..ServiceConfig::default()
    }
}

/// Deductible met, OOP max untouched.
pub fn met_deductible() -> Value {
    json!([
        {"code": "Deductible", "level": "Individual", "limitValue": 500.0, "calculatedValue": 500.0},
        {"code": "OOP Max", "level": "Individual", "limitValue": 2000.0, "calculatedValue": 0.0}
    ])
}

/// A 20% coinsurance coverage tied to the deductible and OOP max.
pub fn coinsurance_20() -> Value {
    json!({
        "isServiceCovered": true,
        "costShareCoinsurance": 20,
        "benefitCode": "coins-20",
        "relatedAccumulators": [
            {"code": "Deductible", "level": "Individual"},
            {"code": "OOP Max", "level": "Individual"}
        ]
    })
}

/// An in-network claim line with an amount rate.
pub fn claim_line(id: &str, cost: f64, coverages: Value) -> Value {
    json!({
        "claimLineId": id,
        "networkStatus": "in",
        "coverages": coverages,
        "rate": {"inNetworkCost": cost, "inNetworkCostType": "amount"}
    })
}

/// Find the calculation for one accumulator in a claim line view.
pub fn calculation<'a>(entries: &'a Value, code: &str, level: &str) -> &'a Value {
    entries
        .as_array()
        .expect("accumulators array")
        .iter()
        .find(|e| e["accumulator"]["code"] == code && e["accumulator"]["level"] == level)
        .map(|e| &e["accumulatorCalculation"])
        .expect("accumulator present")
}
