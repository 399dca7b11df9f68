//! Service configuration.

use std::str::FromStr;

use cost_estimate_core::{EstimatorConfig, PolicyKind, ValueBasis};

/// Storage backend for accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local map; balances are lost on restart.
    #[default]
    Memory,
    /// `RocksDB` under `data_dir`.
    RocksDb,
}

impl StoreBackend {
    /// Name used in configuration and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::RocksDb => "rocksdb",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" | "rocks" => Ok(Self::RocksDb),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
#[error("invalid {var}: {message}")]
pub struct ConfigError {
    /// Environment variable that failed to parse.
    pub var: &'static str,
    /// Why it failed.
    pub message: String,
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/cost-estimate").
    pub data_dir: String,

    /// Accumulator storage backend (default: memory).
    pub store_backend: StoreBackend,

    /// Coverage selection policy and accumulator value basis.
    pub estimator: EstimatorConfig,

    /// How often a commit is retried after a version conflict (default: 3).
    pub commit_max_retries: u32,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store backend, selection policy or value
    /// basis is not a known name.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            store_backend: parse_var("STORE_BACKEND")?.unwrap_or(defaults.store_backend),
            estimator: EstimatorConfig {
                selection_policy: parse_var::<PolicyKind>("COVERAGE_SELECTION_POLICY")?
                    .unwrap_or(defaults.estimator.selection_policy),
                value_basis: parse_var::<ValueBasis>("ACCUMULATOR_VALUE_BASIS")?
                    .unwrap_or(defaults.estimator.value_basis),
            },
            commit_max_retries: std::env::var("COMMIT_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.commit_max_retries),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_seconds),
        })
    }
}

/// Parse an optional variable whose bad values must not be ignored.
fn parse_var<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr<Err = String>,
{
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .parse()
            .map(Some)
            .map_err(|message| ConfigError { var, message }),
        _ => Ok(None),
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/cost-estimate".into(),
            store_backend: StoreBackend::Memory,
            estimator: EstimatorConfig::default(),
            commit_max_retries: 3,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.estimator.selection_policy, PolicyKind::PreferCopay);
        assert_eq!(config.estimator.value_basis, ValueBasis::Consumed);
        assert_eq!(config.commit_max_retries, 3);
    }

    #[test]
    fn store_backend_names() {
        assert_eq!("RocksDB".parse::<StoreBackend>(), Ok(StoreBackend::RocksDb));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
