//! Cost Estimate HTTP API Service.
//!
//! This crate provides the HTTP API for the cost estimate engine:
//!
//! - Cost estimates for a member's claim lines, as preview or committed
//! - Reading and replacing a member's accumulator balances
//! - Ledger previews for a single cost
//!
//! Balances live behind [`cost_estimate_store::AccumulatorStore`]; the
//! backend is chosen by `STORE_BACKEND` at startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Store calls are synchronous

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServiceConfig, StoreBackend};
pub use error::ApiError;
pub use response::{EstimateResponse, ResponseAssembler};
pub use routes::create_router;
pub use state::AppState;
