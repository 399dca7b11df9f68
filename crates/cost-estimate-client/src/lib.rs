//! Cost Estimate Client SDK.
//!
//! This crate provides a client library for services that need member cost
//! estimates or accumulator balances from the cost estimate API.
//!
//! # Example
//!
//! ```no_run
//! use cost_estimate_client::{ClaimLineInput, CostEstimateClient, EstimateRequest};
//! use cost_estimate_core::{BenefitCoverage, ClaimLine, Money, NetworkRate, NetworkStatus, Percent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CostEstimateClient::new("http://cost-estimate.claims.svc:8080")?;
//!
//! let request = EstimateRequest {
//!     member_id: "M-1001".parse()?,
//!     commit: false,
//!     claim_lines: vec![ClaimLineInput::new(ClaimLine {
//!         claim_line_id: "L1".to_string(),
//!         network_status: NetworkStatus::In,
//!         coverages: Some(vec![BenefitCoverage::coinsurance(Percent::try_new(20.into())?)]),
//!         rate: Some(NetworkRate::in_network_amount(Money::from_units(100))),
//!     })],
//! };
//!
//! let estimate = client.create_estimate(&request).await?;
//! println!("Member pays {:?}", estimate.claim_lines[0].health_claim_line.amount_responsibility);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, CostEstimateClient};
pub use error::ClientError;
pub use types::*;
