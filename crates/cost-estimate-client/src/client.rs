//! Cost estimate HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use cost_estimate_core::{AccumulatorState, MemberId, Money};

use crate::error::ClientError;
use crate::types::{
    AccumulatorsResponse, ApiErrorResponse, ApplyCostRequest, ApplyCostResponse,
    EstimateRequest, EstimateResponse, HealthResponse, ReplaceAccumulatorsRequest,
};

/// Cost estimate API client.
///
/// Provides methods for requesting estimates and managing member balances.
#[derive(Debug, Clone)]
pub struct CostEstimateClient {
    client: Client,
    base_url: String,
}

impl CostEstimateClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://cost-estimate:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(format!(
                "{} cost-estimate-client/{}",
                options.service_name,
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Estimate member and insurer cost for a set of claim lines.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ClaimLine` if a claim line cannot be estimated,
    /// `ClientError::MemberNotFound` if the member has no balances, or another
    /// error if the request fails.
    pub async fn create_estimate(
        &self,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, ClientError> {
        let url = format!("{}/v1/cost-estimates", self.base_url);

        tracing::debug!(
            member_id = %request.member_id,
            claim_lines = request.claim_lines.len(),
            commit = request.commit,
            "Requesting cost estimate"
        );

        let response = self.client.post(&url).json(request).send().await?;
        self.handle_response(response).await
    }

    /// Get a member's current balances.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MemberNotFound` if the member has no balances, or
    /// another error if the request fails.
    pub async fn get_accumulators(
        &self,
        member_id: &MemberId,
    ) -> Result<AccumulatorsResponse, ClientError> {
        let response = self
            .client
            .get(self.accumulators_url(member_id, ""))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Replace a member's balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a balance is out of range.
    pub async fn replace_accumulators(
        &self,
        member_id: &MemberId,
        accumulators: &[AccumulatorState],
    ) -> Result<AccumulatorsResponse, ClientError> {
        let response = self
            .client
            .put(self.accumulators_url(member_id, ""))
            .json(&ReplaceAccumulatorsRequest { accumulators })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Preview how a cost would flow through a member's accumulators.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MemberNotFound` if the member has no balances, or
    /// another error if the request fails.
    pub async fn apply_cost(
        &self,
        member_id: &MemberId,
        cost: Money,
    ) -> Result<ApplyCostResponse, ClientError> {
        let response = self
            .client
            .post(self.accumulators_url(member_id, "/apply"))
            .json(&ApplyCostRequest { cost })
            .send()
            .await?;
        self.handle_response(response).await
    }

    fn accumulators_url(&self, member_id: &MemberId, suffix: &str) -> String {
        format!(
            "{}/v1/members/{}/accumulators{suffix}",
            self.base_url,
            member_id.as_str()
        )
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        let Ok(api_error) = error_body else {
            return Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            });
        };

        let code = api_error.error.code;
        let message = api_error.error.message;
        let detail = |key: &str| {
            api_error
                .error
                .details
                .as_ref()
                .and_then(|d| d.get(key))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };

        tracing::debug!(status = status.as_u16(), code = %code, "Cost estimate API error");

        // Map specific error codes to typed errors
        match (status.as_u16(), detail("claimLineId")) {
            (_, Some(claim_line_id)) => Err(ClientError::ClaimLine {
                claim_line_id,
                field: detail("field"),
                code,
                message,
            }),
            (404, None) => Err(ClientError::MemberNotFound { message }),
            (409, None) => Err(ClientError::VersionConflict { message }),
            (status, None) => Err(ClientError::Api {
                code,
                message,
                status,
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Calling service, sent in the user agent.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            service_name: "unknown".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with a service name.
    #[must_use]
    pub fn with_service_name(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Self::default()
        }
    }
}
