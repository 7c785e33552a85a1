//! HTTP client for the hosted-checkout billing collaborator.
//!
//! The collaborator is only ever reached through this client; every failure
//! mode (connect error, timeout, non-2xx, bad body) surfaces as
//! `WorkflowError::Upstream` so callers see a 502 instead of hanging.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::Config;
use crate::utils::error::{WorkflowError, WorkflowResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct BillingClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest<'a> {
    pub customer_email: &'a str,
    pub package_name: &'a str,
    pub amount_usd: i64,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

impl BillingClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.billing_api_base.clone(), config.billing_api_key.clone())
    }

    pub fn new(base_url: String, api_key: String) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build billing HTTP client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Create a hosted checkout session and return its redirect target.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest<'_>,
    ) -> WorkflowResult<CheckoutSession> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Billing collaborator unreachable: {e}");
                if e.is_timeout() {
                    WorkflowError::Upstream("checkout session request timed out".to_string())
                } else {
                    WorkflowError::Upstream(format!("checkout session request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::Upstream(format!(
                "checkout session creation returned {status}"
            )));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| WorkflowError::Upstream(format!("malformed checkout session body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn request<'a>() -> CheckoutSessionRequest<'a> {
        CheckoutSessionRequest {
            customer_email: "hr@example.com",
            package_name: "Professional",
            amount_usd: 49,
            success_url: "http://localhost:5173/payment/success".to_string(),
            cancel_url: "http://localhost:5173/payment/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_session_from_provider() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/checkout/sessions")
                    .header("authorization", "Bearer test-key")
                    .json_body_partial(r#"{ "packageName": "Professional" }"#);
                then.status(200).json_body(serde_json::json!({
                    "id": "cs_123",
                    "url": "https://pay.example.com/cs_123"
                }));
            })
            .await;

        let client = BillingClient::new(server.base_url(), "test-key".to_string());
        let session = client.create_checkout_session(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.id, "cs_123");
        assert_eq!(session.url, "https://pay.example.com/cs_123");
    }

    #[tokio::test]
    async fn provider_error_surfaces_as_upstream() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/checkout/sessions");
                then.status(500);
            })
            .await;

        let client = BillingClient::new(server.base_url(), "test-key".to_string());
        let err = client.create_checkout_session(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }

    #[tokio::test]
    async fn malformed_body_surfaces_as_upstream() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/checkout/sessions");
                then.status(200).body("not json");
            })
            .await;

        let client = BillingClient::new(server.base_url(), "test-key".to_string());
        let err = client.create_checkout_session(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }
}
