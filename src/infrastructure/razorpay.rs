use crate::config::GatewayConfig;
use crate::domain::order::{OrderRequest, ProviderOrder, ProviderPayment};
use crate::domain::ports::{GatewayError, PaymentGateway};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    description: Option<String>,
}

/// Razorpay REST adapter.
///
/// Every request carries the configured timeout; a request that runs out of
/// time maps to [`GatewayError::Timeout`].
pub struct RazorpayGateway {
    client: Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.provider_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.key_id, Some(&self.key_secret))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(classify)?;
        decode(response, fallback).await
    }
}

fn classify(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(error.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await.map_err(classify)?;
    if !status.is_success() {
        debug!(%status, "payment provider rejected request");
        return Err(GatewayError::Rejected(rejection_message(&body, fallback)));
    }
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// The provider's own error description when the body carries one.
fn rejection_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.description)
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<ProviderOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.base_url);
        self.send(
            self.client.post(url).json(request),
            "Failed to create payment order",
        )
        .await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);
        self.send(self.client.get(url), "Payment verification failed")
            .await
    }

    async fn fetch_order(&self, order_id: &str) -> Result<ProviderOrder, GatewayError> {
        let url = format!("{}/v1/orders/{}", self.base_url, order_id);
        self.send(self.client.get(url), "Payment verification failed")
            .await
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}
