use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AccountError;
use crate::services::identity::gateway_post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard,
    Pix,
    Mbway,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_plan")]
    pub plan: String,
    pub payment_method: PaymentMethod,
}

fn default_plan() -> String {
    "annual".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub email: String,
    pub plan: String,
    pub active: bool,
    pub activated_at: DateTime<Utc>,
}

/// Activates a subscription. Pricing lives outside this service.
#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn subscribe(&self, request: &SubscriptionRequest) -> Result<Subscription, AccountError>;
}

/// Always succeeds after a fixed pause. No money moves.
pub struct SimulatedPayment {
    delay: Duration,
}

impl SimulatedPayment {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl PaymentProvider for SimulatedPayment {
    async fn subscribe(&self, request: &SubscriptionRequest) -> Result<Subscription, AccountError> {
        if request.email.trim().is_empty() {
            return Err(AccountError::MissingFields);
        }

        tokio::time::sleep(self.delay).await;

        log::info!(
            "💳 Simulated {} subscription for {} via {:?}",
            request.plan,
            request.email,
            request.payment_method
        );
        Ok(Subscription {
            email: request.email.trim().to_string(),
            plan: request.plan.clone(),
            active: true,
            activated_at: Utc::now(),
        })
    }
}

/// Forwards subscription requests to an HTTP billing service.
pub struct GatewayPayment {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayPayment {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl PaymentProvider for GatewayPayment {
    async fn subscribe(&self, request: &SubscriptionRequest) -> Result<Subscription, AccountError> {
        if request.email.trim().is_empty() {
            return Err(AccountError::MissingFields);
        }
        let url = format!("{}/subscriptions", self.base_url);
        gateway_post(&self.client, &url, request).await
    }
}
