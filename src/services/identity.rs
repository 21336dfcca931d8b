use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::error::AccountError;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Who the user is. Swappable between a simulated stand-in and a real
/// authentication backend.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AccountError>;
    async fn sign_up(&self, registration: &Registration) -> Result<Session, AccountError>;
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Accepts any well-formed input after a fixed pause. No accounts are stored.
pub struct SimulatedIdentity {
    delay: Duration,
}

impl SimulatedIdentity {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SimulatedIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AccountError> {
        tokio::time::sleep(self.delay).await;

        if is_blank(&credentials.email) || is_blank(&credentials.password) {
            return Err(AccountError::MissingFields);
        }

        log::info!("🔐 Simulated sign-in for {}", credentials.email);
        Ok(Session {
            email: credentials.email.trim().to_string(),
            signed_in_at: Utc::now(),
        })
    }

    async fn sign_up(&self, registration: &Registration) -> Result<Session, AccountError> {
        tokio::time::sleep(self.delay).await;

        if is_blank(&registration.name)
            || is_blank(&registration.email)
            || is_blank(&registration.password)
        {
            return Err(AccountError::MissingFields);
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::WeakPassword);
        }

        log::info!("🆕 Simulated sign-up for {}", registration.email);
        Ok(Session {
            email: registration.email.trim().to_string(),
            signed_in_at: Utc::now(),
        })
    }
}

/// Forwards sign-in and sign-up to an HTTP authentication service.
pub struct GatewayIdentity {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayIdentity {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GatewayIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AccountError> {
        if is_blank(&credentials.email) || is_blank(&credentials.password) {
            return Err(AccountError::MissingFields);
        }
        let url = format!("{}/sign-in", self.base_url);
        gateway_post(&self.client, &url, credentials).await
    }

    async fn sign_up(&self, registration: &Registration) -> Result<Session, AccountError> {
        if is_blank(&registration.name)
            || is_blank(&registration.email)
            || is_blank(&registration.password)
        {
            return Err(AccountError::MissingFields);
        }
        let url = format!("{}/sign-up", self.base_url);
        gateway_post(&self.client, &url, registration).await
    }
}

/// POST `body` as JSON and decode the reply. 4xx means the gateway said no,
/// anything else that fails means it could not answer.
pub(crate) async fn gateway_post<B, R>(
    client: &reqwest::Client,
    url: &str,
    body: &B,
) -> Result<R, AccountError>
where
    B: Serialize + Sync,
    R: DeserializeOwned,
{
    let response = client.post(url).json(body).send().await.map_err(|e| {
        log::error!("❌ Gateway {} unreachable: {}", url, e);
        AccountError::Unavailable(e.to_string())
    })?;

    let status = response.status();
    if status.is_client_error() {
        let error_text = response.text().await.unwrap_or_default();
        log::warn!("⚠️ Gateway {} rejected request ({})", url, status);
        let message = serde_json::from_str::<serde_json::Value>(&error_text)
            .ok()
            .and_then(|v| v["error"].as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| format!("Requisição recusada ({})", status.as_u16()));
        return Err(AccountError::Rejected(message));
    }
    if !status.is_success() {
        log::error!("❌ Gateway {} failed with status {}", url, status);
        return Err(AccountError::Unavailable(format!("status {}", status.as_u16())));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| AccountError::Unavailable(format!("invalid gateway response: {}", e)))
}
