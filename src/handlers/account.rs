use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::error::AccountError;
use crate::server::AppState;
use crate::services::identity::{Credentials, Registration, Session};
use crate::services::payment::{Subscription, SubscriptionRequest};

/// Unwrap a JSON body, answering `{error}` like every other failure here
/// instead of axum's plain-text rejection.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AccountError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        log::warn!("⚠️ Rejecting account request body: {}", rejection.body_text());
        AccountError::MissingFields
    })
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Session>, AccountError> {
    let credentials = body(payload)?;
    state.identity.sign_in(&credentials).await.map(Json)
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<Json<Session>, AccountError> {
    let registration = body(payload)?;
    state.identity.sign_up(&registration).await.map(Json)
}

/// Activates the plan once the provider confirms payment.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<Json<Subscription>, AccountError> {
    let request = body(payload)?;
    let subscription = state.payment.subscribe(&request).await?;
    log::info!("✅ {} plan active for {}", subscription.plan, subscription.email);
    Ok(Json(subscription))
}
