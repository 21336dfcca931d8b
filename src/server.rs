use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::{AppConfig, ProviderMode};
use crate::error::AnalysisError;
use crate::handlers::account::{sign_in, sign_up, subscribe};
use crate::handlers::{AnalysisInput, AnalysisOutcome, FoodAnalyzer};
use crate::services::{
    GatewayIdentity, GatewayPayment, IdentityProvider, OpenAiVisionClient, PaymentProvider,
    SimulatedIdentity, SimulatedPayment,
};

pub struct AppState {
    pub analyzer: FoodAnalyzer,
    pub identity: Arc<dyn IdentityProvider>,
    pub payment: Arc<dyn PaymentProvider>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        let model = Arc::new(OpenAiVisionClient::new(config.analyzer.base_url.clone()));

        let identity: Arc<dyn IdentityProvider> = match &config.identity {
            ProviderMode::Simulated { delay } => Arc::new(SimulatedIdentity::new(*delay)),
            ProviderMode::Gateway { base_url } => Arc::new(GatewayIdentity::new(base_url.clone())),
        };
        let payment: Arc<dyn PaymentProvider> = match &config.payment {
            ProviderMode::Simulated { delay } => Arc::new(SimulatedPayment::new(*delay)),
            ProviderMode::Gateway { base_url } => Arc::new(GatewayPayment::new(base_url.clone())),
        };

        Self {
            analyzer: FoodAnalyzer::new(config.analyzer.clone(), model),
            identity,
            payment,
        }
    }
}

pub fn create_router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/analyze-food", post(analyze_food))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/subscription", post(subscribe))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

async fn analyze_food(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<AnalysisOutcome, AnalysisError> {
    let config = state.analyzer.config();
    let input = AnalysisInput::from_body(config.strategy, &body)?;

    // Read per request, never cached.
    let credential = config.credential();

    state.analyzer.analyze(input, credential).await.map_err(|e| {
        log::error!("❌ Food analysis failed ({}): {:?}", e.code(), e);
        e
    })
}

async fn root_handler() -> &'static str {
    "NutriCoach API - POST /api/analyze-food with a meal photo"
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisStrategy, AnalyzerConfig};
    use crate::services::ai_service::fake::FakeVisionModel;
    use crate::services::VisionModel;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

    fn state_with(config: AnalyzerConfig, model: Arc<dyn VisionModel>) -> Arc<AppState> {
        Arc::new(AppState {
            analyzer: FoodAnalyzer::new(config, model),
            identity: Arc::new(SimulatedIdentity::new(Duration::ZERO)),
            payment: Arc::new(SimulatedPayment::new(Duration::ZERO)),
        })
    }

    /// Analyzer config whose credential lives in a variable only this test touches.
    fn config_with_key(strategy: AnalysisStrategy, var: &str, key: Option<&str>) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::for_strategy(strategy);
        config.api_key_var = var.to_string();
        match key {
            Some(key) => std::env::set_var(var, key),
            None => std::env::remove_var(var),
        }
        config
    }

    async fn post_json(state: Arc<AppState>, uri: &str, body: Value) -> (StatusCode, Value) {
        post_raw(state, uri, body.to_string()).await
    }

    async fn post_raw(state: Arc<AppState>, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = create_router(state, 1024 * 1024)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_structured_endpoint_returns_report() {
        let config = config_with_key(AnalysisStrategy::Structured, "NUTRICOACH_TEST_KEY_STRUCTURED", Some("sk-test"));
        let model = FakeVisionModel::replying(
            r#"{"foodName": "Salada Caesar", "mealType": "Almoço", "nutrition": {"calories": 350, "protein": 18}}"#,
        );
        let (status, body) =
            post_json(state_with(config, model.clone()), "/api/analyze-food", json!({ "image": IMAGE })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["foodName"], "Salada Caesar");
        assert_eq!(body["mealType"], "Lunch");
        assert_eq!(body["nutrition"]["calories"], 350.0);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_extraction_endpoint_wraps_analysis() {
        let config = config_with_key(AnalysisStrategy::Extraction, "NUTRICOACH_TEST_KEY_EXTRACTION", Some("sk-test"));
        let model = FakeVisionModel::replying("Calorias: 450kcal, Proteínas: 30g, Carboidratos: 50g, Gorduras: 10g");
        let (status, body) = post_json(
            state_with(config, model.clone()),
            "/api/analyze-food",
            json!({ "imageUrl": IMAGE, "userGoals": "perder peso" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["analysis"]["calories"], 450);
        assert_eq!(body["analysis"]["macros"], json!({ "protein": 30, "carbs": 50, "fats": 10 }));
        assert!(body["analysis"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_missing_image_is_400() {
        let config = config_with_key(AnalysisStrategy::Structured, "NUTRICOACH_TEST_KEY_MISSING_IMAGE", Some("sk-test"));
        let model = FakeVisionModel::replying("{}");
        let (status, body) = post_json(state_with(config, model.clone()), "/api/analyze-food", json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Imagem não fornecida");
        assert_eq!(body["code"], "missing_input");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let config = config_with_key(AnalysisStrategy::Structured, "NUTRICOACH_TEST_KEY_MALFORMED", Some("sk-test"));
        let model = FakeVisionModel::replying("{}");
        let (status, _) = post_raw(state_with(config, model.clone()), "/api/analyze-food", "{image".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_500_without_upstream_call() {
        let config = config_with_key(AnalysisStrategy::Structured, "NUTRICOACH_TEST_KEY_UNSET", None);
        let model = FakeVisionModel::replying("{}");
        let (status, body) =
            post_json(state_with(config, model.clone()), "/api/analyze-food", json!({ "image": IMAGE })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "missing_credential");
        assert!(body["hint"].is_string());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_never_reaches_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = config_with_key(AnalysisStrategy::Structured, "NUTRICOACH_TEST_KEY_UNSET_HTTP", None);
        config.base_url = server.uri();
        let model = Arc::new(OpenAiVisionClient::new(server.uri()));
        let (status, _) = post_json(state_with(config, model), "/api/analyze-food", json!({ "image": IMAGE })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        server.verify().await;
    }

    async fn status_for_upstream(var: &str, upstream: ResponseTemplate) -> (StatusCode, Value) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(upstream)
            .expect(1)
            .mount(&server)
            .await;

        let config = config_with_key(AnalysisStrategy::Structured, var, Some("sk-test"));
        let model = Arc::new(OpenAiVisionClient::new(server.uri()));
        post_json(state_with(config, model), "/api/analyze-food", json!({ "image": IMAGE })).await
    }

    #[tokio::test]
    async fn test_upstream_401_is_401() {
        let (status, body) = status_for_upstream(
            "NUTRICOACH_TEST_KEY_401",
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "invalid_credential");
    }

    #[tokio::test]
    async fn test_upstream_429_is_429() {
        let (status, body) =
            status_for_upstream("NUTRICOACH_TEST_KEY_429", ResponseTemplate::new(429)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["code"], "rate_limited");
    }

    #[tokio::test]
    async fn test_upstream_malformed_content_is_500() {
        let (status, body) = status_for_upstream(
            "NUTRICOACH_TEST_KEY_GARBAGE",
            ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "```json\n{\"foodName\": \n```" } }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "unparseable_response");
    }

    #[tokio::test]
    async fn test_upstream_unreachable_is_503() {
        let config = config_with_key(AnalysisStrategy::Structured, "NUTRICOACH_TEST_KEY_OFFLINE", Some("sk-test"));
        let model = Arc::new(OpenAiVisionClient::new("http://127.0.0.1:9"));
        let (status, body) = post_json(state_with(config, model), "/api/analyze-food", json!({ "image": IMAGE })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "network_failure");
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let config = AnalyzerConfig::for_strategy(AnalysisStrategy::Structured);
        let state = state_with(config, FakeVisionModel::replying("{}"));

        let (status, body) = post_json(
            state.clone(),
            "/api/auth/sign-up",
            json!({ "name": "Ana", "email": "ana@example.com", "password": "123" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Senha deve ter no mínimo 6 caracteres");

        let (status, body) = post_json(
            state,
            "/api/auth/sign-in",
            json!({ "email": "ana@example.com", "password": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ana@example.com");
    }

    #[tokio::test]
    async fn test_account_routes_reject_bad_json_with_error_body() {
        let config = AnalyzerConfig::for_strategy(AnalysisStrategy::Structured);
        let state = state_with(config, FakeVisionModel::replying("{}"));

        let (status, body) = post_raw(state.clone(), "/api/auth/sign-in", "{email".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Preencha todos os campos");

        // paymentMethod is required
        let (status, body) =
            post_json(state, "/api/subscription", json!({ "email": "ana@example.com" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Preencha todos os campos");
    }

    #[tokio::test]
    async fn test_oversized_body_is_413_before_credential_check() {
        let config = config_with_key(AnalysisStrategy::Structured, "NUTRICOACH_TEST_KEY_OVERSIZED", None);
        let model = FakeVisionModel::replying("{}");
        let payload = json!({ "image": format!("data:image/jpeg;base64,{}", "A".repeat(4096)) }).to_string();

        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze-food")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, payload.len())
            .body(Body::from(payload))
            .unwrap();
        let response = create_router(state_with(config, model.clone()), 1024)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_route() {
        let config = AnalyzerConfig::for_strategy(AnalysisStrategy::Structured);
        let state = state_with(config, FakeVisionModel::replying("{}"));

        let (status, body) = post_json(
            state,
            "/api/subscription",
            json!({ "email": "ana@example.com", "paymentMethod": "pix" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], true);
        assert_eq!(body["plan"], "annual");
    }

    #[tokio::test]
    async fn test_health() {
        let config = AnalyzerConfig::for_strategy(AnalysisStrategy::Structured);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = create_router(state_with(config, FakeVisionModel::replying("{}")), 1024)
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
