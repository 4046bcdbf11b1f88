//! REST API Server for the habit cost estimator
//!
//! Exposes the calculator over HTTP.
//! Analysis results are picked up by polling `/api/analysis`.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::calculator::HabitCalculator;
use crate::config::{Scope, Settings};
use crate::validation::HabitForm;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    /// Omitted keeps the stored credentials
    pub giga_credentials: Option<String>,
    pub verify_ssl_certs: bool,
    pub scope: Scope,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub calculator: Arc<HabitCalculator>,
}

fn settings_view(settings: &Settings) -> serde_json::Value {
    serde_json::json!({
        "giga_credentials": settings.masked_credentials(),
        "credentials_configured": settings.has_credentials(),
        "verify_ssl_certs": settings.verify_ssl_certs,
        "scope": settings.scope,
        "available_scopes": Scope::ALL,
    })
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Calculation Endpoint
/// =============================

async fn calculate(
    State(state): State<ApiState>,
    Json(form): Json<HabitForm>,
) -> (StatusCode, Json<ApiResponse>) {
    info!("Received calculation request");

    let today = chrono::Local::now().date_naive();

    match state.calculator.calculate(&form, today).await {
        Ok(calculation) => (StatusCode::OK, Json(ApiResponse::success(calculation))),
        Err(e) if e.is_validation() => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(e.to_string())),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Calculation failed: {}", e))),
        ),
    }
}

/// =============================
/// Analysis + Report Endpoints
/// =============================

async fn analysis(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let snapshot = state.calculator.board().snapshot().await;
    (StatusCode::OK, Json(ApiResponse::success(snapshot)))
}

async fn report(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    match state.calculator.copy_text().await {
        Some(text) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "text": text }))),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Nothing calculated yet".into())),
        ),
    }
}

/// =============================
/// Settings Endpoints
/// =============================

async fn get_settings(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let settings = state.calculator.settings().await;
    (StatusCode::OK, Json(ApiResponse::success(settings_view(&settings))))
}

async fn put_settings(
    State(state): State<ApiState>,
    Json(req): Json<SettingsRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let current = state.calculator.settings().await;

    let settings = Settings {
        giga_credentials: req
            .giga_credentials
            .map(|c| c.trim().to_string())
            .unwrap_or(current.giga_credentials),
        verify_ssl_certs: req.verify_ssl_certs,
        scope: req.scope,
    };

    match state.calculator.update_settings(settings.clone()).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::success(settings_view(&settings)))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to save settings: {}", e))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(calculator: Arc<HabitCalculator>) -> Router {
    let state = ApiState { calculator };

    Router::new()
        .route("/health", get(health))
        .route("/api/calculate", post(calculate))
        .route("/api/analysis", get(analysis))
        .route("/api/report", get(report))
        .route("/api/settings", get(get_settings).put(put_settings))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    calculator: Arc<HabitCalculator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(calculator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{result_channel, AnalysisBoard, GigaChatConnector, TaskDispatcher};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::runtime::Handle;
    use tower::ServiceExt;

    fn router() -> Router {
        let (tx, _rx) = result_channel();
        let dispatcher = TaskDispatcher::new(Arc::new(GigaChatConnector), tx, Handle::current());
        let calculator = HabitCalculator::new(dispatcher, AnalysisBoard::new(), Settings::default());
        create_router(Arc::new(calculator))
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, ApiResponse) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_calculate_endpoint() {
        let (status, response) = call(
            router(),
            post_json(
                "/api/calculate",
                serde_json::json!({
                    "price": "150",
                    "frequency": "3",
                    "period": "week",
                    "description": "Кофе"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data["projection"]["primary_total"], "23400");
        assert_eq!(data["projection"]["secondary_total"], "117000");
        assert_eq!(data["analysis"]["state"], "skipped");
        assert_eq!(data["report"]["bars"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_calculate_rejects_bad_input() {
        let (status, response) = call(
            router(),
            post_json(
                "/api/calculate",
                serde_json::json!({ "price": "abc", "frequency": "3", "period": "day" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Enter a valid price and frequency"));
    }

    #[tokio::test]
    async fn test_report_before_calculation() {
        let request = Request::get("/api/report").body(Body::empty()).unwrap();
        let (status, response) = call(router(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!response.success);
    }

    #[tokio::test]
    async fn test_settings_are_masked() {
        let app = router();
        let request = Request::put("/api/settings")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "giga_credentials": "secret-key",
                    "verify_ssl_certs": false,
                    "scope": "GIGACHAT_API_B2B"
                })
                .to_string(),
            ))
            .unwrap();
        let (status, _) = call(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::get("/api/settings").body(Body::empty()).unwrap();
        let (_, response) = call(app, request).await;
        let data = response.data.unwrap();
        assert_eq!(data["giga_credentials"], "********");
        assert_eq!(data["credentials_configured"], true);
        assert_eq!(data["scope"], "GIGACHAT_API_B2B");
    }
}
