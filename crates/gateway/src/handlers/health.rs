//! Health check handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub upload_dir: CheckResult,
    pub providers: Vec<String>,
    pub local_fallback: bool,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to PDF Intellect API".to_string(),
        version: pdfintellect_common::VERSION.to_string(),
    })
}

/// Liveness check - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness check - the upload directory must be usable
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let upload_check = if state.store.is_writable().await {
        CheckResult {
            status: "up".to_string(),
            error: None,
        }
    } else {
        CheckResult {
            status: "down".to_string(),
            error: Some(format!(
                "Upload directory {} is missing or read-only",
                state.store.root().display()
            )),
        }
    };

    let all_healthy = upload_check.status == "up";
    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks {
                upload_dir: upload_check,
                providers: state.service.provider_names(),
                local_fallback: true,
            },
        }),
    )
}

/// Prometheus exposition
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
