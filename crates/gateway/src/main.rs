//! PDF Intellect API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - PDF upload and static serving
//! - Summaries, chat, simplification and mind maps
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pdfintellect_common::{
    config::{AppConfig, ObservabilityConfig},
    metrics,
    service::AnalysisService,
    UploadStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<AnalysisService>,
    pub store: UploadStore,
    pub metrics: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting PDF Intellect API Gateway v{}",
        pdfintellect_common::VERSION
    );

    // Initialize metrics
    let metrics_handle = PrometheusBuilder::new()
        .set_buckets(metrics::LATENCY_BUCKETS)
        .context("Invalid histogram buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    metrics::register_metrics();

    // Prepare upload storage
    let store = UploadStore::new(config.server.upload_dir.clone());
    store
        .ensure_dir()
        .await
        .context("Failed to create upload directory")?;
    info!(dir = %store.root().display(), "Upload directory ready");

    // Build the analysis service and its provider chain
    let service = AnalysisService::from_config(&config).context("Failed to build analysis service")?;
    if service.provider_names().is_empty() {
        info!("No external providers configured, all answers come from the local engine");
    }

    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        service: Arc::new(service),
        store,
        metrics: metrics_handle,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let server = &config.server;

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let mut api_routes = Router::new()
        .route("/upload", post(handlers::documents::upload))
        .route("/summarize", post(handlers::analysis::summarize))
        .route("/chat", post(handlers::analysis::chat))
        .route("/simplify", post(handlers::analysis::simplify))
        .route("/generate-mindmap", post(handlers::analysis::generate_mindmap));

    let rate_limit = &config.rate_limit;
    if rate_limit.enabled {
        if let Some(limiter) =
            middleware::rate_limit::create_rate_limiter(rate_limit.requests_per_minute, rate_limit.burst)
        {
            api_routes = api_routes.route_layer(axum::middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit::rate_limit_middleware,
            ));
        }
    }

    // Compose the app
    Router::new()
        // Health endpoints (not rate limited)
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .merge(api_routes)
        .route_layer(axum::middleware::from_fn(middleware::track_requests))
        .nest_service("/pdfs", ServeDir::new(&server.upload_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_upload_size + MULTIPART_OVERHEAD_BYTES))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origins))
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::path::Path;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdfintellect-test-boundary";

    fn test_app(dir: &Path) -> Router {
        let mut config = AppConfig::default();
        config.server.upload_dir = dir.to_path_buf();
        config.analysis.seed = Some(7);
        config.rate_limit.enabled = false;

        let service = AnalysisService::with_providers(&config, Vec::new());
        let state = AppState {
            store: UploadStore::new(dir),
            service: Arc::new(service),
            config: Arc::new(config),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        };
        create_router(state)
    }

    fn multipart_upload(filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "healthy");

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(read_json(response).await["message"], "Welcome to PDF Intellect API");
    }

    #[tokio::test]
    async fn test_ready_reports_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["providers"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(json_post("/chat", json!({ "filename": "nope.pdf", "message": "hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "DOCUMENT_NOT_FOUND");
        assert_eq!(body["error"]["message"], "File not found: nope.pdf");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(json_post("/generate-mindmap", json!({ "filename": "../secret.pdf" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(multipart_upload("notes.txt", b"plain text"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_upload_then_analyze() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app
            .clone()
            .oneshot(multipart_upload("my report.pdf", b"not really a pdf"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["filename"], "my_report.pdf");
        assert_eq!(body["status"], "success");
        assert!(dir.path().join("my_report.pdf").exists());

        // Unreadable PDFs still produce a textual result
        let response = app
            .clone()
            .oneshot(json_post("/summarize", json!({ "filename": "my_report.pdf" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["complexity"], "standard");
        assert_eq!(body["source"], "local");
        assert!(body["summary"]
            .as_str()
            .unwrap()
            .starts_with("Could not open the PDF file."));

        let response = app
            .clone()
            .oneshot(json_post(
                "/chat",
                json!({ "filename": "my_report.pdf", "message": "What is in this file?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "success");
        assert!(!body["response"].as_str().unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(json_post("/generate-mindmap", json!({ "filename": "my_report.pdf" })))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["mindmap"]["id"], "root");

        let response = app
            .oneshot(Request::get("/pdfs/my_report.pdf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_simplify_text_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let response = app
            .clone()
            .oneshot(json_post("/simplify", json!({ "text": "We utilize numerous tools." })))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["simplified"], "We use many tools.");
        assert_eq!(body["status"], "success");

        let response = app
            .oneshot(json_post("/simplify", json!({})))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["simplified"], "No text provided for simplification.");
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_api_routes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.server.upload_dir = dir.path().to_path_buf();
        config.rate_limit.requests_per_minute = 1;
        config.rate_limit.burst = 1;

        let state = AppState {
            store: UploadStore::new(dir.path()),
            service: Arc::new(AnalysisService::with_providers(&config, Vec::new())),
            config: Arc::new(config),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        };
        let app = create_router(state);

        let first = app
            .clone()
            .oneshot(json_post("/simplify", json!({ "text": "Short text here." })))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .clone()
            .oneshot(json_post("/simplify", json!({ "text": "Short text here." })))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let health = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }
}
