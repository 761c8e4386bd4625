// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoMatrícula Server - property boundary reconstruction over HTTP.
//!
//! Accepts the output of the extraction oracle (or deed text), rebuilds the
//! parcel polygon, scores it, and keeps projects with their pending revision.
//! The server never calls an LLM itself.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/parcel/compute` - Segments to polygon, metrics and quality
//! - `POST /api/v1/parcel/extraction` - Oracle extraction reply to outcome
//! - `POST /api/v1/parcel/memorial` - Deed text to outcome
//! - `POST /api/v1/parcel/batch` - Many extractions in parallel
//! - `POST /api/v1/georef/utm` - UTM reading to WGS84
//! - `POST /api/v1/export/{dxf,kml}` - File download for a segment list
//! - `POST /api/v1/projects`, `GET /api/v1/projects/:id` - Project store
//! - `POST /api/v1/projects/:id/revisions[/:proposal_id/{confirm,reject}]` - Revisions
//! - `GET /api/v1/projects/:id/export/{dxf,kml}` - Project downloads

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use geomatricula_processing::{
    AuditSink, InMemoryRepository, ProjectRepository, TracingAuditSink,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::{Config, StoreBackend};
use services::DiskRepository;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ProjectRepository>,
    pub audit: Arc<dyn AuditSink>,
    pub config: Arc<Config>,
    /// Serializes load-modify-save of project records
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, repo: Arc<dyn ProjectRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            repo,
            audit,
            config: Arc::new(config),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// State code for zone inference: the request's, else the configured one.
    pub fn state_hint(&self, requested: Option<String>) -> Option<String> {
        requested
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .or_else(|| self.config.default_state.clone())
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router with every endpoint and the middleware stack.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Stateless parcel endpoints
        .route("/api/v1/parcel/compute", post(routes::parcel::compute))
        .route("/api/v1/parcel/extraction", post(routes::parcel::extraction))
        .route("/api/v1/parcel/memorial", post(routes::parcel::memorial))
        .route("/api/v1/parcel/batch", post(routes::parcel::batch))
        .route("/api/v1/georef/utm", post(routes::georef::utm))
        .route("/api/v1/export/dxf", post(routes::export::dxf))
        .route("/api/v1/export/kml", post(routes::export::kml))
        // Projects and revisions
        .route("/api/v1/projects", post(routes::projects::create))
        .route("/api/v1/projects/:id", get(routes::projects::get))
        .route("/api/v1/projects/:id/revisions", post(routes::projects::revise))
        .route(
            "/api/v1/projects/:id/revisions/:proposal_id/confirm",
            post(routes::projects::confirm),
        )
        .route(
            "/api/v1/projects/:id/revisions/:proposal_id/reject",
            post(routes::projects::reject),
        )
        .route(
            "/api/v1/projects/:id/export/dxf",
            get(routes::projects::export_project_dxf),
        )
        .route(
            "/api/v1/projects/:id/export/kml",
            get(routes::projects::export_project_kml),
        )
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_body_mb * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,geomatricula_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        store_backend = ?config.store_backend,
        store_dir = %config.store_dir,
        max_body_mb = config.max_body_mb,
        worker_threads = config.worker_threads,
        default_state = ?config.default_state,
        "Starting GeoMatrícula Server"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    let repo: Arc<dyn ProjectRepository> = match config.store_backend {
        StoreBackend::Disk => Arc::new(DiskRepository::new(&config.store_dir)),
        StoreBackend::Memory => Arc::new(InMemoryRepository::new()),
    };
    let port = config.port;
    let app = build_router(AppState::new(config, repo, Arc::new(TracingAuditSink)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use geomatricula_processing::MemoryAuditSink;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> (AppState, Arc<MemoryAuditSink>) {
        let audit = Arc::new(MemoryAuditSink::new());
        let state = AppState::new(
            Config::for_tests(),
            Arc::new(InMemoryRepository::new()),
            audit.clone(),
        );
        (state, audit)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn square(side: f64) -> Value {
        json!([
            {"index": 1, "bearingRaw": "Az 90°", "distanceM": side},
            {"index": 2, "bearingRaw": "Az 0°", "distanceM": side},
            {"index": 3, "bearingRaw": "Az 270°", "distanceM": side},
            {"index": 4, "bearingRaw": "Az 180°", "distanceM": side}
        ])
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_compute_square() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/parcel/compute",
            Some(json!({"segments": square(20.0), "areaDeclared": "400,00", "extractionMethod": "regex"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["areaComputed"].as_f64().unwrap() - 400.0).abs() < 1e-6);
        assert_eq!(body["confidenceScore"], 95);
        assert_eq!(body["vertices"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_compute_rejects_non_array() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/parcel/compute",
            Some(json!({"segments": {"index": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_PAYLOAD");
    }

    #[tokio::test]
    async fn test_extraction_from_raw_reply() {
        let (state, _) = test_state();
        let app = build_router(state);
        let reply = format!(
            "Aqui está:\n```json\n{}\n```",
            json!({"matricula": "88", "areaDeclared": 900, "segments": square(30.0)})
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/parcel/extraction?method=ai")
            .body(Body::from(reply))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!((body["result"]["areaComputed"].as_f64().unwrap() - 900.0).abs() < 1e-6);
        assert_eq!(body["mapCoordinates"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_georef_rejects_out_of_range() {
        let (state, _) = test_state();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/georef/utm",
            Some(json!({"easting": 333000, "northing": 7394000, "zone": 23})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["location"]["lat"].as_f64().unwrap() + 23.5558).abs() < 1e-3);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/georef/utm",
            Some(json!({"easting": 50, "northing": 7394000, "zone": 23})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["location"].is_null());
    }

    #[tokio::test]
    async fn test_export_dxf_download() {
        let (state, _) = test_state();
        let app = build_router(state);
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/export/dxf")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"projectName": "Lote 7", "segments": square(10.0)}).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Lote_7.dxf\""
        );
    }

    #[tokio::test]
    async fn test_project_revision_flow() {
        let (state, audit) = test_state();
        let app = build_router(state);

        let (status, project) = send(
            &app,
            "POST",
            "/api/v1/projects",
            Some(json!({"extraction": {"matricula": "501", "areaDeclared": 400, "segments": square(20.0)}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(project["title"], "Matrícula 501");
        let id = project["id"].as_str().unwrap().to_string();

        // risky revision stays pending
        let revision = json!({
            "response": "Ampliando o lote para 25 m.",
            "updatedSegments": square(25.0),
            "requiresConfirmation": true,
            "changeDescription": "20 m -> 25 m"
        });
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/projects/{id}/revisions"),
            Some(revision),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending_confirmation");
        assert!((body["project"]["result"]["areaComputed"].as_f64().unwrap() - 400.0).abs() < 1e-6);
        let proposal = body["proposalId"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/projects/{id}/revisions/deadbeef/confirm"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PROPOSAL_MISMATCH");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/projects/{id}/revisions/{proposal}/confirm"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "confirmed");
        assert!((body["project"]["result"]["areaComputed"].as_f64().unwrap() - 625.0).abs() < 1e-6);
        assert!(body["project"].get("pending").is_none());

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, id);

        let (status, body) = send(&app, "GET", &format!("/api/v1/projects/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["result"]["areaComputed"].as_f64().unwrap() - 625.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_partial_revision_rejected() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (_, project) = send(
            &app,
            "POST",
            "/api/v1/projects",
            Some(json!({"extraction": {"segments": square(20.0)}})),
        )
        .await;
        let id = project["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/projects/{id}/revisions"),
            Some(json!({"updatedSegments": [{"index": 2, "bearingRaw": "Az 0°", "distanceM": 21}]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "PARTIAL_REVISION");
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let (state, _) = test_state();
        let app = build_router(state);
        let (status, body) = send(&app, "GET", "/api/v1/projects/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
