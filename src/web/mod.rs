pub mod extractors;
pub mod handlers;

use crate::models::ModelRegistry;
use crate::storage::StaticStore;
use crate::utils::error::VisionError;
use crate::{Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub models: Arc<ModelRegistry>,
    pub store: StaticStore,
}

pub async fn serve(config: Config) -> Result<()> {
    let models = Arc::new(ModelRegistry::load(&config));
    let store = StaticStore::new(&config.static_dir)?;

    let app = create_app(config.clone(), models, store);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        VisionError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /api/detect-optic-disc  - Optic disc detection (multipart upload)");
    tracing::info!("  POST /api/diagnosis-glaucoma - Glaucoma screening (multipart upload)");
    tracing::info!("  GET  /static/{{filename}}      - Stored images");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /api/info               - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        VisionError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| VisionError::Internal(format!("Server failed: {}", e)))?;

    Ok(())
}

pub fn create_app(config: Config, models: Arc<ModelRegistry>, store: StaticStore) -> Router {
    let state = AppState {
        models,
        store: store.clone(),
        config: config.clone(),
    };

    Router::new()
        .route("/api/detect-optic-disc", post(handlers::detect_optic_disc))
        .route("/api/diagnosis-glaucoma", post(handlers::diagnosis_glaucoma))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .nest_service("/static", ServeDir::new(store.dir()))
        .layer(DefaultBodyLimit::max(config.server_config.max_request_size))
        .layer(RequestBodyLimitLayer::new(config.server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server_config.request_timeout,
        )))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.models.stats();
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "models": {
            "detector_loaded": stats.detector_loaded,
            "classifier_loaded": stats.classifier_loaded,
        }
    }))
}

/// Service information endpoint
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "Retina Vision Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "models": state.models.stats(),
        "dev_mode": state.config.dev_mode,
    }))
}
