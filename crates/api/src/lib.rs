//! Movement Coach API Server
//!
//! HTTP surface of the movement analysis engine.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod routes;

pub use config::{AppConfig, LoggingConfig, MockConfig, ServerConfig};

use analysis_engine::{EngineConfig, EngineError, Orchestrator};
use pose_frame::StaticFrameSource;
use pose_pipeline::ScriptedDetector;
use storage::InMemoryResultStore;

/// Server start-up errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Engine setup failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state shared across handlers
pub struct AppState {
    pub engine: Orchestrator,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Renders `/metrics` when a recorder is installed
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(engine: Orchestrator) -> Self {
        Self {
            engine,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            prometheus: None,
        }
    }

    /// Engine backed by the synthetic frame source and detector
    pub fn mock(engine: EngineConfig, mock: &MockConfig) -> Result<Self, ApiError> {
        warn!("No video decoder or pose model configured. Using mock implementation.");
        let store = Arc::new(InMemoryResultStore::new(engine.history.clone()));
        let orchestrator = Orchestrator::new(
            engine,
            Arc::new(StaticFrameSource::new(mock.frames)),
            Arc::new(ScriptedDetector::squat_cycle(mock.squat_period)),
            store,
        )?;
        Ok(Self::new(orchestrator))
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub supported_movements: Vec<String>,
    pub engine: EngineStatus,
}

#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub cached_results: usize,
    pub in_flight: usize,
    pub history_records: usize,
}

/// Create the application router
pub fn create_router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/analyses", post(routes::analyses::post_analysis))
        .route("/api/v1/analyses/history", get(routes::analyses::get_history))
        .route("/metrics", get(routes::metrics::get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut supported_movements: Vec<String> = state
        .engine
        .supported_movements()
        .iter()
        .map(|m| m.as_str().to_string())
        .collect();
    supported_movements.sort();

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        supported_movements,
        engine: EngineStatus {
            cached_results: state.engine.cache_len(),
            in_flight: state.engine.in_flight_len(),
            history_records: state.engine.history_count().await.unwrap_or(0),
        },
    };

    Json(response)
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| ApiError::Logging(format!("unknown log level '{}'", config.level)))?;

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    installed.map_err(|e| ApiError::Logging(e.to_string()))
}

/// Run the server
pub async fn run_server(config: AppConfig) -> Result<(), ApiError> {
    let mut state = AppState::mock(config.engine.clone(), &config.mock)?;
    if config.server.metrics {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| ApiError::Metrics(e.to_string()))?;
        state = state.with_prometheus(handle);
    }

    let app = create_router(Arc::new(RwLock::new(state)));

    info!("Starting API server on {}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let mock = MockConfig {
            frames: 30,
            squat_period: 30,
        };
        let state = AppState::mock(EngineConfig::default(), &mock).unwrap();
        create_router(Arc::new(RwLock::new(state)))
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn analyze(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analyses")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/api/v1/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["engine"]["cached_results"], 0);
        assert_eq!(
            body["supported_movements"],
            serde_json::json!(["baseball_pitch", "lunge", "squat"])
        );
    }

    #[tokio::test]
    async fn test_analyze_squat() {
        let response = app()
            .oneshot(analyze(r#"{"video_id": "clip-1", "movement_type": "squat"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fingerprint"], "clip-1:squat");
        assert!(body["analysis"]["overall_score"].as_u64().unwrap() <= 100);
        assert_eq!(body["frames_processed"], 30);
    }

    #[tokio::test]
    async fn test_failures_use_success_flag() {
        let app = app();

        let response = app
            .clone()
            .oneshot(analyze(r#"{"video_id": "clip-1", "movement_type": "golf_swing"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["kind"], "not_implemented");

        let response = app
            .oneshot(analyze(r#"{"video_id": "clip-1", "movement_type": "cartwheel"}"#))
            .await
            .unwrap();
        let body = json(response).await;
        assert_eq!(body["errors"][0]["kind"], "unsupported_movement_type");
    }

    #[tokio::test]
    async fn test_history_after_analysis() {
        let app = app();
        app.clone()
            .oneshot(analyze(
                r#"{"video_id": "clip-2", "user_id": "ana", "movement_type": "squat"}"#,
            ))
            .await
            .unwrap();

        let response = app.oneshot(get("/api/v1/analyses/history?limit=5")).await.unwrap();
        let body = json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["video_id"], "clip-2");
        assert_eq!(body["data"][0]["user_id"], "ana");
    }

    #[tokio::test]
    async fn test_history_for_one_video() {
        let app = app();
        for body in [
            r#"{"video_id": "clip-a", "user_id": "ana", "movement_type": "squat"}"#,
            r#"{"video_id": "clip-b", "user_id": "ana", "movement_type": "squat"}"#,
            r#"{"video_id": "clip-a", "user_id": "ben", "movement_type": "squat"}"#,
        ] {
            app.clone().oneshot(analyze(body)).await.unwrap();
        }

        let response = app
            .clone()
            .oneshot(get("/api/v1/analyses/history?video_id=clip-a"))
            .await
            .unwrap();
        let body = json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["user_id"], "ben");
        assert_eq!(body["data"][1]["user_id"], "ana");

        let response = app.oneshot(get("/api/v1/analyses/history")).await.unwrap();
        assert_eq!(json(response).await["count"], 3);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = app().oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
