//! Analysis Routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use analysis_engine::{AnalysisOptions, AnalysisResult};
use pose_frame::VideoHandle;
use storage::AnalysisRecord;

use crate::AppState;

/// Body of an analysis request
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub video_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Movement name, e.g. `squat` or `baseball_pitch`
    pub movement_type: String,
    #[serde(default)]
    pub options: AnalysisOptions,
}

/// Run an analysis. Failures are reported in the body, not the status code.
pub async fn post_analysis(
    State(state): State<Arc<RwLock<AppState>>>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<AnalysisResult> {
    let engine = state.read().await.engine.clone();

    let video = VideoHandle {
        video_id: request.video_id,
        user_id: request.user_id,
    };
    let result = engine
        .analyze_named(video, &request.movement_type, request.options)
        .await;

    Json(result)
}

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Restrict to one video
    #[serde(default)]
    pub video_id: Option<String>,
}

fn default_limit() -> usize {
    50
}

/// Response for the history endpoint
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<AnalysisRecord>,
    pub count: usize,
}

/// Most recent analyses first, optionally for one video
pub async fn get_history(
    State(state): State<Arc<RwLock<AppState>>>,
    Query(params): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let engine = state.read().await.engine.clone();
    let limit = params.limit.min(500);

    let lookup = match &params.video_id {
        Some(video_id) => engine.video_history(video_id, limit).await,
        None => engine.history(limit).await,
    };
    let data = match lookup {
        Ok(data) => data,
        Err(e) => {
            warn!("History lookup failed: {}", e);
            Vec::new()
        }
    };

    Json(HistoryResponse {
        count: data.len(),
        data,
    })
}
