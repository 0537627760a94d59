use std::sync::Arc;

use crate::{api::Caller, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use questboard_core::{cleanup::CleanupReport, completion::CompletionStatus};

/// `null` when the quest or its roster is unavailable.
async fn recompute_completion(
    Path(quest_id): Path<String>,
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> ApiResult<Json<Option<CompletionStatus>>> {
    let status = state.completion_service.recompute(&quest_id).await?;
    Ok(Json(status))
}

async fn sweep_references(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> ApiResult<Json<CleanupReport>> {
    let report = state.cleanup_service.sweep().await?;
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quests/{id}/completion", post(recompute_completion))
        .route("/maintenance/cleanup", post(sweep_references))
}
