use std::sync::Arc;

use crate::{api::Caller, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use questboard_core::profiles::{ProfileMerge, UserProfile};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedResponse {
    quest_id: String,
    changed: bool,
}

/// `null` when the profile has not been provisioned yet.
async fn get_profile(
    Path(uid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Option<UserProfile>>> {
    let profile = state.profile_service.get_profile(&uid)?;
    Ok(Json(profile))
}

async fn merge_profile(
    Path(uid): Path<String>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(mut merge): Json<ProfileMerge>,
) -> ApiResult<Json<UserProfile>> {
    caller.ensure_is(&uid)?;
    merge.id = uid;
    let profile = state.profile_service.create_or_merge(merge).await?;
    Ok(Json(profile))
}

async fn save_quest(
    Path((uid, quest_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<SavedResponse>> {
    caller.ensure_is(&uid)?;
    let changed = state.profile_service.add_to_saved(&uid, &quest_id).await?;
    Ok(Json(SavedResponse { quest_id, changed }))
}

async fn unsave_quest(
    Path((uid, quest_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<SavedResponse>> {
    caller.ensure_is(&uid)?;
    let changed = state
        .profile_service
        .remove_from_saved(&uid, &quest_id)
        .await?;
    Ok(Json(SavedResponse { quest_id, changed }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profiles/{uid}", get(get_profile).put(merge_profile))
        .route(
            "/profiles/{uid}/saved/{quest_id}",
            put(save_quest).delete(unsave_quest),
        )
}
