use std::{collections::BTreeMap, sync::Arc};

use crate::{api::Caller, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use questboard_core::{
    join_requests::{JoinRequestState, JoinTransition, NewJoinRequest},
    quests::JoinRequest,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequestBody {
    requester_name: String,
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinStateResponse {
    quest_id: String,
    requester_uid: String,
    state: JoinRequestState,
}

async fn request_to_join(
    Path(quest_id): Path<String>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<JoinRequestBody>,
) -> ApiResult<Json<JoinTransition>> {
    let transition = state
        .join_request_service
        .request_to_join(NewJoinRequest {
            quest_id,
            requester_uid: caller.0,
            requester_name: body.requester_name,
            message: body.message,
        })
        .await?;
    Ok(Json(transition))
}

async fn pending_requests(
    Path(quest_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BTreeMap<String, JoinRequest>>> {
    let pending = state.join_request_service.pending_requests(&quest_id)?;
    Ok(Json(pending))
}

async fn get_state(
    Path((quest_id, requester_uid)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<JoinStateResponse>> {
    let join_state = state
        .join_request_service
        .get_state(&quest_id, &requester_uid)?;
    Ok(Json(JoinStateResponse {
        quest_id,
        requester_uid,
        state: join_state,
    }))
}

async fn approve(
    Path((quest_id, requester_uid)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<JoinTransition>> {
    let transition = state
        .join_request_service
        .approve(&quest_id, caller.uid(), &requester_uid)
        .await?;
    Ok(Json(transition))
}

async fn reject(
    Path((quest_id, requester_uid)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<JoinTransition>> {
    let transition = state
        .join_request_service
        .reject(&quest_id, caller.uid(), &requester_uid)
        .await?;
    Ok(Json(transition))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/quests/{id}/join-requests",
            get(pending_requests).post(request_to_join),
        )
        .route("/quests/{id}/join-requests/{uid}", get(get_state))
        .route("/quests/{id}/join-requests/{uid}/approve", post(approve))
        .route("/quests/{id}/join-requests/{uid}/reject", post(reject))
}
