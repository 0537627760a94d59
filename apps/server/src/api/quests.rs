use std::sync::Arc;

use crate::{api::Caller, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use questboard_core::quests::{NewQuest, Quest, QuestStatus, QuestUpdate};
use serde::Deserialize;

async fn list_quests(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Quest>>> {
    let quests = state.quest_service.list_quests()?;
    Ok(Json(quests))
}

async fn create_quest(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(mut new_quest): Json<NewQuest>,
) -> ApiResult<(StatusCode, Json<Quest>)> {
    if new_quest.organizer_uid.trim().is_empty() {
        new_quest.organizer_uid = caller.uid().to_string();
    }
    caller.ensure_is(&new_quest.organizer_uid)?;
    let quest = state.quest_service.create_quest(new_quest).await?;
    Ok((StatusCode::CREATED, Json(quest)))
}

async fn get_quest(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Quest>> {
    let quest = state.quest_service.get_quest(&id)?;
    Ok(Json(quest))
}

async fn update_quest(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(mut update): Json<QuestUpdate>,
) -> ApiResult<Json<Quest>> {
    update.id = id;
    let quest = state
        .quest_service
        .update_quest(caller.uid(), update)
        .await?;
    Ok(Json(quest))
}

async fn delete_quest(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<StatusCode> {
    state.quest_service.delete_quest(&id, caller.uid()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_organizer_quests(
    Path(uid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Quest>>> {
    let quests = state.quest_service.list_quests_by_organizer(&uid)?;
    Ok(Json(quests))
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn change_status(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Quest>> {
    let status: QuestStatus = body.status.parse()?;
    let quest = state
        .quest_service
        .change_status(&id, caller.uid(), status)
        .await?;
    Ok(Json(quest))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quests", get(list_quests).post(create_quest))
        .route(
            "/quests/{id}",
            get(get_quest).put(update_quest).delete(delete_quest),
        )
        .route("/quests/{id}/status", put(change_status))
        .route("/organizers/{uid}/quests", get(list_organizer_quests))
}
