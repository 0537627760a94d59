use std::sync::Arc;

use crate::{api::Caller, error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use questboard_core::badges::{Badge, BadgeStats, NewBadge};
use serde::Deserialize;

async fn give_badge(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(new_badge): Json<NewBadge>,
) -> ApiResult<(StatusCode, Json<Badge>)> {
    let badge = state.badge_service.give_badge(caller.uid(), new_badge).await?;
    Ok((StatusCode::CREATED, Json(badge)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BadgeFilter {
    giver_uid: Option<String>,
    receiver_uid: Option<String>,
}

/// Giver filter wins when both are supplied.
async fn list_quest_badges(
    Path(quest_id): Path<String>,
    Query(filter): Query<BadgeFilter>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Badge>>> {
    let badges = match (filter.giver_uid, filter.receiver_uid) {
        (Some(giver), _) => state.badge_service.get_badges_given(&quest_id, &giver)?,
        (None, Some(receiver)) => state
            .badge_service
            .get_badges_received(&quest_id, &receiver)?,
        (None, None) => state.badge_service.get_badges_for_quest(&quest_id)?,
    };
    Ok(Json(badges))
}

async fn badge_stats(
    Path(uid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BadgeStats>> {
    let stats = state.badge_service.get_user_badge_stats(&uid)?;
    Ok(Json(stats))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/badges", post(give_badge))
        .route("/quests/{id}/badges", get(list_quest_badges))
        .route("/profiles/{uid}/badge-stats", get(badge_stats))
}
