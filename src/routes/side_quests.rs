use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::archive::{self, ArchiveReceipt, ArchivedSideQuestDetail};
use crate::error::AppResult;
use crate::models::ArchivedSideQuest;
use crate::side_quests::{
    self, SideQuestDetail, SideQuestFilter, SideQuestFollowupDetail, SideQuestFollowupInput,
    SideQuestInput, SideQuestSummary, SideQuestUpdate,
};
use crate::state::AppState;
use crate::status::SideQuestStatus;

pub async fn list_side_quests(
    State(state): State<AppState>,
    Query(filter): Query<SideQuestFilter>,
) -> AppResult<Json<Vec<SideQuestSummary>>> {
    let mut conn = state.db()?;
    let rows = side_quests::list_side_quests(&mut conn, &state.config.sla, &filter)?;
    Ok(Json(rows))
}

pub async fn create_side_quest(
    State(state): State<AppState>,
    Json(payload): Json<SideQuestInput>,
) -> AppResult<(StatusCode, Json<SideQuestDetail>)> {
    let mut conn = state.db()?;
    let detail = side_quests::create_side_quest(&mut conn, &state.config.sla, payload)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_side_quest(
    State(state): State<AppState>,
    Path(side_quest_id): Path<String>,
) -> AppResult<Json<SideQuestDetail>> {
    let mut conn = state.db()?;
    let detail = side_quests::get_side_quest(&mut conn, &state.config.sla, &side_quest_id)?;
    Ok(Json(detail))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn update_side_quest_status(
    State(state): State<AppState>,
    Path(side_quest_id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<SideQuestUpdate>> {
    let next: SideQuestStatus = payload.status.parse()?;
    let mut conn = state.db()?;
    let outcome = side_quests::update_side_quest_status(
        &mut conn,
        &state.backups,
        &state.config.sla,
        &side_quest_id,
        next,
    )?;
    Ok(Json(outcome))
}

pub async fn add_side_quest_followup(
    State(state): State<AppState>,
    Path(side_quest_id): Path<String>,
    Json(payload): Json<SideQuestFollowupInput>,
) -> AppResult<(StatusCode, Json<SideQuestFollowupDetail>)> {
    let mut conn = state.db()?;
    let followup = side_quests::add_side_quest_followup(&mut conn, &side_quest_id, payload)?;
    Ok((StatusCode::CREATED, Json(followup)))
}

pub async fn archive_side_quest(
    State(state): State<AppState>,
    Path(side_quest_id): Path<String>,
) -> AppResult<Json<ArchiveReceipt>> {
    let mut conn = state.db()?;
    let receipt = archive::archive_side_quest(&mut conn, &state.backups, &side_quest_id)?;
    Ok(Json(receipt))
}

pub async fn list_archived_side_quests(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ArchivedSideQuest>>> {
    let mut conn = state.db()?;
    let rows = archive::list_archived_side_quests(&mut conn)?;
    Ok(Json(rows))
}

pub async fn get_archived_side_quest(
    State(state): State<AppState>,
    Path(side_quest_id): Path<String>,
) -> AppResult<Json<ArchivedSideQuestDetail>> {
    let mut conn = state.db()?;
    let detail = archive::get_archived_side_quest(&mut conn, &side_quest_id)?;
    Ok(Json(detail))
}
