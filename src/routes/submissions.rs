use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::archive::{self, ArchiveReceipt, ArchivedSubmissionDetail};
use crate::attachments::{AttachmentInput, AttachmentParent};
use crate::changelog::{self, ChangeLogView};
use crate::error::{AppError, AppResult};
use crate::models::{ArchivedSubmission, Attachment, DocumentationLink, FollowupTask, Squad};
use crate::squads;
use crate::state::AppState;
use crate::submissions::{
    self, FollowupInput, FollowupPatch, FollowupTaskDetail, SubmissionDetail, SubmissionFilter,
    SubmissionInput, SubmissionSummary, UpdateOutcome,
};
use crate::utils::dates::parse_datetime;
use crate::utils::json::{classify_nullable, NullableValue};

pub async fn list_submissions(
    State(state): State<AppState>,
    Query(filter): Query<SubmissionFilter>,
) -> AppResult<Json<Vec<SubmissionSummary>>> {
    let mut conn = state.db()?;
    let rows = submissions::list_submissions(&mut conn, &state.config.sla, &filter)?;
    Ok(Json(rows))
}

pub async fn create_submission(
    State(state): State<AppState>,
    Json(payload): Json<SubmissionInput>,
) -> AppResult<(StatusCode, Json<SubmissionDetail>)> {
    let mut conn = state.db()?;
    let detail = submissions::create_submission(&mut conn, &state.config.sla, payload)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
) -> AppResult<Json<SubmissionDetail>> {
    let mut conn = state.db()?;
    let detail = submissions::get_submission(&mut conn, &state.config.sla, &submission_id)?;
    Ok(Json(detail))
}

pub async fn update_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
    Json(payload): Json<SubmissionInput>,
) -> AppResult<Json<UpdateOutcome>> {
    let mut conn = state.db()?;
    let outcome = submissions::update_submission(
        &mut conn,
        &state.backups,
        &state.config.sla,
        &state.config.change_log_actor,
        &submission_id,
        payload,
    )?;
    Ok(Json(outcome))
}

pub async fn archive_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
) -> AppResult<Json<ArchiveReceipt>> {
    let mut conn = state.db()?;
    let receipt = archive::archive_submission(&mut conn, &state.backups, &submission_id)?;
    Ok(Json(receipt))
}

pub async fn submission_history(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
) -> AppResult<Json<Vec<ChangeLogView>>> {
    let mut conn = state.db()?;
    let entries = changelog::history(&mut conn, &submission_id)?;
    Ok(Json(entries))
}

pub async fn add_followup_task(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
    Json(payload): Json<FollowupInput>,
) -> AppResult<(StatusCode, Json<FollowupTaskDetail>)> {
    let mut conn = state.db()?;
    let task = submissions::add_followup_task(&mut conn, &submission_id, payload)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_followup_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<Json<FollowupTask>> {
    let description = match classify_nullable(body.get("description"))
        .map_err(AppError::bad_request)?
    {
        NullableValue::Omitted => None,
        NullableValue::Null => return Err(AppError::bad_request("description cannot be null")),
        NullableValue::String(value) => Some(value),
    };
    let action_notes = classify_nullable(body.get("action_notes"))
        .map_err(AppError::bad_request)?
        .into_patch();
    let due_date = classify_nullable(body.get("due_date"))
        .map_err(AppError::bad_request)?
        .into_patch()
        .map(|value| value.as_deref().map(parse_datetime).transpose())
        .transpose()?;
    let is_completed = match body.get("is_completed") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(flag)) => Some(*flag),
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "is_completed must be a boolean, got {other}"
            )))
        }
    };

    let mut conn = state.db()?;
    let task = submissions::update_followup_task(
        &mut conn,
        &task_id,
        FollowupPatch {
            description,
            action_notes,
            is_completed,
            due_date,
        },
    )?;
    Ok(Json(task))
}

#[derive(Deserialize)]
pub struct AddLinkRequest {
    pub url: String,
}

pub async fn add_documentation_link(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
    Json(payload): Json<AddLinkRequest>,
) -> AppResult<(StatusCode, Json<DocumentationLink>)> {
    let mut conn = state.db()?;
    let link = submissions::add_documentation_link(&mut conn, &submission_id, &payload.url)?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn list_doc_links(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let mut conn = state.db()?;
    let links = submissions::distinct_doc_links(&mut conn)?;
    Ok(Json(links))
}

#[derive(Deserialize)]
pub struct CreateAttachmentRequest {
    pub submission_id: Option<String>,
    pub followup_task_id: Option<String>,
    pub side_quest_id: Option<String>,
    pub side_quest_followup_id: Option<String>,
    #[serde(flatten)]
    pub attachment: AttachmentInput,
}

pub async fn create_attachment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAttachmentRequest>,
) -> AppResult<(StatusCode, Json<Attachment>)> {
    let parent = AttachmentParent::from_refs(
        payload.submission_id,
        payload.followup_task_id,
        payload.side_quest_id,
        payload.side_quest_followup_id,
    )?;
    let mut conn = state.db()?;
    let attachment = submissions::add_attachment(&mut conn, parent, payload.attachment)?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn list_squads(State(state): State<AppState>) -> AppResult<Json<Vec<Squad>>> {
    let mut conn = state.db()?;
    let rows = squads::list_squads(&mut conn)?;
    Ok(Json(rows))
}

pub async fn list_archived_submissions(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ArchivedSubmission>>> {
    let mut conn = state.db()?;
    let rows = archive::list_archived_submissions(&mut conn)?;
    Ok(Json(rows))
}

pub async fn get_archived_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
) -> AppResult<Json<ArchivedSubmissionDetail>> {
    let mut conn = state.db()?;
    let detail = archive::get_archived_submission(&mut conn, &submission_id)?;
    Ok(Json(detail))
}
