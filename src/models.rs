use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = squads)]
pub struct Squad {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = squads)]
pub struct NewSquad {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = submissions)]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_squad: String,
    pub pic: String,
    pub submission_type: String,
    pub submission_date: NaiveDateTime,
    pub review_date: Option<NaiveDateTime>,
    pub decision_date: Option<NaiveDateTime>,
    pub status: String,
    pub decision: Option<String>,
    pub mitigation_notes: Option<String>,
    pub adr_number: Option<String>,
    pub notes: Option<String>,
    pub sla_duration_workdays: i32,
    pub sla_target_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = submissions)]
pub struct NewSubmission {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_squad: String,
    pub pic: String,
    pub submission_type: String,
    pub submission_date: NaiveDateTime,
    pub review_date: Option<NaiveDateTime>,
    pub decision_date: Option<NaiveDateTime>,
    pub status: String,
    pub decision: Option<String>,
    pub mitigation_notes: Option<String>,
    pub adr_number: Option<String>,
    pub notes: Option<String>,
    pub sla_duration_workdays: i32,
    pub sla_target_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Full-form replacement of a submission's scalar fields.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = submissions)]
#[diesel(treat_none_as_null = true)]
pub struct SubmissionChangeset {
    pub name: String,
    pub description: String,
    pub owner_squad: String,
    pub pic: String,
    pub submission_type: String,
    pub submission_date: NaiveDateTime,
    pub review_date: Option<NaiveDateTime>,
    pub decision_date: Option<NaiveDateTime>,
    pub status: String,
    pub decision: Option<String>,
    pub mitigation_notes: Option<String>,
    pub adr_number: Option<String>,
    pub notes: Option<String>,
    pub sla_duration_workdays: i32,
    pub sla_target_date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = followup_tasks)]
pub struct FollowupTask {
    pub id: String,
    pub submission_id: String,
    pub description: String,
    pub action_notes: Option<String>,
    pub is_completed: bool,
    pub due_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = followup_tasks)]
pub struct NewFollowupTask {
    pub id: String,
    pub submission_id: String,
    pub description: String,
    pub action_notes: Option<String>,
    pub is_completed: bool,
    pub due_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = documentation_links)]
pub struct DocumentationLink {
    pub id: String,
    pub submission_id: String,
    pub url: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documentation_links)]
pub struct NewDocumentationLink {
    pub id: String,
    pub submission_id: String,
    pub url: String,
    pub created_at: NaiveDateTime,
}

/// Raw attachment row. Use [`crate::attachments::AttachmentParent`] to read
/// the owner; the `(parent_kind, parent_id)` pair is only written through it.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = attachments)]
pub struct Attachment {
    pub id: String,
    pub parent_kind: String,
    pub parent_id: String,
    pub filename: String,
    pub storage_path: String,
    pub caption: Option<String>,
    pub mime_type: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = attachments)]
pub struct NewAttachmentRow {
    pub id: String,
    pub parent_kind: String,
    pub parent_id: String,
    pub filename: String,
    pub storage_path: String,
    pub caption: Option<String>,
    pub mime_type: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = side_quests)]
pub struct SideQuest {
    pub id: String,
    pub ticket_code: String,
    pub quest_name: String,
    pub instruction: String,
    pub request_date: NaiveDateTime,
    pub requestor: String,
    pub executor: String,
    pub due_date: NaiveDateTime,
    pub finish_date: Option<NaiveDateTime>,
    pub impact_score: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = side_quests)]
pub struct NewSideQuest {
    pub id: String,
    pub ticket_code: String,
    pub quest_name: String,
    pub instruction: String,
    pub request_date: NaiveDateTime,
    pub requestor: String,
    pub executor: String,
    pub due_date: NaiveDateTime,
    pub finish_date: Option<NaiveDateTime>,
    pub impact_score: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = side_quest_followups)]
pub struct SideQuestFollowUp {
    pub id: String,
    pub side_quest_id: String,
    pub entry_date: NaiveDateTime,
    pub action: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = side_quest_followups)]
pub struct NewSideQuestFollowUp {
    pub id: String,
    pub side_quest_id: String,
    pub entry_date: NaiveDateTime,
    pub action: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = change_log_entries)]
pub struct ChangeLogEntry {
    pub id: String,
    pub submission_id: String,
    pub recorded_at: NaiveDateTime,
    pub actor: String,
    pub changes: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = change_log_entries)]
pub struct NewChangeLogEntry {
    pub id: String,
    pub submission_id: String,
    pub recorded_at: NaiveDateTime,
    pub actor: String,
    pub changes: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Insertable, Serialize)]
#[diesel(table_name = archived_submissions)]
pub struct ArchivedSubmission {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_squad: String,
    pub pic: String,
    pub submission_type: String,
    pub submission_date: NaiveDateTime,
    pub review_date: Option<NaiveDateTime>,
    pub decision_date: Option<NaiveDateTime>,
    pub status: String,
    pub decision: Option<String>,
    pub mitigation_notes: Option<String>,
    pub adr_number: Option<String>,
    pub notes: Option<String>,
    pub sla_duration_workdays: i32,
    pub sla_target_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub archived_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Insertable, Serialize)]
#[diesel(table_name = archived_followup_tasks)]
pub struct ArchivedFollowupTask {
    pub id: String,
    pub archived_submission_id: String,
    pub description: String,
    pub action_notes: Option<String>,
    pub is_completed: bool,
    pub due_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub archived_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Insertable, Serialize)]
#[diesel(table_name = archived_documentation_links)]
pub struct ArchivedDocumentationLink {
    pub id: String,
    pub archived_submission_id: String,
    pub url: String,
    pub created_at: NaiveDateTime,
    pub archived_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Insertable, Serialize)]
#[diesel(table_name = archived_attachments)]
pub struct ArchivedAttachment {
    pub id: String,
    pub parent_kind: String,
    pub parent_id: String,
    pub filename: String,
    pub storage_path: String,
    pub caption: Option<String>,
    pub mime_type: Option<String>,
    pub created_at: NaiveDateTime,
    pub archived_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Insertable, Serialize)]
#[diesel(table_name = archived_side_quests)]
pub struct ArchivedSideQuest {
    pub id: String,
    pub ticket_code: String,
    pub quest_name: String,
    pub instruction: String,
    pub request_date: NaiveDateTime,
    pub requestor: String,
    pub executor: String,
    pub due_date: NaiveDateTime,
    pub finish_date: Option<NaiveDateTime>,
    pub impact_score: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub archived_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Insertable, Serialize)]
#[diesel(table_name = archived_side_quest_followups)]
pub struct ArchivedSideQuestFollowUp {
    pub id: String,
    pub archived_side_quest_id: String,
    pub entry_date: NaiveDateTime,
    pub action: String,
    pub created_at: NaiveDateTime,
    pub archived_at: NaiveDateTime,
}
