use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::archive::{self, ArchiveReceipt};
use crate::attachments::{
    attachments_for, attachments_for_ids, insert_attachment, AttachmentInput, AttachmentParent,
    NewAttachment, KIND_FOLLOWUP_TASK,
};
use crate::backup::BackupService;
use crate::changelog::record_changes_if_any;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    Attachment, DocumentationLink, FollowupTask, NewDocumentationLink, NewFollowupTask,
    NewSubmission, Submission, SubmissionChangeset,
};
use crate::schema::{archived_documentation_links, documentation_links, followup_tasks, submissions};
use crate::sla::{compute_target, SlaPolicy, SlaStatus};
use crate::status::{SubmissionStatus, SubmissionType};
use crate::utils::dates::{parse_datetime, parse_optional_datetime};

/// SLA duration as it arrives from a form: either a number or free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawWorkdays {
    Number(i64),
    Text(String),
}

impl RawWorkdays {
    pub fn resolve(&self, policy: &SlaPolicy) -> TrackerResult<i32> {
        match self {
            RawWorkdays::Number(value) => policy.resolve_workdays_value(Some(*value)),
            RawWorkdays::Text(value) => policy.resolve_workdays(Some(value)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner_squad: String,
    pub pic: String,
    #[serde(rename = "type", alias = "submission_type")]
    pub submission_type: String,
    pub submission_date: Option<String>,
    pub review_date: Option<String>,
    pub decision_date: Option<String>,
    pub status: Option<String>,
    pub decision: Option<String>,
    pub mitigation_notes: Option<String>,
    pub adr_number: Option<String>,
    pub notes: Option<String>,
    pub sla_duration: Option<RawWorkdays>,
    #[serde(default)]
    pub documentation_links: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

struct ValidatedSubmission {
    name: String,
    description: String,
    owner_squad: String,
    pic: String,
    submission_type: SubmissionType,
    submission_date: Option<NaiveDateTime>,
    review_date: Option<NaiveDateTime>,
    decision_date: Option<NaiveDateTime>,
    status: Option<SubmissionStatus>,
    decision: Option<String>,
    mitigation_notes: Option<String>,
    adr_number: Option<String>,
    notes: Option<String>,
    sla_duration_workdays: Option<i32>,
    documentation_links: Vec<String>,
    attachments: Vec<AttachmentInput>,
}

fn required(value: &str, field: &str) -> TrackerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn normalize_link(raw: &str) -> TrackerResult<String> {
    let trimmed = raw.trim();
    Url::parse(trimmed)
        .map(|_| trimmed.to_string())
        .map_err(|err| TrackerError::validation(format!("invalid documentation link `{trimmed}`: {err}")))
}

impl SubmissionInput {
    /// Omitted submission date and SLA duration stay `None`; create fills
    /// them with defaults, update keeps the stored values.
    fn validate(self, policy: &SlaPolicy) -> TrackerResult<ValidatedSubmission> {
        let submission_date = match self.submission_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_datetime(raw)?),
        };
        let status = optional_text(self.status)
            .map(|raw| raw.parse::<SubmissionStatus>())
            .transpose()?;
        let documentation_links = self
            .documentation_links
            .iter()
            .filter(|link| !link.trim().is_empty())
            .map(|link| normalize_link(link))
            .collect::<TrackerResult<Vec<_>>>()?;

        Ok(ValidatedSubmission {
            name: required(&self.name, "name")?,
            description: self.description.trim().to_string(),
            owner_squad: required(&self.owner_squad, "owner squad")?,
            pic: required(&self.pic, "pic")?,
            submission_type: self.submission_type.parse()?,
            submission_date,
            review_date: parse_optional_datetime(self.review_date.as_deref())?,
            decision_date: parse_optional_datetime(self.decision_date.as_deref())?,
            status,
            decision: optional_text(self.decision),
            mitigation_notes: optional_text(self.mitigation_notes),
            adr_number: optional_text(self.adr_number),
            notes: optional_text(self.notes),
            sla_duration_workdays: self
                .sla_duration
                .as_ref()
                .map(|raw| raw.resolve(policy))
                .transpose()?,
            documentation_links,
            attachments: self.attachments,
        })
    }
}

/// A submission with every dependent row, as read in one go.
#[derive(Debug, Clone)]
pub struct SubmissionGraph {
    pub submission: Submission,
    pub followup_tasks: Vec<FollowupTask>,
    pub followup_attachments: Vec<Attachment>,
    pub attachments: Vec<Attachment>,
    pub documentation_links: Vec<DocumentationLink>,
}

pub fn load_graph(conn: &mut SqliteConnection, id: &str) -> TrackerResult<SubmissionGraph> {
    let submission: Submission = submissions::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| TrackerError::not_found("submission", id))?;

    let followup_tasks: Vec<FollowupTask> = followup_tasks::table
        .filter(followup_tasks::submission_id.eq(id))
        .order(followup_tasks::created_at.asc())
        .load(conn)?;
    let task_ids: Vec<String> = followup_tasks.iter().map(|task| task.id.clone()).collect();
    let followup_attachments = attachments_for_ids(conn, KIND_FOLLOWUP_TASK, &task_ids)?;
    let attachments = attachments_for(conn, &AttachmentParent::Submission(id.to_string()))?;
    let documentation_links = documentation_links::table
        .filter(documentation_links::submission_id.eq(id))
        .order(documentation_links::created_at.asc())
        .load(conn)?;

    Ok(SubmissionGraph {
        submission,
        followup_tasks,
        followup_attachments,
        attachments,
        documentation_links,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowupTaskDetail {
    #[serde(flatten)]
    pub task: FollowupTask,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    pub sla_status: SlaStatus,
    pub followup_tasks: Vec<FollowupTaskDetail>,
    pub documentation_links: Vec<DocumentationLink>,
    pub attachments: Vec<Attachment>,
}

fn is_completed(status: &str) -> bool {
    status
        .parse::<SubmissionStatus>()
        .map(|status| status.is_completed())
        .unwrap_or(false)
}

/// Derived on every read; never stored.
pub fn sla_status_of(submission: &Submission, policy: &SlaPolicy) -> SlaStatus {
    policy.classify(submission.sla_target_date, is_completed(&submission.status))
}

impl SubmissionDetail {
    fn from_graph(graph: SubmissionGraph, policy: &SlaPolicy) -> Self {
        let mut by_task: HashMap<String, Vec<Attachment>> = HashMap::new();
        for attachment in graph.followup_attachments {
            by_task
                .entry(attachment.parent_id.clone())
                .or_default()
                .push(attachment);
        }

        let followup_tasks = graph
            .followup_tasks
            .into_iter()
            .map(|task| FollowupTaskDetail {
                attachments: by_task.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect();

        Self {
            sla_status: sla_status_of(&graph.submission, policy),
            submission: graph.submission,
            followup_tasks,
            documentation_links: graph.documentation_links,
            attachments: graph.attachments,
        }
    }
}

fn insert_links(
    conn: &mut SqliteConnection,
    submission_id: &str,
    links: &[String],
    now: NaiveDateTime,
) -> TrackerResult<()> {
    for url in links {
        let link = NewDocumentationLink {
            id: Uuid::new_v4().to_string(),
            submission_id: submission_id.to_string(),
            url: url.clone(),
            created_at: now,
        };
        diesel::insert_into(documentation_links::table)
            .values(&link)
            .execute(conn)?;
    }
    Ok(())
}

fn prepare_attachments(
    parent: &AttachmentParent,
    inputs: Vec<AttachmentInput>,
) -> TrackerResult<Vec<NewAttachment>> {
    inputs
        .into_iter()
        .map(|input| NewAttachment::new(parent.clone(), input))
        .collect()
}

pub fn get_submission(
    conn: &mut SqliteConnection,
    policy: &SlaPolicy,
    id: &str,
) -> TrackerResult<SubmissionDetail> {
    let graph = load_graph(conn, id)?;
    Ok(SubmissionDetail::from_graph(graph, policy))
}

pub fn create_submission(
    conn: &mut SqliteConnection,
    policy: &SlaPolicy,
    input: SubmissionInput,
) -> TrackerResult<SubmissionDetail> {
    let now = Utc::now().naive_utc();
    let validated = input.validate(policy)?;
    let status = validated.status.unwrap_or(SubmissionStatus::Submitted);
    if status == SubmissionStatus::Archived {
        return Err(TrackerError::validation(
            "a submission cannot be created in the Archived state",
        ));
    }

    let id = Uuid::new_v4().to_string();
    let parent = AttachmentParent::Submission(id.clone());
    let attachments = prepare_attachments(&parent, validated.attachments)?;
    let links = validated.documentation_links;
    let submission_date = validated.submission_date.unwrap_or(now);
    let sla_duration_workdays = validated
        .sla_duration_workdays
        .unwrap_or(policy.default_workdays);
    let new_submission = NewSubmission {
        id: id.clone(),
        name: validated.name,
        description: validated.description,
        owner_squad: validated.owner_squad,
        pic: validated.pic,
        submission_type: validated.submission_type.as_str().to_string(),
        submission_date,
        review_date: validated.review_date,
        decision_date: validated.decision_date,
        status: status.as_str().to_string(),
        decision: validated.decision,
        mitigation_notes: validated.mitigation_notes,
        adr_number: validated.adr_number,
        notes: validated.notes,
        sla_duration_workdays,
        sla_target_date: compute_target(submission_date, sla_duration_workdays)?,
        created_at: now,
        updated_at: now,
    };

    conn.transaction::<(), TrackerError, _>(|conn| {
        diesel::insert_into(submissions::table)
            .values(&new_submission)
            .execute(conn)?;
        insert_links(conn, &id, &links, now)?;
        for attachment in attachments {
            insert_attachment(conn, attachment)?;
        }
        Ok(())
    })?;

    info!(
        submission_id = %id,
        status = %status,
        sla_target = %new_submission.sla_target_date,
        "submission created"
    );
    get_submission(conn, policy, &id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated(Box<SubmissionDetail>),
    Archived(ArchiveReceipt),
}

/// Full-form update. Setting the status to Archived hands the record to the
/// archive coordinator and ignores the other fields.
pub fn update_submission(
    conn: &mut SqliteConnection,
    backups: &BackupService,
    policy: &SlaPolicy,
    actor: &str,
    id: &str,
    input: SubmissionInput,
) -> TrackerResult<UpdateOutcome> {
    let now = Utc::now().naive_utc();
    let validated = input.validate(policy)?;

    if validated.status == Some(SubmissionStatus::Archived) {
        let current: String = submissions::table
            .find(id)
            .select(submissions::status)
            .first(conn)
            .optional()?
            .ok_or_else(|| TrackerError::not_found("submission", id))?;
        current
            .parse::<SubmissionStatus>()?
            .transition_to(SubmissionStatus::Archived)?;
        let receipt = archive::archive_submission(conn, backups, id)?;
        return Ok(UpdateOutcome::Archived(receipt));
    }

    let parent = AttachmentParent::Submission(id.to_string());
    let attachments = prepare_attachments(&parent, validated.attachments)?;
    let links = validated.documentation_links;

    conn.transaction::<(), TrackerError, _>(|conn| {
        let current: Submission = submissions::table
            .find(id)
            .first(conn)
            .optional()?
            .ok_or_else(|| TrackerError::not_found("submission", id))?;
        let current_status: SubmissionStatus = current.status.parse()?;
        let next_status = validated.status.unwrap_or(current_status);
        if let Err(err) = current_status.transition_to(next_status) {
            warn!(submission_id = %id, from = %current_status, to = %next_status, "status change rejected");
            return Err(err);
        }

        let submission_date = validated.submission_date.unwrap_or(current.submission_date);
        let sla_duration_workdays = validated
            .sla_duration_workdays
            .unwrap_or(current.sla_duration_workdays);
        let changeset = SubmissionChangeset {
            name: validated.name,
            description: validated.description,
            owner_squad: validated.owner_squad,
            pic: validated.pic,
            submission_type: validated.submission_type.as_str().to_string(),
            submission_date,
            review_date: validated.review_date,
            decision_date: validated.decision_date,
            status: next_status.as_str().to_string(),
            decision: validated.decision,
            mitigation_notes: validated.mitigation_notes,
            adr_number: validated.adr_number,
            notes: validated.notes,
            sla_duration_workdays,
            sla_target_date: compute_target(submission_date, sla_duration_workdays)?,
            updated_at: now,
        };

        record_changes_if_any(conn, &current, &changeset, actor)?;
        diesel::update(submissions::table.find(id))
            .set(&changeset)
            .execute(conn)?;
        insert_links(conn, id, &links, now)?;
        for attachment in attachments {
            insert_attachment(conn, attachment)?;
        }
        Ok(())
    })?;

    info!(submission_id = %id, "submission updated");
    let detail = get_submission(conn, policy, id)?;
    Ok(UpdateOutcome::Updated(Box::new(detail)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    SubmissionDate,
    SlaTargetDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "name" => Some(SortField::Name),
            "submissionDate" | "submission_date" => Some(SortField::SubmissionDate),
            "slaTarget" | "slaTargetDate" | "sla_target_date" => Some(SortField::SlaTargetDate),
            "status" => Some(SortField::Status),
            "createdAt" | "created_at" => Some(SortField::CreatedAt),
            "updatedAt" | "updated_at" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Parses `field-dir[,field-dir]`. Unknown fields are dropped and
/// `updated_at desc` is appended unless already present.
pub fn parse_sort(raw: Option<&str>) -> Vec<SortKey> {
    let mut keys: Vec<SortKey> = raw
        .unwrap_or("updatedAt-desc")
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| {
            let (field, direction) = part.rsplit_once('-').unwrap_or((part, "asc"));
            match SortField::parse(field) {
                Some(field) => Some(SortKey {
                    field,
                    descending: direction.trim().eq_ignore_ascii_case("desc"),
                }),
                None => {
                    warn!(sort = %part, "ignoring unknown sort field");
                    None
                }
            }
        })
        .collect();

    if !keys.iter().any(|key| key.field == SortField::UpdatedAt) {
        keys.push(SortKey {
            field: SortField::UpdatedAt,
            descending: true,
        });
    }
    keys
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionFilter {
    pub status: Option<String>,
    pub decision: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub has_pending_tasks: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    #[serde(flatten)]
    pub submission: Submission,
    pub sla_status: SlaStatus,
    pub pending_tasks: i64,
}

pub fn list_submissions(
    conn: &mut SqliteConnection,
    policy: &SlaPolicy,
    filter: &SubmissionFilter,
) -> TrackerResult<Vec<SubmissionSummary>> {
    let mut query: submissions::BoxedQuery<'static, Sqlite> = submissions::table.into_boxed();

    if let Some(raw) = filter.status.as_deref().filter(|raw| !raw.trim().is_empty()) {
        let status: SubmissionStatus = raw.parse()?;
        query = query.filter(submissions::status.eq(status.as_str()));
    }
    if let Some(decision) = optional_text(filter.decision.clone()) {
        query = query.filter(submissions::decision.eq(decision));
    }
    if let Some(search) = optional_text(filter.search.clone()) {
        query = query.filter(submissions::name.like(format!("%{search}%")));
    }

    let pending_rows: Vec<(String, i64)> = followup_tasks::table
        .filter(followup_tasks::is_completed.eq(false))
        .group_by(followup_tasks::submission_id)
        .select((followup_tasks::submission_id, count_star()))
        .load(conn)?;
    let pending: HashMap<String, i64> = pending_rows.into_iter().collect();

    if filter.has_pending_tasks {
        let ids: Vec<String> = pending.keys().cloned().collect();
        query = query.filter(submissions::id.eq_any(ids));
    }

    for key in parse_sort(filter.sort_by.as_deref()) {
        query = match (key.field, key.descending) {
            (SortField::Name, false) => query.then_order_by(submissions::name.asc()),
            (SortField::Name, true) => query.then_order_by(submissions::name.desc()),
            (SortField::SubmissionDate, false) => {
                query.then_order_by(submissions::submission_date.asc())
            }
            (SortField::SubmissionDate, true) => {
                query.then_order_by(submissions::submission_date.desc())
            }
            (SortField::SlaTargetDate, false) => {
                query.then_order_by(submissions::sla_target_date.asc())
            }
            (SortField::SlaTargetDate, true) => {
                query.then_order_by(submissions::sla_target_date.desc())
            }
            (SortField::Status, false) => query.then_order_by(submissions::status.asc()),
            (SortField::Status, true) => query.then_order_by(submissions::status.desc()),
            (SortField::CreatedAt, false) => query.then_order_by(submissions::created_at.asc()),
            (SortField::CreatedAt, true) => query.then_order_by(submissions::created_at.desc()),
            (SortField::UpdatedAt, false) => query.then_order_by(submissions::updated_at.asc()),
            (SortField::UpdatedAt, true) => query.then_order_by(submissions::updated_at.desc()),
        };
    }

    let rows: Vec<Submission> = query.load(conn)?;
    Ok(rows
        .into_iter()
        .map(|submission| SubmissionSummary {
            sla_status: sla_status_of(&submission, policy),
            pending_tasks: pending.get(&submission.id).copied().unwrap_or(0),
            submission,
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowupInput {
    pub description: String,
    pub action_notes: Option<String>,
    pub due_date: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

pub fn add_followup_task(
    conn: &mut SqliteConnection,
    submission_id: &str,
    input: FollowupInput,
) -> TrackerResult<FollowupTaskDetail> {
    let description = required(&input.description, "description")?;
    let due_date = parse_optional_datetime(input.due_date.as_deref())?;
    let now = Utc::now().naive_utc();
    let task_id = Uuid::new_v4().to_string();
    let attachments = prepare_attachments(
        &AttachmentParent::FollowupTask(task_id.clone()),
        input.attachments,
    )?;
    let new_task = NewFollowupTask {
        id: task_id.clone(),
        submission_id: submission_id.to_string(),
        description,
        action_notes: optional_text(input.action_notes),
        is_completed: false,
        due_date,
        created_at: now,
        updated_at: now,
    };

    let stored = conn.transaction::<FollowupTaskDetail, TrackerError, _>(|conn| {
        let exists: i64 = submissions::table
            .filter(submissions::id.eq(submission_id))
            .count()
            .get_result(conn)?;
        if exists == 0 {
            return Err(TrackerError::not_found("submission", submission_id));
        }

        diesel::insert_into(followup_tasks::table)
            .values(&new_task)
            .execute(conn)?;
        let mut stored_attachments = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            stored_attachments.push(insert_attachment(conn, attachment)?);
        }
        let task: FollowupTask = followup_tasks::table.find(&task_id).first(conn)?;
        Ok(FollowupTaskDetail {
            task,
            attachments: stored_attachments,
        })
    })?;

    info!(submission_id, task_id = %stored.task.id, "follow-up task added");
    Ok(stored)
}

#[derive(Debug, Clone, Default)]
pub struct FollowupPatch {
    pub description: Option<String>,
    pub action_notes: Option<Option<String>>,
    pub is_completed: Option<bool>,
    pub due_date: Option<Option<NaiveDateTime>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = followup_tasks)]
struct FollowupTaskChangeset {
    description: Option<String>,
    action_notes: Option<Option<String>>,
    is_completed: Option<bool>,
    due_date: Option<Option<NaiveDateTime>>,
    updated_at: NaiveDateTime,
}

pub fn update_followup_task(
    conn: &mut SqliteConnection,
    task_id: &str,
    patch: FollowupPatch,
) -> TrackerResult<FollowupTask> {
    let description = patch
        .description
        .as_deref()
        .map(|value| required(value, "description"))
        .transpose()?;
    let changeset = FollowupTaskChangeset {
        description,
        action_notes: patch.action_notes,
        is_completed: patch.is_completed,
        due_date: patch.due_date,
        updated_at: Utc::now().naive_utc(),
    };

    let updated = diesel::update(followup_tasks::table.find(task_id))
        .set(&changeset)
        .execute(conn)?;
    if updated == 0 {
        return Err(TrackerError::not_found("follow-up task", task_id));
    }

    let task: FollowupTask = followup_tasks::table.find(task_id).first(conn)?;
    info!(task_id, is_completed = task.is_completed, "follow-up task updated");
    Ok(task)
}

pub fn add_documentation_link(
    conn: &mut SqliteConnection,
    submission_id: &str,
    raw_url: &str,
) -> TrackerResult<DocumentationLink> {
    let url = normalize_link(raw_url)?;
    let exists: i64 = submissions::table
        .filter(submissions::id.eq(submission_id))
        .count()
        .get_result(conn)?;
    if exists == 0 {
        return Err(TrackerError::not_found("submission", submission_id));
    }

    let link = NewDocumentationLink {
        id: Uuid::new_v4().to_string(),
        submission_id: submission_id.to_string(),
        url,
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(documentation_links::table)
        .values(&link)
        .execute(conn)?;
    let stored = documentation_links::table.find(&link.id).first(conn)?;
    Ok(stored)
}

/// Every documentation link ever used, live or archived, sorted.
pub fn distinct_doc_links(conn: &mut SqliteConnection) -> TrackerResult<Vec<String>> {
    let live: Vec<String> = documentation_links::table
        .select(documentation_links::url)
        .distinct()
        .load(conn)?;
    let archived: Vec<String> = archived_documentation_links::table
        .select(archived_documentation_links::url)
        .distinct()
        .load(conn)?;

    let links: BTreeSet<String> = live.into_iter().chain(archived).collect();
    Ok(links.into_iter().collect())
}

pub fn add_attachment(
    conn: &mut SqliteConnection,
    parent: AttachmentParent,
    input: AttachmentInput,
) -> TrackerResult<Attachment> {
    let attachment = NewAttachment::new(parent, input)?;
    let stored = insert_attachment(conn, attachment)?;
    info!(
        attachment_id = %stored.id,
        parent_kind = %stored.parent_kind,
        parent_id = %stored.parent_id,
        "attachment registered"
    );
    Ok(stored)
}

/// Re-derives every live SLA target from its submission date and duration.
/// Returns how many rows were corrected.
pub fn recompute_sla_targets(conn: &mut SqliteConnection) -> TrackerResult<usize> {
    conn.transaction::<usize, TrackerError, _>(|conn| {
        let rows: Vec<(String, NaiveDateTime, i32, NaiveDateTime)> = submissions::table
            .select((
                submissions::id,
                submissions::submission_date,
                submissions::sla_duration_workdays,
                submissions::sla_target_date,
            ))
            .load(conn)?;

        let mut corrected = 0;
        for (id, submission_date, workdays, stored_target) in rows {
            let target = compute_target(submission_date, workdays)?;
            if target != stored_target {
                diesel::update(submissions::table.find(&id))
                    .set(submissions::sla_target_date.eq(target))
                    .execute(conn)?;
                corrected += 1;
            }
        }
        Ok(corrected)
    })
}
