use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::attachments::{KIND_FOLLOWUP_TASK, KIND_SIDE_QUEST, KIND_SIDE_QUEST_FOLLOWUP, KIND_SUBMISSION};
use crate::backup::BackupService;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    ArchivedAttachment, ArchivedDocumentationLink, ArchivedFollowupTask, ArchivedSideQuest,
    ArchivedSideQuestFollowUp, ArchivedSubmission, DocumentationLink, FollowupTask, SideQuest,
    SideQuestFollowUp, Submission,
};
use crate::schema::{
    archived_attachments, archived_documentation_links, archived_followup_tasks,
    archived_side_quest_followups, archived_side_quests, archived_submissions, side_quests,
    submissions,
};
use crate::side_quests::load_graph as load_side_quest_graph;
use crate::status::{SideQuestStatus, SubmissionStatus};
use crate::submissions::load_graph as load_submission_graph;

/// What an archive run moved. `backup_path` is `None` when the pre-archive
/// backup failed; the archive itself still went through.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReceipt {
    pub id: String,
    pub archived_at: NaiveDateTime,
    pub backup_path: Option<PathBuf>,
    pub followups: usize,
    pub attachments: usize,
    pub documentation_links: usize,
}

fn submission_exists(conn: &mut SqliteConnection, id: &str) -> TrackerResult<bool> {
    let count: i64 = submissions::table
        .filter(submissions::id.eq(id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

fn side_quest_exists(conn: &mut SqliteConnection, id: &str) -> TrackerResult<bool> {
    let count: i64 = side_quests::table
        .filter(side_quests::id.eq(id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Keeps `NotFound` as is so callers can tell a lost race from a failure.
fn into_transaction_error(err: TrackerError) -> TrackerError {
    match err {
        TrackerError::NotFound { .. } | TrackerError::Transaction(_) => err,
        TrackerError::Database(diesel::result::Error::NotFound) => err,
        other => TrackerError::Transaction(other.to_string()),
    }
}

fn archived_submission_row(submission: &Submission, archived_at: NaiveDateTime) -> ArchivedSubmission {
    ArchivedSubmission {
        id: submission.id.clone(),
        name: submission.name.clone(),
        description: submission.description.clone(),
        owner_squad: submission.owner_squad.clone(),
        pic: submission.pic.clone(),
        submission_type: submission.submission_type.clone(),
        submission_date: submission.submission_date,
        review_date: submission.review_date,
        decision_date: submission.decision_date,
        status: SubmissionStatus::Archived.as_str().to_string(),
        decision: submission.decision.clone(),
        mitigation_notes: submission.mitigation_notes.clone(),
        adr_number: submission.adr_number.clone(),
        notes: submission.notes.clone(),
        sla_duration_workdays: submission.sla_duration_workdays,
        sla_target_date: submission.sla_target_date,
        created_at: submission.created_at,
        updated_at: submission.updated_at,
        archived_at,
    }
}

fn archived_task_row(task: &FollowupTask, archived_at: NaiveDateTime) -> ArchivedFollowupTask {
    ArchivedFollowupTask {
        id: task.id.clone(),
        archived_submission_id: task.submission_id.clone(),
        description: task.description.clone(),
        action_notes: task.action_notes.clone(),
        is_completed: task.is_completed,
        due_date: task.due_date,
        created_at: task.created_at,
        updated_at: task.updated_at,
        archived_at,
    }
}

fn archived_link_row(link: &DocumentationLink, archived_at: NaiveDateTime) -> ArchivedDocumentationLink {
    ArchivedDocumentationLink {
        id: link.id.clone(),
        archived_submission_id: link.submission_id.clone(),
        url: link.url.clone(),
        created_at: link.created_at,
        archived_at,
    }
}

fn archived_side_quest_row(quest: &SideQuest, archived_at: NaiveDateTime) -> ArchivedSideQuest {
    ArchivedSideQuest {
        id: quest.id.clone(),
        ticket_code: quest.ticket_code.clone(),
        quest_name: quest.quest_name.clone(),
        instruction: quest.instruction.clone(),
        request_date: quest.request_date,
        requestor: quest.requestor.clone(),
        executor: quest.executor.clone(),
        due_date: quest.due_date,
        finish_date: quest.finish_date,
        impact_score: quest.impact_score,
        status: SideQuestStatus::Archived.as_str().to_string(),
        created_at: quest.created_at,
        updated_at: quest.updated_at,
        archived_at,
    }
}

fn archived_side_quest_followup_row(
    followup: &SideQuestFollowUp,
    archived_at: NaiveDateTime,
) -> ArchivedSideQuestFollowUp {
    ArchivedSideQuestFollowUp {
        id: followup.id.clone(),
        archived_side_quest_id: followup.side_quest_id.clone(),
        entry_date: followup.entry_date,
        action: followup.action.clone(),
        created_at: followup.created_at,
        archived_at,
    }
}

fn insert_archived_attachment(
    conn: &mut SqliteConnection,
    attachment: &ArchivedAttachment,
) -> TrackerResult<()> {
    diesel::insert_into(archived_attachments::table)
        .values(attachment)
        .execute(conn)?;
    Ok(())
}

/// Moves a submission and everything hanging off it into the archive tables,
/// then deletes the live row. A backup of the database file is attempted
/// first; its failure is logged and does not stop the archive.
pub fn archive_submission(
    conn: &mut SqliteConnection,
    backups: &BackupService,
    id: &str,
) -> TrackerResult<ArchiveReceipt> {
    if !submission_exists(conn, id)? {
        warn!(submission_id = %id, "archive requested for missing submission");
        return Err(TrackerError::not_found("submission", id));
    }

    info!(submission_id = %id, "archiving submission");
    let backup_path = backups.create_best_effort("archive-submission");

    let result = conn.immediate_transaction::<ArchiveReceipt, TrackerError, _>(|conn| {
        let graph = load_submission_graph(conn, id)?;
        let archived_at = Utc::now().naive_utc();

        diesel::insert_into(archived_submissions::table)
            .values(&archived_submission_row(&graph.submission, archived_at))
            .execute(conn)?;

        let mut by_task: HashMap<&str, Vec<_>> = HashMap::new();
        for attachment in &graph.followup_attachments {
            by_task
                .entry(attachment.parent_id.as_str())
                .or_default()
                .push(attachment);
        }

        let mut attachment_count = 0;
        for task in &graph.followup_tasks {
            diesel::insert_into(archived_followup_tasks::table)
                .values(&archived_task_row(task, archived_at))
                .execute(conn)?;
            for attachment in by_task.remove(task.id.as_str()).unwrap_or_default() {
                insert_archived_attachment(conn, &attachment.to_archived(archived_at))?;
                attachment_count += 1;
            }
        }

        for attachment in &graph.attachments {
            insert_archived_attachment(conn, &attachment.to_archived(archived_at))?;
            attachment_count += 1;
        }

        for link in &graph.documentation_links {
            diesel::insert_into(archived_documentation_links::table)
                .values(&archived_link_row(link, archived_at))
                .execute(conn)?;
        }

        let deleted = diesel::delete(submissions::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(TrackerError::not_found("submission", id));
        }

        Ok(ArchiveReceipt {
            id: id.to_string(),
            archived_at,
            backup_path: backup_path.clone(),
            followups: graph.followup_tasks.len(),
            attachments: attachment_count,
            documentation_links: graph.documentation_links.len(),
        })
    });

    match result {
        Ok(receipt) => {
            info!(
                submission_id = %id,
                followups = receipt.followups,
                attachments = receipt.attachments,
                documentation_links = receipt.documentation_links,
                "submission archived"
            );
            Ok(receipt)
        }
        Err(err) => {
            let err = into_transaction_error(err);
            error!(submission_id = %id, error = %err, "submission archive rolled back");
            Err(err)
        }
    }
}

/// Side-quest counterpart of [`archive_submission`].
pub fn archive_side_quest(
    conn: &mut SqliteConnection,
    backups: &BackupService,
    id: &str,
) -> TrackerResult<ArchiveReceipt> {
    if !side_quest_exists(conn, id)? {
        warn!(side_quest_id = %id, "archive requested for missing side quest");
        return Err(TrackerError::not_found("side quest", id));
    }

    info!(side_quest_id = %id, "archiving side quest");
    let backup_path = backups.create_best_effort("archive-side-quest");

    let result = conn.immediate_transaction::<ArchiveReceipt, TrackerError, _>(|conn| {
        let graph = load_side_quest_graph(conn, id)?;
        let archived_at = Utc::now().naive_utc();

        diesel::insert_into(archived_side_quests::table)
            .values(&archived_side_quest_row(&graph.side_quest, archived_at))
            .execute(conn)?;

        let mut by_followup: HashMap<&str, Vec<_>> = HashMap::new();
        for attachment in &graph.followup_attachments {
            by_followup
                .entry(attachment.parent_id.as_str())
                .or_default()
                .push(attachment);
        }

        let mut attachment_count = 0;
        for followup in &graph.followups {
            diesel::insert_into(archived_side_quest_followups::table)
                .values(&archived_side_quest_followup_row(followup, archived_at))
                .execute(conn)?;
            for attachment in by_followup.remove(followup.id.as_str()).unwrap_or_default() {
                insert_archived_attachment(conn, &attachment.to_archived(archived_at))?;
                attachment_count += 1;
            }
        }

        for attachment in &graph.attachments {
            insert_archived_attachment(conn, &attachment.to_archived(archived_at))?;
            attachment_count += 1;
        }

        let deleted = diesel::delete(side_quests::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(TrackerError::not_found("side quest", id));
        }

        Ok(ArchiveReceipt {
            id: id.to_string(),
            archived_at,
            backup_path: backup_path.clone(),
            followups: graph.followups.len(),
            attachments: attachment_count,
            documentation_links: 0,
        })
    });

    match result {
        Ok(receipt) => {
            info!(
                side_quest_id = %id,
                followups = receipt.followups,
                attachments = receipt.attachments,
                "side quest archived"
            );
            Ok(receipt)
        }
        Err(err) => {
            let err = into_transaction_error(err);
            error!(side_quest_id = %id, error = %err, "side quest archive rolled back");
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedFollowupDetail {
    #[serde(flatten)]
    pub task: ArchivedFollowupTask,
    pub attachments: Vec<ArchivedAttachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedSubmissionDetail {
    #[serde(flatten)]
    pub submission: ArchivedSubmission,
    pub followup_tasks: Vec<ArchivedFollowupDetail>,
    pub documentation_links: Vec<ArchivedDocumentationLink>,
    pub attachments: Vec<ArchivedAttachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedSideQuestFollowupDetail {
    #[serde(flatten)]
    pub followup: ArchivedSideQuestFollowUp,
    pub attachments: Vec<ArchivedAttachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedSideQuestDetail {
    #[serde(flatten)]
    pub side_quest: ArchivedSideQuest,
    pub followups: Vec<ArchivedSideQuestFollowupDetail>,
    pub attachments: Vec<ArchivedAttachment>,
}

fn archived_attachments_for(
    conn: &mut SqliteConnection,
    kind: &str,
    parent_ids: &[String],
) -> TrackerResult<Vec<ArchivedAttachment>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = archived_attachments::table
        .filter(archived_attachments::parent_kind.eq(kind))
        .filter(archived_attachments::parent_id.eq_any(parent_ids))
        .order(archived_attachments::created_at.asc())
        .load(conn)?;
    Ok(rows)
}

fn group_by_parent(rows: Vec<ArchivedAttachment>) -> HashMap<String, Vec<ArchivedAttachment>> {
    let mut grouped: HashMap<String, Vec<ArchivedAttachment>> = HashMap::new();
    for row in rows {
        grouped.entry(row.parent_id.clone()).or_default().push(row);
    }
    grouped
}

/// Most recently archived first.
pub fn list_archived_submissions(
    conn: &mut SqliteConnection,
) -> TrackerResult<Vec<ArchivedSubmission>> {
    let rows = archived_submissions::table
        .order(archived_submissions::archived_at.desc())
        .load(conn)?;
    Ok(rows)
}

pub fn get_archived_submission(
    conn: &mut SqliteConnection,
    id: &str,
) -> TrackerResult<ArchivedSubmissionDetail> {
    let submission: ArchivedSubmission = archived_submissions::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| TrackerError::not_found("archived submission", id))?;

    let tasks: Vec<ArchivedFollowupTask> = archived_followup_tasks::table
        .filter(archived_followup_tasks::archived_submission_id.eq(id))
        .order(archived_followup_tasks::created_at.asc())
        .load(conn)?;
    let task_ids: Vec<String> = tasks.iter().map(|task| task.id.clone()).collect();
    let mut task_attachments =
        group_by_parent(archived_attachments_for(conn, KIND_FOLLOWUP_TASK, &task_ids)?);
    let attachments = archived_attachments_for(conn, KIND_SUBMISSION, &[id.to_string()])?;
    let documentation_links = archived_documentation_links::table
        .filter(archived_documentation_links::archived_submission_id.eq(id))
        .order(archived_documentation_links::created_at.asc())
        .load(conn)?;

    let followup_tasks = tasks
        .into_iter()
        .map(|task| ArchivedFollowupDetail {
            attachments: task_attachments.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect();

    Ok(ArchivedSubmissionDetail {
        submission,
        followup_tasks,
        documentation_links,
        attachments,
    })
}

pub fn list_archived_side_quests(
    conn: &mut SqliteConnection,
) -> TrackerResult<Vec<ArchivedSideQuest>> {
    let rows = archived_side_quests::table
        .order(archived_side_quests::archived_at.desc())
        .load(conn)?;
    Ok(rows)
}

pub fn get_archived_side_quest(
    conn: &mut SqliteConnection,
    id: &str,
) -> TrackerResult<ArchivedSideQuestDetail> {
    let side_quest: ArchivedSideQuest = archived_side_quests::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| TrackerError::not_found("archived side quest", id))?;

    let followups: Vec<ArchivedSideQuestFollowUp> = archived_side_quest_followups::table
        .filter(archived_side_quest_followups::archived_side_quest_id.eq(id))
        .order(archived_side_quest_followups::entry_date.asc())
        .load(conn)?;
    let followup_ids: Vec<String> = followups.iter().map(|entry| entry.id.clone()).collect();
    let mut followup_attachments = group_by_parent(archived_attachments_for(
        conn,
        KIND_SIDE_QUEST_FOLLOWUP,
        &followup_ids,
    )?);
    let attachments = archived_attachments_for(conn, KIND_SIDE_QUEST, &[id.to_string()])?;

    let followups = followups
        .into_iter()
        .map(|followup| ArchivedSideQuestFollowupDetail {
            attachments: followup_attachments.remove(&followup.id).unwrap_or_default(),
            followup,
        })
        .collect();

    Ok(ArchivedSideQuestDetail {
        side_quest,
        followups,
        attachments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_race_stays_not_found() {
        let err = into_transaction_error(TrackerError::not_found("submission", "abc"));
        assert!(err.is_not_found());
    }

    #[test]
    fn database_failures_become_transaction_failures() {
        let err = into_transaction_error(TrackerError::Database(
            diesel::result::Error::RollbackTransaction,
        ));
        assert!(matches!(err, TrackerError::Transaction(_)));
    }
}
