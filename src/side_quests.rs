use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::{Sqlite, SqliteConnection};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::archive::{self, ArchiveReceipt};
use crate::attachments::{
    attachments_for, attachments_for_ids, insert_attachment, AttachmentInput, AttachmentParent,
    NewAttachment, KIND_SIDE_QUEST_FOLLOWUP,
};
use crate::backup::BackupService;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Attachment, NewSideQuest, NewSideQuestFollowUp, SideQuest, SideQuestFollowUp};
use crate::schema::{side_quest_followups, side_quests};
use crate::sla::{SlaPolicy, SlaStatus};
use crate::status::SideQuestStatus;
use crate::utils::dates::{parse_datetime, parse_optional_datetime};

pub const MIN_IMPACT_SCORE: i32 = 1;
pub const MAX_IMPACT_SCORE: i32 = 5;
pub const STRATEGIC_IMPACT_SCORE: i32 = 4;

const TICKET_CODE_ATTEMPTS: usize = 5;

/// `SQ-YYYYMMDD-XXXX`, the suffix being four random hex digits.
pub fn generate_ticket_code(now: NaiveDateTime) -> String {
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("SQ-{}-{}", now.format("%Y%m%d"), &suffix[..4])
}

pub fn is_strategic(impact_score: i32) -> bool {
    impact_score >= STRATEGIC_IMPACT_SCORE
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SideQuestInput {
    pub quest_name: String,
    #[serde(default)]
    pub instruction: String,
    pub request_date: Option<String>,
    pub requestor: String,
    pub executor: String,
    pub due_date: String,
    pub finish_date: Option<String>,
    pub impact_score: i32,
    pub status: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

fn required(value: &str, field: &str) -> TrackerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// A side quest with every dependent row, as read in one go.
#[derive(Debug, Clone)]
pub struct SideQuestGraph {
    pub side_quest: SideQuest,
    pub followups: Vec<SideQuestFollowUp>,
    pub followup_attachments: Vec<Attachment>,
    pub attachments: Vec<Attachment>,
}

pub fn load_graph(conn: &mut SqliteConnection, id: &str) -> TrackerResult<SideQuestGraph> {
    let side_quest: SideQuest = side_quests::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| TrackerError::not_found("side quest", id))?;

    let followups: Vec<SideQuestFollowUp> = side_quest_followups::table
        .filter(side_quest_followups::side_quest_id.eq(id))
        .order(side_quest_followups::entry_date.asc())
        .load(conn)?;
    let followup_ids: Vec<String> = followups.iter().map(|entry| entry.id.clone()).collect();
    let followup_attachments = attachments_for_ids(conn, KIND_SIDE_QUEST_FOLLOWUP, &followup_ids)?;
    let attachments = attachments_for(conn, &AttachmentParent::SideQuest(id.to_string()))?;

    Ok(SideQuestGraph {
        side_quest,
        followups,
        followup_attachments,
        attachments,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SideQuestFollowupDetail {
    #[serde(flatten)]
    pub followup: SideQuestFollowUp,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideQuestDetail {
    #[serde(flatten)]
    pub side_quest: SideQuest,
    pub sla_status: SlaStatus,
    pub is_strategic: bool,
    pub followups: Vec<SideQuestFollowupDetail>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideQuestSummary {
    #[serde(flatten)]
    pub side_quest: SideQuest,
    pub sla_status: SlaStatus,
    pub is_strategic: bool,
}

/// Measured against the due date; a quest counts as completed once Done.
pub fn sla_status_of(side_quest: &SideQuest, policy: &SlaPolicy) -> SlaStatus {
    let completed = side_quest
        .status
        .parse::<SideQuestStatus>()
        .map(|status| status.is_completed())
        .unwrap_or(false);
    policy.classify(side_quest.due_date, completed)
}

impl SideQuestDetail {
    fn from_graph(graph: SideQuestGraph, policy: &SlaPolicy) -> Self {
        let mut by_followup: HashMap<String, Vec<Attachment>> = HashMap::new();
        for attachment in graph.followup_attachments {
            by_followup
                .entry(attachment.parent_id.clone())
                .or_default()
                .push(attachment);
        }

        let followups = graph
            .followups
            .into_iter()
            .map(|followup| SideQuestFollowupDetail {
                attachments: by_followup.remove(&followup.id).unwrap_or_default(),
                followup,
            })
            .collect();

        Self {
            sla_status: sla_status_of(&graph.side_quest, policy),
            is_strategic: is_strategic(graph.side_quest.impact_score),
            side_quest: graph.side_quest,
            followups,
            attachments: graph.attachments,
        }
    }
}

pub fn get_side_quest(
    conn: &mut SqliteConnection,
    policy: &SlaPolicy,
    id: &str,
) -> TrackerResult<SideQuestDetail> {
    let graph = load_graph(conn, id)?;
    Ok(SideQuestDetail::from_graph(graph, policy))
}

fn is_unique_violation(err: &TrackerError) -> bool {
    matches!(
        err,
        TrackerError::Database(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            _
        ))
    )
}

pub fn create_side_quest(
    conn: &mut SqliteConnection,
    policy: &SlaPolicy,
    input: SideQuestInput,
) -> TrackerResult<SideQuestDetail> {
    let now = Utc::now().naive_utc();
    let quest_name = required(&input.quest_name, "quest name")?;
    let requestor = required(&input.requestor, "requestor")?;
    let executor = required(&input.executor, "executor")?;
    let request_date = match input.request_date.as_deref().map(str::trim) {
        None | Some("") => now,
        Some(raw) => parse_datetime(raw)?,
    };
    let due_date = parse_datetime(&input.due_date)?;
    let finish_date = parse_optional_datetime(input.finish_date.as_deref())?;
    if !(MIN_IMPACT_SCORE..=MAX_IMPACT_SCORE).contains(&input.impact_score) {
        return Err(TrackerError::validation(format!(
            "impact score must be between {MIN_IMPACT_SCORE} and {MAX_IMPACT_SCORE}"
        )));
    }
    let status = match input.status.as_deref().map(str::trim) {
        None | Some("") => SideQuestStatus::Submitted,
        Some(raw) => raw.parse()?,
    };
    if status == SideQuestStatus::Archived {
        return Err(TrackerError::validation(
            "a side quest cannot be created in the Archived state",
        ));
    }

    let id = Uuid::new_v4().to_string();
    let attachments = input
        .attachments
        .into_iter()
        .map(|attachment| NewAttachment::new(AttachmentParent::SideQuest(id.clone()), attachment))
        .collect::<TrackerResult<Vec<_>>>()?;

    let mut new_quest = NewSideQuest {
        id: id.clone(),
        ticket_code: generate_ticket_code(now),
        quest_name,
        instruction: input.instruction.trim().to_string(),
        request_date,
        requestor,
        executor,
        due_date,
        finish_date,
        impact_score: input.impact_score,
        status: status.as_str().to_string(),
        created_at: now,
        updated_at: now,
    };

    let mut attempt = 1;
    loop {
        let pending = attachments.clone();
        let result = conn.transaction::<(), TrackerError, _>(|conn| {
            diesel::insert_into(side_quests::table)
                .values(&new_quest)
                .execute(conn)?;
            for attachment in pending {
                insert_attachment(conn, attachment)?;
            }
            Ok(())
        });

        match result {
            Ok(()) => break,
            Err(err) if is_unique_violation(&err) && attempt < TICKET_CODE_ATTEMPTS => {
                warn!(ticket_code = %new_quest.ticket_code, attempt, "ticket code taken, regenerating");
                new_quest.ticket_code = generate_ticket_code(now);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        side_quest_id = %id,
        ticket_code = %new_quest.ticket_code,
        impact_score = new_quest.impact_score,
        "side quest created"
    );
    get_side_quest(conn, policy, &id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum SideQuestUpdate {
    Updated(Box<SideQuestDetail>),
    Archived(ArchiveReceipt),
}

/// Moving to Done stamps `finish_date` when it is empty; moving out of Done
/// clears it. Archived hands the quest to the archive coordinator.
pub fn update_side_quest_status(
    conn: &mut SqliteConnection,
    backups: &BackupService,
    policy: &SlaPolicy,
    id: &str,
    next: SideQuestStatus,
) -> TrackerResult<SideQuestUpdate> {
    let current: SideQuest = side_quests::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or_else(|| TrackerError::not_found("side quest", id))?;
    let current_status: SideQuestStatus = current.status.parse()?;
    if let Err(err) = current_status.transition_to(next) {
        warn!(side_quest_id = %id, from = %current_status, to = %next, "status change rejected");
        return Err(err);
    }

    if next == SideQuestStatus::Archived {
        let receipt = archive::archive_side_quest(conn, backups, id)?;
        return Ok(SideQuestUpdate::Archived(receipt));
    }

    let now = Utc::now().naive_utc();
    let finish_date = match (current_status.is_completed(), next.is_completed()) {
        (_, true) => current.finish_date.or(Some(now)),
        (true, false) => None,
        (false, false) => current.finish_date,
    };

    diesel::update(side_quests::table.find(id))
        .set((
            side_quests::status.eq(next.as_str()),
            side_quests::finish_date.eq(finish_date),
            side_quests::updated_at.eq(now),
        ))
        .execute(conn)?;

    info!(side_quest_id = %id, from = %current_status, to = %next, "side quest status changed");
    let detail = get_side_quest(conn, policy, id)?;
    Ok(SideQuestUpdate::Updated(Box::new(detail)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SideQuestFollowupInput {
    pub entry_date: Option<String>,
    pub action: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

pub fn add_side_quest_followup(
    conn: &mut SqliteConnection,
    side_quest_id: &str,
    input: SideQuestFollowupInput,
) -> TrackerResult<SideQuestFollowupDetail> {
    let action = required(&input.action, "action")?;
    let now = Utc::now().naive_utc();
    let entry_date = match input.entry_date.as_deref().map(str::trim) {
        None | Some("") => now,
        Some(raw) => parse_datetime(raw)?,
    };
    let followup_id = Uuid::new_v4().to_string();
    let attachments = input
        .attachments
        .into_iter()
        .map(|attachment| {
            NewAttachment::new(
                AttachmentParent::SideQuestFollowup(followup_id.clone()),
                attachment,
            )
        })
        .collect::<TrackerResult<Vec<_>>>()?;
    let entry = NewSideQuestFollowUp {
        id: followup_id.clone(),
        side_quest_id: side_quest_id.to_string(),
        entry_date,
        action,
        created_at: now,
    };

    let detail = conn.transaction::<SideQuestFollowupDetail, TrackerError, _>(|conn| {
        let exists: i64 = side_quests::table
            .filter(side_quests::id.eq(side_quest_id))
            .count()
            .get_result(conn)?;
        if exists == 0 {
            return Err(TrackerError::not_found("side quest", side_quest_id));
        }

        diesel::insert_into(side_quest_followups::table)
            .values(&entry)
            .execute(conn)?;
        let mut stored = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            stored.push(insert_attachment(conn, attachment)?);
        }
        diesel::update(side_quests::table.find(side_quest_id))
            .set(side_quests::updated_at.eq(now))
            .execute(conn)?;

        let followup = side_quest_followups::table.find(&followup_id).first(conn)?;
        Ok(SideQuestFollowupDetail {
            followup,
            attachments: stored,
        })
    })?;

    info!(side_quest_id, followup_id = %detail.followup.id, "side quest follow-up logged");
    Ok(detail)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SideQuestFilter {
    pub status: Option<String>,
    pub executor: Option<String>,
    pub search: Option<String>,
}

/// Soonest due first.
pub fn list_side_quests(
    conn: &mut SqliteConnection,
    policy: &SlaPolicy,
    filter: &SideQuestFilter,
) -> TrackerResult<Vec<SideQuestSummary>> {
    let mut query: side_quests::BoxedQuery<'static, Sqlite> = side_quests::table.into_boxed();

    if let Some(raw) = filter.status.as_deref().filter(|raw| !raw.trim().is_empty()) {
        let status: SideQuestStatus = raw.parse()?;
        query = query.filter(side_quests::status.eq(status.as_str()));
    }
    if let Some(executor) = filter
        .executor
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        query = query.filter(side_quests::executor.eq(executor.to_string()));
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        let pattern = format!("%{search}%");
        query = query.filter(
            side_quests::quest_name
                .like(pattern.clone())
                .or(side_quests::ticket_code.like(pattern)),
        );
    }

    let rows: Vec<SideQuest> = query
        .order((side_quests::due_date.asc(), side_quests::updated_at.desc()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|side_quest| SideQuestSummary {
            sla_status: sla_status_of(&side_quest, policy),
            is_strategic: is_strategic(side_quest.impact_score),
            side_quest,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn ticket_code_has_date_and_hex_suffix() {
        let now = NaiveDate::from_ymd_opt(2026, 2, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let code = generate_ticket_code(now);
        assert!(code.starts_with("SQ-20260216-"));
        let suffix = &code["SQ-20260216-".len()..];
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn strategic_threshold() {
        assert!(!is_strategic(3));
        assert!(is_strategic(4));
        assert!(is_strategic(5));
    }

    #[test]
    fn unique_violation_detection() {
        let err = TrackerError::Database(DieselError::NotFound);
        assert!(!is_unique_violation(&err));
        assert!(!is_unique_violation(&TrackerError::validation("x")));
    }
}
