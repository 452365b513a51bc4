use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{ArchivedAttachment, Attachment, NewAttachmentRow};
use crate::schema::{attachments, followup_tasks, side_quest_followups, side_quests, submissions};

pub const KIND_SUBMISSION: &str = "submission";
pub const KIND_FOLLOWUP_TASK: &str = "followup_task";
pub const KIND_SIDE_QUEST: &str = "side_quest";
pub const KIND_SIDE_QUEST_FOLLOWUP: &str = "side_quest_followup";

/// The single owner of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AttachmentParent {
    Submission(String),
    FollowupTask(String),
    SideQuest(String),
    SideQuestFollowup(String),
}

impl AttachmentParent {
    pub fn kind(&self) -> &'static str {
        match self {
            AttachmentParent::Submission(_) => KIND_SUBMISSION,
            AttachmentParent::FollowupTask(_) => KIND_FOLLOWUP_TASK,
            AttachmentParent::SideQuest(_) => KIND_SIDE_QUEST,
            AttachmentParent::SideQuestFollowup(_) => KIND_SIDE_QUEST_FOLLOWUP,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            AttachmentParent::Submission(id)
            | AttachmentParent::FollowupTask(id)
            | AttachmentParent::SideQuest(id)
            | AttachmentParent::SideQuestFollowup(id) => id,
        }
    }

    pub fn from_parts(kind: &str, id: impl Into<String>) -> TrackerResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TrackerError::validation("attachment parent id must not be empty"));
        }
        match kind {
            KIND_SUBMISSION => Ok(AttachmentParent::Submission(id)),
            KIND_FOLLOWUP_TASK => Ok(AttachmentParent::FollowupTask(id)),
            KIND_SIDE_QUEST => Ok(AttachmentParent::SideQuest(id)),
            KIND_SIDE_QUEST_FOLLOWUP => Ok(AttachmentParent::SideQuestFollowup(id)),
            other => Err(TrackerError::validation(format!(
                "unknown attachment parent kind `{other}`"
            ))),
        }
    }

    /// Builds a parent from the four optional owner references a form carries.
    /// Exactly one of them must be set.
    pub fn from_refs(
        submission_id: Option<String>,
        followup_task_id: Option<String>,
        side_quest_id: Option<String>,
        side_quest_followup_id: Option<String>,
    ) -> TrackerResult<Self> {
        let candidates = [
            (KIND_SUBMISSION, submission_id),
            (KIND_FOLLOWUP_TASK, followup_task_id),
            (KIND_SIDE_QUEST, side_quest_id),
            (KIND_SIDE_QUEST_FOLLOWUP, side_quest_followup_id),
        ];
        let mut present = candidates
            .into_iter()
            .filter_map(|(kind, id)| id.filter(|value| !value.trim().is_empty()).map(|id| (kind, id)));

        match (present.next(), present.next()) {
            (Some((kind, id)), None) => AttachmentParent::from_parts(kind, id),
            (None, _) => Err(TrackerError::validation("attachment must have a parent")),
            (Some(_), Some(_)) => Err(TrackerError::validation(
                "attachment must have exactly one parent",
            )),
        }
    }

    fn ensure_exists(&self, conn: &mut SqliteConnection) -> TrackerResult<()> {
        let found: i64 = match self {
            AttachmentParent::Submission(id) => submissions::table
                .filter(submissions::id.eq(id))
                .count()
                .get_result(conn)?,
            AttachmentParent::FollowupTask(id) => followup_tasks::table
                .filter(followup_tasks::id.eq(id))
                .count()
                .get_result(conn)?,
            AttachmentParent::SideQuest(id) => side_quests::table
                .filter(side_quests::id.eq(id))
                .count()
                .get_result(conn)?,
            AttachmentParent::SideQuestFollowup(id) => side_quest_followups::table
                .filter(side_quest_followups::id.eq(id))
                .count()
                .get_result(conn)?,
        };
        if found == 0 {
            return Err(TrackerError::not_found(self.entity_name(), self.id()));
        }
        Ok(())
    }

    fn entity_name(&self) -> &'static str {
        match self {
            AttachmentParent::Submission(_) => "submission",
            AttachmentParent::FollowupTask(_) => "follow-up task",
            AttachmentParent::SideQuest(_) => "side quest",
            AttachmentParent::SideQuestFollowup(_) => "side quest follow-up",
        }
    }
}

impl Attachment {
    /// Archived copy owned by the same logical parent; ids are preserved.
    pub fn to_archived(&self, archived_at: NaiveDateTime) -> ArchivedAttachment {
        ArchivedAttachment {
            id: self.id.clone(),
            parent_kind: self.parent_kind.clone(),
            parent_id: self.parent_id.clone(),
            filename: self.filename.clone(),
            storage_path: self.storage_path.clone(),
            caption: self.caption.clone(),
            mime_type: self.mime_type.clone(),
            created_at: self.created_at,
            archived_at,
        }
    }
}

/// Metadata for a file that has already been stored elsewhere.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentInput {
    pub filename: String,
    pub storage_path: String,
    pub caption: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    parent: AttachmentParent,
    filename: String,
    storage_path: String,
    caption: Option<String>,
    mime_type: Option<String>,
}

impl NewAttachment {
    pub fn new(parent: AttachmentParent, input: AttachmentInput) -> TrackerResult<Self> {
        let filename = input.filename.trim().to_string();
        if filename.is_empty() {
            return Err(TrackerError::validation("attachment filename must not be empty"));
        }
        let storage_path = input.storage_path.trim().to_string();
        if storage_path.is_empty() {
            return Err(TrackerError::validation(
                "attachment storage path must not be empty",
            ));
        }

        let caption = input
            .caption
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let mime_type = input
            .mime_type
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| {
                mime_guess::from_path(&filename)
                    .first()
                    .map(|mime| mime.essence_str().to_string())
            });

        Ok(Self {
            parent,
            filename,
            storage_path,
            caption,
            mime_type,
        })
    }

    pub fn parent(&self) -> &AttachmentParent {
        &self.parent
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn into_row(self, now: NaiveDateTime) -> NewAttachmentRow {
        NewAttachmentRow {
            id: Uuid::new_v4().to_string(),
            parent_kind: self.parent.kind().to_string(),
            parent_id: self.parent.id().to_string(),
            filename: self.filename,
            storage_path: self.storage_path,
            caption: self.caption,
            mime_type: self.mime_type,
            created_at: now,
        }
    }
}

pub fn insert_attachment(
    conn: &mut SqliteConnection,
    attachment: NewAttachment,
) -> TrackerResult<Attachment> {
    attachment.parent().ensure_exists(conn)?;
    let row = attachment.into_row(Utc::now().naive_utc());
    diesel::insert_into(attachments::table)
        .values(&row)
        .execute(conn)?;
    let stored = attachments::table.find(&row.id).first(conn)?;
    Ok(stored)
}

pub fn attachments_for(
    conn: &mut SqliteConnection,
    parent: &AttachmentParent,
) -> TrackerResult<Vec<Attachment>> {
    let rows = attachments::table
        .filter(attachments::parent_kind.eq(parent.kind()))
        .filter(attachments::parent_id.eq(parent.id()))
        .order(attachments::created_at.asc())
        .load(conn)?;
    Ok(rows)
}

pub fn attachments_for_ids(
    conn: &mut SqliteConnection,
    kind: &str,
    parent_ids: &[String],
) -> TrackerResult<Vec<Attachment>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = attachments::table
        .filter(attachments::parent_kind.eq(kind))
        .filter(attachments::parent_id.eq_any(parent_ids))
        .order(attachments::created_at.asc())
        .load(conn)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(filename: &str) -> AttachmentInput {
        AttachmentInput {
            filename: filename.to_string(),
            storage_path: format!("/uploads/{filename}"),
            caption: None,
            mime_type: None,
        }
    }

    #[test]
    fn exactly_one_reference_is_required() {
        let parent = AttachmentParent::from_refs(None, Some("task-1".into()), None, None).unwrap();
        assert_eq!(parent, AttachmentParent::FollowupTask("task-1".into()));

        let none = AttachmentParent::from_refs(None, None, None, Some("  ".into()));
        assert!(matches!(none, Err(TrackerError::Validation(_))));

        let both =
            AttachmentParent::from_refs(Some("sub-1".into()), None, Some("sq-1".into()), None);
        assert!(matches!(both, Err(TrackerError::Validation(_))));
    }

    #[test]
    fn parts_round_trip() {
        let parent = AttachmentParent::SideQuestFollowup("f-9".into());
        let rebuilt = AttachmentParent::from_parts(parent.kind(), parent.id()).unwrap();
        assert_eq!(parent, rebuilt);
        assert!(AttachmentParent::from_parts("folder", "x").is_err());
    }

    #[test]
    fn parent_serializes_as_tagged_value() {
        let parent = AttachmentParent::Submission("abc".into());
        let json = serde_json::to_value(&parent).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "submission", "id": "abc" }));
    }

    #[test]
    fn guesses_mime_type_from_filename() {
        let parent = AttachmentParent::Submission("abc".into());
        let attachment = NewAttachment::new(parent.clone(), input("diagram.png")).unwrap();
        assert_eq!(attachment.mime_type(), Some("image/png"));

        let mut explicit = input("notes.bin");
        explicit.mime_type = Some("application/x-custom".into());
        let attachment = NewAttachment::new(parent, explicit).unwrap();
        assert_eq!(attachment.mime_type(), Some("application/x-custom"));
    }

    #[test]
    fn rejects_blank_filename() {
        let parent = AttachmentParent::Submission("abc".into());
        assert!(NewAttachment::new(parent, input("   ")).is_err());
    }
}
