//! Field-level audit trail for submission updates.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::TrackerResult;
use crate::models::{ChangeLogEntry, NewChangeLogEntry, Submission, SubmissionChangeset};
use crate::schema::change_log_entries;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeLogView {
    pub id: String,
    pub submission_id: String,
    pub recorded_at: NaiveDateTime,
    pub actor: String,
    pub changes: Vec<FieldChange>,
}

impl TryFrom<ChangeLogEntry> for ChangeLogView {
    type Error = serde_json::Error;

    fn try_from(entry: ChangeLogEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            changes: serde_json::from_str(&entry.changes)?,
            id: entry.id,
            submission_id: entry.submission_id,
            recorded_at: entry.recorded_at,
            actor: entry.actor,
        })
    }
}

enum Tracked<'a> {
    Text(Option<&'a str>),
    Date(Option<NaiveDateTime>),
    Number(i32),
}

fn render_date(value: Option<NaiveDateTime>) -> String {
    value
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Default)]
struct DiffBuilder {
    changes: Vec<FieldChange>,
}

impl DiffBuilder {
    fn check(&mut self, field: &str, old: Tracked<'_>, new: Tracked<'_>) {
        let (old, new) = match (old, new) {
            // Instants, not calendar days, decide whether a date changed.
            (Tracked::Date(old), Tracked::Date(new)) => {
                if old == new {
                    return;
                }
                (render_date(old), render_date(new))
            }
            (Tracked::Number(old), Tracked::Number(new)) => {
                if old == new {
                    return;
                }
                (old.to_string(), new.to_string())
            }
            (Tracked::Text(old), Tracked::Text(new)) => {
                let old = old.unwrap_or_default();
                let new = new.unwrap_or_default();
                if old == new {
                    return;
                }
                (old.to_string(), new.to_string())
            }
            _ => return,
        };

        if old.is_empty() && new.is_empty() {
            return;
        }

        self.changes.push(FieldChange {
            field: field.to_string(),
            old,
            new,
        });
    }
}

/// Ordered list of differences between the stored submission and a full-form
/// update of it. Empty-to-empty changes are not reported.
pub fn diff_submission(current: &Submission, proposed: &SubmissionChangeset) -> Vec<FieldChange> {
    let mut diff = DiffBuilder::default();
    diff.check(
        "Name",
        Tracked::Text(Some(&current.name)),
        Tracked::Text(Some(&proposed.name)),
    );
    diff.check(
        "Description",
        Tracked::Text(Some(&current.description)),
        Tracked::Text(Some(&proposed.description)),
    );
    diff.check(
        "Owner Squad",
        Tracked::Text(Some(&current.owner_squad)),
        Tracked::Text(Some(&proposed.owner_squad)),
    );
    diff.check(
        "PIC",
        Tracked::Text(Some(&current.pic)),
        Tracked::Text(Some(&proposed.pic)),
    );
    diff.check(
        "Type",
        Tracked::Text(Some(&current.submission_type)),
        Tracked::Text(Some(&proposed.submission_type)),
    );
    diff.check(
        "Submission Date",
        Tracked::Date(Some(current.submission_date)),
        Tracked::Date(Some(proposed.submission_date)),
    );
    diff.check(
        "Review Date",
        Tracked::Date(current.review_date),
        Tracked::Date(proposed.review_date),
    );
    diff.check(
        "Decision Date",
        Tracked::Date(current.decision_date),
        Tracked::Date(proposed.decision_date),
    );
    diff.check(
        "Status",
        Tracked::Text(Some(&current.status)),
        Tracked::Text(Some(&proposed.status)),
    );
    diff.check(
        "Decision",
        Tracked::Text(current.decision.as_deref()),
        Tracked::Text(proposed.decision.as_deref()),
    );
    diff.check(
        "Mitigation Notes",
        Tracked::Text(current.mitigation_notes.as_deref()),
        Tracked::Text(proposed.mitigation_notes.as_deref()),
    );
    diff.check(
        "ADR Number",
        Tracked::Text(current.adr_number.as_deref()),
        Tracked::Text(proposed.adr_number.as_deref()),
    );
    diff.check(
        "Notes",
        Tracked::Text(current.notes.as_deref()),
        Tracked::Text(proposed.notes.as_deref()),
    );
    diff.check(
        "SLA Duration",
        Tracked::Number(current.sla_duration_workdays),
        Tracked::Number(proposed.sla_duration_workdays),
    );
    diff.changes
}

/// Appends one change-log entry when `proposed` differs from `current`.
/// Run it inside the same transaction as the update it describes.
pub fn record_changes_if_any(
    conn: &mut SqliteConnection,
    current: &Submission,
    proposed: &SubmissionChangeset,
    actor: &str,
) -> TrackerResult<Option<ChangeLogEntry>> {
    let changes = diff_submission(current, proposed);
    if changes.is_empty() {
        debug!(submission_id = %current.id, "no tracked field changed");
        return Ok(None);
    }

    let entry = NewChangeLogEntry {
        id: Uuid::new_v4().to_string(),
        submission_id: current.id.clone(),
        recorded_at: Utc::now().naive_utc(),
        actor: actor.to_string(),
        changes: serde_json::to_string(&changes)?,
    };
    diesel::insert_into(change_log_entries::table)
        .values(&entry)
        .execute(conn)?;

    debug!(
        submission_id = %current.id,
        fields = changes.len(),
        "recorded change log entry"
    );

    let stored = change_log_entries::table
        .find(entry.id.as_str())
        .first(conn)?;
    Ok(Some(stored))
}

/// Newest first. Entries survive archival of the submission.
pub fn history(
    conn: &mut SqliteConnection,
    submission_id: &str,
) -> TrackerResult<Vec<ChangeLogView>> {
    let entries: Vec<ChangeLogEntry> = change_log_entries::table
        .filter(change_log_entries::submission_id.eq(submission_id))
        .order(change_log_entries::recorded_at.desc())
        .load(conn)?;

    let views = entries
        .into_iter()
        .map(ChangeLogView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn submission() -> Submission {
        Submission {
            id: "sub-1".into(),
            name: "A".into(),
            description: "desc".into(),
            owner_squad: "Data".into(),
            pic: "rina".into(),
            submission_type: "New Service".into(),
            submission_date: at(2026, 2, 16, 9),
            review_date: None,
            decision_date: None,
            status: "Submitted".into(),
            decision: None,
            mitigation_notes: Some(String::new()),
            adr_number: None,
            notes: None,
            sla_duration_workdays: 5,
            sla_target_date: at(2026, 2, 23, 9),
            created_at: at(2026, 2, 16, 9),
            updated_at: at(2026, 2, 16, 9),
        }
    }

    fn unchanged(current: &Submission) -> SubmissionChangeset {
        SubmissionChangeset {
            name: current.name.clone(),
            description: current.description.clone(),
            owner_squad: current.owner_squad.clone(),
            pic: current.pic.clone(),
            submission_type: current.submission_type.clone(),
            submission_date: current.submission_date,
            review_date: current.review_date,
            decision_date: current.decision_date,
            status: current.status.clone(),
            decision: current.decision.clone(),
            mitigation_notes: current.mitigation_notes.clone(),
            adr_number: current.adr_number.clone(),
            notes: current.notes.clone(),
            sla_duration_workdays: current.sla_duration_workdays,
            sla_target_date: current.sla_target_date,
            updated_at: current.updated_at,
        }
    }

    #[test]
    fn rename_produces_single_change() {
        let current = submission();
        let mut proposed = unchanged(&current);
        proposed.name = "B".into();

        let changes = diff_submission(&current, &proposed);
        assert_eq!(
            changes,
            vec![FieldChange {
                field: "Name".into(),
                old: "A".into(),
                new: "B".into(),
            }]
        );
    }

    #[test]
    fn null_to_empty_is_not_a_change() {
        let current = submission();
        let mut proposed = unchanged(&current);
        proposed.mitigation_notes = None;
        proposed.notes = Some(String::new());

        assert!(diff_submission(&current, &proposed).is_empty());
    }

    #[test]
    fn dates_compare_by_instant_and_render_as_days() {
        let current = submission();
        let mut proposed = unchanged(&current);
        proposed.submission_date = at(2026, 2, 16, 15);
        proposed.review_date = Some(at(2026, 2, 18, 10));

        let changes = diff_submission(&current, &proposed);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "Submission Date");
        assert_eq!(changes[0].old, "2026-02-16");
        assert_eq!(changes[0].new, "2026-02-16");
        assert_eq!(changes[1].field, "Review Date");
        assert_eq!(changes[1].old, "");
        assert_eq!(changes[1].new, "2026-02-18");
    }

    #[test]
    fn keeps_field_order() {
        let current = submission();
        let mut proposed = unchanged(&current);
        proposed.sla_duration_workdays = 8;
        proposed.status = "In-Review".into();
        proposed.pic = "dimas".into();

        let fields: Vec<_> = diff_submission(&current, &proposed)
            .into_iter()
            .map(|change| change.field)
            .collect();
        assert_eq!(fields, vec!["PIC", "Status", "SLA Duration"]);
    }
}
