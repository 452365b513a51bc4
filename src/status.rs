//! Lifecycle states for submissions and side quests, with their transition
//! tables. `Archived` is terminal for both.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Submitted,
    #[serde(rename = "In-Review")]
    InReview,
    #[serde(rename = "Revision Needed")]
    RevisionNeeded,
    Approved,
    Rejected,
    Archived,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 6] = [
        SubmissionStatus::Submitted,
        SubmissionStatus::InReview,
        SubmissionStatus::RevisionNeeded,
        SubmissionStatus::Approved,
        SubmissionStatus::Rejected,
        SubmissionStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "Submitted",
            SubmissionStatus::InReview => "In-Review",
            SubmissionStatus::RevisionNeeded => "Revision Needed",
            SubmissionStatus::Approved => "Approved",
            SubmissionStatus::Rejected => "Rejected",
            SubmissionStatus::Archived => "Archived",
        }
    }

    /// A decision has been reached; the SLA clock no longer matters.
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Approved | SubmissionStatus::Rejected
        )
    }

    pub fn allowed_next(&self) -> &'static [SubmissionStatus] {
        use SubmissionStatus::*;
        match self {
            Submitted => &[InReview, RevisionNeeded, Approved, Rejected, Archived],
            InReview => &[Submitted, RevisionNeeded, Approved, Rejected, Archived],
            RevisionNeeded => &[Submitted, InReview, Approved, Rejected, Archived],
            Approved => &[InReview, RevisionNeeded, Archived],
            Rejected => &[InReview, RevisionNeeded, Archived],
            Archived => &[],
        }
    }

    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        (*self == next && next != SubmissionStatus::Archived) || self.allowed_next().contains(&next)
    }

    pub fn transition_to(self, next: SubmissionStatus) -> Result<SubmissionStatus, TrackerError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TrackerError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        SubmissionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TrackerError::validation(format!("unknown submission status `{trimmed}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideQuestStatus {
    #[serde(alias = "Submited")]
    Submitted,
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    #[serde(rename = "Waiting Confirmation")]
    WaitingConfirmation,
    Archived,
}

impl SideQuestStatus {
    pub const ALL: [SideQuestStatus; 6] = [
        SideQuestStatus::Submitted,
        SideQuestStatus::Pending,
        SideQuestStatus::InProgress,
        SideQuestStatus::Done,
        SideQuestStatus::WaitingConfirmation,
        SideQuestStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SideQuestStatus::Submitted => "Submitted",
            SideQuestStatus::Pending => "Pending",
            SideQuestStatus::InProgress => "In Progress",
            SideQuestStatus::Done => "Done",
            SideQuestStatus::WaitingConfirmation => "Waiting Confirmation",
            SideQuestStatus::Archived => "Archived",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SideQuestStatus::Done)
    }

    /// Live states move freely between each other; only leaving `Archived`
    /// is forbidden.
    pub fn can_transition_to(&self, _next: SideQuestStatus) -> bool {
        *self != SideQuestStatus::Archived
    }

    pub fn transition_to(self, next: SideQuestStatus) -> Result<SideQuestStatus, TrackerError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TrackerError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for SideQuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SideQuestStatus {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        // Older rows carry the misspelled label.
        if trimmed.eq_ignore_ascii_case("Submited") {
            return Ok(SideQuestStatus::Submitted);
        }
        SideQuestStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TrackerError::validation(format!("unknown side quest status `{trimmed}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionType {
    #[serde(rename = "New Service")]
    NewService,
    #[serde(rename = "Major Change")]
    MajorChange,
    #[serde(rename = "Tech Refresh")]
    TechRefresh,
    Deprecation,
    #[serde(rename = "Normal Change")]
    NormalChange,
    #[serde(rename = "Bug Fixing")]
    BugFixing,
}

impl SubmissionType {
    pub const ALL: [SubmissionType; 6] = [
        SubmissionType::NewService,
        SubmissionType::MajorChange,
        SubmissionType::TechRefresh,
        SubmissionType::Deprecation,
        SubmissionType::NormalChange,
        SubmissionType::BugFixing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionType::NewService => "New Service",
            SubmissionType::MajorChange => "Major Change",
            SubmissionType::TechRefresh => "Tech Refresh",
            SubmissionType::Deprecation => "Deprecation",
            SubmissionType::NormalChange => "Normal Change",
            SubmissionType::BugFixing => "Bug Fixing",
        }
    }
}

impl FromStr for SubmissionType {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        SubmissionType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TrackerError::validation(format!("unknown submission type `{trimmed}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!(
            "in-review".parse::<SubmissionStatus>().unwrap(),
            SubmissionStatus::InReview
        );
        assert_eq!(
            " Revision Needed ".parse::<SubmissionStatus>().unwrap(),
            SubmissionStatus::RevisionNeeded
        );
        assert!("Closed".parse::<SubmissionStatus>().is_err());
        assert_eq!(
            "bug fixing".parse::<SubmissionType>().unwrap(),
            SubmissionType::BugFixing
        );
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for status in SubmissionStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for status in SideQuestStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn archived_submission_is_terminal() {
        for next in SubmissionStatus::ALL {
            assert!(SubmissionStatus::Archived.transition_to(next).is_err());
        }
    }

    #[test]
    fn submission_review_flow() {
        let status = SubmissionStatus::Submitted
            .transition_to(SubmissionStatus::InReview)
            .and_then(|s| s.transition_to(SubmissionStatus::RevisionNeeded))
            .and_then(|s| s.transition_to(SubmissionStatus::InReview))
            .and_then(|s| s.transition_to(SubmissionStatus::Approved))
            .and_then(|s| s.transition_to(SubmissionStatus::Archived))
            .unwrap();
        assert_eq!(status, SubmissionStatus::Archived);
    }

    #[test]
    fn decided_submission_cannot_return_to_submitted() {
        let err = SubmissionStatus::Approved
            .transition_to(SubmissionStatus::Submitted)
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTransition { .. }));
        assert!(SubmissionStatus::Rejected
            .transition_to(SubmissionStatus::Submitted)
            .is_err());
    }

    #[test]
    fn same_status_is_a_no_op() {
        assert!(SubmissionStatus::Approved.can_transition_to(SubmissionStatus::Approved));
        assert!(!SubmissionStatus::Archived.can_transition_to(SubmissionStatus::Archived));
    }

    #[test]
    fn completion_states() {
        assert!(SubmissionStatus::Approved.is_completed());
        assert!(SubmissionStatus::Rejected.is_completed());
        assert!(!SubmissionStatus::InReview.is_completed());
        assert!(SideQuestStatus::Done.is_completed());
        assert!(!SideQuestStatus::WaitingConfirmation.is_completed());
    }

    #[test]
    fn side_quest_accepts_legacy_spelling() {
        assert_eq!(
            "Submited".parse::<SideQuestStatus>().unwrap(),
            SideQuestStatus::Submitted
        );
        let parsed: SideQuestStatus = serde_json::from_str("\"Submited\"").unwrap();
        assert_eq!(parsed, SideQuestStatus::Submitted);
    }

    #[test]
    fn side_quest_leaves_archived_never() {
        assert!(SideQuestStatus::Done.can_transition_to(SideQuestStatus::InProgress));
        assert!(SideQuestStatus::Pending.can_transition_to(SideQuestStatus::Archived));
        assert!(SideQuestStatus::Archived
            .transition_to(SideQuestStatus::Pending)
            .is_err());
    }
}
