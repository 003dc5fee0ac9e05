//! Review items and the approval state machine's states and actions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::entity::Extraction;
use crate::ids::{DocumentTypeId, ReviewId};
use crate::mapping::MappingResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::UnderReview => "under_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Approved | ReviewStatus::Rejected)
    }

    /// Transition table of the approval workflow.
    ///
    /// Returns the next status, or `None` when `action` is not legal from `self`.
    pub fn transition(self, action: ReviewAction) -> Option<ReviewStatus> {
        match (self, action) {
            (ReviewStatus::Pending, ReviewAction::StartReview) => Some(ReviewStatus::UnderReview),
            (ReviewStatus::Pending, ReviewAction::Approve) => Some(ReviewStatus::Approved),
            (ReviewStatus::Pending, ReviewAction::Reject) => Some(ReviewStatus::Rejected),
            (ReviewStatus::Pending, ReviewAction::RequestCorrection) => None,
            (ReviewStatus::UnderReview, ReviewAction::StartReview) => None,
            (ReviewStatus::UnderReview, ReviewAction::Approve) => Some(ReviewStatus::Approved),
            (ReviewStatus::UnderReview, ReviewAction::Reject) => Some(ReviewStatus::Rejected),
            (ReviewStatus::UnderReview, ReviewAction::RequestCorrection) => {
                Some(ReviewStatus::Pending)
            }
            (ReviewStatus::Approved | ReviewStatus::Rejected, _) => None,
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "under_review" => Ok(ReviewStatus::UnderReview),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(ModelError::UnknownVariant {
                kind: "review status",
                value: s.to_string(),
            }),
        }
    }
}

/// Decision a reviewer applies to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    StartReview,
    Approve,
    Reject,
    RequestCorrection,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::StartReview => "start_review",
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::RequestCorrection => "request_correction",
        }
    }

    pub fn requires_comment(&self) -> bool {
        matches!(self, ReviewAction::Reject | ReviewAction::RequestCorrection)
    }

    /// Kind of the audit comment appended when the action succeeds.
    pub fn comment_kind(&self) -> CommentKind {
        match self {
            ReviewAction::StartReview => CommentKind::Review,
            ReviewAction::Approve => CommentKind::Validation,
            ReviewAction::Reject => CommentKind::Rejection,
            ReviewAction::RequestCorrection => CommentKind::Correction,
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewAction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "start_review" | "review" => Ok(ReviewAction::StartReview),
            "approve" => Ok(ReviewAction::Approve),
            "reject" => Ok(ReviewAction::Reject),
            "request_correction" | "correct" => Ok(ReviewAction::RequestCorrection),
            _ => Err(ModelError::UnknownVariant {
                kind: "review action",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Submission,
    Review,
    Correction,
    Validation,
    Rejection,
    Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: CommentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalDocument {
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    pub page_count: u32,
}

/// Unit of work tracked by the approval workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: ReviewId,
    pub original_document: OriginalDocument,
    pub document_type: DocumentTypeId,
    pub extraction: Extraction,
    /// Recognition confidence reported by the OCR engine, kept apart from mapping confidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
    pub mapping_result: MappingResult,
    pub status: ReviewStatus,
    pub comments: Vec<ReviewComment>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
}

impl ReviewItem {
    pub fn push_comment(
        &mut self,
        author: impl Into<String>,
        content: impl Into<String>,
        kind: CommentKind,
        timestamp: DateTime<Utc>,
    ) {
        self.comments.push(ReviewComment {
            author: author.into(),
            content: content.into(),
            timestamp,
            kind,
        });
    }

    pub fn last_comment(&self) -> Option<&ReviewComment> {
        self.comments.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [ReviewAction; 4] = [
        ReviewAction::StartReview,
        ReviewAction::Approve,
        ReviewAction::Reject,
        ReviewAction::RequestCorrection,
    ];

    #[test]
    fn pending_reaches_review_or_decision() {
        let reachable: Vec<ReviewStatus> = ACTIONS
            .iter()
            .filter_map(|action| ReviewStatus::Pending.transition(*action))
            .collect();
        assert_eq!(
            reachable,
            vec![
                ReviewStatus::UnderReview,
                ReviewStatus::Approved,
                ReviewStatus::Rejected
            ]
        );
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        for status in [ReviewStatus::Approved, ReviewStatus::Rejected] {
            assert!(status.is_terminal());
            for action in ACTIONS {
                assert_eq!(status.transition(action), None);
            }
        }
    }

    #[test]
    fn correction_returns_to_pending() {
        assert_eq!(
            ReviewStatus::UnderReview.transition(ReviewAction::RequestCorrection),
            Some(ReviewStatus::Pending)
        );
    }

    #[test]
    fn action_parsing_accepts_aliases() {
        assert_eq!(
            "request-correction".parse::<ReviewAction>().unwrap(),
            ReviewAction::RequestCorrection
        );
        assert_eq!(
            "review".parse::<ReviewAction>().unwrap(),
            ReviewAction::StartReview
        );
        assert!("archive".parse::<ReviewAction>().is_err());
    }
}
