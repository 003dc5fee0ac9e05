use std::path::PathBuf;

use lexscan_model::{ReviewAction, ReviewId, ReviewStatus};
use lexscan_validate::Issue;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write record to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("record sink unavailable: {message}")]
    Unavailable { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("review item {id} not found")]
    NotFound { id: ReviewId },

    #[error("cannot {action} review item {id} while {from}")]
    InvalidTransition {
        id: ReviewId,
        from: ReviewStatus,
        action: ReviewAction,
    },

    #[error("{operation} requires a non-empty comment")]
    EmptyComment { operation: &'static str },

    #[error("corrections cannot accompany {action}")]
    CorrectionsNotAllowed { action: ReviewAction },

    #[error("field {field} is not part of schema {schema}")]
    UnknownField { field: String, schema: String },

    #[error("review item {id} failed validation: {}", summarize(.issues))]
    ValidationFailed { id: ReviewId, issues: Vec<Issue> },

    #[error("confidence threshold must lie in [0, 1], got {value}")]
    InvalidThreshold { value: f32 },

    #[error("record sink failed: {0}")]
    Sink(#[from] SinkError),
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(Issue::message)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
