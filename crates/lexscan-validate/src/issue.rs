//! Validation issue types.
//!
//! Each variant carries only the data its message needs.

use serde::{Deserialize, Serialize};

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Blocks approval
    Error,
    /// Shown to the reviewer only
    Warning,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    // Presence
    /// Required schema field has no mapping
    RequiredMissing { field: String },

    // Format
    /// Value does not match the field's validation pattern
    PatternMismatch {
        field: String,
        value: String,
        pattern: String,
    },
    /// Select value outside the field's options
    InvalidOption {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    /// Date field value is not an ISO calendar date
    InvalidDate { field: String, value: String },
    /// Number field value is not a whole number
    NotANumber { field: String, value: String },

    // Document
    /// Document type not recognized, or `type` value too short to name one
    UnrecognizedDocumentType { value: String },
    /// Date that must not lie after the validation day
    FutureDate { field: String, value: String },

    // Template rules
    /// A document type's validation rule failed
    RuleViolation {
        field: String,
        rule: String,
        message: String,
    },

    // Quality
    /// Mapping confidence below the low band
    LowConfidence { field: String, confidence: f32 },
}

impl Issue {
    /// Field name (all issues have one).
    pub fn field(&self) -> &str {
        match self {
            Issue::RequiredMissing { field } => field,
            Issue::PatternMismatch { field, .. } => field,
            Issue::InvalidOption { field, .. } => field,
            Issue::InvalidDate { field, .. } => field,
            Issue::NotANumber { field, .. } => field,
            Issue::UnrecognizedDocumentType { .. } => "type",
            Issue::FutureDate { field, .. } => field,
            Issue::RuleViolation { field, .. } => field,
            Issue::LowConfidence { field, .. } => field,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Issue::LowConfidence { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Issue::RequiredMissing { .. } => "required_missing",
            Issue::PatternMismatch { .. } => "pattern_mismatch",
            Issue::InvalidOption { .. } => "invalid_option",
            Issue::InvalidDate { .. } => "invalid_date",
            Issue::NotANumber { .. } => "not_a_number",
            Issue::UnrecognizedDocumentType { .. } => "unrecognized_document_type",
            Issue::FutureDate { .. } => "future_date",
            Issue::RuleViolation { .. } => "rule_violation",
            Issue::LowConfidence { .. } => "low_confidence",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Issue::RequiredMissing { field } => {
                format!("Required field {field} is missing")
            }

            Issue::PatternMismatch {
                field,
                value,
                pattern,
            } => {
                format!("Field {field} value '{value}' does not match {pattern}")
            }

            Issue::InvalidOption {
                field,
                value,
                allowed,
            } => {
                format!(
                    "Field {field} value '{value}' is not one of: {}",
                    allowed.join(", ")
                )
            }

            Issue::InvalidDate { field, value } => {
                format!("Field {field} value '{value}' is not a YYYY-MM-DD date")
            }

            Issue::NotANumber { field, value } => {
                format!("Field {field} value '{value}' is not a number")
            }

            Issue::UnrecognizedDocumentType { value } if value.is_empty() => {
                "Document type not recognized".to_string()
            }

            Issue::UnrecognizedDocumentType { value } => {
                format!("Document type '{value}' not recognized")
            }

            Issue::FutureDate { field, value } => {
                format!("Field {field} date {value} lies in the future")
            }

            Issue::RuleViolation { field, message, .. } => {
                format!("Field {field}: {message}")
            }

            Issue::LowConfidence { field, confidence } => {
                format!("Field {field} mapped with low confidence ({confidence:.2})")
            }
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
