#![deny(unsafe_code)]

//! Validation of mapped records before approval.
//!
//! Checks, in order:
//!
//! - **Presence**: every required schema field has a value
//! - **Format**: validation patterns, select options, ISO dates, whole numbers
//! - **Document**: a recognized document type and a publication date that
//!   does not lie in the future, for every template
//! - **Template rules**: the document type's `required`, `pattern`,
//!   `not_future`, `min_length` and `one_of` rules
//! - **Confidence**: machine-mapped fields below the low band (warnings)
//!
//! Any `Error` issue blocks the `approve` transition.

pub mod checks;
mod issue;
mod report;

use chrono::NaiveDate;
use lexscan_catalog::DocumentTypeTemplate;
use lexscan_model::{ConfidenceThresholds, FormSchema, MappingResult};
use tracing::debug;

pub use issue::{Issue, Severity};
pub use report::ValidationReport;

/// Validate a mapping against `schema` and, when given, the template's rules.
///
/// `today` is the reference day for `not_future` rules.
pub fn validate(
    result: &MappingResult,
    schema: &FormSchema,
    template: Option<&DocumentTypeTemplate>,
    today: NaiveDate,
) -> ValidationReport {
    validate_with_thresholds(
        result,
        schema,
        template,
        today,
        &ConfidenceThresholds::default(),
    )
}

pub fn validate_with_thresholds(
    result: &MappingResult,
    schema: &FormSchema,
    template: Option<&DocumentTypeTemplate>,
    today: NaiveDate,
    thresholds: &ConfidenceThresholds,
) -> ValidationReport {
    let report = checks::run_all(result, schema, template, today, thresholds);
    debug!(
        schema = %schema.name,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation finished"
    );
    report
}
