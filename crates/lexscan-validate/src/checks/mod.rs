//! Individual validation checks.

pub mod confidence;
pub mod document;
pub mod format;
pub mod required;
pub mod rules;

use chrono::NaiveDate;
use lexscan_catalog::DocumentTypeTemplate;
use lexscan_model::{ConfidenceThresholds, FormSchema, MappingResult};

use crate::report::ValidationReport;

/// Run every check in a fixed order: presence, format, document, template
/// rules, confidence.
pub(crate) fn run_all(
    result: &MappingResult,
    schema: &FormSchema,
    template: Option<&DocumentTypeTemplate>,
    today: NaiveDate,
    thresholds: &ConfidenceThresholds,
) -> ValidationReport {
    let mut report = ValidationReport::new(schema.name.clone());
    report.issues.extend(required::check(result, schema));
    report.issues.extend(format::check(result, schema, template));
    report.issues.extend(document::check(result, schema, template, today));
    if let Some(template) = template {
        report.issues.extend(rules::check(result, template, today));
    }
    report.issues.extend(confidence::check(result, thresholds));
    report
}
