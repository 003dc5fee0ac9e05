//! Checks every document gets, whatever its template declares.

use chrono::NaiveDate;
use lexscan_catalog::{DocumentTypeTemplate, RuleKind};
use lexscan_model::{FormSchema, MappingResult};

use super::format::ISO_DATE_FORMAT;
use crate::issue::Issue;

pub const TYPE_FIELD: &str = "type";
pub const PUBLICATION_DATE_FIELD: &str = "publication_date";

/// Shortest `type` value taken as a document type name.
pub const MIN_TYPE_CHARS: usize = 3;

/// `template` is `None` when the document type was not recognized.
pub fn check(
    result: &MappingResult,
    schema: &FormSchema,
    template: Option<&DocumentTypeTemplate>,
    today: NaiveDate,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    issues.extend(document_type(result, template));
    issues.extend(future_publication(result, schema, template, today));
    issues
}

fn document_type(
    result: &MappingResult,
    template: Option<&DocumentTypeTemplate>,
) -> Option<Issue> {
    let value = result.value(TYPE_FIELD).map(str::trim);
    let too_short = value.is_some_and(|v| !v.is_empty() && v.chars().count() < MIN_TYPE_CHARS);
    (template.is_none() || too_short).then(|| Issue::UnrecognizedDocumentType {
        value: value.unwrap_or_default().to_string(),
    })
}

fn future_publication(
    result: &MappingResult,
    schema: &FormSchema,
    template: Option<&DocumentTypeTemplate>,
    today: NaiveDate,
) -> Option<Issue> {
    schema.field(PUBLICATION_DATE_FIELD)?;
    // a declared rule reports it with the template's own message
    let declared = template.is_some_and(|template| {
        template.validation_rules.iter().any(|rule| {
            rule.field == PUBLICATION_DATE_FIELD && matches!(rule.rule, RuleKind::NotFuture)
        })
    });
    if declared {
        return None;
    }
    let value = result.value(PUBLICATION_DATE_FIELD)?.trim();
    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT)
        .is_ok_and(|date| date > today)
        .then(|| Issue::FutureDate {
            field: PUBLICATION_DATE_FIELD.to_string(),
            value: value.to_string(),
        })
}
