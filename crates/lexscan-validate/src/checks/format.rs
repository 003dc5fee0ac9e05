//! Per-field value format: validation pattern, select options, date and number kinds.

use std::borrow::Cow;

use chrono::NaiveDate;
use lexscan_catalog::DocumentTypeTemplate;
use lexscan_model::{FieldKind, FormField, FormSchema, MappingResult};
use regex::Regex;
use tracing::warn;

use crate::issue::Issue;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn check(
    result: &MappingResult,
    schema: &FormSchema,
    template: Option<&DocumentTypeTemplate>,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for field in schema.fields() {
        let Some(value) = result.value(&field.name).map(str::trim) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        if let Some(pattern) = field.validation.as_deref()
            && let Some(regex) = validation_regex(field, pattern, template)
            && !regex.is_match(value)
        {
            issues.push(Issue::PatternMismatch {
                field: field.name.clone(),
                value: value.to_string(),
                pattern: pattern.to_string(),
            });
        }

        match field.kind {
            FieldKind::Select if !field.options.is_empty() => {
                if !field.options.iter().any(|o| o.eq_ignore_ascii_case(value)) {
                    issues.push(Issue::InvalidOption {
                        field: field.name.clone(),
                        value: value.to_string(),
                        allowed: field.options.clone(),
                    });
                }
            }
            FieldKind::Date => {
                if NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).is_err() {
                    issues.push(Issue::InvalidDate {
                        field: field.name.clone(),
                        value: value.to_string(),
                    });
                }
            }
            FieldKind::Number => {
                if value.parse::<i64>().is_err() {
                    issues.push(Issue::NotANumber {
                        field: field.name.clone(),
                        value: value.to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    issues
}

/// Template-compiled regex when the field belongs to the template's schema,
/// otherwise compiled here.
fn validation_regex<'a>(
    field: &FormField,
    pattern: &str,
    template: Option<&'a DocumentTypeTemplate>,
) -> Option<Cow<'a, Regex>> {
    if let Some(template) = template
        && template.form_schema.field(&field.name) == Some(field)
        && let Some(regex) = template.field_validation(&field.name)
    {
        return Some(Cow::Borrowed(regex));
    }
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(regex) => Some(Cow::Owned(regex)),
        Err(error) => {
            warn!(field = %field.name, %error, "skipping invalid validation pattern");
            None
        }
    }
}
