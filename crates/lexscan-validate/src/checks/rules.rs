//! Document type validation rules from the catalog.

use chrono::NaiveDate;
use lexscan_catalog::{DocumentTypeTemplate, RuleKind, ValidationRule};
use lexscan_model::MappingResult;

use super::format::ISO_DATE_FORMAT;
use crate::issue::Issue;

pub fn check(
    result: &MappingResult,
    template: &DocumentTypeTemplate,
    today: NaiveDate,
) -> Vec<Issue> {
    template
        .validation_rules
        .iter()
        .filter(|rule| violates(rule, result.value(&rule.field).map(str::trim), today))
        .map(|rule| Issue::RuleViolation {
            field: rule.field.clone(),
            rule: rule.source.clone(),
            message: message(rule),
        })
        .collect()
}

/// Rules other than `required` only judge values that are present.
fn violates(rule: &ValidationRule, value: Option<&str>, today: NaiveDate) -> bool {
    let value = value.filter(|v| !v.is_empty());
    match (&rule.rule, value) {
        (RuleKind::Required, value) => value.is_none(),
        (_, None) => false,
        (RuleKind::Pattern(regex), Some(value)) => !regex.is_match(value),
        // unparseable dates are reported by the format check
        (RuleKind::NotFuture, Some(value)) => {
            NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).is_ok_and(|date| date > today)
        }
        (RuleKind::MinLength(min), Some(value)) => value.chars().count() < *min,
        (RuleKind::OneOf(options), Some(value)) => !options
            .iter()
            .any(|option| option.eq_ignore_ascii_case(value)),
    }
}

fn message(rule: &ValidationRule) -> String {
    if !rule.message.trim().is_empty() {
        return rule.message.clone();
    }
    match &rule.rule {
        RuleKind::Required => "value is required".to_string(),
        RuleKind::Pattern(_) => format!("value must satisfy {}", rule.source),
        RuleKind::NotFuture => "date must not lie in the future".to_string(),
        RuleKind::MinLength(min) => format!("value must be at least {min} characters long"),
        RuleKind::OneOf(options) => format!("value must be one of: {}", options.join(", ")),
    }
}
