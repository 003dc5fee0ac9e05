//! Validation of hand-built mappings against the embedded catalog.

use std::sync::LazyLock;

use chrono::NaiveDate;
use lexscan_catalog::{Catalog, DocumentTypeTemplate};
use lexscan_model::{
    FieldKind, FieldMapping, FormField, FormSchema, FormSection, MappingResult, MappingSource,
};
use lexscan_validate::{Issue, Severity, validate};

static CATALOG: LazyLock<Catalog> = LazyLock::new(|| Catalog::load_embedded().unwrap());

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn decree() -> &'static DocumentTypeTemplate {
    CATALOG.template_by_id("executive_decree").unwrap()
}

fn mapping(fields: &[(&str, &str, f32)]) -> MappingResult {
    MappingResult {
        mapped_fields: fields
            .iter()
            .map(|(name, value, confidence)| {
                FieldMapping::new(*name, *value, *confidence, MappingSource::PatternMatch)
            })
            .collect(),
        ..MappingResult::default()
    }
}

fn listing(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{} {}", issue.code(), issue.field()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn complete_decree_passes_with_low_confidence_warning() {
    let result = mapping(&[
        ("title", "Décret exécutif n° 23-145 du 12 mars 2023", 0.9),
        ("type", "Décret exécutif", 0.95),
        ("number", "23-145", 0.95),
        ("date_gregorian", "2023-03-12", 0.9),
        ("status", "in force", 0.5),
    ]);
    let template = decree();
    let report = validate(&result, &template.form_schema, Some(template), today());

    assert!(!report.blocks_approval());
    assert_eq!(report.warning_count(), 1);
    assert_eq!(
        report.issues,
        vec![Issue::LowConfidence {
            field: "status".to_string(),
            confidence: 0.5
        }]
    );
}

#[test]
fn every_check_reports_in_order() {
    let result = mapping(&[
        ("type", "Circulaire", 0.9),
        ("number", "2023/145", 0.9),
        ("date_gregorian", "2031-01-01", 0.9),
        ("article_count", "deux", 0.9),
        ("status", "obsolete", 0.9),
    ]);
    let template = decree();
    let report = validate(&result, &template.form_schema, Some(template), today());

    insta::assert_snapshot!(listing(&report.issues), @r"
    required_missing title
    invalid_option type
    pattern_mismatch number
    not_a_number article_count
    invalid_option status
    rule_violation number
    rule_violation date_gregorian
    rule_violation status
    ");
    assert!(report.blocks_approval());
    assert_eq!(report.error_count(), 8);

    let future = report
        .issues
        .iter()
        .find(|issue| issue.field() == "date_gregorian")
        .unwrap();
    assert_eq!(
        future.message(),
        "Field date_gregorian: a decree cannot be dated in the future"
    );
}

#[test]
fn dates_on_the_reference_day_are_not_future() {
    let result = mapping(&[("date_gregorian", "2024-06-01", 0.9)]);
    let template = decree();
    let report = validate(&result, &template.form_schema, Some(template), today());
    assert!(
        report
            .issues
            .iter()
            .all(|issue| issue.field() != "date_gregorian")
    );
}

#[test]
fn corrected_values_are_trusted_but_still_checked() {
    let mut result = mapping(&[
        ("title", "Décret exécutif n° 23-145", 0.2),
        ("type", "Décret exécutif", 0.95),
        ("date_gregorian", "2023-03-12", 0.9),
    ]);
    result.apply_correction("title", "Décret exécutif n° 23-145 portant création");
    result.apply_correction("number", "23-1450");

    let template = decree();
    let report = validate(&result, &template.form_schema, Some(template), today());
    // schema accepts four digits, the decree rule does not
    assert_eq!(listing(&report.issues), "rule_violation number");
}

#[test]
fn schema_without_template_skips_rules_but_blocks_on_the_type() {
    let schema = FormSchema::new(
        "notice",
        vec![FormSection {
            name: "main".to_string(),
            required: true,
            fields: vec![
                FormField::new("reference", FieldKind::Text)
                    .required()
                    .with_validation(r"[A-Z]{2}-\d+"),
                FormField::new("issued", FieldKind::Date),
            ],
        }],
    )
    .unwrap();
    let result = mapping(&[("reference", "ab-12", 0.9), ("issued", "12 mars 2023", 0.9)]);
    let report = validate(&result, &schema, None, today());

    assert_eq!(report.schema, "notice");
    assert_eq!(
        listing(&report.sorted_by_severity().into_iter().cloned().collect::<Vec<_>>()),
        "pattern_mismatch reference\ninvalid_date issued\nunrecognized_document_type type"
    );
    assert!(report.issues.iter().all(|i| i.severity() == Severity::Error));
}

#[test]
fn future_publication_date_blocks_templates_without_the_rule() {
    let template = CATALOG.template_by_id("law").unwrap();
    let result = mapping(&[
        ("title", "Loi n° 23-12 relative aux archives", 0.9),
        ("type", "Loi", 0.95),
        ("number", "23-12", 0.95),
        ("date_gregorian", "2023-03-12", 0.9),
        ("publication_date", "2099-01-01", 0.9),
    ]);
    let report = validate(&result, &template.form_schema, Some(template), today());

    assert!(report.blocks_approval());
    assert!(report.issues.contains(&Issue::FutureDate {
        field: "publication_date".to_string(),
        value: "2099-01-01".to_string(),
    }));
}

#[test]
fn declared_publication_rule_is_not_reported_twice() {
    let result = mapping(&[("publication_date", "2099-01-01", 0.9)]);
    let template = decree();
    let report = validate(&result, &template.form_schema, Some(template), today());
    let publication: Vec<&str> = report
        .issues
        .iter()
        .filter(|issue| issue.field() == "publication_date")
        .map(Issue::code)
        .collect();
    assert_eq!(publication, vec!["rule_violation"]);
}

#[test]
fn type_too_short_to_name_a_document_blocks() {
    let result = mapping(&[("type", "Dé", 0.9)]);
    let template = CATALOG.template_by_id("ministerial_order").unwrap();
    let report = validate(&result, &template.form_schema, Some(template), today());
    let issue = report
        .issues
        .iter()
        .find(|issue| issue.code() == "unrecognized_document_type")
        .unwrap();
    assert!(issue.is_blocking());
    assert_eq!(issue.message(), "Document type 'Dé' not recognized");
}
