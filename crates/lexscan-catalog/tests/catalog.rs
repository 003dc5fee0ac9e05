//! Loading catalogs from directories and the embedded defaults.

use std::fs;
use std::path::Path;

use lexscan_catalog::embedded::{CATALOG_TOML, INSTITUTIONS_CSV, VOCABULARY_TOML};
use lexscan_catalog::{Catalog, CatalogError, RuleKind};
use lexscan_model::Language;

fn write_catalog_dir(dir: &Path, catalog: &str) {
    fs::write(dir.join("catalog.toml"), catalog).unwrap();
    fs::write(dir.join("vocabulary.toml"), VOCABULARY_TOML).unwrap();
    fs::write(dir.join("institutions.csv"), INSTITUTIONS_CSV).unwrap();
}

#[test]
fn directory_catalog_matches_embedded_digest() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog_dir(dir.path(), CATALOG_TOML);

    let from_dir = Catalog::load_from_dir(dir.path()).unwrap();
    let embedded = Catalog::load_embedded().unwrap();
    assert_eq!(from_dir.digest(), embedded.digest());
    assert_eq!(from_dir.version(), embedded.version());
    assert_eq!(embedded.origin(), "embedded");
}

#[test]
fn edited_catalog_changes_digest() {
    let dir = tempfile::tempdir().unwrap();
    let edited = CATALOG_TOML.replace("version = \"2024.2\"", "version = \"2024.3\"");
    write_catalog_dir(dir.path(), &edited);

    let catalog = Catalog::load_from_dir(dir.path()).unwrap();
    assert_eq!(catalog.version(), "2024.3");
    assert_ne!(catalog.digest(), Catalog::load_embedded().unwrap().digest());
}

#[test]
fn missing_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Catalog::load_from_dir(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
}

#[test]
fn unknown_validation_rule_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let broken = CATALOG_TOML.replacen("rule = \"not_future\"", "rule = \"unique\"", 1);
    write_catalog_dir(dir.path(), &broken);

    let err = Catalog::load_from_dir(dir.path()).unwrap_err();
    assert!(
        matches!(err, CatalogError::InvalidRule { ref rule, .. } if rule == "unique"),
        "unexpected error: {err}"
    );
}

#[test]
fn template_with_unknown_schema_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let broken = CATALOG_TOML.replacen(
        "schema = \"legislative\"\nentity_sets",
        "schema = \"fiscal\"\nentity_sets",
        1,
    );
    write_catalog_dir(dir.path(), &broken);

    let err = Catalog::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CatalogError::UnknownSchema { ref schema, .. } if schema == "fiscal"));
}

#[test]
fn templates_share_declared_schemas() {
    let catalog = Catalog::load_embedded().unwrap();
    let listing: Vec<String> = catalog
        .templates()
        .iter()
        .map(|t| format!("{} | {} | {}", t.id, t.type_name, t.form_schema.name))
        .collect();
    insta::assert_snapshot!(listing.join("\n"), @r"
    law | Loi | legislative
    ordinance | Ordonnance | legislative
    presidential_decree | Décret présidentiel | regulatory
    executive_decree | Décret exécutif | regulatory
    interministerial_order | Arrêté interministériel | order
    ministerial_order | Arrêté ministériel | order
    ");
    assert_eq!(catalog.schema_names(), ["legislative", "order", "regulatory"]);
}

#[test]
fn schema_requiredness_follows_section_flags() {
    let catalog = Catalog::load_embedded().unwrap();
    let decree = catalog.template_by_id("executive_decree").unwrap();
    let required: Vec<&str> = decree
        .form_schema
        .required_fields()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(required, vec!["title", "type", "number", "date_gregorian"]);

    let order = catalog.template_by_id("ministerial_order").unwrap();
    assert!(order.form_schema.is_required("institution"));
    assert!(!order.form_schema.is_required("number"));
}

#[test]
fn field_patterns_are_compiled_and_anchored() {
    let catalog = Catalog::load_embedded().unwrap();
    let decree = catalog.template_by_id("executive_decree").unwrap();
    let number = decree.field_validation("number").unwrap();
    assert!(number.is_match("23-145"));
    assert!(!number.is_match("n° 23-145"));
    assert_eq!(decree.extraction_rules("place").len(), 2);
    assert!(decree.extraction_rules("title").is_empty());

    let rules: Vec<&str> = decree
        .rules_for("number")
        .map(|r| r.rule.name())
        .collect();
    assert_eq!(rules, vec!["pattern"]);
    assert!(
        decree
            .rules_for("date_gregorian")
            .any(|r| matches!(r.rule, RuleKind::NotFuture))
    );
}

#[test]
fn identification_reports_earliest_match_and_count() {
    let catalog = Catalog::load_embedded().unwrap();
    let decree = catalog.template_by_id("executive_decree").unwrap();
    let text = "Décret exécutif n° 23-145 du 12 mars 2023.\nVu le décret exécutif n° 20-12 ;";
    let hit = decree.identify(text, Language::French).unwrap();
    assert_eq!(hit.first.start, 0);
    assert_eq!(hit.matches, 2);
    assert!(decree.identify(text, Language::Arabic).is_none());
}

#[test]
fn summary_counts_catalog_contents() {
    let catalog = Catalog::load_embedded().unwrap();
    let summary = catalog.summary();
    assert_eq!(summary.template_count, 6);
    assert_eq!(summary.schema_count, 3);
    assert_eq!(summary.gregorian_month_count, 12);
    assert_eq!(summary.hijri_month_count, 12);
    assert_eq!(summary.institution_count, catalog.institutions().len());
    assert!(summary.entity_pattern_count > summary.template_count);
}
