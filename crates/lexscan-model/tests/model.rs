//! Tests for lexscan-model types.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use lexscan_model::{
    ApprovedRecord, DocumentTypeId, Extraction, FieldMapping, Language, MappingResult,
    MappingSource, OriginalDocument, ReviewId, ReviewItem, ReviewStatus, overall_confidence,
};

fn mappings(confidences: &[f32]) -> Vec<FieldMapping> {
    confidences
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            FieldMapping::new(
                format!("f{idx}"),
                "value",
                *c,
                MappingSource::ExtractedEntity,
            )
        })
        .collect()
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn overall_confidence_with_no_required_mapped() {
    let mapped = mappings(&[0.5, 0.7]);
    assert_close(overall_confidence(0, 4, &mapped), 0.6 * 0.0 + 0.4 * 0.6);
}

#[test]
fn overall_confidence_with_half_required_mapped() {
    let mapped = mappings(&[0.9, 0.8, 0.4]);
    assert_close(overall_confidence(2, 4, &mapped), 0.6 * 0.5 + 0.4 * 0.7);
}

#[test]
fn overall_confidence_with_all_required_mapped() {
    let mapped = mappings(&[1.0, 0.8]);
    assert_close(overall_confidence(2, 2, &mapped), 0.6 * 1.0 + 0.4 * 0.9);
}

#[test]
fn overall_confidence_edge_cases() {
    assert_close(overall_confidence(0, 0, &[]), 0.6);
    assert_close(overall_confidence(0, 3, &[]), 0.0);
}

#[test]
fn confident_partial_beats_uncertain_complete_only_within_bound() {
    let uncertain_complete = overall_confidence(4, 4, &mappings(&[0.2, 0.2, 0.2, 0.2]));
    let confident_partial = overall_confidence(3, 4, &mappings(&[1.0, 1.0, 1.0]));
    assert!(confident_partial > uncertain_complete);
}

proptest! {
    #[test]
    fn overall_confidence_stays_in_unit_interval(
        confidences in proptest::collection::vec(0.0f32..=1.0, 0..12),
        total in 0usize..10,
        mapped in 0usize..12,
    ) {
        let value = overall_confidence(mapped, total, &mappings(&confidences));
        prop_assert!((0.0..=1.0).contains(&value));
    }
}

#[test]
fn approved_record_serializes_flat_fields_and_workflow_attributes() {
    let item = ReviewItem {
        id: ReviewId::new(),
        original_document: OriginalDocument {
            filename: "decret-23-145.txt".to_string(),
            size: 1024,
            page_count: 2,
        },
        document_type: DocumentTypeId::new("executive_decree").unwrap(),
        extraction: Extraction::unknown(Language::French),
        ocr_confidence: Some(0.93),
        mapping_result: MappingResult {
            mapped_fields: vec![FieldMapping::new(
                "number",
                "23-145",
                0.95,
                MappingSource::PatternMatch,
            )],
            unmapped_data: vec![],
            suggestions: vec![],
            overall_confidence: 0.98,
        },
        status: ReviewStatus::Approved,
        comments: vec![],
        submitted_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        reviewed_at: None,
        reviewed_by: None,
    };
    let approved_at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap();
    let record = ApprovedRecord::from_item(&item, approved_at, "2024.1");

    let json = serde_json::to_value(&record).expect("serialize record");
    assert_eq!(json["number"], "23-145");
    assert_eq!(json["workflowStatus"], "approved");
    assert_eq!(json["approvedAt"], "2024-05-02T09:30:00Z");
    assert_eq!(
        json["extractionMetadata"]["documentType"],
        "executive_decree"
    );
    assert_eq!(json["extractionMetadata"]["catalogVersion"], "2024.1");

    let round: ApprovedRecord = serde_json::from_value(json).expect("deserialize record");
    assert_eq!(round.fields.get("number").map(String::as_str), Some("23-145"));
}
