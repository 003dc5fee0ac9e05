//! Approval workflow: transition legality, validation gate, batch approval, sinks.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use lexscan_catalog::Catalog;
use lexscan_extract::EntityExtractor;
use lexscan_map::{FieldMapper, MappingInput};
use lexscan_model::{
    ApprovedRecord, CommentKind, DocumentTypeId, Extraction, FieldMapping, Language,
    FormSchema, MappingResult, MappingSource, OriginalDocument, ReviewAction, ReviewId, ReviewStatus,
};
use lexscan_review::{
    ApprovalWorkflow, JsonLinesSink, MemorySink, RecordSink, ReviewRequest, SinkError,
    SubmitRequest, UNTYPED_SCHEMA, WorkflowError,
};
use lexscan_validate::Issue;

fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap()
}

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::load_embedded().unwrap())
}

fn workflow() -> (ApprovalWorkflow, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let workflow = ApprovalWorkflow::with_clock(catalog(), sink.clone(), fixed_clock);
    (workflow, sink)
}

fn decree_mapping(number: Option<&str>, overall_confidence: f32) -> MappingResult {
    let mut fields = vec![
        ("title", "Décret exécutif n° 23-145 du 12 mars 2023 portant création"),
        ("type", "Décret exécutif"),
        ("date_gregorian", "2023-03-12"),
    ];
    if let Some(number) = number {
        fields.push(("number", number));
    }
    MappingResult {
        mapped_fields: fields
            .into_iter()
            .map(|(name, value)| FieldMapping::new(name, value, 0.9, MappingSource::PatternMatch))
            .collect(),
        overall_confidence,
        ..MappingResult::default()
    }
}

fn request(mapping_result: MappingResult) -> SubmitRequest {
    SubmitRequest {
        original_document: OriginalDocument {
            filename: "decret-23-145.txt".to_string(),
            size: 512,
            page_count: 1,
        },
        extraction: Extraction {
            document_type: DocumentTypeId::new("executive_decree").unwrap(),
            language: Language::French,
            entities: vec![],
        },
        mapping_result,
        ocr_confidence: Some(0.91),
        submitted_by: "scanner".to_string(),
    }
}

fn submit(workflow: &ApprovalWorkflow, confidence: f32) -> ReviewId {
    workflow.submit(request(decree_mapping(Some("23-145"), confidence)))
}

fn act(workflow: &ApprovalWorkflow, id: ReviewId, action: ReviewAction) -> Result<ReviewStatus, WorkflowError> {
    let request = ReviewRequest::new(action, "reviewer").with_comment("checked");
    workflow.review(id, request).map(|item| item.status)
}

#[test]
fn submit_creates_pending_item_with_submission_comment() {
    let (workflow, _) = workflow();
    let id = submit(&workflow, 0.9);
    let item = workflow.get(id).unwrap();
    assert_eq!(item.status, ReviewStatus::Pending);
    assert_eq!(item.comments.len(), 1);
    assert_eq!(item.comments[0].kind, CommentKind::Submission);
    assert_eq!(item.submitted_at, fixed_clock());
    assert_eq!(item.document_type.as_str(), "executive_decree");
    assert_eq!(item.ocr_confidence, Some(0.91));
}

#[test]
fn transitions_follow_the_table() {
    use ReviewAction::{Approve, Reject, RequestCorrection, StartReview};
    use ReviewStatus::{Approved, Pending, Rejected, UnderReview};

    let cases: [(&[ReviewAction], ReviewAction, Option<ReviewStatus>); 10] = [
        (&[], StartReview, Some(UnderReview)),
        (&[], Approve, Some(Approved)),
        (&[], Reject, Some(Rejected)),
        (&[], RequestCorrection, None),
        (&[StartReview], StartReview, None),
        (&[StartReview], Approve, Some(Approved)),
        (&[StartReview], Reject, Some(Rejected)),
        (&[StartReview], RequestCorrection, Some(Pending)),
        (&[Approve], Reject, None),
        (&[Reject], StartReview, None),
    ];

    for (setup, action, expected) in cases {
        let (workflow, _) = workflow();
        let id = submit(&workflow, 0.9);
        for step in setup {
            act(&workflow, id, *step).unwrap();
        }
        let before = workflow.get(id).unwrap();
        let outcome = act(&workflow, id, action);
        match expected {
            Some(status) => {
                assert_eq!(outcome.unwrap(), status, "{setup:?} then {action}");
                let after = workflow.get(id).unwrap();
                assert_eq!(after.comments.len(), before.comments.len() + 1);
                assert_eq!(after.last_comment().unwrap().kind, action.comment_kind());
            }
            None => {
                assert!(
                    matches!(outcome, Err(WorkflowError::InvalidTransition { .. })),
                    "{setup:?} then {action}"
                );
                assert_eq!(workflow.get(id).unwrap(), before);
            }
        }
    }
}

#[test]
fn reject_and_correction_require_a_comment() {
    let (workflow, _) = workflow();
    let id = submit(&workflow, 0.9);

    let blank = ReviewRequest::new(ReviewAction::Reject, "reviewer").with_comment("   ");
    assert!(matches!(
        workflow.review(id, blank),
        Err(WorkflowError::EmptyComment { operation: "reject" })
    ));
    let missing = ReviewRequest::new(ReviewAction::Reject, "reviewer");
    assert!(workflow.review(id, missing).is_err());

    let item = workflow.get(id).unwrap();
    assert_eq!(item.status, ReviewStatus::Pending);
    assert_eq!(item.comments.len(), 1);
    assert!(item.reviewed_at.is_none());
}

#[test]
fn reject_stamps_reviewer() {
    let (workflow, sink) = workflow();
    let id = submit(&workflow, 0.9);
    let request = ReviewRequest::new(ReviewAction::Reject, "amina").with_comment("illegible scan");
    let item = workflow.review(id, request).unwrap();

    assert_eq!(item.status, ReviewStatus::Rejected);
    assert_eq!(item.reviewed_by.as_deref(), Some("amina"));
    assert_eq!(item.reviewed_at, Some(fixed_clock()));
    assert_eq!(item.last_comment().unwrap().content, "illegible scan");
    assert!(sink.is_empty());
    assert!(workflow.approved_record(id).unwrap().is_none());
}

#[test]
fn approval_is_refused_with_blocking_issues_until_corrected() {
    let (workflow, sink) = workflow();
    let id = workflow.submit(request(decree_mapping(None, 0.7)));

    match act(&workflow, id, ReviewAction::Approve) {
        Err(WorkflowError::ValidationFailed { issues, .. }) => {
            assert_eq!(
                issues,
                vec![Issue::RequiredMissing {
                    field: "number".to_string()
                }]
            );
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(workflow.get(id).unwrap().status, ReviewStatus::Pending);
    assert!(workflow.validation(id).unwrap().blocks_approval());
    assert!(sink.is_empty());

    act(&workflow, id, ReviewAction::StartReview).unwrap();
    let corrections = vec![("number".to_string(), "23-145".to_string())];
    let request = ReviewRequest::new(ReviewAction::RequestCorrection, "reviewer")
        .with_comment("number read from the heading")
        .with_corrections(&corrections);
    let corrected = workflow.review(id, request).unwrap();
    assert_eq!(corrected.status, ReviewStatus::Pending);
    let number = corrected.mapping_result.field("number").unwrap();
    assert_eq!(number.source, MappingSource::Corrected);
    // all four required fields now mapped
    assert!(corrected.mapping_result.overall_confidence > 0.9);

    assert_eq!(act(&workflow, id, ReviewAction::Approve).unwrap(), ReviewStatus::Approved);
    assert_eq!(sink.len(), 1);
}

#[test]
fn corrections_must_name_schema_fields() {
    let (workflow, _) = workflow();
    let id = submit(&workflow, 0.9);
    act(&workflow, id, ReviewAction::StartReview).unwrap();

    let corrections = vec![("signatory".to_string(), "Premier ministre".to_string())];
    let request = ReviewRequest::new(ReviewAction::RequestCorrection, "reviewer")
        .with_comment("add signatory")
        .with_corrections(&corrections);
    assert!(matches!(
        workflow.review(id, request),
        Err(WorkflowError::UnknownField { .. })
    ));

    let request = ReviewRequest::new(ReviewAction::Reject, "reviewer")
        .with_comment("no")
        .with_corrections(&corrections);
    assert!(matches!(
        workflow.review(id, request),
        Err(WorkflowError::CorrectionsNotAllowed { .. })
    ));
    assert_eq!(workflow.get(id).unwrap().status, ReviewStatus::UnderReview);
}

#[test]
fn batch_approves_exactly_items_at_or_above_threshold() {
    let (workflow, sink) = workflow();
    let ids: Vec<ReviewId> = [0.5, 0.86, 0.9]
        .into_iter()
        .map(|confidence| submit(&workflow, confidence))
        .collect();

    let approved = workflow.batch_approve(0.85, "auto").unwrap();
    assert_eq!(approved, ids[1..].to_vec());
    assert_eq!(workflow.get(ids[0]).unwrap().status, ReviewStatus::Pending);
    for id in &ids[1..] {
        let item = workflow.get(*id).unwrap();
        assert_eq!(item.status, ReviewStatus::Approved);
        assert_eq!(item.last_comment().unwrap().kind, CommentKind::Validation);
    }
    assert_eq!(sink.len(), 2);

    // nothing left above the threshold
    assert!(workflow.batch_approve(0.85, "auto").unwrap().is_empty());
    assert_eq!(workflow.counts().get("approved"), Some(&2));
}

#[test]
fn batch_skips_items_with_blocking_issues_and_rejects_bad_thresholds() {
    let (workflow, _) = workflow();
    let incomplete = workflow.submit(request(decree_mapping(None, 0.95)));
    let complete = submit(&workflow, 0.95);

    assert_eq!(workflow.batch_approve(0.9, "auto").unwrap(), vec![complete]);
    assert_eq!(workflow.get(incomplete).unwrap().status, ReviewStatus::Pending);

    for value in [-0.1, 1.5, f32::NAN] {
        assert!(matches!(
            workflow.batch_approve(value, "auto"),
            Err(WorkflowError::InvalidThreshold { .. })
        ));
    }
}

#[test]
fn future_publication_date_blocks_approval_of_a_law() {
    let (workflow, sink) = workflow();
    let mut law = request(MappingResult {
        mapped_fields: [
            ("title", "Loi n° 23-12 du 12 mars 2023 relative aux archives"),
            ("type", "Loi"),
            ("number", "23-12"),
            ("date_gregorian", "2023-03-12"),
            ("publication_date", "2099-01-01"),
        ]
        .into_iter()
        .map(|(name, value)| FieldMapping::new(name, value, 0.9, MappingSource::PatternMatch))
        .collect(),
        overall_confidence: 0.9,
        ..MappingResult::default()
    });
    law.extraction.document_type = DocumentTypeId::new("law").unwrap();
    let id = workflow.submit(law);

    match act(&workflow, id, ReviewAction::Approve) {
        Err(WorkflowError::ValidationFailed { issues, .. }) => assert_eq!(
            issues,
            vec![Issue::FutureDate {
                field: "publication_date".to_string(),
                value: "2099-01-01".to_string(),
            }]
        ),
        other => panic!("expected a validation failure, got {other:?}"),
    }
    assert_eq!(workflow.get(id).unwrap().status, ReviewStatus::Pending);
    assert!(sink.is_empty());
}

#[test]
fn unrecognized_documents_are_never_approved() {
    let catalog = catalog();
    let text = "Lorem ipsum dolor sit amet";
    let extractor = EntityExtractor::new(Arc::clone(&catalog));
    let extraction = extractor.extract(text, None, None);
    assert!(extraction.is_unknown());
    let structure = extractor.analyze(text, &extraction);
    let mapping_result = FieldMapper::new(Arc::clone(&catalog)).map(
        &MappingInput {
            text,
            entities: &extraction.entities,
            structure: &structure,
        },
        &FormSchema::empty(UNTYPED_SCHEMA),
    );
    // an empty schema is complete, so the score alone would pass
    assert!(mapping_result.overall_confidence >= 0.6);

    let sink = Arc::new(MemorySink::new());
    let workflow = ApprovalWorkflow::with_clock(Arc::clone(&catalog), sink.clone(), fixed_clock);
    let id = workflow.submit(SubmitRequest {
        extraction,
        mapping_result,
        ..request(MappingResult::default())
    });

    assert!(workflow.batch_approve(0.6, "auto").unwrap().is_empty());
    assert!(matches!(
        act(&workflow, id, ReviewAction::Approve),
        Err(WorkflowError::ValidationFailed { .. })
    ));
    assert_eq!(workflow.get(id).unwrap().status, ReviewStatus::Pending);
    assert!(sink.is_empty());
    assert_eq!(act(&workflow, id, ReviewAction::Reject).unwrap(), ReviewStatus::Rejected);
}

struct FailingSink;

impl RecordSink for FailingSink {
    fn emit(&self, _record: &ApprovedRecord) -> Result<(), SinkError> {
        Err(SinkError::Unavailable {
            message: "archive offline".to_string(),
        })
    }
}

#[test]
fn sink_failure_leaves_item_untouched() {
    let workflow = ApprovalWorkflow::with_clock(catalog(), Arc::new(FailingSink), fixed_clock);
    let id = submit(&workflow, 0.95);
    let before = workflow.get(id).unwrap();

    assert!(matches!(
        act(&workflow, id, ReviewAction::Approve),
        Err(WorkflowError::Sink(SinkError::Unavailable { .. }))
    ));
    assert_eq!(workflow.get(id).unwrap(), before);
    assert!(workflow.batch_approve(0.5, "auto").unwrap().is_empty());
}

#[test]
fn comments_are_allowed_in_terminal_states() {
    let (workflow, _) = workflow();
    let id = submit(&workflow, 0.9);
    act(&workflow, id, ReviewAction::Approve).unwrap();

    workflow.add_comment(id, "archivist", "filed under 2023").unwrap();
    let item = workflow.get(id).unwrap();
    assert_eq!(item.status, ReviewStatus::Approved);
    assert_eq!(item.last_comment().unwrap().kind, CommentKind::Note);
    assert!(matches!(
        workflow.add_comment(id, "archivist", ""),
        Err(WorkflowError::EmptyComment { .. })
    ));
    assert!(matches!(
        workflow.add_comment(ReviewId::new(), "archivist", "lost"),
        Err(WorkflowError::NotFound { .. })
    ));
}

#[test]
fn list_filters_by_status_in_submission_order() {
    let (workflow, _) = workflow();
    let first = submit(&workflow, 0.9);
    let second = submit(&workflow, 0.9);
    let third = submit(&workflow, 0.9);
    act(&workflow, second, ReviewAction::StartReview).unwrap();

    let all: Vec<ReviewId> = workflow.list(None).iter().map(|i| i.id).collect();
    assert_eq!(all, vec![first, second, third]);
    let pending: Vec<ReviewId> = workflow
        .list(Some(ReviewStatus::Pending))
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(pending, vec![first, third]);
}

#[test]
fn concurrent_approvals_of_one_item_succeed_once() {
    let (workflow, sink) = workflow();
    let id = submit(&workflow, 0.9);

    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| act(&workflow, id, ReviewAction::Approve).is_ok()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(sink.len(), 1);
    let item = workflow.get(id).unwrap();
    // submission + one validation comment
    assert_eq!(item.comments.len(), 2);
}

#[test]
fn json_lines_sink_appends_one_record_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("approved.jsonl");
    let sink = Arc::new(JsonLinesSink::append(&path).unwrap());
    let workflow = ApprovalWorkflow::with_clock(catalog(), sink, fixed_clock);
    let ids = [submit(&workflow, 0.9), submit(&workflow, 0.95)];
    workflow.batch_approve(0.0, "auto").unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let records: Vec<ApprovedRecord> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].extraction_metadata.review_item_id, ids[0]);
    assert_eq!(records[1].extraction_metadata.review_item_id, ids[1]);
    assert_eq!(records[0].fields.get("number").map(String::as_str), Some("23-145"));
    assert_eq!(records[0].approved_at, fixed_clock());
}

/// Fails the first `failures` writes, then appends to a shared buffer.
struct FlakyWriter {
    out: Arc<Mutex<Vec<u8>>>,
    failures: usize,
}

impl Write for FlakyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::other("disk full"));
        }
        self.out.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failed_write_leaves_no_record_behind() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let writer = FlakyWriter {
        out: Arc::clone(&out),
        failures: 1,
    };
    let sink = Arc::new(JsonLinesSink::from_writer("approved.jsonl", writer));
    let workflow = ApprovalWorkflow::with_clock(catalog(), sink, fixed_clock);
    let first = submit(&workflow, 0.9);
    let second = submit(&workflow, 0.9);

    assert!(matches!(
        act(&workflow, first, ReviewAction::Approve),
        Err(WorkflowError::Sink(SinkError::Io { .. }))
    ));
    assert_eq!(workflow.get(first).unwrap().status, ReviewStatus::Pending);
    assert_eq!(act(&workflow, second, ReviewAction::Approve).unwrap(), ReviewStatus::Approved);

    let contents = String::from_utf8(out.lock().unwrap().clone()).unwrap();
    let records: Vec<ApprovedRecord> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].extraction_metadata.review_item_id, second);
}

#[test]
fn scanned_decree_flows_from_text_to_approved_record() {
    let catalog = catalog();
    let text = "Décret exécutif n° 23-145 du 12 mars 2023 portant création...";

    let extractor = EntityExtractor::new(Arc::clone(&catalog));
    let extraction = extractor.extract(text, None, None);
    let structure = extractor.analyze(text, &extraction);
    let template = catalog.template(&extraction.document_type).unwrap();
    let mapping_result = FieldMapper::new(Arc::clone(&catalog)).map_template(
        &MappingInput {
            text,
            entities: &extraction.entities,
            structure: &structure,
        },
        template,
    );

    let sink = Arc::new(MemorySink::new());
    let workflow = ApprovalWorkflow::with_clock(Arc::clone(&catalog), sink.clone(), fixed_clock);
    let id = workflow.submit(SubmitRequest {
        original_document: OriginalDocument {
            filename: "scan-001.txt".to_string(),
            size: text.len() as u64,
            page_count: 1,
        },
        extraction,
        mapping_result,
        ocr_confidence: None,
        submitted_by: "scanner".to_string(),
    });

    assert_eq!(act(&workflow, id, ReviewAction::Approve).unwrap(), ReviewStatus::Approved);
    let record = workflow.approved_record(id).unwrap().unwrap();
    assert_eq!(record.fields.get("number").map(String::as_str), Some("23-145"));
    assert_eq!(
        record.fields.get("date_gregorian").map(String::as_str),
        Some("2023-03-12")
    );
    assert_eq!(record.extraction_metadata.document_type.as_str(), "executive_decree");
    assert_eq!(record.extraction_metadata.catalog_version, catalog.version());
    assert_eq!(sink.records(), vec![record]);
}
