//! Review queue and the approval state machine.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use lexscan_catalog::{Catalog, DocumentTypeTemplate};
use lexscan_model::{
    ApprovedRecord, CommentKind, Extraction, FormSchema, MappingResult, OriginalDocument,
    ReviewAction, ReviewId, ReviewItem, ReviewStatus,
};
use lexscan_validate::{ValidationReport, validate};
use tracing::{debug, info, info_span};

use crate::error::{Result, WorkflowError};
use crate::sink::RecordSink;
use crate::{lock, read, write};

/// Schema name reported for items whose document type has no template.
pub const UNTYPED_SCHEMA: &str = "untyped";

/// Source of timestamps; `not_future` rules use its calendar day.
pub type Clock = fn() -> DateTime<Utc>;

/// Everything needed to queue a processed document for review.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub original_document: OriginalDocument,
    pub extraction: Extraction,
    pub mapping_result: MappingResult,
    pub ocr_confidence: Option<f32>,
    pub submitted_by: String,
}

/// One reviewer decision.
#[derive(Debug, Clone, Copy)]
pub struct ReviewRequest<'a> {
    pub action: ReviewAction,
    pub reviewer: &'a str,
    pub comment: Option<&'a str>,
    /// `(field, value)` pairs; accepted with `approve` and `request_correction`.
    pub corrections: &'a [(String, String)],
}

impl<'a> ReviewRequest<'a> {
    pub fn new(action: ReviewAction, reviewer: &'a str) -> Self {
        Self {
            action,
            reviewer,
            comment: None,
            corrections: &[],
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &'a str) -> Self {
        self.comment = Some(comment);
        self
    }

    #[must_use]
    pub fn with_corrections(mut self, corrections: &'a [(String, String)]) -> Self {
        self.corrections = corrections;
        self
    }
}

#[derive(Default)]
struct Index {
    /// Submission order.
    order: Vec<ReviewId>,
    items: HashMap<ReviewId, Arc<Mutex<ReviewItem>>>,
}

/// Human-review gate between mapping and persistence.
///
/// Items live behind one mutex each, so transitions on the same item are
/// serialized while different items proceed in parallel. Items are never
/// deleted.
pub struct ApprovalWorkflow {
    catalog: Arc<Catalog>,
    sink: Arc<dyn RecordSink>,
    clock: Clock,
    index: RwLock<Index>,
}

impl ApprovalWorkflow {
    pub fn new(catalog: Arc<Catalog>, sink: Arc<dyn RecordSink>) -> Self {
        Self::with_clock(catalog, sink, Utc::now)
    }

    pub fn with_clock(catalog: Arc<Catalog>, sink: Arc<dyn RecordSink>, clock: Clock) -> Self {
        Self {
            catalog,
            sink,
            clock,
            index: RwLock::new(Index::default()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Queue a new `pending` item.
    pub fn submit(&self, request: SubmitRequest) -> ReviewId {
        let now = (self.clock)();
        let id = ReviewId::new();
        let mut item = ReviewItem {
            id,
            document_type: request.extraction.document_type.clone(),
            original_document: request.original_document,
            extraction: request.extraction,
            ocr_confidence: request.ocr_confidence,
            mapping_result: request.mapping_result,
            status: ReviewStatus::Pending,
            comments: Vec::new(),
            submitted_at: now,
            reviewed_at: None,
            reviewed_by: None,
        };
        item.push_comment(
            request.submitted_by,
            format!("submitted {}", item.original_document.filename),
            CommentKind::Submission,
            now,
        );
        info!(
            item_id = %id,
            document_type = %item.document_type,
            overall_confidence = item.mapping_result.overall_confidence,
            "review item submitted"
        );

        let mut index = write(&self.index);
        index.order.push(id);
        index.items.insert(id, Arc::new(Mutex::new(item)));
        id
    }

    /// Apply a reviewer decision and return the updated item.
    ///
    /// Fails without mutating the item when the transition is illegal, a
    /// required comment is empty, a correction names an unknown field,
    /// validation blocks an approval, or the sink refuses the record.
    pub fn review(&self, id: ReviewId, request: ReviewRequest<'_>) -> Result<ReviewItem> {
        let span = info_span!("review", item_id = %id, action = %request.action);
        let _guard = span.enter();

        let entry = self.entry(id)?;
        let mut item = lock(&entry);
        let next = self.decide(&item, &request)?;
        *item = next;
        info!(status = %item.status, reviewer = request.reviewer, "review applied");
        Ok(item.clone())
    }

    /// Approve every pending item with `overall_confidence >= min_confidence`
    /// and no blocking validation issue.
    ///
    /// Only items pending when the call starts are considered. Returns the
    /// approved ids in submission order.
    pub fn batch_approve(&self, min_confidence: f32, reviewer: &str) -> Result<Vec<ReviewId>> {
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(WorkflowError::InvalidThreshold {
                value: min_confidence,
            });
        }
        let span = info_span!("batch_approve", min_confidence);
        let _guard = span.enter();

        let snapshot: Vec<(ReviewId, Arc<Mutex<ReviewItem>>)> = {
            let index = read(&self.index);
            index
                .order
                .iter()
                .filter_map(|id| index.items.get(id).map(|entry| (*id, Arc::clone(entry))))
                .collect()
        };

        let comment = format!("auto-approved at confidence >= {min_confidence:.2}");
        let request = ReviewRequest::new(ReviewAction::Approve, reviewer).with_comment(&comment);
        let mut approved = Vec::new();
        for (id, entry) in snapshot {
            let mut item = lock(&entry);
            if item.status != ReviewStatus::Pending
                || item.mapping_result.overall_confidence < min_confidence
            {
                continue;
            }
            match self.decide(&item, &request) {
                Ok(next) => {
                    *item = next;
                    approved.push(id);
                }
                Err(error) => debug!(item_id = %id, %error, "left pending"),
            }
        }
        info!(approved = approved.len(), "batch approval finished");
        Ok(approved)
    }

    /// Append a note; allowed in every state.
    pub fn add_comment(&self, id: ReviewId, author: &str, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(WorkflowError::EmptyComment {
                operation: "add_comment",
            });
        }
        let entry = self.entry(id)?;
        let mut item = lock(&entry);
        item.push_comment(author, content.trim(), CommentKind::Note, (self.clock)());
        Ok(())
    }

    pub fn get(&self, id: ReviewId) -> Option<ReviewItem> {
        let entry = read(&self.index).items.get(&id).cloned()?;
        let item = lock(&entry).clone();
        Some(item)
    }

    /// Items in submission order, optionally restricted to one status.
    pub fn list(&self, status: Option<ReviewStatus>) -> Vec<ReviewItem> {
        let entries: Vec<Arc<Mutex<ReviewItem>>> = {
            let index = read(&self.index);
            index
                .order
                .iter()
                .filter_map(|id| index.items.get(id).cloned())
                .collect()
        };
        entries
            .iter()
            .map(|entry| lock(entry).clone())
            .filter(|item| status.is_none_or(|status| item.status == status))
            .collect()
    }

    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for item in self.list(None) {
            *counts.entry(item.status.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Record of an approved item; `None` while the item is not approved.
    pub fn approved_record(&self, id: ReviewId) -> Result<Option<ApprovedRecord>> {
        let entry = self.entry(id)?;
        let item = lock(&entry);
        Ok(match (item.status, item.reviewed_at) {
            (ReviewStatus::Approved, Some(approved_at)) => Some(ApprovedRecord::from_item(
                &item,
                approved_at,
                self.catalog.version(),
            )),
            _ => None,
        })
    }

    /// Validation report the `approve` transition would see right now.
    pub fn validation(&self, id: ReviewId) -> Result<ValidationReport> {
        let entry = self.entry(id)?;
        let item = lock(&entry);
        Ok(self.validate_item(&item))
    }

    fn entry(&self, id: ReviewId) -> Result<Arc<Mutex<ReviewItem>>> {
        read(&self.index)
            .items
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::NotFound { id })
    }

    /// Compute the item after `request`, emitting the record for approvals.
    fn decide(&self, item: &ReviewItem, request: &ReviewRequest<'_>) -> Result<ReviewItem> {
        let action = request.action;
        let status = item
            .status
            .transition(action)
            .ok_or(WorkflowError::InvalidTransition {
                id: item.id,
                from: item.status,
                action,
            })?;

        let comment = request.comment.map(str::trim).filter(|c| !c.is_empty());
        if action.requires_comment() && comment.is_none() {
            return Err(WorkflowError::EmptyComment {
                operation: action.as_str(),
            });
        }

        let now = (self.clock)();
        let mut next = item.clone();
        if !request.corrections.is_empty() {
            if !matches!(
                action,
                ReviewAction::Approve | ReviewAction::RequestCorrection
            ) {
                return Err(WorkflowError::CorrectionsNotAllowed { action });
            }
            self.apply_corrections(&mut next, request.corrections)?;
        }

        next.status = status;
        let content = comment.map_or_else(|| default_comment(action).to_string(), str::to_string);
        next.push_comment(request.reviewer, content, action.comment_kind(), now);

        match action {
            ReviewAction::StartReview | ReviewAction::RequestCorrection => {}
            ReviewAction::Reject => {
                next.reviewed_at = Some(now);
                next.reviewed_by = Some(request.reviewer.to_string());
            }
            ReviewAction::Approve => {
                let report = self.validate_item(&next);
                if report.blocks_approval() {
                    return Err(WorkflowError::ValidationFailed {
                        id: item.id,
                        issues: report.blocking().cloned().collect(),
                    });
                }
                next.reviewed_at = Some(now);
                next.reviewed_by = Some(request.reviewer.to_string());
                let record = ApprovedRecord::from_item(&next, now, self.catalog.version());
                self.sink.emit(&record)?;
                debug!(item_id = %item.id, "approved record emitted");
            }
        }
        Ok(next)
    }

    fn apply_corrections(
        &self,
        item: &mut ReviewItem,
        corrections: &[(String, String)],
    ) -> Result<()> {
        let schema = self.schema_of(item);
        for (field, _) in corrections {
            if let Some(schema) = schema
                && schema.field(field).is_none()
            {
                return Err(WorkflowError::UnknownField {
                    field: field.clone(),
                    schema: schema.name.clone(),
                });
            }
        }
        for (field, value) in corrections {
            item.mapping_result.apply_correction(field, value);
        }
        match schema {
            Some(schema) => item.mapping_result.recompute_confidence(schema),
            None => item
                .mapping_result
                .recompute_confidence(&FormSchema::empty(UNTYPED_SCHEMA)),
        }
        Ok(())
    }

    fn template_of(&self, item: &ReviewItem) -> Option<&DocumentTypeTemplate> {
        self.catalog.template(&item.document_type)
    }

    fn schema_of(&self, item: &ReviewItem) -> Option<&FormSchema> {
        self.template_of(item).map(|template| &template.form_schema)
    }

    fn validate_item(&self, item: &ReviewItem) -> ValidationReport {
        let today = (self.clock)().date_naive();
        match self.template_of(item) {
            Some(template) => validate(
                &item.mapping_result,
                &template.form_schema,
                Some(template),
                today,
            ),
            None => {
                debug!(
                    item_id = %item.id,
                    document_type = %item.document_type,
                    "no template, document type unrecognized"
                );
                validate(
                    &item.mapping_result,
                    &FormSchema::empty(UNTYPED_SCHEMA),
                    None,
                    today,
                )
            }
        }
    }
}

fn default_comment(action: ReviewAction) -> &'static str {
    match action {
        ReviewAction::StartReview => "review started",
        ReviewAction::Approve => "approved",
        ReviewAction::Reject => "rejected",
        ReviewAction::RequestCorrection => "correction requested",
    }
}
