//! Document intake and the extract, map, submit sequence shared by the commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lexscan_extract::EntityExtractor;
use lexscan_map::{FieldMapper, MappingInput};
use lexscan_model::{
    DocumentStructure, DocumentTypeId, Extraction, FormSchema, Language, MappingResult,
    OcrOutput, OriginalDocument, ReviewId, ReviewItem, ReviewStatus,
};
use lexscan_review::{ApprovalWorkflow, SubmitRequest, UNTYPED_SCHEMA, WorkflowError};
use tracing::{debug, info, info_span, trace};

use crate::logging::redact_value;

/// Page separator emitted by text-recognition engines.
const FORM_FEED: char = '\u{c}';

const EXCERPT_CHARS: usize = 80;

/// One recognized document read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInput {
    pub filename: String,
    /// Size of the source file in bytes.
    pub size: u64,
    pub text: String,
    pub ocr_confidence: Option<f32>,
    pub page_count: u32,
}

impl DocumentInput {
    /// Build an input from in-memory text, e.g. for stdin or tests.
    pub fn from_text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            filename: filename.into(),
            size: text.len() as u64,
            page_count: count_pages(&text),
            text,
            ocr_confidence: None,
        }
    }

    pub fn original_document(&self) -> OriginalDocument {
        OriginalDocument {
            filename: self.filename.clone(),
            size: self.size,
            page_count: self.page_count,
        }
    }
}

/// Read an OCR result (`.json` holding an [`OcrOutput`]) or a plain text file.
pub fn read_input(path: &Path) -> Result<DocumentInput> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let size = bytes.len() as u64;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let input = if is_json {
        let ocr: OcrOutput = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse OCR output {}", path.display()))?;
        let page_count = ocr.page_count.unwrap_or_else(|| count_pages(&ocr.text));
        DocumentInput {
            filename,
            size,
            text: ocr.text,
            ocr_confidence: Some(ocr.confidence.clamp(0.0, 1.0)),
            page_count,
        }
    } else {
        let text = String::from_utf8(bytes)
            .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
        DocumentInput {
            filename,
            size,
            page_count: count_pages(&text),
            text,
            ocr_confidence: None,
        }
    };
    debug!(
        filename = %input.filename,
        size = input.size,
        pages = input.page_count,
        "document read"
    );
    trace!(
        excerpt = redact_value(excerpt(&input.text)),
        "document text"
    );
    Ok(input)
}

fn count_pages(text: &str) -> u32 {
    let breaks = text
        .trim_end_matches(FORM_FEED)
        .matches(FORM_FEED)
        .count();
    u32::try_from(breaks + 1).unwrap_or(u32::MAX)
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Extraction, structure and mapping of one document.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub extraction: Extraction,
    pub structure: DocumentStructure,
    pub mapping: MappingResult,
}

/// Extract entities and map them onto the identified type's schema.
///
/// Documents of unknown type are mapped against an empty schema, so they
/// reach review with no mapped fields and stay blocked until rejected.
pub fn process_text(
    extractor: &EntityExtractor,
    mapper: &FieldMapper,
    text: &str,
    type_hint: Option<&DocumentTypeId>,
    language: Option<Language>,
) -> ProcessedDocument {
    let extraction = extractor.extract(text, type_hint, language);
    let structure = extractor.analyze(text, &extraction);
    let input = MappingInput {
        text,
        entities: &extraction.entities,
        structure: &structure,
    };
    let mapping = match extractor.catalog().template(&extraction.document_type) {
        Some(template) => mapper.map_template(&input, template),
        None => mapper.map(&input, &FormSchema::empty(UNTYPED_SCHEMA)),
    };
    ProcessedDocument {
        extraction,
        structure,
        mapping,
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub type_hint: Option<DocumentTypeId>,
    pub language: Option<Language>,
    /// Approve pending items at or above this overall confidence after submission.
    pub auto_approve: Option<f32>,
    pub reviewer: String,
    pub submitted_by: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            type_hint: None,
            language: None,
            auto_approve: None,
            reviewer: "lexscan".to_string(),
            submitted_by: "lexscan".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Items in submission order, in their final state.
    pub items: Vec<ReviewItem>,
    pub approved: Vec<ReviewId>,
}

impl BatchOutcome {
    pub fn pending(&self) -> impl Iterator<Item = &ReviewItem> {
        self.items
            .iter()
            .filter(|item| item.status == ReviewStatus::Pending)
    }
}

/// Process and submit every input, then run batch approval when requested.
pub fn run_batch(
    workflow: &ApprovalWorkflow,
    extractor: &EntityExtractor,
    mapper: &FieldMapper,
    inputs: &[DocumentInput],
    options: &BatchOptions,
) -> Result<BatchOutcome, WorkflowError> {
    let span = info_span!("batch", documents = inputs.len());
    let _guard = span.enter();

    let mut ids = Vec::with_capacity(inputs.len());
    for input in inputs {
        let processed = process_text(
            extractor,
            mapper,
            &input.text,
            options.type_hint.as_ref(),
            options.language,
        );
        let id = workflow.submit(SubmitRequest {
            original_document: input.original_document(),
            extraction: processed.extraction,
            mapping_result: processed.mapping,
            ocr_confidence: input.ocr_confidence,
            submitted_by: options.submitted_by.clone(),
        });
        ids.push(id);
    }

    let approved = match options.auto_approve {
        Some(threshold) => workflow.batch_approve(threshold, &options.reviewer)?,
        None => Vec::new(),
    };
    let items: Vec<ReviewItem> = ids.iter().filter_map(|id| workflow.get(*id)).collect();
    info!(
        submitted = items.len(),
        approved = approved.len(),
        "batch finished"
    );
    Ok(BatchOutcome { items, approved })
}
