#![deny(unsafe_code)]

pub mod entity;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod ocr;
pub mod record;
pub mod review;
pub mod schema;
pub mod structure;

pub use entity::{EntityKind, ExtractedEntity, Extraction, Language, Span};
pub use error::{ModelError, Result};
pub use ids::{DocumentTypeId, ReviewId};
pub use mapping::{
    COMPLETENESS_WEIGHT, ConfidenceLevel, ConfidenceThresholds, FIELD_CONFIDENCE_WEIGHT,
    FieldMapping, FieldSuggestion, MappingResult, MappingSource, overall_confidence,
};
pub use ocr::OcrOutput;
pub use record::{ApprovedRecord, ExtractionMetadata};
pub use review::{
    CommentKind, OriginalDocument, ReviewAction, ReviewComment, ReviewItem, ReviewStatus,
};
pub use schema::{FieldKind, FormField, FormSchema, FormSection};
pub use structure::{Article, DocumentStructure};
