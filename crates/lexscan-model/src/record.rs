use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DocumentTypeId, ReviewId};
use crate::review::{ReviewItem, ReviewStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub review_item_id: ReviewId,
    pub document_type: DocumentTypeId,
    pub filename: String,
    pub overall_confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
    pub entity_count: usize,
    pub unmapped_count: usize,
    pub catalog_version: String,
}

/// Final structured record handed to the persistence sink.
///
/// Serializes as the mapped schema fields plus `workflowStatus`, `approvedAt`
/// and `extractionMetadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedRecord {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub workflow_status: ReviewStatus,
    pub approved_at: DateTime<Utc>,
    pub extraction_metadata: ExtractionMetadata,
}

impl ApprovedRecord {
    pub fn from_item(item: &ReviewItem, approved_at: DateTime<Utc>, catalog_version: &str) -> Self {
        Self {
            fields: item.mapping_result.values(),
            workflow_status: ReviewStatus::Approved,
            approved_at,
            extraction_metadata: ExtractionMetadata {
                review_item_id: item.id,
                document_type: item.document_type.clone(),
                filename: item.original_document.filename.clone(),
                overall_confidence: item.mapping_result.overall_confidence,
                ocr_confidence: item.ocr_confidence,
                entity_count: item.extraction.entities.len(),
                unmapped_count: item.mapping_result.unmapped_data.len(),
                catalog_version: catalog_version.to_string(),
            },
        }
    }
}
