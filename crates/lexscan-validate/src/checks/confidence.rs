use lexscan_model::{ConfidenceThresholds, MappingResult, MappingSource};

use crate::issue::Issue;

/// Machine-mapped fields below the low confidence band. Corrections are trusted.
pub fn check(result: &MappingResult, thresholds: &ConfidenceThresholds) -> Vec<Issue> {
    result
        .mapped_fields
        .iter()
        .filter(|m| m.source != MappingSource::Corrected)
        .filter(|m| thresholds.categorize(m.confidence).is_none())
        .map(|m| Issue::LowConfidence {
            field: m.field_name.clone(),
            confidence: m.confidence,
        })
        .collect()
}
