//! Field mappings produced by the mapper and the confidence model around them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::FormSchema;

/// Weight of required-field completeness in [`overall_confidence`].
pub const COMPLETENESS_WEIGHT: f32 = 0.6;
/// Weight of the mean per-field confidence in [`overall_confidence`].
pub const FIELD_CONFIDENCE_WEIGHT: f32 = 0.4;

/// Where a mapped value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    /// Taken from an extracted entity.
    ExtractedEntity,
    /// Taken from the document structure or a field extraction rule.
    PatternMatch,
    /// Derived by a heuristic or default.
    Inferred,
    /// Entered by a reviewer.
    Corrected,
}

impl MappingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingSource::ExtractedEntity => "extracted_entity",
            MappingSource::PatternMatch => "pattern_match",
            MappingSource::Inferred => "inferred",
            MappingSource::Corrected => "corrected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field_name: String,
    pub value: String,
    pub confidence: f32,
    pub source: MappingSource,
}

impl FieldMapping {
    pub fn new(
        field_name: impl Into<String>,
        value: impl Into<String>,
        confidence: f32,
        source: MappingSource,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

/// A candidate value for a field that could not be mapped with confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSuggestion {
    pub field_name: String,
    pub suggested_value: String,
    pub reason: String,
    pub confidence: f32,
}

/// Confidence level categories for mapping quality assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    /// At or above the low threshold; needs verification.
    Low,
    /// At or above the medium threshold; should be reviewed.
    Medium,
    /// At or above the high threshold; likely correct.
    High,
}

impl ConfidenceLevel {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "high confidence - likely correct",
            Self::Medium => "medium confidence - should review",
            Self::Low => "low confidence - needs verification",
        }
    }
}

/// Configurable thresholds for categorizing mapping confidence.
///
/// - Below `low`: uncategorized
/// - `low` to `medium`: [`ConfidenceLevel::Low`]
/// - `medium` to `high`: [`ConfidenceLevel::Medium`]
/// - At or above `high`: [`ConfidenceLevel::High`]
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceThresholds {
    pub high: f32,
    pub medium: f32,
    pub low: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.95,
            medium: 0.80,
            low: 0.60,
        }
    }
}

impl ConfidenceThresholds {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            high: 0.98,
            medium: 0.90,
            low: 0.75,
        }
    }

    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            high: 0.90,
            medium: 0.70,
            low: 0.50,
        }
    }

    /// Returns `None` if the score is below the low threshold.
    #[must_use]
    pub fn categorize(&self, confidence: f32) -> Option<ConfidenceLevel> {
        if confidence >= self.high {
            Some(ConfidenceLevel::High)
        } else if confidence >= self.medium {
            Some(ConfidenceLevel::Medium)
        } else if confidence >= self.low {
            Some(ConfidenceLevel::Low)
        } else {
            None
        }
    }
}

/// Blend required-field completeness with mean field confidence.
///
/// `0.6 * (mapped_required / total_required) + 0.4 * mean(confidence)`.
/// A schema without required fields counts as complete; no mappings give a mean of zero.
pub fn overall_confidence(
    mapped_required: usize,
    total_required: usize,
    mapped: &[FieldMapping],
) -> f32 {
    let completeness = if total_required == 0 {
        1.0
    } else {
        mapped_required.min(total_required) as f32 / total_required as f32
    };
    let mean = if mapped.is_empty() {
        0.0
    } else {
        mapped.iter().map(|m| m.confidence).sum::<f32>() / mapped.len() as f32
    };
    (COMPLETENESS_WEIGHT * completeness + FIELD_CONFIDENCE_WEIGHT * mean).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    /// Accepted mappings in schema field order.
    pub mapped_fields: Vec<FieldMapping>,
    /// Entity values that no accepted mapping contains.
    pub unmapped_data: Vec<String>,
    pub suggestions: Vec<FieldSuggestion>,
    pub overall_confidence: f32,
}

impl MappingResult {
    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.mapped_fields.iter().find(|m| m.field_name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|m| m.value.as_str())
    }

    /// Values keyed by field name, as emitted in approved records.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.mapped_fields
            .iter()
            .map(|m| (m.field_name.clone(), m.value.clone()))
            .collect()
    }

    pub fn mapped_required(&self, schema: &FormSchema) -> usize {
        schema
            .required_fields()
            .filter(|field| self.field(&field.name).is_some())
            .count()
    }

    /// Required schema fields that have no mapping.
    pub fn missing_required<'a>(&self, schema: &'a FormSchema) -> Vec<&'a str> {
        schema
            .required_fields()
            .filter(|field| self.field(&field.name).is_none())
            .map(|field| field.name.as_str())
            .collect()
    }

    pub fn recompute_confidence(&mut self, schema: &FormSchema) {
        self.overall_confidence = overall_confidence(
            self.mapped_required(schema),
            schema.required_count(),
            &self.mapped_fields,
        );
    }

    /// Replace (or add) the mapping for `field_name` with a reviewer-entered value.
    ///
    /// Suggestions for the field are dropped and unmapped data contained in the
    /// new value is pruned. Callers recompute the overall confidence afterwards.
    pub fn apply_correction(&mut self, field_name: &str, value: &str) {
        let corrected = FieldMapping::new(field_name, value.trim(), 1.0, MappingSource::Corrected);
        self.unmapped_data
            .retain(|unmapped| !corrected.value.contains(unmapped.as_str()));
        match self
            .mapped_fields
            .iter_mut()
            .find(|m| m.field_name == field_name)
        {
            Some(existing) => *existing = corrected,
            None => self.mapped_fields.push(corrected),
        }
        self.suggestions.retain(|s| s.field_name != field_name);
    }

    /// Mapped fields per confidence band; fields below `low` are not counted.
    #[must_use]
    pub fn count_by_level(
        &self,
        thresholds: &ConfidenceThresholds,
    ) -> BTreeMap<ConfidenceLevel, usize> {
        let mut counts = BTreeMap::new();
        for mapping in &self.mapped_fields {
            if let Some(level) = thresholds.categorize(mapping.confidence) {
                *counts.entry(level).or_insert(0) += 1;
            }
        }
        counts
    }
}
