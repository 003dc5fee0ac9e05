//! Entities recognized inside recognized document text.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::ids::DocumentTypeId;

/// Kind of domain concept an entity stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Document number such as `23-145`.
    Number,
    /// Gregorian, Hijri or composite date.
    Date,
    /// Issuing or signing institution.
    Institution,
    /// Article heading.
    Article,
    /// Cross-reference to another legal text.
    Reference,
    /// Free text span (object clause, preamble).
    TextBlock,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Number => "number",
            EntityKind::Date => "date",
            EntityKind::Institution => "institution",
            EntityKind::Article => "article",
            EntityKind::Reference => "reference",
            EntityKind::TextBlock => "text-block",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "number" => Ok(EntityKind::Number),
            "date" => Ok(EntityKind::Date),
            "institution" => Ok(EntityKind::Institution),
            "article" => Ok(EntityKind::Article),
            "reference" => Ok(EntityKind::Reference),
            "text-block" | "textblock" => Ok(EntityKind::TextBlock),
            _ => Err(ModelError::UnknownVariant {
                kind: "entity kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Byte range into the source text (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the two half-open ranges share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A typed, located span recognized as a domain concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub kind: EntityKind,
    pub value: String,
    pub span: Span,
    /// Base confidence of the pattern that produced the entity (0.0 to 1.0).
    pub confidence: f32,
    /// Named sub-groups of composite matches (e.g. `hijri_month`, `g_year`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ExtractedEntity {
    pub fn new(kind: EntityKind, value: impl Into<String>, span: Span, confidence: f32) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
            confidence: confidence.clamp(0.0, 1.0),
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Script/language of a document text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    French,
    Arabic,
    #[default]
    Unknown,
}

impl Language {
    /// Short code used by pattern `lang` tags.
    pub fn code(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::Arabic => "ar",
            Language::Unknown => "und",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fr" | "french" | "fra" => Ok(Language::French),
            "ar" | "arabic" | "ara" => Ok(Language::Arabic),
            "und" | "unknown" => Ok(Language::Unknown),
            _ => Err(ModelError::UnknownVariant {
                kind: "language",
                value: s.to_string(),
            }),
        }
    }
}

/// Output of one extraction pass over a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub document_type: DocumentTypeId,
    pub language: Language,
    /// Entities in document order.
    pub entities: Vec<ExtractedEntity>,
}

impl Extraction {
    /// An extraction that matched no template.
    pub fn unknown(language: Language) -> Self {
        Self {
            document_type: DocumentTypeId::unknown(),
            language,
            entities: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.document_type.is_unknown()
    }

    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &ExtractedEntity> {
        self.entities.iter().filter(move |entity| entity.kind == kind)
    }

    pub fn first_of(&self, kind: EntityKind) -> Option<&ExtractedEntity> {
        self.entities_of(kind).next()
    }
}
