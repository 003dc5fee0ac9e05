#![deny(unsafe_code)]

//! Document type catalog: templates, shared form schemas, calendar vocabulary
//! and known institutions.
//!
//! The default catalog is embedded; a directory holding `catalog.toml`,
//! `vocabulary.toml` and `institutions.csv` can replace it at startup.

pub mod embedded;
pub mod error;
pub mod hash;
pub mod institutions;
pub mod manifest;
pub mod pattern;
pub mod registry;
pub mod rules;
pub mod template;
pub mod text;
pub mod vocabulary;

pub use error::{CatalogError, Result};
pub use institutions::{Institution, InstitutionList, InstitutionMatch};
pub use pattern::{EntityPattern, LangTag, PatternRule};
pub use registry::{
    Catalog, CatalogSources, CatalogSummary, NAME_SIMILARITY_THRESHOLD, TemplateMatch,
};
pub use rules::{RuleKind, ValidationRule};
pub use template::{DocumentTypeTemplate, FieldPatterns, Identification};
pub use text::normalize_key;
pub use vocabulary::{Calendar, KeywordHit, MonthName, Vocabulary};
