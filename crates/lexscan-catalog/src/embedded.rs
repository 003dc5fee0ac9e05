//! Default catalog data, embedded at compile time with `include_str!()`.
//!
//! A directory with the same three files can replace it at startup
//! (see [`crate::Catalog::load_from_dir`]).

/// Document type templates, shared form schemas and entity pattern sets.
pub const CATALOG_TOML: &str = include_str!("../data/catalog.toml");

/// Gregorian and Hijri month names, status and amendment keywords.
pub const VOCABULARY_TOML: &str = include_str!("../data/vocabulary.toml");

/// Known issuing institutions: canonical name, aliases, Arabic name.
pub const INSTITUTIONS_CSV: &str = include_str!("../data/institutions.csv");
