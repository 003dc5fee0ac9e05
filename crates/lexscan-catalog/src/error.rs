#![deny(unsafe_code)]

use std::path::PathBuf;

use lexscan_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse CSV {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported schema in {origin}: found {found}, expected {expected} v{version}")]
    UnsupportedSchema {
        origin: String,
        found: String,
        expected: &'static str,
        version: u32,
    },

    #[error("invalid catalog: {message}")]
    InvalidCatalog { message: String },

    #[error("duplicate template id: {id}")]
    DuplicateTemplate { id: String },

    #[error("template {template} references unknown schema {schema}")]
    UnknownSchema { template: String, schema: String },

    #[error("template {template} references unknown entity set {set}")]
    UnknownEntitySet { template: String, set: String },

    #[error("invalid pattern in {context}: {source}")]
    InvalidPattern {
        context: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid validation rule {rule:?} in template {template}: {message}")]
    InvalidRule {
        template: String,
        rule: String,
        message: String,
    },

    #[error("template {template} has a rule for unknown field {field}")]
    UnknownField { template: String, field: String },

    #[error("confidence {value} out of range in {context}")]
    InvalidConfidence { context: String, value: f32 },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
