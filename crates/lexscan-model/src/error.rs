use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid document type id: {0:?}")]
    InvalidDocumentTypeId(String),

    #[error("duplicate field '{field}' in schema {schema}")]
    DuplicateField { schema: String, field: String },

    #[error("invalid review id {value}: {source}")]
    InvalidReviewId {
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
