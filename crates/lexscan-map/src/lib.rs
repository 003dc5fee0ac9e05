#![deny(unsafe_code)]

//! Field mapping from extracted entities onto form schemas.

pub mod dates;
pub mod mapper;
pub mod options;
mod strategies;
mod suggestions;

pub use mapper::FieldMapper;
pub use options::MapperOptions;
pub use strategies::{MappingInput, strategy_fields};
