#![deny(unsafe_code)]

//! Entity extraction over recognized document text.

pub mod extractor;
pub mod language;
pub mod structure;

pub use extractor::{EntityExtractor, extract_entities};
pub use language::{ARABIC_SHARE_THRESHOLD, detect_language};
pub use structure::{MAX_TITLE_CHARS, analyze};
