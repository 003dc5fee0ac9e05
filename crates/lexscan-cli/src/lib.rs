#![deny(unsafe_code)]

//! Library half of the `lexscan` binary: logging setup and the document
//! pipeline the commands drive.

pub mod logging;
pub mod pipeline;
