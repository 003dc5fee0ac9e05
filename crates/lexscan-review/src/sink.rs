//! Destinations for approved records.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lexscan_model::ApprovedRecord;

use crate::error::SinkError;
use crate::lock;

/// Receives each approved record exactly once, before the approval is committed.
///
/// An error aborts the approval and leaves the review item untouched.
pub trait RecordSink: Send + Sync {
    fn emit(&self, record: &ApprovedRecord) -> Result<(), SinkError>;
}

/// Keeps records in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ApprovedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ApprovedRecord> {
        lock(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, record: &ApprovedRecord) -> Result<(), SinkError> {
        lock(&self.records).push(record.clone());
        Ok(())
    }
}

/// Appends one JSON record per line to a file.
///
/// Each line goes to the file in a single unbuffered write, so a failed
/// emit never leaves bytes behind for a later one to flush.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it when missing.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self::from_writer(path, file))
    }

    /// Write lines to `writer`; `path` names it in errors.
    pub fn from_writer(path: impl Into<PathBuf>, writer: impl Write + Send + 'static) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for JsonLinesSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RecordSink for JsonLinesSink {
    fn emit(&self, record: &ApprovedRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut writer = lock(&self.writer);
        writer
            .write_all(&line)
            .and_then(|()| writer.flush())
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
