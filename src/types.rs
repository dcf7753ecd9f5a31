//! Core types for attachment-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a record (object id) in the feature service
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Create a new RecordId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RecordId> for i64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata for one attachment, as listed by the feature service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    /// Per-record attachment id
    pub id: i64,

    /// Attachment filename as stored by the service (e.g. "photo.jpg")
    pub name: String,

    /// MIME type reported by the service, if any
    #[serde(default, rename = "contentType")]
    pub content_type: Option<String>,

    /// Size in bytes reported by the service, if any
    #[serde(default)]
    pub size: Option<u64>,
}

/// Counts of what an export run processed
///
/// Returned by [`AttachmentExporter::run`](crate::AttachmentExporter::run)
/// after all record tasks have settled. Per-record and per-file failures are
/// tallied here rather than aborting the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Number of records the service enumerated
    pub records_total: usize,

    /// Records whose attachment listing or field resolution failed
    pub records_failed: usize,

    /// Attachment files written to disk
    pub files_written: usize,

    /// Attachment downloads or writes that failed
    pub files_failed: usize,
}

impl ExportSummary {
    /// Whether every enumerated record and file was processed without error
    pub fn is_clean(&self) -> bool {
        self.records_failed == 0 && self.files_failed == 0
    }
}

/// Events emitted during an export run
///
/// Subscribe via [`AttachmentExporter::subscribe`](crate::AttachmentExporter::subscribe).
/// Events are broadcast; a slow or absent subscriber never blocks the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Record ids enumerated, fan-out starting
    Enumerated {
        /// Number of records returned by the ids-only query
        total: usize,
    },

    /// One attachment written to disk
    FileWritten {
        /// Owning record
        record_id: RecordId,
        /// Attachment id within the record
        attachment_id: i64,
        /// Final destination path
        path: PathBuf,
    },

    /// One attachment failed to download or write
    FileFailed {
        /// Owning record
        record_id: RecordId,
        /// Attachment id within the record
        attachment_id: i64,
        /// Error message
        error: String,
    },

    /// A record's attachment listing or field resolution failed; its
    /// attachments were skipped
    RecordFailed {
        /// The record that was skipped
        record_id: RecordId,
        /// Error message
        error: String,
    },

    /// All record tasks settled
    Completed {
        /// Final tallies for the run
        summary: ExportSummary,
    },
}
