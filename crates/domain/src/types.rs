//! Wire-level envelope types for listing and bulk-write responses

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a `_all_docs` or view response.
///
/// Error rows carry `error`/`reason` instead of a document; the listing
/// endpoints report per-row failures this way rather than failing the whole
/// page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ViewRow {
    /// Whether the server reported a failure for this row.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Envelope of one page returned by the listing endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowsPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default)]
    pub rows: Vec<ViewRow>,
}

/// Per-document outcome of a bulk write.
///
/// The bulk-write endpoint answers with one entry per submitted document;
/// entries with an `error` field mark individual failures and do not imply
/// the batch as a whole failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WriteOutcome {
    /// Whether the server rejected this document.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Identity of a stored document revision, as returned by single-document
/// writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: String,
    pub rev: String,
    #[serde(default)]
    pub ok: bool,
}
