//! Bounded batch flushing of pending writes
//!
//! A [`Batch`] buffers pending documents together with a running cost
//! estimate; the [`BatchFlusher`] posts it to the bulk-write endpoint once a
//! byte or count threshold is crossed. Per-document write errors in the
//! response are counted and logged, never raised: only transport and
//! HTTP-level failures propagate, and those leave the batch intact so no
//! pending write is lost.

use davenport_domain::{Result, WriteOutcome};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::request::DocumentApi;

/// Observer invoked with the per-document outcomes of each flush.
pub type OnFlush<'a> = &'a mut (dyn FnMut(&[WriteOutcome]) + Send);

/// Approximates the in-memory size of one pending document.
///
/// The estimate steers threshold bookkeeping only; it is documented as
/// approximate and is not a wire-exact figure.
pub trait CostEstimator: Send + Sync {
    fn estimate(&self, doc: &Value) -> usize;
}

/// Default cost model: serialized-JSON byte length.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonByteCost;

impl CostEstimator for JsonByteCost {
    fn estimate(&self, doc: &Value) -> usize {
        serde_json::to_vec(doc).map(|bytes| bytes.len()).unwrap_or(0)
    }
}

/// Caller-owned buffer of pending writes plus a running cost estimate.
///
/// The buffer is mutated only through `push` and `clear`; `&mut` access is
/// the mutual-exclusion boundary, so a batch can never be observed half
/// flushed.
#[derive(Debug, Default)]
pub struct Batch {
    docs: Vec<Value>,
    approx_bytes: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pending write, growing the running cost estimate.
    pub fn push(&mut self, doc: Value, estimator: &dyn CostEstimator) {
        self.approx_bytes += estimator.estimate(&doc);
        self.docs.push(doc);
    }

    pub fn docs(&self) -> &[Value] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Running approximate cost of the buffered documents, in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.approx_bytes
    }

    /// Empty the buffer and reset the cost estimate to zero.
    pub fn clear(&mut self) {
        self.docs.clear();
        self.approx_bytes = 0;
    }
}

/// When to flush a growing batch.
#[derive(Debug, Clone)]
pub struct FlushThresholds {
    /// Flush once the running cost estimate reaches this many bytes.
    pub max_bytes: usize,
    /// Flush once the batch holds this many documents.
    pub max_docs: usize,
}

impl Default for FlushThresholds {
    fn default() -> Self {
        Self { max_bytes: 10 * 1024 * 1024, max_docs: 300 }
    }
}

impl FlushThresholds {
    pub fn exceeded_by(&self, batch: &Batch) -> bool {
        batch.approx_bytes() >= self.max_bytes || batch.len() >= self.max_docs
    }
}

/// Posts batches of pending writes to one database's bulk-write endpoint.
pub struct BatchFlusher<'a> {
    api: &'a dyn DocumentApi,
    database: String,
    estimator: Box<dyn CostEstimator>,
}

impl<'a> BatchFlusher<'a> {
    pub fn new(api: &'a dyn DocumentApi, database: impl Into<String>) -> Self {
        Self { api, database: database.into(), estimator: Box::new(JsonByteCost) }
    }

    /// Replace the default cost model.
    #[must_use]
    pub fn with_estimator(mut self, estimator: Box<dyn CostEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Append one pending write to a caller-owned batch.
    pub fn accumulate(&self, batch: &mut Batch, doc: Value) {
        batch.push(doc, self.estimator.as_ref());
    }

    /// Submit the batch as one bulk-write request and clear it.
    ///
    /// Per-document errors in the response are counted and logged but do not
    /// fail the call; the batch is cleared either way. A transport or
    /// HTTP-level failure propagates and leaves the batch untouched, so the
    /// caller still owns every unflushed document.
    pub async fn flush(&self, batch: &mut Batch) -> Result<Vec<WriteOutcome>> {
        let outcomes = self.post_docs(batch.docs()).await?;
        batch.clear();
        Ok(outcomes)
    }

    /// Flush only once the batch crosses a threshold.
    ///
    /// Returns whether a flush occurred. Thresholds are "meets or exceeds":
    /// the flush fires on the accumulation that reaches the limit, not the
    /// one after it.
    pub async fn flush_if_threshold_exceeded(
        &self,
        batch: &mut Batch,
        thresholds: &FlushThresholds,
    ) -> Result<bool> {
        if !thresholds.exceeded_by(batch) {
            return Ok(false);
        }
        self.flush(batch).await?;
        Ok(true)
    }

    /// Write a whole collection through threshold-bounded batches.
    ///
    /// Documents are accumulated in order and flushed every time a threshold
    /// is crossed, with a final flush for the remainder. Every input lands in
    /// exactly one flush, in its original position; batches split only at
    /// threshold boundaries. `on_flush` observes each flush's outcomes.
    pub async fn flush_throttled(
        &self,
        docs: Vec<Value>,
        thresholds: &FlushThresholds,
        mut on_flush: Option<OnFlush<'_>>,
    ) -> Result<()> {
        let mut batch = Batch::new();
        for doc in docs {
            self.accumulate(&mut batch, doc);
            if thresholds.exceeded_by(&batch) {
                let outcomes = self.flush(&mut batch).await?;
                if let Some(observer) = &mut on_flush {
                    observer(&outcomes);
                }
            }
        }
        if !batch.is_empty() {
            let outcomes = self.flush(&mut batch).await?;
            if let Some(observer) = &mut on_flush {
                observer(&outcomes);
            }
        }
        Ok(())
    }

    /// Mark every document deleted and submit them in one unthrottled flush.
    pub async fn bulk_delete(&self, mut docs: Vec<Value>) -> Result<Vec<WriteOutcome>> {
        for doc in &mut docs {
            if let Some(fields) = doc.as_object_mut() {
                fields.insert("_deleted".to_owned(), Value::Bool(true));
            }
        }
        self.post_docs(&docs).await
    }

    /// One-shot bulk write of the given documents, bypassing batching.
    pub async fn post_docs(&self, docs: &[Value]) -> Result<Vec<WriteOutcome>> {
        let path = format!("/{}/_bulk_docs", self.database);
        let body = json!({ "docs": docs });
        debug!(database = %self.database, docs = docs.len(), "posting bulk write");

        let response = self.api.post(&path, &body).await?;
        let outcomes: Vec<WriteOutcome> = response.json()?;

        let errors = outcomes.iter().filter(|outcome| outcome.is_error()).count();
        if errors > 0 {
            warn!(database = %self.database, errors, "bulk write completed with item errors");
        }
        Ok(outcomes)
    }
}
