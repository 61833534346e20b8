//! Database facade
//!
//! Composes the request client, the pagination engine and the batch flusher
//! into the public per-database operations: single-document CRUD, the four
//! bulk reads and the bulk writes.

use std::sync::Arc;

use davenport_domain::{DocumentMeta, Result, RowsPage, ViewRow, WriteOutcome};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{instrument, warn};
use urlencoding::encode;

use crate::bulk::{paginate, Batch, BatchFlusher, FlushThresholds, OnFlush, PageConsumer};
use crate::query::QueryOptions;
use crate::request::{DocumentApi, RequestClient};

/// Handle to one database on the server.
///
/// Cheap to clone; all operations borrow the shared request client.
#[derive(Clone)]
pub struct Database {
    api: Arc<RequestClient>,
    name: String,
}

impl Database {
    pub(crate) fn new(api: Arc<RequestClient>, name: impl Into<String>) -> Self {
        Self { api, name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Batch flusher bound to this database.
    pub fn flusher(&self) -> BatchFlusher<'_> {
        BatchFlusher::new(self.api.as_ref(), self.name.clone())
    }

    /// Fetch and decode one document.
    pub async fn get_doc<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        let path = format!("/{}/{}", self.name, encode(id));
        self.api.get(&path).await?.json()
    }

    /// Store a document under the given id.
    pub async fn put_doc(&self, id: &str, doc: &Value) -> Result<DocumentMeta> {
        let path = format!("/{}/{}", self.name, encode(id));
        self.api.put(&path, doc).await?.json()
    }

    /// Delete one document at the given revision.
    pub async fn delete_doc(&self, id: &str, rev: &str) -> Result<DocumentMeta> {
        let path = format!("/{}/{}?rev={}", self.name, encode(id), encode(rev));
        self.api.delete(&path).await?.json()
    }

    /// Current revision of a document, or `None` if it does not exist.
    ///
    /// Uses a HEAD probe, so a missing document is an answer rather than an
    /// error.
    pub async fn rev(&self, id: &str) -> Result<Option<String>> {
        let path = format!("/{}/{}", self.name, encode(id));
        let response = self.api.head(&path).await?;
        if response.is_success() {
            Ok(response.etag())
        } else {
            Ok(None)
        }
    }

    /// Raw bytes of a document attachment.
    pub async fn attachment(&self, id: &str, attachment: &str) -> Result<Vec<u8>> {
        let path = format!("/{}/{}/{}", self.name, encode(id), encode(attachment));
        Ok(self.api.get(&path).await?.body)
    }

    /// Whether the database itself exists on the server.
    pub async fn exists(&self) -> Result<bool> {
        let path = format!("/{}", self.name);
        let response = self.api.head(&path).await?;
        Ok(response.is_success())
    }

    /// One page of full documents from the listing endpoint.
    ///
    /// Injects `include_docs=true` unless the caller already set it. Rows
    /// reporting an error, and rows without a document, are logged and
    /// skipped rather than failing the page.
    pub async fn fetch_all_docs(&self, mut options: QueryOptions) -> Result<Vec<Value>> {
        if !options.contains("include_docs") {
            options.insert("include_docs", true);
        }
        let path = format!("/{}/_all_docs{}", self.name, options.to_query_string());
        let page: RowsPage = self.api.get(&path).await?.json()?;

        let mut docs = Vec::with_capacity(page.rows.len());
        for row in page.rows {
            if row.is_error() {
                warn!(
                    key = ?row.key,
                    error = row.error.as_deref(),
                    reason = row.reason.as_deref(),
                    "skipping listing row with error"
                );
                continue;
            }
            match row.doc {
                Some(doc) => docs.push(doc),
                None => warn!(key = ?row.key, "skipping listing row without document"),
            }
        }
        Ok(docs)
    }

    /// One page of document ids from the listing endpoint.
    ///
    /// Rows carrying a server-reported error are logged (key and reason) and
    /// excluded from the result instead of failing the whole page.
    pub async fn fetch_all_ids(&self, options: QueryOptions) -> Result<Vec<String>> {
        let path = format!("/{}/_all_docs{}", self.name, options.to_query_string());
        let page: RowsPage = self.api.get(&path).await?.json()?;

        let mut ids = Vec::with_capacity(page.rows.len());
        for row in page.rows {
            if row.is_error() {
                warn!(
                    key = ?row.key,
                    error = row.error.as_deref(),
                    reason = row.reason.as_deref(),
                    "skipping listing row with error"
                );
                continue;
            }
            match row.id {
                Some(id) => ids.push(id),
                None => warn!(key = ?row.key, "skipping listing row without id"),
            }
        }
        Ok(ids)
    }

    /// One page of rows from a view.
    pub async fn fetch_view_rows(
        &self,
        design: &str,
        view: &str,
        options: QueryOptions,
    ) -> Result<Vec<ViewRow>> {
        let path = format!(
            "/{}/_design/{}/_view/{}{}",
            self.name,
            encode(design),
            encode(view),
            options.to_query_string()
        );
        let page: RowsPage = self.api.get(&path).await?.json()?;
        Ok(page.rows)
    }

    /// One page of full documents from a view; forces `include_docs=true`.
    pub async fn fetch_view_docs(
        &self,
        design: &str,
        view: &str,
        mut options: QueryOptions,
    ) -> Result<Vec<Value>> {
        options.insert("include_docs", true);
        let rows = self.fetch_view_rows(design, view, options).await?;
        Ok(rows.into_iter().filter_map(|row| row.doc).collect())
    }

    /// Every document in the database, fetched in `page_size` slices.
    ///
    /// Memory grows with the collection; prefer
    /// [`all_docs_each`](Self::all_docs_each) for large databases.
    #[instrument(skip(self, options), fields(database = %self.name))]
    pub async fn all_docs(&self, page_size: usize, options: QueryOptions) -> Result<Vec<Value>> {
        paginate(
            |opts| self.fetch_all_docs(opts),
            page_size,
            options,
            doc_cursor_key,
            PageConsumer::Collect,
        )
        .await
    }

    /// Stream every document in `page_size` slices through `on_page`.
    pub async fn all_docs_each<F>(
        &self,
        page_size: usize,
        options: QueryOptions,
        mut on_page: F,
    ) -> Result<()>
    where
        F: FnMut(Vec<Value>) -> Result<()> + Send,
    {
        paginate(
            |opts| self.fetch_all_docs(opts),
            page_size,
            options,
            doc_cursor_key,
            PageConsumer::Callback(&mut on_page),
        )
        .await?;
        Ok(())
    }

    /// Every document id in the database.
    pub async fn all_ids(&self, page_size: usize, options: QueryOptions) -> Result<Vec<String>> {
        paginate(
            |opts| self.fetch_all_ids(opts),
            page_size,
            options,
            |id: &String| Some(id.clone()),
            PageConsumer::Collect,
        )
        .await
    }

    /// Stream every document id in `page_size` slices through `on_page`.
    pub async fn all_ids_each<F>(
        &self,
        page_size: usize,
        options: QueryOptions,
        mut on_page: F,
    ) -> Result<()>
    where
        F: FnMut(Vec<String>) -> Result<()> + Send,
    {
        paginate(
            |opts| self.fetch_all_ids(opts),
            page_size,
            options,
            |id: &String| Some(id.clone()),
            PageConsumer::Callback(&mut on_page),
        )
        .await?;
        Ok(())
    }

    /// Every row of a view.
    pub async fn view_rows(
        &self,
        design: &str,
        view: &str,
        page_size: usize,
        options: QueryOptions,
    ) -> Result<Vec<ViewRow>> {
        paginate(
            |opts| self.fetch_view_rows(design, view, opts),
            page_size,
            options,
            row_cursor_key,
            PageConsumer::Collect,
        )
        .await
    }

    /// Stream every row of a view in `page_size` slices through `on_page`.
    pub async fn view_rows_each<F>(
        &self,
        design: &str,
        view: &str,
        page_size: usize,
        options: QueryOptions,
        mut on_page: F,
    ) -> Result<()>
    where
        F: FnMut(Vec<ViewRow>) -> Result<()> + Send,
    {
        paginate(
            |opts| self.fetch_view_rows(design, view, opts),
            page_size,
            options,
            row_cursor_key,
            PageConsumer::Callback(&mut on_page),
        )
        .await?;
        Ok(())
    }

    /// Every document emitted by a view.
    ///
    /// Pages are fetched as rows so the cursor can advance on the row id,
    /// then each row is unwrapped to its embedded document.
    pub async fn view_docs(
        &self,
        design: &str,
        view: &str,
        page_size: usize,
        options: QueryOptions,
    ) -> Result<Vec<Value>> {
        let rows = self.view_docs_rows(design, view, page_size, options).await?;
        Ok(rows.into_iter().filter_map(|row| row.doc).collect())
    }

    /// Stream every view document in `page_size` slices through `on_page`.
    pub async fn view_docs_each<F>(
        &self,
        design: &str,
        view: &str,
        page_size: usize,
        options: QueryOptions,
        mut on_page: F,
    ) -> Result<()>
    where
        F: FnMut(Vec<Value>) -> Result<()> + Send,
    {
        let mut unwrap_page =
            |rows: Vec<ViewRow>| on_page(rows.into_iter().filter_map(|row| row.doc).collect());
        paginate(
            |opts| self.fetch_view_docs_page(design, view, opts),
            page_size,
            options,
            row_cursor_key,
            PageConsumer::Callback(&mut unwrap_page),
        )
        .await?;
        Ok(())
    }

    async fn view_docs_rows(
        &self,
        design: &str,
        view: &str,
        page_size: usize,
        options: QueryOptions,
    ) -> Result<Vec<ViewRow>> {
        paginate(
            |opts| self.fetch_view_docs_page(design, view, opts),
            page_size,
            options,
            row_cursor_key,
            PageConsumer::Collect,
        )
        .await
    }

    /// View page with documents attached, kept as rows for the paginator.
    async fn fetch_view_docs_page(
        &self,
        design: &str,
        view: &str,
        mut options: QueryOptions,
    ) -> Result<Vec<ViewRow>> {
        options.insert("include_docs", true);
        self.fetch_view_rows(design, view, options).await
    }

    /// One-shot bulk write of the given documents.
    pub async fn flush_bulk(&self, docs: &[Value]) -> Result<Vec<WriteOutcome>> {
        self.flusher().post_docs(docs).await
    }

    /// Write a whole collection through threshold-bounded batches.
    #[instrument(skip(self, docs, on_flush), fields(database = %self.name, docs = docs.len()))]
    pub async fn flush_bulk_throttled(
        &self,
        docs: Vec<Value>,
        thresholds: &FlushThresholds,
        on_flush: Option<OnFlush<'_>>,
    ) -> Result<()> {
        self.flusher().flush_throttled(docs, thresholds, on_flush).await
    }

    /// Flush a caller-owned batch once it crosses a threshold.
    pub async fn flush_bulk_if_big_enough(
        &self,
        batch: &mut Batch,
        thresholds: &FlushThresholds,
    ) -> Result<bool> {
        self.flusher().flush_if_threshold_exceeded(batch, thresholds).await
    }

    /// Mark every document deleted and submit them in one flush.
    pub async fn bulk_delete(&self, docs: Vec<Value>) -> Result<Vec<WriteOutcome>> {
        self.flusher().bulk_delete(docs).await
    }
}

fn doc_cursor_key(doc: &Value) -> Option<String> {
    doc.get("_id").and_then(Value::as_str).map(str::to_owned)
}

fn row_cursor_key(row: &ViewRow) -> Option<String> {
    row.id.clone()
}
