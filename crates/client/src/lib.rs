//! # Davenport Client
//!
//! Async client for CouchDB-style document databases.
//!
//! This crate contains:
//! - HTTP transport (reqwest wrapper with connect/read timeouts)
//! - Authenticated request client with response classification
//! - Cursor-based bulk pagination over listing and view endpoints
//! - Size-and-count-bounded batch flushing of pending writes
//! - The `Client`/`Database` facade composing the above
//!
//! ## Architecture
//! - Domain types live in `davenport-domain`
//! - Bulk components depend on the narrow [`DocumentApi`] capability trait,
//!   not on the concrete request client
//! - No automatic retries anywhere; retry policy belongs to the caller

pub mod bulk;
pub mod config;
pub mod http;
pub mod query;
pub mod request;

mod client;
mod database;

// Re-export commonly used items
pub use bulk::{
    paginate, Batch, BatchFlusher, CostEstimator, FlushThresholds, JsonByteCost, OnFlush,
    PageConsumer, CURSOR_SENTINEL,
};
pub use client::Client;
pub use database::Database;
pub use davenport_domain::{
    DavenportError, DocumentMeta, Result, RowsPage, ServerConfig, ViewRow, WriteOutcome,
};
pub use http::{HttpClient, HttpClientBuilder};
pub use query::QueryOptions;
pub use request::{ApiResponse, CallOptions, DocumentApi, RequestClient};
