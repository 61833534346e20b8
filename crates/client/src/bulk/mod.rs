//! Bulk reads and writes
//!
//! Two generic engines live here:
//! - [`paginate`]: keyset pagination over an unbounded remote collection,
//!   using only a "start after last seen key" cursor
//! - [`BatchFlusher`]: size-and-count-bounded batching of pending writes to
//!   the bulk-write endpoint

pub mod flush;
pub mod paginate;

pub use flush::{Batch, BatchFlusher, CostEstimator, FlushThresholds, JsonByteCost, OnFlush};
pub use paginate::{paginate, PageConsumer, CURSOR_SENTINEL};
