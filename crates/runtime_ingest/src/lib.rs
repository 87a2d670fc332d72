//! Concurrent ingestion of many sources into parsed documents.
//!
//! An [`Ingestor`] runs one task per [`Source`] on a fixed pool of scoped
//! worker threads. Results flow back over a channel to the calling thread,
//! which is the only place the result map is touched.

mod config;
mod error;
mod fetcher;
mod ingestor;

pub use core_types::Source;

pub use crate::config::{ConfigError, DEFAULT_MAX_THREADS, IngestConfig};
pub use crate::error::IngestError;
pub use crate::fetcher::{DocumentFetcher, NetFetcher};
pub use crate::ingestor::{
    BatchReport, Ingestor, LinkObserver, LinkSummary, LogLinkObserver, TaskState,
};
