//! Uniform document trees from HTML, CSS and JSON sources, with a bounded
//! concurrent ingestion pipeline on top.
//!
//! The workspace crates are re-exported here so downstream users only need a
//! single dependency.

pub use core_types::{ResourceKind, Source};
pub use formats::{CssTreeBuilder, Format, JsonTreeBuilder, RuleObserver};
pub use html::{Document, Element, Node, ParseSettings, Token, TreeBuilder};
pub use runtime_ingest::{DocumentFetcher, IngestConfig, IngestError, Ingestor, NetFetcher};

pub use core_types;
pub use formats;
pub use html;
pub use runtime_ingest;
