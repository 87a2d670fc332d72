//! Format adapters that turn CSS and JSON into the shared tree model.
//!
//! Each adapter implements [`html::TreeBuilder`], so the same token stream
//! driver ([`html::run_tree_builder`]) feeds HTML, CSS and JSON alike.
//! [`Format`] picks an adapter at runtime.

mod json;
mod observe;
mod stylesheet;

use core_types::ResourceKind;
use html::{Node, TreeBuilder, TreeBuilderResult, run_tree_builder, tokenize};

pub use crate::json::{JSON_ROOT_NAME, JsonTreeBuilder};
pub use crate::observe::{LogObserver, ObservedRule, RecordingObserver, RuleObserver};
pub use crate::stylesheet::CssTreeBuilder;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Css,
    Json,
}

impl Format {
    /// A fresh adapter for one parse session.
    pub fn adapter(self, base_uri: &str) -> Box<dyn TreeBuilder + Send> {
        match self {
            Format::Css => Box::new(CssTreeBuilder::new(base_uri)),
            Format::Json => Box::new(JsonTreeBuilder::new()),
        }
    }

    pub fn from_kind(kind: ResourceKind) -> Option<Self> {
        match kind {
            ResourceKind::Css => Some(Format::Css),
            ResourceKind::Json => Some(Format::Json),
            ResourceKind::Html => None,
        }
    }
}

/// Tokenizes `input` with the adapter's settings and drives the adapter over it.
pub fn parse(format: Format, input: &str, base_uri: &str) -> TreeBuilderResult<Vec<Node>> {
    let mut adapter = format.adapter(base_uri);
    let stream = tokenize(input, adapter.default_settings());
    run_tree_builder(adapter.as_mut(), &stream)
}
