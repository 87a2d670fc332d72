//! Tree model, token source and HTML tree construction.
//!
//! Every format in the workspace produces the same two-kind tree: [`Element`]
//! (tag name, ordered unique attributes, owned children) and text. Format
//! adapters plug in through the [`TreeBuilder`] capability set.

pub mod document;

mod dom_builder;
mod entities;
mod serialize;
mod tokenizer;
mod types;

pub use crate::document::{Document, Elements, parse_document};
pub use crate::dom_builder::{
    DOCUMENT_NODE_NAME, HtmlTreeBuilder, TreeBuilder, TreeBuilderError, TreeBuilderResult,
    run_tree_builder,
};
pub use crate::tokenizer::tokenize;
pub use crate::types::{Attributes, Element, Node, ParseSettings, Token, TokenStream};
