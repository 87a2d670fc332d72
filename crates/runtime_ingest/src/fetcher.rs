use std::path::Path;

use core_types::{ResourceKind, Source};
use formats::{CssTreeBuilder, JsonTreeBuilder};
use html::{Document, Element, parse_document};
use net::FetchError;
use url::Url;

/// Turns a [`Source`] into a parsed [`Document`]. Shared by every worker of a
/// batch, hence `Sync`.
pub trait DocumentFetcher: Sync {
    fn fetch(&self, source: &Source) -> Result<Document, FetchError>;
}

impl<F> DocumentFetcher for F
where
    F: Fn(&Source) -> Result<Document, FetchError> + Sync,
{
    fn fetch(&self, source: &Source) -> Result<Document, FetchError> {
        self(source)
    }
}

/// Fetches over HTTP or from disk and picks the parser from the content type
/// (URLs) or the file extension (paths). Raw markup is parsed as HTML.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetFetcher;

impl DocumentFetcher for NetFetcher {
    fn fetch(&self, source: &Source) -> Result<Document, FetchError> {
        match source {
            Source::Url(url) => {
                let fetched = net::fetch_text(url)?;
                let kind = ResourceKind::from_content_type(fetched.content_type.as_deref());
                Ok(build_document(kind, &fetched.body, Some(fetched.url)))
            }
            Source::File(path) => {
                let text = net::read_text(path)?;
                Ok(build_document(
                    ResourceKind::from_path(path),
                    &text,
                    file_base_uri(path),
                ))
            }
            Source::Html(markup) => Ok(parse_document(markup, None)),
        }
    }
}

fn file_base_uri(path: &Path) -> Option<String> {
    let absolute = std::path::absolute(path).ok()?;
    Url::from_file_path(absolute).ok().map(String::from)
}

fn build_document(kind: ResourceKind, text: &str, base_uri: Option<String>) -> Document {
    match kind {
        ResourceKind::Html => parse_document(text, base_uri.as_deref()),
        ResourceKind::Css => {
            let builder = CssTreeBuilder::new(base_uri.clone().unwrap_or_default());
            Document::from_nodes(builder.parse_standalone(text), base_uri)
        }
        ResourceKind::Json => {
            let nodes = JsonTreeBuilder::parse_root(text)
                .map(Element::into_children)
                .unwrap_or_default();
            Document::from_nodes(nodes, base_uri)
        }
    }
}
