use url::Url;

use crate::dom_builder::{DOCUMENT_NODE_NAME, HtmlTreeBuilder, TreeBuilder, run_tree_builder};
use crate::tokenizer::tokenize;
use crate::types::{Element, Node};

/// A parsed tree plus the URI it was loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    root: Element,
    base_uri: Option<String>,
}

impl Document {
    pub fn new(base_uri: Option<String>) -> Self {
        Self::from_nodes(Vec::new(), base_uri)
    }

    pub fn from_nodes(nodes: Vec<Node>, base_uri: Option<String>) -> Self {
        let mut root = Element::new(DOCUMENT_NODE_NAME);
        *root.children_mut() = nodes;
        Self { root, base_uri }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// Every element below the root, in document order.
    pub fn elements(&self) -> Elements<'_> {
        Elements {
            stack: self.root.children().iter().rev().collect(),
        }
    }

    /// Elements whose tag name matches `name` (ASCII case-insensitive).
    pub fn select<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements()
            .filter(move |e| e.name().eq_ignore_ascii_case(name))
    }

    /// Trimmed text of the first `<title>`, if any.
    pub fn title(&self) -> Option<String> {
        self.select("title")
            .next()
            .map(|t| t.text().trim().to_string())
    }

    /// Base for relative references: the document URI joined with the first
    /// `<base href>`.
    pub fn effective_base(&self) -> Option<Url> {
        let document_base = self.base_uri.as_deref().and_then(|b| Url::parse(b).ok());
        let base_href = self
            .select("base")
            .find_map(|b| b.attributes().get_ignore_ascii_case("href"));
        match (document_base, base_href) {
            (Some(base), Some(href)) => base.join(href).ok().or(Some(base)),
            (None, Some(href)) => Url::parse(href).ok(),
            (base, None) => base,
        }
    }

    /// Resolves `href` to an absolute URL; `None` when it is relative and the
    /// document has no usable base.
    pub fn abs_url(&self, href: &str) -> Option<String> {
        resolve(self.effective_base().as_ref(), href)
    }

    /// Absolute targets of every `a[href]`, in document order.
    pub fn select_links(&self) -> Vec<String> {
        let base = self.effective_base();
        self.select("a")
            .filter_map(|a| a.attributes().get_ignore_ascii_case("href"))
            .filter_map(|href| resolve(base.as_ref(), href))
            .collect()
    }
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(href) {
        Ok(url) => Some(url.into()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.and_then(|b| b.join(href).ok()).map(Into::into)
        }
        Err(_) => None,
    }
}

/// Depth-first pre-order walk over elements, without recursion.
pub struct Elements<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Node::Element(element) = node {
                self.stack.extend(element.children().iter().rev());
                return Some(element);
            }
        }
        None
    }
}

/// Parses HTML markup into a [`Document`].
pub fn parse_document(input: &str, base_uri: Option<&str>) -> Document {
    let mut builder = HtmlTreeBuilder::new();
    let stream = tokenize(input, builder.default_settings());
    // the HTML builder never reports contract violations
    let nodes = run_tree_builder(&mut builder, &stream).unwrap_or_default();
    Document::from_nodes(nodes, base_uri.map(str::to_string))
}
