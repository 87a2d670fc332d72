//! Markup output for the tree model.
//!
//! Text is escaped for `&`, `<` and `>`; attribute values for `&`, `<`, `>`
//! and `"`, always double-quoted. Children of raw-text elements (`script`,
//! `style`, `json`) are written verbatim. Void elements without children get
//! no end tag.

use std::fmt;

use crate::document::Document;
use crate::tokenizer::{is_raw_text_element, is_void_element};
use crate::types::{Element, Node};

impl Element {
    /// The element itself, its attributes and its subtree as markup.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self);
        out
    }

    /// Markup of the children only.
    pub fn html(&self) -> String {
        let mut out = String::new();
        write_children(&mut out, self);
        out
    }
}

impl Node {
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, self, false);
        out
    }
}

impl Document {
    /// Markup of every top-level node; the synthetic root is not written.
    pub fn html(&self) -> String {
        self.root().html()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outer_html())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outer_html())
    }
}

fn write_node(out: &mut String, node: &Node, raw: bool) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) if raw => out.push_str(text),
        Node::Text(text) => write_escaped(out, text, false),
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(element.name());
    for (key, value) in element.attributes().iter() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        write_escaped(out, value, true);
        out.push('"');
    }
    out.push('>');
    if element.children().is_empty() && is_void_element(element.name()) {
        return;
    }
    write_children(out, element);
    out.push_str("</");
    out.push_str(element.name());
    out.push('>');
}

fn write_children(out: &mut String, element: &Element) {
    let raw = is_raw_text_element(element.name());
    for child in element.children() {
        write_node(out, child, raw);
    }
}

fn write_escaped(out: &mut String, value: &str, attribute: bool) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
