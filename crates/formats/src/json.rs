use std::path::Path;

use html::{Element, Node, ParseSettings, Token, TreeBuilder, TreeBuilderError, TreeBuilderResult};
use net::{FetchError, FetchResult};
use serde_json::Value;

/// Name of the root element [`JsonTreeBuilder::load_from_url`] and
/// [`JsonTreeBuilder::load_from_file`] convert under.
pub const JSON_ROOT_NAME: &str = "json";

/// Converts JSON found in a token stream into elements and text.
///
/// Object keys become elements, arrays splice their items into the enclosing
/// element and primitives become text. `<json>` raw-text elements and bare
/// character data are both accepted.
#[derive(Debug, Default)]
pub struct JsonTreeBuilder {
    nodes: Vec<Node>,
    // open <json> elements; their character tokens repeat the start tag data
    open_json: usize,
}

impl JsonTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts `value`. With a parent, nodes are appended to it and the
    /// returned vector is empty; without one, the top-level elements are
    /// returned. A primitive with nowhere to go is an error.
    pub fn convert(value: &Value, parent: Option<&mut Element>) -> TreeBuilderResult<Vec<Node>> {
        let mut roots = Vec::new();
        convert_into(value, parent, &mut roots)?;
        Ok(roots)
    }

    /// Parses `text` and converts it under a root element named `json`.
    /// Blank or malformed text yields `None`.
    pub fn parse_root(text: &str) -> Option<Element> {
        if text.trim().is_empty() {
            return None;
        }
        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(target: "formats.json", "skipping malformed document: {err}");
                return None;
            }
        };
        let mut root = Element::new(JSON_ROOT_NAME);
        // cannot fail: every primitive has the root as parent
        Self::convert(&value, Some(&mut root)).ok()?;
        Some(root)
    }

    pub fn load_from_url(url: &str) -> FetchResult<Option<Element>> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidTarget(url.to_string()));
        }
        match net::fetch_text(url) {
            Ok(fetched) => Ok(Self::parse_root(&fetched.body)),
            Err(FetchError::Status { url, status }) => {
                log::warn!(target: "formats.json", "{url} answered with HTTP {status}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn load_from_file(path: &Path) -> FetchResult<Option<Element>> {
        let text = net::read_text(path)?;
        Ok(Self::parse_root(&text))
    }

    fn convert_text(&mut self, text: &str) -> TreeBuilderResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                let nodes = Self::convert(&value, None)?;
                self.nodes.extend(nodes);
            }
            Err(err) => log::warn!(target: "formats.json", "skipping malformed text: {err}"),
        }
        Ok(())
    }
}

fn convert_into(
    value: &Value,
    mut parent: Option<&mut Element>,
    roots: &mut Vec<Node>,
) -> TreeBuilderResult<()> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let mut element = Element::new(key.clone());
                convert_into(child, Some(&mut element), roots)?;
                match parent.as_deref_mut() {
                    Some(parent) => parent.append_child(element),
                    None => roots.push(element.into()),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                convert_into(item, parent.as_deref_mut(), roots)?;
            }
        }
        primitive => {
            let text = primitive_text(primitive);
            match parent {
                Some(parent) => parent.append_child(Node::text(text)),
                None => return Err(TreeBuilderError::OrphanText { text }),
            }
        }
    }
    Ok(())
}

fn primitive_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl TreeBuilder for JsonTreeBuilder {
    fn default_settings(&self) -> ParseSettings {
        ParseSettings::PRESERVE_CASE
    }

    fn new_instance(&self) -> Box<dyn TreeBuilder + Send> {
        Box::new(JsonTreeBuilder::new())
    }

    fn process(&mut self, token: &Token) -> TreeBuilderResult<bool> {
        match token {
            Token::StartTag {
                name,
                self_closing,
                data,
                ..
            } if name.eq_ignore_ascii_case(JSON_ROOT_NAME) => {
                if !self_closing {
                    self.open_json += 1;
                }
                if let Some(data) = data {
                    self.convert_text(data)?;
                }
            }
            Token::EndTag(name) if name.eq_ignore_ascii_case(JSON_ROOT_NAME) => {
                self.open_json = self.open_json.saturating_sub(1);
            }
            Token::Character(text) if self.open_json == 0 => self.convert_text(text)?,
            _ => {}
        }
        Ok(true)
    }

    fn parse_fragment(
        &mut self,
        input: &str,
        context: Option<&Element>,
        _base_uri: &str,
    ) -> TreeBuilderResult<Vec<Node>> {
        let value = match serde_json::from_str::<Value>(input) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(target: "formats.json", "skipping malformed fragment: {err}");
                return Ok(Vec::new());
            }
        };
        match context {
            Some(context) => {
                let mut scratch = Element::new(context.name());
                Self::convert(&value, Some(&mut scratch))?;
                Ok(scratch.into_children())
            }
            None => Self::convert(&value, None),
        }
    }

    fn finish(&mut self) -> Vec<Node> {
        self.open_json = 0;
        std::mem::take(&mut self.nodes)
    }
}
