use std::borrow::Cow;

/// Case handling for tag and attribute names.
///
/// HTML folds names to lowercase; the CSS and JSON adapters preserve them so
/// selectors and object keys survive verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseSettings {
    preserve_tag_case: bool,
    preserve_attribute_case: bool,
}

impl ParseSettings {
    pub const HTML_DEFAULT: Self = Self::new(false, false);
    pub const PRESERVE_CASE: Self = Self::new(true, true);

    pub const fn new(preserve_tag_case: bool, preserve_attribute_case: bool) -> Self {
        Self {
            preserve_tag_case,
            preserve_attribute_case,
        }
    }

    pub fn preserves_tag_case(&self) -> bool {
        self.preserve_tag_case
    }

    pub fn preserves_attribute_case(&self) -> bool {
        self.preserve_attribute_case
    }

    pub fn normalize_tag<'a>(&self, name: &'a str) -> Cow<'a, str> {
        fold(name, self.preserve_tag_case)
    }

    pub fn normalize_attribute<'a>(&self, name: &'a str) -> Cow<'a, str> {
        fold(name, self.preserve_attribute_case)
    }
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self::HTML_DEFAULT
    }
}

fn fold(name: &str, preserve: bool) -> Cow<'_, str> {
    if preserve || !name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(name.to_ascii_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Attributes,
        self_closing: bool,
        /// Raw body of a raw-text element (`style`, `script`, `json`).
        data: Option<String>,
    },
    EndTag(String),
    Comment(String),
    Character(String),
    /// Reference to an external stylesheet (`<link rel="stylesheet" href>`).
    Stylesheet(String),
    Eof,
}

impl Token {
    pub fn start_tag(name: impl Into<String>) -> Self {
        Token::StartTag {
            name: name.into(),
            attributes: Attributes::new(),
            self_closing: false,
            data: None,
        }
    }

    /// Value of `key` when this is a start tag carrying that attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            Token::StartTag { attributes, .. } => attributes.get(key),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Ordered attribute mapping with unique keys.
///
/// Setting an existing key replaces its value in place, so insertion order is
/// the order of first appearance.
///
/// Entries live in a plain vector and every lookup is a linear scan. Filling
/// `n` attributes through [`Attributes::set`] costs O(n²) comparisons, which
/// stays cheap for the handful of attributes a tag or style rule carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`. Linear in the number of entries.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_ignore_ascii_case(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (k, v) in iter {
            attributes.set(k, v);
        }
        attributes
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Attributes,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attributes(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            attributes,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.set(key, value);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn append_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    /// Concatenated text of all descendant text nodes, in document order.
    pub fn text(&self) -> String {
        fn walk(node: &Node, out: &mut String) {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => {
                    for child in &element.children {
                        walk(child, out);
                    }
                }
            }
        }
        let mut out = String::new();
        for child in &self.children {
            walk(child, &mut out);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_last_write_wins_in_place() {
        let mut attributes = Attributes::new();
        attributes.set("id", "a");
        attributes.set("color", "red");
        attributes.set("id", "b");
        let entries: Vec<_> = attributes.iter().collect();
        assert_eq!(entries, vec![("id", "b"), ("color", "red")]);
    }

    #[test]
    fn many_attributes_keep_first_appearance_order() {
        let mut attributes: Attributes = (0..300).map(|i| (format!("p{i}"), "x")).collect();
        for i in (0..300).step_by(7) {
            attributes.set(format!("p{i}"), i.to_string());
        }
        assert_eq!(attributes.len(), 300);
        assert_eq!(attributes.iter().nth(7), Some(("p7", "7")));
        assert_eq!(attributes.iter().last(), Some(("p299", "x")));
    }

    #[test]
    fn settings_fold_only_when_not_preserving() {
        assert_eq!(ParseSettings::HTML_DEFAULT.normalize_tag("DiV"), "div");
        assert_eq!(ParseSettings::PRESERVE_CASE.normalize_tag("DiV"), "DiV");
        assert!(matches!(
            ParseSettings::HTML_DEFAULT.normalize_attribute("href"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn element_text_concatenates_descendants() {
        let mut inner = Element::new("b");
        inner.append_child(Node::text("world"));
        let mut outer = Element::new("p");
        outer.append_child(Node::text("hello "));
        outer.append_child(inner);
        assert_eq!(outer.text(), "hello world");
    }
}
