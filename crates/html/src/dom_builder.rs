use crate::tokenizer::{is_raw_text_element, tokenize};
use crate::types::{Element, Node, ParseSettings, Token, TokenStream};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeBuilderError {
    /// Text content that has no element to live under.
    #[error("text {text:?} has no enclosing element")]
    OrphanText { text: String },
}

pub type TreeBuilderResult<T> = Result<T, TreeBuilderError>;

/// Turns a token stream of one format into tree nodes.
///
/// One instance handles one parse session; `new_instance` hands out a fresh
/// builder with the same configuration.
pub trait TreeBuilder {
    /// Settings the token source should use when feeding this builder.
    fn default_settings(&self) -> ParseSettings;

    fn new_instance(&self) -> Box<dyn TreeBuilder + Send>;

    /// Consumes one token. `Ok(false)` asks the driver to stop feeding tokens.
    fn process(&mut self, token: &Token) -> TreeBuilderResult<bool>;

    /// Parses a standalone chunk of input, independent of the token session.
    fn parse_fragment(
        &mut self,
        input: &str,
        context: Option<&Element>,
        base_uri: &str,
    ) -> TreeBuilderResult<Vec<Node>>;

    /// Drains the nodes produced by `process` so far.
    fn finish(&mut self) -> Vec<Node>;
}

/// Feeds `stream` into `builder` until it is exhausted or the builder asks to stop.
pub fn run_tree_builder(
    builder: &mut dyn TreeBuilder,
    stream: &TokenStream,
) -> TreeBuilderResult<Vec<Node>> {
    for token in stream {
        if !builder.process(token)? {
            break;
        }
    }
    Ok(builder.finish())
}

pub const DOCUMENT_NODE_NAME: &str = "#document";

/// Builds an HTML tree with a stack of open elements.
///
/// End tags close the nearest open element with a matching name (ASCII
/// case-insensitive) together with everything opened after it; stray end tags
/// are ignored. Comments, doctypes and stylesheet passthroughs carry no tree
/// content.
#[derive(Debug)]
pub struct HtmlTreeBuilder {
    settings: ParseSettings,
    root: Element,
    open_elements: Vec<Element>,
}

impl HtmlTreeBuilder {
    pub fn new() -> Self {
        Self::with_settings(ParseSettings::HTML_DEFAULT)
    }

    pub fn with_settings(settings: ParseSettings) -> Self {
        Self {
            settings,
            root: Element::new(DOCUMENT_NODE_NAME),
            open_elements: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Element {
        self.open_elements.last_mut().unwrap_or(&mut self.root)
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open_elements.pop() {
            self.current().append_child(element);
        }
    }

    fn close_all(&mut self) {
        while !self.open_elements.is_empty() {
            self.close_top();
        }
    }
}

impl Default for HtmlTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder for HtmlTreeBuilder {
    fn default_settings(&self) -> ParseSettings {
        self.settings
    }

    fn new_instance(&self) -> Box<dyn TreeBuilder + Send> {
        Box::new(HtmlTreeBuilder::with_settings(self.settings))
    }

    fn process(&mut self, token: &Token) -> TreeBuilderResult<bool> {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
                ..
            } => {
                let element = Element::with_attributes(name.clone(), attributes.clone());
                if *self_closing {
                    self.current().append_child(element);
                } else {
                    self.open_elements.push(element);
                }
            }
            Token::Character(text) => {
                if !text.is_empty() {
                    self.current().append_child(Node::text(text.clone()));
                }
            }
            Token::EndTag(name) => {
                if let Some(depth) = self
                    .open_elements
                    .iter()
                    .rposition(|e| e.name().eq_ignore_ascii_case(name))
                {
                    while self.open_elements.len() > depth {
                        self.close_top();
                    }
                }
            }
            Token::Eof => {
                self.close_all();
                return Ok(false);
            }
            Token::Doctype(_) | Token::Comment(_) | Token::Stylesheet(_) => {}
        }
        Ok(true)
    }

    fn parse_fragment(
        &mut self,
        input: &str,
        context: Option<&Element>,
        _base_uri: &str,
    ) -> TreeBuilderResult<Vec<Node>> {
        // raw-text contexts take their input verbatim
        if let Some(ctx) = context
            && is_raw_text_element(ctx.name())
        {
            return Ok(vec![Node::text(input)]);
        }
        let mut fragment = HtmlTreeBuilder::with_settings(self.settings);
        run_tree_builder(&mut fragment, &tokenize(input, self.settings))
    }

    fn finish(&mut self) -> Vec<Node> {
        self.close_all();
        std::mem::take(self.root.children_mut())
    }
}
