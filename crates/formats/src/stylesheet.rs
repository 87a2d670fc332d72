use std::path::PathBuf;
use std::sync::Arc;

use css::{Stylesheet, parse_selectors, parse_stylesheet};
use html::{Element, Node, ParseSettings, Token, TreeBuilder, TreeBuilderResult};
use net::{FetchError, FetchResult};
use url::Url;

use crate::observe::{LogObserver, RuleObserver};

/// Turns CSS found in a token stream into one element per style rule.
///
/// The element is named by the rule's selector text and carries an `id`
/// attribute equal to the selector followed by the rule's declarations as
/// attributes. Inline `<style type="text/css">` blocks and external
/// `<link rel="stylesheet">` references are both picked up; failures are
/// logged and skipped.
pub struct CssTreeBuilder {
    base_uri: String,
    observer: Arc<dyn RuleObserver>,
    nodes: Vec<Node>,
}

impl CssTreeBuilder {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self::with_observer(base_uri, Arc::new(LogObserver))
    }

    pub fn with_observer(base_uri: impl Into<String>, observer: Arc<dyn RuleObserver>) -> Self {
        Self {
            base_uri: base_uri.into(),
            observer,
            nodes: Vec::new(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Parses a complete stylesheet. Malformed input yields no nodes.
    pub fn parse_standalone(&self, text: &str) -> Vec<Node> {
        match parse_stylesheet(text, None) {
            Ok(sheet) => self.rules_to_nodes(&sheet),
            Err(err) => {
                log::warn!(target: "formats.css", "skipping malformed stylesheet: {err}");
                Vec::new()
            }
        }
    }

    fn rules_to_nodes(&self, sheet: &Stylesheet) -> Vec<Node> {
        sheet
            .style_rules()
            .map(|rule| {
                self.observer
                    .on_rule(&rule.selector_text, &rule.declarations);
                let mut element = Element::new(rule.selector_text.clone());
                element.set_attr("id", rule.selector_text.clone());
                for declaration in &rule.declarations {
                    element.set_attr(declaration.name.clone(), declaration.value.clone());
                }
                Node::from(element)
            })
            .collect()
    }

    fn load_external(&mut self, reference: &str) {
        let text = match self.read_reference(reference) {
            Ok(text) => text,
            Err(err) => {
                log::warn!(target: "formats.css", "skipping stylesheet {reference:?}: {err}");
                return;
            }
        };
        let nodes = self.parse_standalone(&text);
        for node in &nodes {
            let Some(element) = node.as_element() else {
                continue;
            };
            match parse_selectors(element.name()) {
                Ok(selectors) => {
                    log::debug!(target: "formats.css", "{reference}: selectors {selectors:?}")
                }
                Err(err) => log::debug!(target: "formats.css", "{reference}: {err}"),
            }
        }
        self.nodes.extend(nodes);
    }

    fn read_reference(&self, reference: &str) -> FetchResult<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(FetchError::InvalidTarget(reference.to_string()));
        }
        match resolve_reference(&self.base_uri, reference) {
            Target::Remote(url) => net::fetch_text(url.as_str()).map(|fetched| fetched.body),
            Target::Local(path) => net::read_text(&path),
            Target::Unsupported(target) => Err(FetchError::InvalidTarget(target)),
        }
    }
}

impl std::fmt::Debug for CssTreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CssTreeBuilder")
            .field("base_uri", &self.base_uri)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

enum Target {
    Remote(Url),
    Local(PathBuf),
    Unsupported(String),
}

/// Absolute references stand alone; relative ones join the base URI when it
/// is a URL and are filesystem paths otherwise.
fn resolve_reference(base_uri: &str, reference: &str) -> Target {
    let resolved = match Url::parse(reference) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(base_uri).ok().and_then(|base| base.join(reference).ok())
        }
        Err(_) => None,
    };
    let Some(url) = resolved else {
        return Target::Local(PathBuf::from(reference));
    };
    match url.scheme() {
        "http" | "https" => Target::Remote(url),
        "file" => match url.to_file_path() {
            Ok(path) => Target::Local(path),
            Err(()) => Target::Unsupported(url.into()),
        },
        // a single letter is a Windows drive, not a scheme
        scheme if scheme.len() == 1 => Target::Local(PathBuf::from(reference)),
        _ => Target::Unsupported(url.into()),
    }
}

fn is_inline_css(name: &str, token: &Token) -> bool {
    name.eq_ignore_ascii_case("style")
        && matches!(
            token,
            Token::StartTag { attributes, .. }
                if attributes
                    .get_ignore_ascii_case("type")
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case("text/css"))
        )
}

impl TreeBuilder for CssTreeBuilder {
    fn default_settings(&self) -> ParseSettings {
        ParseSettings::PRESERVE_CASE
    }

    fn new_instance(&self) -> Box<dyn TreeBuilder + Send> {
        Box::new(CssTreeBuilder::with_observer(
            self.base_uri.clone(),
            Arc::clone(&self.observer),
        ))
    }

    fn process(&mut self, token: &Token) -> TreeBuilderResult<bool> {
        match token {
            Token::StartTag { name, data, .. } if is_inline_css(name, token) => {
                let base_uri = self.base_uri.clone();
                let nodes =
                    self.parse_fragment(data.as_deref().unwrap_or_default(), None, &base_uri)?;
                self.nodes.extend(nodes);
            }
            Token::Stylesheet(reference) => self.load_external(reference),
            _ => {}
        }
        Ok(true)
    }

    fn parse_fragment(
        &mut self,
        input: &str,
        _context: Option<&Element>,
        base_uri: &str,
    ) -> TreeBuilderResult<Vec<Node>> {
        let base = (!base_uri.is_empty()).then_some(base_uri);
        match parse_stylesheet(input, base) {
            Ok(sheet) => Ok(self.rules_to_nodes(&sheet)),
            Err(err) => {
                log::warn!(target: "formats.css", "skipping malformed inline style: {err}");
                Ok(Vec::new())
            }
        }
    }

    fn finish(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::RecordingObserver;

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes
            .iter()
            .filter_map(Node::as_element)
            .map(Element::name)
            .collect()
    }

    #[test]
    fn one_element_per_style_rule() {
        let builder = CssTreeBuilder::new("");
        let nodes = builder.parse_standalone(
            "h1 { color: red; font-size: 20px; }\n.some-class { display: none; height: 100vh; }",
        );
        assert_eq!(names(&nodes), ["h1", ".some-class"]);

        let h1 = nodes[0].as_element().unwrap();
        let attrs: Vec<_> = h1.attributes().iter().collect();
        assert_eq!(
            attrs,
            [("id", "h1"), ("color", "red"), ("font-size", "20px")]
        );
    }

    #[test]
    fn repeated_property_keeps_last_value_in_place() {
        let builder = CssTreeBuilder::new("");
        let nodes = builder.parse_standalone("p { color: red; margin: 0; color: blue }");
        let p = nodes[0].as_element().unwrap();
        let attrs: Vec<_> = p.attributes().iter().collect();
        assert_eq!(attrs, [("id", "p"), ("color", "blue"), ("margin", "0")]);
    }

    #[test]
    fn at_rules_and_comments_produce_nothing() {
        let builder = CssTreeBuilder::new("");
        let nodes = builder
            .parse_standalone("/* c */ @charset \"utf-8\"; @media print { a { b: c } } a { b: c }");
        assert_eq!(names(&nodes), ["a"]);
    }

    #[test]
    fn malformed_css_yields_empty() {
        let builder = CssTreeBuilder::new("");
        assert!(builder.parse_standalone("h1 { color: red").is_empty());
        assert!(builder.parse_standalone("/* open").is_empty());
        assert!(builder.parse_standalone("").is_empty());
    }

    #[test]
    fn observer_sees_rules_in_order() {
        let observer = Arc::new(RecordingObserver::new());
        let builder = CssTreeBuilder::with_observer("", observer.clone());
        builder.parse_standalone("a { x: 1 } b { y: 2; z: 3 }");
        let seen = observer.rules();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].selector, "a");
        assert_eq!(
            seen[1].properties,
            [("y".to_string(), "2".to_string()), ("z".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn inline_style_needs_text_css_type() {
        let mut builder = CssTreeBuilder::new("");
        let mut style = Token::start_tag("STYLE");
        if let Token::StartTag {
            attributes, data, ..
        } = &mut style
        {
            attributes.set("Type", "Text/CSS");
            *data = Some("h2 { margin: 0 }".to_string());
        }
        assert!(builder.process(&style).unwrap());

        let mut untyped = Token::start_tag("style");
        if let Token::StartTag { data, .. } = &mut untyped {
            *data = Some("h3 { margin: 0 }".to_string());
        }
        assert!(builder.process(&untyped).unwrap());

        assert_eq!(names(&builder.finish()), ["h2"]);
    }

    #[test]
    fn fragment_resolves_urls_against_base() {
        let mut builder = CssTreeBuilder::new("");
        let nodes = builder
            .parse_fragment(
                "div { background: url(img/a.png) }",
                None,
                "https://site.test/css/",
            )
            .unwrap();
        let div = nodes[0].as_element().unwrap();
        assert_eq!(
            div.attr("background"),
            Some("url(https://site.test/css/img/a.png)")
        );
    }

    #[test]
    fn missing_external_stylesheet_is_skipped() {
        let mut builder = CssTreeBuilder::new("");
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.css");
        let token = Token::Stylesheet(missing.display().to_string());
        assert!(builder.process(&token).unwrap());
        assert!(builder.finish().is_empty());
    }

    #[test]
    fn reference_resolution() {
        assert!(matches!(
            resolve_reference("https://site.test/a/page.html", "main.css"),
            Target::Remote(url) if url.as_str() == "https://site.test/a/main.css"
        ));
        assert!(matches!(
            resolve_reference("", "styles/main.css"),
            Target::Local(path) if path == PathBuf::from("styles/main.css")
        ));
        assert!(matches!(
            resolve_reference("https://site.test/", "ftp://files.test/a.css"),
            Target::Unsupported(_)
        ));
    }
}
