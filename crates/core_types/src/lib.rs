use std::fmt;
use std::path::{Path, PathBuf};

/// One unit of ingestion work, also the key it is aggregated under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Url(String),
    File(PathBuf),
    /// Raw markup parsed in memory.
    Html(String),
}

impl Source {
    pub fn url(url: impl Into<String>) -> Self {
        Source::Url(url.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(path.into())
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Source::Html(markup.into())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "url {url}"),
            Source::File(path) => write!(f, "file {}", path.display()),
            Source::Html(markup) => {
                // raw markup can be arbitrarily long
                let preview: String = markup.chars().take(40).collect();
                if preview.len() < markup.len() {
                    write!(f, "html {preview:?}...")
                } else {
                    write!(f, "html {preview:?}")
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Html,
    Css,
    Json,
}

impl ResourceKind {
    /// Classify a `Content-Type` header value; anything unrecognised is HTML.
    pub fn from_content_type(ct: Option<&str>) -> Self {
        let Some(value) = ct else {
            return ResourceKind::Html;
        };
        let mime = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/css" => ResourceKind::Css,
            "application/json" | "text/json" => ResourceKind::Json,
            m if m.ends_with("+json") => ResourceKind::Json,
            _ => ResourceKind::Html,
        }
    }

    /// Classify by file extension; anything unrecognised is HTML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("css") => ResourceKind::Css,
            Some(ext) if ext.eq_ignore_ascii_case("json") => ResourceKind::Json,
            _ => ResourceKind::Html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_ignores_parameters_and_case() {
        assert_eq!(
            ResourceKind::from_content_type(Some("Text/CSS; charset=utf-8")),
            ResourceKind::Css
        );
        assert_eq!(
            ResourceKind::from_content_type(Some("application/ld+json")),
            ResourceKind::Json
        );
        assert_eq!(
            ResourceKind::from_content_type(Some("text/html")),
            ResourceKind::Html
        );
        assert_eq!(ResourceKind::from_content_type(None), ResourceKind::Html);
    }

    #[test]
    fn path_extension_selects_kind() {
        assert_eq!(ResourceKind::from_path(Path::new("a/site.CSS")), ResourceKind::Css);
        assert_eq!(ResourceKind::from_path(Path::new("data.json")), ResourceKind::Json);
        assert_eq!(ResourceKind::from_path(Path::new("index.html")), ResourceKind::Html);
        assert_eq!(ResourceKind::from_path(Path::new("README")), ResourceKind::Html);
    }

    #[test]
    fn display_truncates_long_markup() {
        let long = Source::html("x".repeat(100));
        let shown = long.to_string();
        assert!(shown.ends_with("..."), "got {shown}");
        assert_eq!(Source::url("https://a.test").to_string(), "url https://a.test");
    }
}
