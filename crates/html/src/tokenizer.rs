//! Simplified HTML tokenizer with a constrained, practical tag-name character set.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`; attribute names
//! use the same class. Name case follows the [`ParseSettings`] passed in.
//!
//! Beyond plain markup tokens the stream carries two things the format adapters
//! rely on:
//! - raw-text elements (`script`, `style`, `json`) carry their body verbatim in
//!   the start tag's `data` payload, followed by the usual character token;
//! - `<link rel="stylesheet" href=...>` is followed by a
//!   [`Token::Stylesheet`] passthrough holding the `href`.
//!
//! Known limitations (intentional): no HTML5 parse-error recovery, and raw-text
//! close tags only accept ASCII whitespace before `>`.
use crate::entities::decode_entities;
use crate::types::{Attributes, ParseSettings, Token, TokenStream};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

const RAW_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "json"];

pub(crate) fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS
        .iter()
        .any(|raw| name.eq_ignore_ascii_case(raw))
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Finds `</name` followed by optional ASCII whitespace and `>`.
/// Returns (start of close tag, index after `>`).
fn find_raw_text_close(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let name = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        let name_at = i + 2;
        if bytes.get(i + 1) == Some(&b'/') && starts_with_ignore_ascii_case_at(bytes, name_at, name)
        {
            let mut k = name_at + name.len();
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

fn is_stylesheet_link(name: &str, attributes: &Attributes) -> bool {
    name.eq_ignore_ascii_case("link")
        && attributes
            .get_ignore_ascii_case("rel")
            .is_some_and(|rel| {
                rel.split_ascii_whitespace()
                    .any(|t| t.eq_ignore_ascii_case("stylesheet"))
            })
}

/// Character data joins the preceding character token, so a text run is
/// always one token.
fn push_text(out: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(Token::Character(run)) => run.push_str(text),
        _ => out.push(Token::Character(text.to_string())),
    }
}

/// Tokenizes `input`, folding or preserving name case according to `settings`.
///
/// The stream always ends with [`Token::Eof`].
pub fn tokenize(input: &str, settings: ParseSettings) -> TokenStream {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    // Slices are only cut at ASCII structural bytes, so every endpoint is a
    // UTF-8 char boundary.
    while i < len {
        if bytes[i] != b'<' {
            let start = i;
            i = memchr(b'<', &bytes[i..]).map_or(len, |rel| i + rel);
            push_text(&mut out, &decode_entities(&input[start..i]));
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            let Some(end) = rest.find('>') else {
                break;
            };
            out.push(Token::Doctype(rest[..end].trim().to_string()));
            i += 2 + end + 1;
            continue;
        }

        if bytes.get(i + 1) == Some(&b'/') {
            let start = i + 2;
            let mut j = start;
            while j < len && is_name_char(bytes[j]) {
                j += 1;
            }
            let name = settings.normalize_tag(&input[start..j]).into_owned();
            j = memchr(b'>', &bytes[j..]).map_or(len, |rel| j + rel + 1);
            out.push(Token::EndTag(name));
            i = j;
            continue;
        }

        let start = i + 1;
        let mut j = start;
        while j < len && is_name_char(bytes[j]) {
            j += 1;
        }
        if j == start {
            // a lone '<' is text
            push_text(&mut out, "<");
            i += 1;
            continue;
        }
        let name = settings.normalize_tag(&input[start..j]).into_owned();
        let (attributes, self_closing_syntax, k) = scan_attributes(input, j, settings);
        let self_closing = self_closing_syntax || is_void_element(&name);

        let raw_text = !self_closing && is_raw_text_element(&name);
        if !raw_text {
            let stylesheet_href = is_stylesheet_link(&name, &attributes)
                .then(|| attributes.get_ignore_ascii_case("href").map(str::to_string))
                .flatten();
            out.push(Token::StartTag {
                name,
                attributes,
                self_closing,
                data: None,
            });
            if let Some(href) = stylesheet_href {
                out.push(Token::Stylesheet(href));
            }
            i = k;
            continue;
        }

        // Raw-text body runs to the matching close tag, or to end of input when
        // the close tag is missing (an implicit end tag is emitted).
        let (body_end, resume) = match find_raw_text_close(&input[k..], &name) {
            Some((rel_start, rel_end)) => (k + rel_start, k + rel_end),
            None => (len, len),
        };
        let body = &input[k..body_end];
        out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing: false,
            data: Some(body.to_string()),
        });
        if !body.is_empty() {
            out.push(Token::Character(body.to_string()));
        }
        out.push(Token::EndTag(name));
        i = resume;
    }
    out.push(Token::Eof);
    log::trace!(target: "html.tokenizer", "tokenized {} bytes into {} tokens", len, out.len());
    TokenStream::new(out)
}

/// Scans attributes from `k` (just after the tag name) through the closing `>`.
/// Returns the attributes, whether `/>` closed the tag, and the resume index.
fn scan_attributes(input: &str, mut k: usize, settings: ParseSettings) -> (Attributes, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes = Attributes::new();

    loop {
        while k < len && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        if k >= len {
            return (attributes, false, k);
        }
        match bytes[k] {
            b'>' => return (attributes, false, k + 1),
            b'/' if bytes.get(k + 1) == Some(&b'>') => return (attributes, true, k + 2),
            b'/' => {
                k += 1;
                continue;
            }
            _ => {}
        }

        let name_start = k;
        while k < len && is_name_char(bytes[k]) {
            k += 1;
        }
        if name_start == k {
            k += 1;
            continue;
        }
        let attribute_name = settings.normalize_attribute(&input[name_start..k]).into_owned();

        while k < len && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        if bytes.get(k) != Some(&b'=') {
            attributes.set(attribute_name, "");
            continue;
        }
        k += 1;
        while k < len && bytes[k].is_ascii_whitespace() {
            k += 1;
        }

        let value = match bytes.get(k).copied() {
            Some(quote) if quote == b'"' || quote == b'\'' => {
                let value_start = k + 1;
                let value_end = memchr(quote, &bytes[value_start..]).map_or(len, |rel| value_start + rel);
                k = (value_end + 1).min(len);
                decode_entities(&input[value_start..value_end])
            }
            _ => {
                let value_start = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                        break;
                    }
                    k += 1;
                }
                decode_entities(&input[value_start..k])
            }
        };
        attributes.set(attribute_name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(input: &str) -> TokenStream {
        tokenize(input, ParseSettings::HTML_DEFAULT)
    }

    #[test]
    fn stream_always_ends_with_eof() {
        assert_eq!(html("").tokens(), &[Token::Eof]);
        assert!(matches!(html("<p>x</p>").tokens().last(), Some(Token::Eof)));
    }

    #[test]
    fn preserves_utf8_text() {
        let stream = html("<p>caf\u{e9} \u{1F60A}</p>");
        assert!(
            stream
                .iter()
                .any(|t| matches!(t, Token::Character(s) if s == "caf\u{e9} \u{1F60A}")),
            "expected UTF-8 text token, got: {stream:?}"
        );
    }

    #[test]
    fn html_settings_fold_names_and_preserve_case_keeps_them() {
        let folded = html("<DiV ClassName=x></DIV>");
        assert!(matches!(
            &folded.tokens()[0],
            Token::StartTag { name, attributes, .. }
                if name == "div" && attributes.get("classname") == Some("x")
        ));
        assert_eq!(folded.tokens()[1], Token::EndTag("div".to_string()));

        let kept = tokenize("<DiV ClassName=x></DIV>", ParseSettings::PRESERVE_CASE);
        assert!(matches!(
            &kept.tokens()[0],
            Token::StartTag { name, attributes, .. }
                if name == "DiV" && attributes.get("ClassName") == Some("x")
        ));
    }

    #[test]
    fn style_body_is_carried_as_start_tag_data() {
        let stream = html("<style type=\"text/css\">h1 { color: red }</StYle >");
        match stream.tokens() {
            [
                Token::StartTag { name, data, attributes, .. },
                Token::Character(body),
                Token::EndTag(end),
                Token::Eof,
            ] => {
                assert_eq!(name, "style");
                assert_eq!(data.as_deref(), Some("h1 { color: red }"));
                assert_eq!(attributes.get("type"), Some("text/css"));
                assert_eq!(body, "h1 { color: red }");
                assert_eq!(end, "style");
            }
            other => panic!("unexpected tokens: {other:?}"),
        }
    }

    #[test]
    fn json_element_is_raw_text() {
        let stream = html("<json>{\"a\": \"<b>\"}</json>");
        assert!(matches!(
            &stream.tokens()[0],
            Token::StartTag { name, data: Some(d), .. } if name == "json" && d == "{\"a\": \"<b>\"}"
        ));
    }

    #[test]
    fn raw_text_without_close_tag_runs_to_end() {
        let stream = html("<script>x<y>");
        assert!(matches!(
            stream.tokens(),
            [Token::StartTag { data: Some(d), .. }, Token::Character(_), Token::EndTag(_), Token::Eof]
                if d == "x<y>"
        ));
    }

    #[test]
    fn raw_text_close_tag_rejects_near_matches() {
        let stream = html("<script>ok</scriptx >no</script >");
        assert!(matches!(
            &stream.tokens()[0],
            Token::StartTag { data: Some(d), .. } if d == "ok</scriptx >no"
        ));
    }

    #[test]
    fn stylesheet_link_emits_passthrough() {
        let stream = html("<link rel=\"alternate STYLESHEET\" href=\"/site.css\">");
        assert!(matches!(
            stream.tokens(),
            [Token::StartTag { self_closing: true, .. }, Token::Stylesheet(href), Token::Eof]
                if href == "/site.css"
        ));

        let icon = html("<link rel=icon href=/favicon.ico>");
        assert!(!icon.iter().any(|t| matches!(t, Token::Stylesheet(_))));
    }

    #[test]
    fn duplicate_attribute_keeps_last_value() {
        let stream = html("<a href=one href='two'>");
        assert_eq!(stream.tokens()[0].attribute("href"), Some("two"));
    }

    #[test]
    fn decodes_entities_in_text_and_attribute_values() {
        let stream = html("<a title=\"a &amp; b\">x &lt; y</a>");
        assert_eq!(stream.tokens()[0].attribute("title"), Some("a & b"));
        assert_eq!(stream.tokens()[1], Token::Character("x < y".to_string()));
    }

    #[test]
    fn comments_and_doctype() {
        let stream = html("<!DOCTYPE html><!--note--><!--open");
        assert_eq!(
            stream.tokens(),
            &[
                Token::Doctype("DOCTYPE html".to_string()),
                Token::Comment("note".to_string()),
                Token::Comment("open".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn handles_tons_of_angle_brackets() {
        let input = "<".repeat(200_000);
        let stream = html(&input);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.tokens()[0], Token::Character(input));
    }

    #[test]
    fn stray_angle_bracket_stays_in_text_run() {
        let stream = html("a < b &amp; c");
        assert_eq!(
            stream.tokens(),
            &[Token::Character("a < b & c".to_string()), Token::Eof]
        );

        let stream = html("<p>1 < 2</p>");
        assert_eq!(stream.tokens()[1], Token::Character("1 < 2".to_string()));
    }
}
