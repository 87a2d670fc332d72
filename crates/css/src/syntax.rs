use url::Url;

/// A single CSS property: `color: red`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// `selector { declarations }`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Selector list as written, with whitespace runs collapsed.
    pub selector_text: String,
    pub declarations: Vec<Declaration>,
}

/// `@name prelude;` or `@name prelude { block }`. Blocks are kept raw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtRule {
    pub name: String,
    pub prelude: String,
    pub block: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Style(StyleRule),
    At(AtRule),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn style_rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::Style(style) => Some(style),
            Rule::At(_) => None,
        })
    }
}

/// Grammar errors. Offsets are byte offsets into the input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CssError {
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error("unterminated string starting at byte {offset}")]
    UnterminatedString { offset: usize },
    #[error("unbalanced block at byte {offset}")]
    UnbalancedBlock { offset: usize },
    #[error("rule at byte {offset} has no declaration block")]
    MissingBlock { offset: usize },
    #[error("empty selector at byte {offset}")]
    EmptySelector { offset: usize },
}

pub type CssResult<T> = Result<T, CssError>;

// input: "h1, h2 { color: red; } @media print { p { margin: 0 } }"
// output: [Rule::Style { "h1, h2", [color: red] }, Rule::At { "media", "print", .. }]
pub fn parse_stylesheet(input: &str, base_uri: Option<&str>) -> CssResult<Stylesheet> {
    let text = blank_comments(input)?;
    let base = base_uri.and_then(|b| Url::parse(b).ok());
    let bytes = text.as_bytes();
    let mut rules = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        // HTML comment delimiters are allowed at the top level of a sheet
        if text[i..].starts_with("<!--") {
            i += 4;
            continue;
        }
        if text[i..].starts_with("-->") {
            i += 3;
            continue;
        }
        if b == b'}' {
            return Err(CssError::UnbalancedBlock { offset: i });
        }

        let start = i;
        let (end, terminator) = scan_prelude(bytes, i)?;
        let prelude = text[start..end].trim();

        if let Some(at) = prelude.strip_prefix('@') {
            let name_len = at
                .find(|c: char| c.is_whitespace() || c == '(' || c == '"' || c == '\'')
                .unwrap_or(at.len());
            let (name, rest) = at.split_at(name_len);
            let block = match terminator {
                Some(b'{') => {
                    let close = find_block_end(bytes, end)?;
                    let block = text[end + 1..close].to_string();
                    i = close + 1;
                    Some(block)
                }
                _ => {
                    i = (end + 1).min(bytes.len());
                    None
                }
            };
            rules.push(Rule::At(AtRule {
                name: name.to_ascii_lowercase(),
                prelude: rest.trim().to_string(),
                block,
            }));
            continue;
        }

        if terminator != Some(b'{') {
            return Err(CssError::MissingBlock { offset: start });
        }
        let selector_text = collapse_whitespace(prelude);
        if selector_text.is_empty() {
            return Err(CssError::EmptySelector { offset: start });
        }
        let close = find_block_end(bytes, end)?;
        let mut declarations = parse_declarations(&text[end + 1..close]);
        if let Some(base) = &base {
            for declaration in &mut declarations {
                declaration.value = resolve_urls(&declaration.value, base);
            }
        }
        rules.push(Rule::Style(StyleRule {
            selector_text,
            declarations,
        }));
        i = close + 1;
    }

    log::trace!(
        target: "css.syntax",
        "parsed {} rules from {} bytes",
        rules.len(),
        input.len()
    );
    Ok(Stylesheet { rules })
}

// input: "h1,  h2 >  p, .a"
// output: ["h1", "h2 > p", ".a"]
pub fn parse_selectors(input: &str) -> CssResult<Vec<String>> {
    let text = blank_comments(input)?;
    let mut selectors = Vec::new();
    for (offset, piece) in split_top_level(&text, b',')? {
        let selector = collapse_whitespace(piece);
        if selector.is_empty() {
            return Err(CssError::EmptySelector { offset });
        }
        selectors.push(selector);
    }
    Ok(selectors)
}

// input: "color: red; font-size: 12px !important"
// output: [Declaration { "color", "red" }, Declaration { "font-size", "12px", important }]
//
// Declarations without a name or value are dropped. Property names are folded
// to lowercase except custom properties (`--name`).
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    let Ok(pieces) = split_top_level(input, b';') else {
        return Vec::new();
    };
    pieces
        .into_iter()
        .filter_map(|(_, piece)| {
            let (n, v) = piece.split_once(':')?;
            let n = n.trim();
            if n.is_empty() {
                return None;
            }
            let name = if n.starts_with("--") {
                n.to_string()
            } else {
                n.to_ascii_lowercase()
            };
            let (value, important) = strip_important(v.trim());
            if value.is_empty() {
                return None;
            }
            Some(Declaration {
                name,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

fn strip_important(value: &str) -> (&str, bool) {
    if let Some(bang) = value.rfind('!') {
        let flag = value[bang + 1..].trim();
        if flag.eq_ignore_ascii_case("important") {
            return (value[..bang].trim_end(), true);
        }
    }
    (value, false)
}

/// Replaces every comment with spaces of the same byte length so offsets into
/// the result are offsets into the input.
fn blank_comments(input: &str) -> CssResult<String> {
    if !input.contains("/*") {
        return Ok(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut copy_start = 0;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'"' | b'\'') => i = skip_string(bytes, i, q)?,
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let body = i + 2;
                let Some(rel) = input[body..].find("*/") else {
                    return Err(CssError::UnterminatedComment { offset: i });
                };
                let end = body + rel + 2;
                out.push_str(&input[copy_start..i]);
                out.extend(std::iter::repeat_n(' ', end - i));
                i = end;
                copy_start = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&input[copy_start..]);
    Ok(out)
}

/// Returns the index after the closing quote of the string opened at `start`.
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> CssResult<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => break,
            b if b == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(CssError::UnterminatedString { offset: start })
}

/// Scans a rule prelude from `i` to the first top-level `{` or `;`.
/// Returns that index (or the input length) and the terminator byte.
fn scan_prelude(bytes: &[u8], mut i: usize) -> CssResult<(usize, Option<u8>)> {
    let mut parens = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'"' | b'\'') => {
                i = skip_string(bytes, i, q)?;
                continue;
            }
            b'(' | b'[' => parens += 1,
            b')' | b']' => parens = parens.saturating_sub(1),
            b'{' | b';' if parens == 0 => return Ok((i, Some(bytes[i]))),
            b'}' if parens == 0 => return Err(CssError::UnbalancedBlock { offset: i }),
            _ => {}
        }
        i += 1;
    }
    Ok((bytes.len(), None))
}

/// Given the index of an opening `{`, returns the index of its matching `}`.
fn find_block_end(bytes: &[u8], open: usize) -> CssResult<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'"' | b'\'') => {
                i = skip_string(bytes, i, q)?;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(CssError::UnbalancedBlock { offset: open })
}

/// Splits on `sep` outside strings, parentheses and brackets.
/// Yields (byte offset, piece) pairs; a trailing empty piece is dropped.
fn split_top_level(input: &str, sep: u8) -> CssResult<Vec<(usize, &str)>> {
    let bytes = input.as_bytes();
    let mut pieces = Vec::new();
    let mut nesting = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            q @ (b'"' | b'\'') => {
                i = skip_string(bytes, i, q)?;
                continue;
            }
            b'(' | b'[' => nesting += 1,
            b')' | b']' => nesting = nesting.saturating_sub(1),
            b if b == sep && nesting == 0 => {
                pieces.push((start, &input[start..i]));
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if !input[start..].trim().is_empty() || pieces.is_empty() {
        pieces.push((start, &input[start..]));
    }
    Ok(pieces)
}

/// Trims and collapses whitespace runs outside quoted strings to one space.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    for c in s.trim().chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Rewrites relative `url(...)` references in `value` against `base`.
fn resolve_urls(value: &str, base: &Url) -> String {
    const OPEN: &str = "url(";
    let lower = value.to_ascii_lowercase();
    if !lower.contains(OPEN) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut cursor = 0;
    while let Some(rel) = lower[cursor..].find(OPEN) {
        let arg_start = cursor + rel + OPEN.len();
        let Some(close_rel) = value[arg_start..].find(')') else {
            break;
        };
        let arg_end = arg_start + close_rel;
        out.push_str(&value[cursor..arg_start]);

        let raw = value[arg_start..arg_end].trim();
        let (quote, target) = match raw.chars().next() {
            Some(q @ ('"' | '\'')) if raw.len() >= 2 && raw.ends_with(q) => {
                (Some(q), &raw[1..raw.len() - 1])
            }
            _ => (None, raw),
        };
        let resolved = match Url::parse(target) {
            Err(url::ParseError::RelativeUrlWithoutBase) if !target.starts_with('#') => {
                base.join(target).map(String::from).ok()
            }
            _ => None,
        };
        match (resolved, quote) {
            (Some(abs), Some(q)) => {
                out.push(q);
                out.push_str(&abs);
                out.push(q);
            }
            (Some(abs), None) => out.push_str(&abs),
            (None, _) => out.push_str(&value[arg_start..arg_end]),
        }
        cursor = arg_end;
    }
    out.push_str(&value[cursor..]);
    out
}
