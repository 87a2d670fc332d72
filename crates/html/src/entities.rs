/// Decode the small set of character references the tokenizer supports.
///
/// Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`. Numeric: `&#215;`
/// and `&#xD7;`, only when semicolon-terminated and a valid scalar value.
/// Everything else passes through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    const NAMED: [(&str, char); 6] = [
        ("amp", '&'),
        ("lt", '<'),
        ("gt", '>'),
        ("quot", '"'),
        ("apos", '\''),
        ("nbsp", '\u{00A0}'),
    ];
    // longest reference body we ever decode: "#x10FFFF"
    const MAX_BODY: usize = 8;

    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let body_end = tail
            .bytes()
            .take(MAX_BODY + 1)
            .position(|b| b == b';');

        let decoded = body_end.and_then(|end| {
            let body = &tail[..end];
            if let Some(num) = body.strip_prefix('#') {
                decode_numeric(num)
            } else {
                NAMED.iter().find(|(n, _)| *n == body).map(|(_, c)| *c)
            }
        });

        match (decoded, body_end) {
            (Some(ch), Some(end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric(num: &str) -> Option<char> {
    let value = match num.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) => num.parse().ok()?,
        None => return None,
    };
    char::from_u32(value)
}
