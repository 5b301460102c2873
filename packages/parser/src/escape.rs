//! XML character escaping shared by the parser, serializer and line index.

use crate::error::{FormatError, FormatResult};
use std::borrow::Cow;

/// Resolve entity and character references in text or attribute content.
///
/// `pos` is the byte offset of `raw` in the document, used for error spans.
pub fn decode_text(raw: &str, pos: usize) -> FormatResult<Cow<'_, str>> {
    if !raw.contains('&') {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut offset = pos;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| FormatError::invalid_syntax(offset + amp, "unterminated entity reference"))?;
        let name = &after[..semi];
        let ch = resolve_entity(name).ok_or_else(|| {
            FormatError::invalid_syntax(offset + amp, format!("unknown entity '&{};'", name))
        })?;
        out.push(ch);

        let consumed = amp + 1 + semi + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }
    out.push_str(rest);

    Ok(Cow::Owned(out))
}

/// Like [`decode_text`], but leaves malformed references as written
pub fn decode_lossy(raw: &str) -> Cow<'_, str> {
    decode_text(raw, 0).unwrap_or(Cow::Borrowed(raw))
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

/// Escape element text content
pub fn escape_text(value: &str) -> Cow<'_, str> {
    escape(value, false)
}

/// Escape a double-quoted attribute value
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value, true)
}

fn escape(value: &str, quotes: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| matches!(c, '&' | '<' | '>') || (quotes && c == '"');
    if !value.contains(needs_escape) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
