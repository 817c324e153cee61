//! Minimal HTML scanning used to read artifacts back.
//!
//! This is not a general HTML parser. It understands the subset the folio
//! renderer writes: start tags with quoted attributes, balanced end tags,
//! comments and text. Hand edits that stay within that subset survive.

use std::collections::BTreeMap;

pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn html_unescape(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let Some(end) = rest.find(';').filter(|end| *end <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric(entity),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_numeric(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

/// A start tag found in a document, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
    pub start: usize,
    pub end: usize,
    pub self_closing: bool,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Parse the start tag beginning at `at` (which must point at `<`).
pub fn parse_start_tag(doc: &str, at: usize) -> Option<StartTag> {
    let bytes = doc.as_bytes();
    if bytes.get(at) != Some(&b'<') {
        return None;
    }
    let mut i = at + 1;
    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = doc[name_start..i].to_ascii_lowercase();
    let mut attrs = BTreeMap::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                return Some(StartTag {
                    name,
                    attrs,
                    start: at,
                    end: i + 1,
                    self_closing: false,
                });
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some(StartTag {
                    name,
                    attrs,
                    start: at,
                    end: i + 2,
                    self_closing: true,
                });
            }
            _ => {}
        }

        let key_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        if i == key_start {
            // stray `/` inside the tag
            i += 1;
            continue;
        }
        let key = doc[key_start..i].to_ascii_lowercase();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            attrs.insert(key, String::new());
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let close = doc[i + 1..].find(*quote as char)? + i + 1;
                let raw = &doc[i + 1..close];
                i = close + 1;
                raw
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &doc[value_start..i]
            }
        };
        attrs.insert(key, html_unescape(value));
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Byte offset just past the element that opens with `tag`.
///
/// Nested elements with the same name are balanced; void and self-closing
/// elements end at their start tag.
pub fn element_end(doc: &str, tag: &StartTag) -> Option<usize> {
    if tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str()) {
        return Some(tag.end);
    }
    let open = format!("<{}", tag.name);
    let close = format!("</{}", tag.name);
    let mut depth = 1usize;
    let mut i = tag.end;
    while i < doc.len() {
        let next = doc[i..].find('<')? + i;
        let rest = &doc[next..];
        if rest.starts_with("<!--") {
            i = next + rest.find("-->")? + 3;
            continue;
        }
        if starts_with_ignore_case(rest, &close) && tag_boundary(rest, close.len()) {
            depth -= 1;
            let gt = rest.find('>')?;
            if depth == 0 {
                return Some(next + gt + 1);
            }
            i = next + gt + 1;
            continue;
        }
        if starts_with_ignore_case(rest, &open) && tag_boundary(rest, open.len()) {
            let inner = parse_start_tag(doc, next)?;
            if !inner.self_closing {
                depth += 1;
            }
            i = inner.end;
            continue;
        }
        i = next + 1;
    }
    None
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

fn tag_boundary(rest: &str, len: usize) -> bool {
    matches!(
        rest.as_bytes().get(len),
        Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r')
    )
}

/// Every start tag in `doc`, in document order. Comments are skipped.
pub fn start_tags(doc: &str) -> Vec<StartTag> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while let Some(found) = doc[i..].find('<') {
        let at = i + found;
        let rest = &doc[at..];
        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => {
                    i = at + end + 3;
                    continue;
                }
                None => break,
            }
        }
        match parse_start_tag(doc, at) {
            Some(tag) => {
                i = tag.end;
                out.push(tag);
            }
            None => i = at + 1,
        }
    }
    out
}

/// The first start tag carrying `attr` with value `value`.
pub fn find_tag_with_attr(doc: &str, attr: &str, value: &str) -> Option<StartTag> {
    start_tags(doc)
        .into_iter()
        .find(|tag| tag.attr(attr) == Some(value))
}

/// Text directly inside the element tagged `data-field="{field}"`, up to the
/// next markup, unescaped with its whitespace kept.
pub fn field_raw(doc: &str, field: &str) -> Option<String> {
    let tag = find_tag_with_attr(doc, "data-field", field)?;
    let rest = &doc[tag.end..];
    let text = match rest.find('<') {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(html_unescape(text))
}

/// [`field_raw`], trimmed.
pub fn field_text(doc: &str, field: &str) -> Option<String> {
    field_raw(doc, field).map(|text| text.trim().to_string())
}
