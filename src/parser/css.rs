//! CSS `url(...)` reference extraction
//!
//! Stylesheets and inline styles reference resources through `url(...)`
//! tokens. A quoted argument is scanned as one atomic token, so data URLs that
//! carry `)`, nested quotes or scheme-like text inside their payload never get
//! split into bogus partial matches.

use crate::parser::{charset, extract_links, Page, ParseResult, RawAnchor};
use tracing::debug;

/// Tag name recorded on links found in CSS
pub const CSS_LINK_TAG: &str = "style";

/// Extracts the targets of all `url(...)` tokens in CSS text, in source order
///
/// # Rules
///
/// - `url(` is matched case-insensitively
/// - Quoted arguments (`'...'` or `"..."`) run to the matching unescaped quote;
///   backslash escapes are honored and unescaped
/// - Unquoted arguments run to the first `)`
/// - `data:` URLs and empty arguments are skipped
/// - Unterminated tokens are dropped
///
/// # Example
///
/// ```
/// use ripple_parse::parser::css::extract_urls;
///
/// let css = r#"a { background: url("x.png") } b { src: url(fonts/y.woff2) }"#;
/// assert_eq!(extract_urls(css), vec!["x.png", "fonts/y.woff2"]);
/// ```
pub fn extract_urls(css: &str) -> Vec<String> {
    let bytes = css.as_bytes();
    let mut urls = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_url_function(bytes, pos) {
        let mut i = skip_whitespace(bytes, start + "url(".len());
        if i >= bytes.len() {
            break;
        }

        let quote = bytes[i];
        if quote == b'"' || quote == b'\'' {
            let content_start = i + 1;
            let Some(content_end) = find_closing_quote(bytes, content_start, quote) else {
                break;
            };
            let after = skip_whitespace(bytes, content_end + 1);
            if after < bytes.len() && bytes[after] == b')' {
                push_url(&mut urls, &unescape(&css[content_start..content_end]));
                pos = after + 1;
            } else {
                pos = content_end + 1;
            }
        } else {
            let Some(offset) = css[i..].find(')') else {
                break;
            };
            push_url(&mut urls, &css[i..i + offset]);
            i += offset;
            pos = i + 1;
        }
    }

    urls
}

/// Builds a parse result for a stylesheet page
///
/// Stylesheets have no title, text or meta tags; only their `url(...)`
/// references become outgoing links, resolved against `context_url`.
pub fn parse_stylesheet(
    page: &Page,
    context_url: &str,
    content_charset: &str,
    encoding: &'static encoding_rs::Encoding,
    max_links: usize,
) -> ParseResult {
    let text = charset::decode(&page.content, encoding);
    let candidates: Vec<RawAnchor> = extract_urls(&text)
        .into_iter()
        .map(|url| RawAnchor::new(url, CSS_LINK_TAG))
        .collect();

    let outgoing_links = extract_links(&candidates, context_url, content_charset, max_links);
    debug!(
        "Parsed stylesheet {} ({} links)",
        page.url,
        outgoing_links.len()
    );

    ParseResult {
        title: None,
        text: String::new(),
        meta_tags: Default::default(),
        outgoing_links,
        content_charset: content_charset.to_string(),
        content_type: page.content_type.clone(),
        html: text,
    }
}

/// Returns true if a Content-Type value denotes a stylesheet
pub fn is_stylesheet(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("text/css"))
        .unwrap_or(false)
}

fn push_url(urls: &mut Vec<String>, raw: &str) {
    let url = raw.trim();
    if url.is_empty() || url.get(..5).map_or(false, |s| s.eq_ignore_ascii_case("data:")) {
        return;
    }
    urls.push(url.to_string());
}

/// Finds the next `url(` at or after `from`, case-insensitively
fn find_url_function(bytes: &[u8], from: usize) -> Option<usize> {
    const NEEDLE: &[u8] = b"url(";
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(NEEDLE.len())
        .position(|window| window.eq_ignore_ascii_case(NEEDLE))
        .map(|offset| from + offset)
}

fn find_closing_quote(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
