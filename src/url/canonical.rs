use crate::{UrlError, UrlResult};
use encoding_rs::{Encoding, UTF_8};
use url::Url;

/// Canonicalizes a possibly-relative href against a context URL
///
/// # Canonicalization Steps
///
/// 1. Percent-encode non-ASCII query characters with `charset`
/// 2. Resolve the href against `context`; reject if malformed
/// 3. Keep only HTTP and HTTPS URLs that carry a host
/// 4. Lowercase the host and drop the default port (done by the parser)
/// 5. Normalize path:
///    - Remove dot segments (done by the parser)
///    - Collapse empty segments from repeated slashes, keeping a trailing slash
///    - Decode percent-encoded unreserved characters, uppercase other escapes
/// 6. Remove fragment (everything after #)
/// 7. Drop empty query pairs and sort the rest by key (stable)
/// 8. Remove empty query string (trailing ?)
///
/// Applying the function to its own output returns the same URL.
///
/// # Examples
///
/// ```
/// use ripple_parse::url::canonicalize_url;
///
/// let url = canonicalize_url("/a/b", "http://h.example/c/d", encoding_rs::UTF_8).unwrap();
/// assert_eq!(url.as_str(), "http://h.example/a/b");
/// ```
pub fn canonicalize_url(
    href: &str,
    context: &str,
    charset: &'static Encoding,
) -> UrlResult<Url> {
    let base = Url::parse(context.trim()).ok();
    let options = Url::options().base_url(base.as_ref());

    // The parser encodes queries as UTF-8 unless told otherwise
    let resolved = if charset == UTF_8 {
        options.parse(href.trim())
    } else {
        options
            .encoding_override(Some(&|query| charset.encode(query).0))
            .parse(href.trim())
    };
    let mut url = resolved.map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    let path = normalize_path(url.path());
    url.set_path(&path);

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let query = normalize_query(query);
        if query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

/// Collapses empty path segments and normalizes escapes, keeping a trailing slash
fn normalize_path(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(normalize_percent_encoding)
        .collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if path.ends_with('/') {
        result.push('/');
    }
    result
}

/// Drops empty pairs and sorts the remainder by key, keeping pair encoding intact
fn normalize_query(query: &str) -> String {
    let mut pairs: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(normalize_percent_encoding)
        .collect();

    pairs.sort_by(|a, b| query_key(a).cmp(query_key(b)));

    pairs.join("&")
}

fn query_key(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(key, _)| key)
}

/// Decodes escapes of unreserved characters and uppercases the remaining ones
fn normalize_percent_encoding(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                let decoded = hi * 16 + lo;
                if is_unreserved(decoded) {
                    out.push(decoded as char);
                } else {
                    out.push_str(&format!("%{:02X}", decoded));
                }
                i += 3;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }

    out
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}
