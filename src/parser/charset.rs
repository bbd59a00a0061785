//! Charset lookup, sniffing and transcoding

use crate::ContentError;
use encoding_rs::Encoding;

/// How far into a document a `<meta>` charset declaration is looked for
const META_SNIFF_LIMIT: usize = 1024;

/// Looks up an encoding by label (`UTF-8`, `latin1`, `Shift_JIS`, ...)
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().trim_matches(|c: char| c == '"' || c == '\'');
    if label.is_empty() {
        return None;
    }
    Encoding::for_label(label.as_bytes())
}

/// Looks up an encoding, failing on unknown labels
pub fn require(label: &str) -> Result<&'static Encoding, ContentError> {
    lookup(label).ok_or_else(|| ContentError::UnsupportedCharset(label.to_string()))
}

/// Decodes bytes, letting a byte order mark override `encoding`
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Encodes text, falling back to UTF-8 for encodings that cannot be produced
pub fn encode(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let (bytes, _, _) = encoding.encode(text);
    bytes.into_owned()
}

/// Extracts the `charset` parameter of a Content-Type value
///
/// ```
/// use ripple_parse::parser::charset::charset_from_content_type;
///
/// assert_eq!(charset_from_content_type("text/html; charset=ISO-8859-1"), Some("ISO-8859-1"));
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches(|c: char| c == '"' || c == '\''))
        .filter(|value| !value.is_empty())
}

/// Finds a `<meta charset>` or `http-equiv` charset near the start of a document
///
/// Only ASCII-compatible markup is recognized; the scan covers the first
/// kilobyte, where the HTML standard requires the declaration to appear.
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let mut search_from = 0;
    while let Some(offset) = head[search_from..].find("<meta") {
        let tag_start = search_from + offset;
        let tag_end = head[tag_start..]
            .find('>')
            .map_or(head.len(), |i| tag_start + i);
        let tag = &head[tag_start..tag_end];

        if let Some(pos) = tag.find("charset=") {
            let value: String = tag[pos + "charset=".len()..]
                .trim_start_matches(|c: char| c == '"' || c == '\'')
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || matches!(*c, '-' | '_' | ':' | '.'))
                .collect();
            if !value.is_empty() {
                return Some(value);
            }
        }

        search_from = tag_end;
    }

    None
}
