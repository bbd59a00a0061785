//! HTML tokenization
//!
//! The [`Tokenizer`] trait is the seam between the parse pipeline and the HTML
//! engine. [`ScraperTokenizer`] is the default implementation, built on the
//! `scraper` crate.

use crate::parser::{charset, css, RawAnchor};
use encoding_rs::{Encoding, UTF_8};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use thiserror::Error;

/// Leading bytes inspected when deciding whether content is binary
const BINARY_SNIFF_LIMIT: usize = 1024;

/// Tags whose text never counts as body text
const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Tags that reference other resources through `href`
const HREF_TAGS: &[&str] = &["a", "area", "link"];

/// Tags that reference other resources through `src`
const SRC_TAGS: &[&str] = &[
    "img", "script", "iframe", "frame", "embed", "source", "audio", "video", "track",
];

/// Errors raised while tokenizing page bytes
#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("content looks binary (NUL byte at offset {0})")]
    BinaryContent(usize),

    #[error("content type declares unknown charset '{0}'")]
    UnknownCharset(String),
}

/// Which encoding the tokenizer decodes page bytes with
///
/// A charset declared for the page by the fetcher overrides anything the
/// content says about itself. `fallback` applies when neither declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharsetHint {
    pub declared: Option<&'static Encoding>,
    pub fallback: &'static Encoding,
}

impl CharsetHint {
    pub fn fallback(fallback: &'static Encoding) -> Self {
        Self {
            declared: None,
            fallback,
        }
    }
}

impl Default for CharsetHint {
    fn default() -> Self {
        Self::fallback(UTF_8)
    }
}

/// Everything the parse pipeline needs from the markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedDocument {
    pub title: Option<String>,
    pub body_text: String,
    pub meta_tags: BTreeMap<String, String>,
    pub raw_anchors: Vec<RawAnchor>,

    /// `<base href>` override for link resolution
    pub base_url: Option<String>,

    /// Charset the markup or content type declares
    pub charset: Option<String>,
}

/// HTML engine capability used by [`crate::StaticContentParser`]
pub trait Tokenizer: Send + Sync {
    fn tokenize(
        &self,
        content: &[u8],
        content_type: Option<&str>,
        hint: CharsetHint,
    ) -> Result<TokenizedDocument, TokenizeError>;
}

/// Tokenizer built on `scraper` (html5ever)
///
/// All tags are mapped: link candidates come from every element that carries
/// a link attribute, plus CSS `url(...)` references in `<style>` blocks and
/// `style` attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperTokenizer;

impl Tokenizer for ScraperTokenizer {
    fn tokenize(
        &self,
        content: &[u8],
        content_type: Option<&str>,
        hint: CharsetHint,
    ) -> Result<TokenizedDocument, TokenizeError> {
        check_not_binary(content)?;

        let header_charset = content_type.and_then(charset::charset_from_content_type);
        let encoding = match (hint.declared, header_charset) {
            (Some(declared), _) => declared,
            (None, Some(label)) => charset::lookup(label)
                .ok_or_else(|| TokenizeError::UnknownCharset(label.to_string()))?,
            (None, None) => charset::sniff_meta_charset(content)
                .and_then(|label| charset::lookup(&label))
                .unwrap_or(hint.fallback),
        };

        let text = charset::decode(content, encoding);
        let document = Html::parse_document(&text);

        let mut meta_tags = BTreeMap::new();
        let mut meta_charset = None;
        collect_meta(&document, &mut meta_tags, &mut meta_charset);

        Ok(TokenizedDocument {
            title: extract_title(&document),
            body_text: extract_body_text(&document),
            meta_tags,
            raw_anchors: extract_anchors(&document),
            base_url: extract_base_url(&document),
            charset: header_charset.map(str::to_string).or(meta_charset),
        })
    }
}

fn check_not_binary(content: &[u8]) -> Result<(), TokenizeError> {
    // UTF-16 text legitimately contains NUL bytes
    if content.starts_with(&[0xFF, 0xFE]) || content.starts_with(&[0xFE, 0xFF]) {
        return Ok(());
    }
    let head = &content[..content.len().min(BINARY_SNIFF_LIMIT)];
    match head.iter().position(|&b| b == 0) {
        Some(offset) => Err(TokenizeError::BinaryContent(offset)),
        None => Ok(()),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Collects visible text under `<body>` (or the whole document if it has none)
fn extract_body_text(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut pieces = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |element| NON_TEXT_TAGS.contains(&element.name()))
        });
        if !hidden {
            pieces.push(&**text);
        }
    }

    collapse_whitespace(&pieces.join(" "))
}

/// Collects `<meta>` tags keyed by lowercase name; the first occurrence wins
fn collect_meta(
    document: &Html,
    meta_tags: &mut BTreeMap<String, String>,
    meta_charset: &mut Option<String>,
) {
    let Ok(meta_selector) = Selector::parse("meta") else {
        return;
    };

    for element in document.select(&meta_selector) {
        let meta = element.value();

        if meta_charset.is_none() {
            if let Some(value) = meta.attr("charset").map(str::trim).filter(|v| !v.is_empty()) {
                *meta_charset = Some(value.to_string());
            }
        }

        let Some(name) = meta
            .attr("name")
            .or_else(|| meta.attr("http-equiv"))
            .or_else(|| meta.attr("property"))
        else {
            continue;
        };
        let Some(content) = meta.attr("content") else {
            continue;
        };

        let name = name.trim().to_lowercase();
        if name == "content-type" && meta_charset.is_none() {
            *meta_charset = charset::charset_from_content_type(content).map(str::to_string);
        }
        meta_tags.entry(name).or_insert_with(|| content.trim().to_string());
    }
}

/// Extracts link candidates from every element, in document order
fn extract_anchors(document: &Html) -> Vec<RawAnchor> {
    let Ok(all) = Selector::parse("*") else {
        return Vec::new();
    };

    let mut anchors = Vec::new();
    for element in document.select(&all) {
        let name = element.value().name();

        if HREF_TAGS.contains(&name) {
            anchors.push(anchor_from(&element, "href"));
        } else if SRC_TAGS.contains(&name) {
            if let Some(src) = element.value().attr("src") {
                anchors.push(candidate(&element, src));
            }
        } else if name == "meta" {
            if let Some(target) = meta_redirect_target(&element) {
                anchors.push(candidate(&element, &target));
            }
        } else if name == "style" {
            let css_text = element.text().collect::<String>();
            anchors.extend(css_candidates(&element, &css_text));
        }

        if let Some(style) = element.value().attr("style") {
            anchors.extend(css_candidates(&element, style));
        }
    }

    anchors
}

fn anchor_from(element: &ElementRef, attr: &str) -> RawAnchor {
    let anchor_text = if element.value().name() == "link" {
        String::new()
    } else {
        collapse_whitespace(&element.text().collect::<String>())
    };

    RawAnchor {
        href: element.value().attr(attr).map(str::to_string),
        tag: element.value().name().to_string(),
        anchor_text,
        attributes: attributes_of(element),
    }
}

fn candidate(element: &ElementRef, href: &str) -> RawAnchor {
    RawAnchor {
        href: Some(href.to_string()),
        tag: element.value().name().to_string(),
        anchor_text: String::new(),
        attributes: attributes_of(element),
    }
}

fn css_candidates(element: &ElementRef, css_text: &str) -> Vec<RawAnchor> {
    css::extract_urls(css_text)
        .into_iter()
        .map(|url| RawAnchor {
            href: Some(url),
            tag: css::CSS_LINK_TAG.to_string(),
            anchor_text: String::new(),
            attributes: attributes_of(element),
        })
        .collect()
}

/// Target of `<meta http-equiv="refresh" content="5; url=...">` or `http-equiv="location"`
fn meta_redirect_target(element: &ElementRef) -> Option<String> {
    let meta = element.value();
    let equiv = meta.attr("http-equiv")?.trim().to_ascii_lowercase();
    let content = meta.attr("content")?;

    match equiv.as_str() {
        "refresh" => {
            let lower = content.to_ascii_lowercase();
            let pos = lower.find("url=")?;
            let target = content[pos + "url=".len()..]
                .trim()
                .trim_matches(|c: char| c == '"' || c == '\'');
            Some(target.to_string()).filter(|t| !t.is_empty())
        }
        "location" => Some(content.trim().to_string()).filter(|t| !t.is_empty()),
        _ => None,
    }
}

fn extract_base_url(document: &Html) -> Option<String> {
    let selector = Selector::parse("base[href]").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

fn attributes_of(element: &ElementRef) -> BTreeMap<String, String> {
    element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_lowercase(), value.to_string()))
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
