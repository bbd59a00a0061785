//! Content extraction for fetched pages
//!
//! This module contains the parse pipeline:
//! - Tokenization of page bytes (title, body text, meta tags, raw link candidates)
//! - Charset resolution and raw HTML reconstruction
//! - Bounded, deduplicating link extraction
//! - Render-aware parsing that waits for client-side content before extracting
//!
//! The static and dynamic parsers share the [`ContentParser`] capability; the
//! dynamic one wraps the static one rather than replacing it.

pub mod charset;
pub mod css;
mod dynamic;
mod html;
mod links;
mod tokenizer;

pub use dynamic::DynamicContentParser;
pub use html::StaticContentParser;
pub use links::extract_links;
pub use tokenizer::{CharsetHint, ScraperTokenizer, TokenizeError, TokenizedDocument, Tokenizer};

use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// A fetched page as handed over by the fetch layer
///
/// `content` is replaced exactly once by [`DynamicContentParser`] with the
/// rendered source before static extraction runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Source URL the page was fetched from
    pub url: String,

    /// Raw response body
    pub content: Vec<u8>,

    /// Declared Content-Type header value
    pub content_type: Option<String>,

    /// Declared charset (usually from the Content-Type header)
    pub charset: Option<String>,
}

impl Page {
    /// Creates a page with no declared content type or charset
    pub fn new(url: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            content_type: None,
            charset: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Declared charset, ignoring blank values
    pub fn declared_charset(&self) -> Option<&str> {
        self.charset
            .as_deref()
            .map(str::trim)
            .filter(|charset| !charset.is_empty())
    }
}

/// Structured content extracted from one page
///
/// Created fresh per parse call and owned by the caller afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseResult {
    /// Page title, if the markup has a non-empty one
    pub title: Option<String>,

    /// Body text, trimmed of leading and trailing whitespace
    pub text: String,

    /// Meta tags by lowercase name; the first occurrence of a name wins
    pub meta_tags: BTreeMap<String, String>,

    /// Outgoing links in source order, unique by canonical URL
    pub outgoing_links: Vec<ExtractedLink>,

    /// Charset used to decode the page and encode link queries
    pub content_charset: String,

    /// Content type declared by the fetch layer
    pub content_type: Option<String>,

    /// Page bytes decoded with `content_charset`
    pub html: String,
}

impl ParseResult {
    /// Canonical URLs of all outgoing links, in source order
    pub fn link_urls(&self) -> Vec<&str> {
        self.outgoing_links
            .iter()
            .map(|link| link.url.as_str())
            .collect()
    }
}

/// An outgoing link after canonicalization
///
/// Two links are equal when their canonical URLs are equal, whatever tag,
/// anchor text or attributes they were found with.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedLink {
    /// Canonical absolute URL
    pub url: String,

    /// Lowercase name of the tag the link came from
    pub tag: String,

    /// Anchor text (empty for non-anchor tags)
    pub anchor: String,

    /// All attributes of the originating tag
    pub attributes: BTreeMap<String, String>,
}

impl PartialEq for ExtractedLink {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ExtractedLink {}

impl Hash for ExtractedLink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// A link candidate as reported by the tokenizer, before any filtering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAnchor {
    pub href: Option<String>,
    pub tag: String,
    pub anchor_text: String,
    pub attributes: BTreeMap<String, String>,
}

impl RawAnchor {
    pub fn new(href: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_anchor_text(mut self, text: impl Into<String>) -> Self {
        self.anchor_text = text.into();
        self
    }
}

/// The parse capability exposed to crawl workers
pub trait ContentParser: Send + Sync {
    /// Parses `page`, resolving relative links against `context_url`
    ///
    /// Implementations may replace `page.content` (render-aware parsing does).
    fn parse(&self, page: &mut Page, context_url: &str) -> crate::Result<ParseResult>;

    /// Parses `page` using its own URL as the link context
    fn parse_page(&self, page: &mut Page) -> crate::Result<ParseResult> {
        let context_url = page.url.clone();
        self.parse(page, &context_url)
    }
}
