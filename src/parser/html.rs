//! Static content parser
//!
//! Tokenizes page bytes as they were fetched, resolves the page charset and
//! assembles a [`ParseResult`] with the page's outgoing links.

use crate::config::ParserConfig;
use crate::parser::{
    charset, css, extract_links, CharsetHint, ContentParser, Page, ParseResult, ScraperTokenizer,
    Tokenizer,
};
use crate::{ContentError, ParseError};
use std::sync::Arc;
use tracing::{debug, error};
use url::Url;

/// Parser for pages whose content is complete as fetched
///
/// Holds no mutable state; one instance can serve every worker concurrently.
#[derive(Clone)]
pub struct StaticContentParser {
    tokenizer: Arc<dyn Tokenizer>,
    max_outgoing_links: usize,
    default_charset: String,
}

impl StaticContentParser {
    /// Creates a parser backed by the `scraper` tokenizer
    pub fn new(config: &ParserConfig) -> Self {
        Self::with_tokenizer(config, Arc::new(ScraperTokenizer))
    }

    /// Creates a parser backed by a custom tokenizer
    pub fn with_tokenizer(config: &ParserConfig, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            max_outgoing_links: config.max_outgoing_links_to_follow,
            default_charset: config.default_charset.clone(),
        }
    }

    pub fn max_outgoing_links(&self) -> usize {
        self.max_outgoing_links
    }

    /// Charset assumed for pages that declare none
    pub fn default_charset(&self) -> &str {
        &self.default_charset
    }

    /// Parses a page without modifying it
    ///
    /// # Steps
    ///
    /// 1. Tokenize page bytes (title, body text, meta tags, link candidates),
    ///    decoding undeclared content with the default charset
    /// 2. Resolve charset: page declaration, then tokenizer report, then default
    /// 3. Resolve links against `<base href>` if present, else `context_url`
    /// 4. Decode the page bytes with the resolved charset
    ///
    /// # Errors
    ///
    /// * `ParseError::Content` - Tokenization failed or the charset is unknown
    pub fn parse_static(&self, page: &Page, context_url: &str) -> crate::Result<ParseResult> {
        if css::is_stylesheet(page.content_type.as_deref()) {
            return self.parse_css(page, context_url);
        }

        let hint = self.charset_hint(page).map_err(|e| {
            error!("error parsing the html: {}: {}", page.url, e);
            ParseError::content(&page.url, e)
        })?;

        let document = self
            .tokenizer
            .tokenize(&page.content, page.content_type.as_deref(), hint)
            .map_err(|e| {
                error!("{}, while parsing: {}", e, page.url);
                ParseError::content(&page.url, e)
            })?;

        let content_charset = page
            .declared_charset()
            .map(str::to_string)
            .or_else(|| document.charset.clone())
            .unwrap_or_else(|| self.default_charset.clone());

        let context_url = effective_context(document.base_url.as_deref(), context_url);
        let outgoing_links = extract_links(
            &document.raw_anchors,
            &context_url,
            &content_charset,
            self.max_outgoing_links,
        );

        let encoding = charset::require(&content_charset).map_err(|e| {
            error!("error parsing the html: {}: {}", page.url, e);
            ParseError::content(&page.url, e)
        })?;
        let html = charset::decode(&page.content, encoding);

        debug!(
            "Parsed {} ({} links, charset {})",
            page.url,
            outgoing_links.len(),
            content_charset
        );

        Ok(ParseResult {
            title: document.title,
            text: document.body_text.trim().to_string(),
            meta_tags: document.meta_tags,
            outgoing_links,
            content_charset,
            content_type: page.content_type.clone(),
            html,
        })
    }

    fn charset_hint(&self, page: &Page) -> Result<CharsetHint, ContentError> {
        Ok(CharsetHint {
            declared: page.declared_charset().map(charset::require).transpose()?,
            fallback: charset::require(&self.default_charset)?,
        })
    }

    fn parse_css(&self, page: &Page, context_url: &str) -> crate::Result<ParseResult> {
        let content_charset = page
            .declared_charset()
            .or_else(|| {
                page.content_type
                    .as_deref()
                    .and_then(charset::charset_from_content_type)
            })
            .unwrap_or(&self.default_charset)
            .to_string();
        let encoding =
            charset::require(&content_charset).map_err(|e| ParseError::content(&page.url, e))?;

        Ok(css::parse_stylesheet(
            page,
            context_url,
            &content_charset,
            encoding,
            self.max_outgoing_links,
        ))
    }
}

impl ContentParser for StaticContentParser {
    fn parse(&self, page: &mut Page, context_url: &str) -> crate::Result<ParseResult> {
        self.parse_static(page, context_url)
    }
}

/// A `<base href>` overrides the context; relative base values resolve against it
fn effective_context(base_url: Option<&str>, context_url: &str) -> String {
    let Some(base) = base_url else {
        return context_url.to_string();
    };

    match Url::parse(context_url).and_then(|context| context.join(base)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => base.to_string(),
    }
}
