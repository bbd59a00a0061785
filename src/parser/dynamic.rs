//! Render-aware content parser
//!
//! Pages whose content only exists after client-side rendering are loaded in
//! the calling worker's render session first. The rendered source then goes
//! through the same static extraction as any other page.

use crate::config::Config;
use crate::parser::{charset, ContentParser, Page, ParseResult, StaticContentParser};
use crate::render::{RenderSession, RenderSessionRegistry, WaitOutcome, WaitStrategy, WorkerId};
use crate::{ContentError, ParseError};
use encoding_rs::Encoding;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Parser that renders a page in a browser before extracting content
///
/// # Per-call flow
///
/// 1. Look up the worker's session (missing binding fails the page)
/// 2. Navigate to the page URL
/// 3. Wait for the [`WaitStrategy`]; a timeout is logged and parsing goes on
/// 4. Encode the rendered source and enforce the download size limit
/// 5. Replace the page content and delegate to [`StaticContentParser`]
///
/// A failed page leaves the session bound and usable for the next page.
pub struct DynamicContentParser {
    inner: StaticContentParser,
    registry: Arc<RenderSessionRegistry>,
    wait: WaitStrategy,
    config: Arc<Config>,
}

impl DynamicContentParser {
    pub fn new(config: Arc<Config>, registry: Arc<RenderSessionRegistry>, wait: WaitStrategy) -> Self {
        Self::with_static_parser(
            StaticContentParser::new(&config.parser),
            config,
            registry,
            wait,
        )
    }

    /// Wraps an already configured static parser
    pub fn with_static_parser(
        inner: StaticContentParser,
        config: Arc<Config>,
        registry: Arc<RenderSessionRegistry>,
        wait: WaitStrategy,
    ) -> Self {
        Self {
            inner,
            registry,
            wait,
            config,
        }
    }

    /// Parses `page` using the session bound to `worker`
    ///
    /// # Errors
    ///
    /// * `ParseError::Content` - No session is bound, the engine failed, the
    ///   charset is unknown or static extraction failed
    /// * `ParseError::PageTooLarge` - The rendered source exceeds the download limit
    pub fn parse_as(
        &self,
        worker: &WorkerId,
        page: &mut Page,
        context_url: &str,
    ) -> crate::Result<ParseResult> {
        let handle = self.registry.get(worker).map_err(|e| {
            error!(
                "Render session not bound for worker {} while parsing {}; \
                 the worker startup hook must bind one before dynamic parsing",
                worker, page.url
            );
            ParseError::content(&page.url, e)
        })?;

        let rendered = {
            let mut session = handle.lock();
            self.render(&mut **session, page)?
        };

        if rendered.len() > self.config.dynamic.max_download_size {
            warn!(
                "Rendered page {} is {} bytes, over the {} byte limit; skipping",
                page.url,
                rendered.len(),
                self.config.dynamic.max_download_size
            );
            return Err(ParseError::PageTooLarge {
                url: page.url.clone(),
                size: rendered.len(),
                max: self.config.dynamic.max_download_size,
            });
        }

        page.content = rendered;
        self.inner.parse_static(page, context_url)
    }

    /// Navigates, waits and returns the encoded rendered source
    fn render(&self, session: &mut dyn RenderSession, page: &Page) -> crate::Result<Vec<u8>> {
        let engine_failure = |e| {
            error!("Render session failed on {}: {}", page.url, e);
            ParseError::content(&page.url, ContentError::Render(e))
        };

        session.navigate(&page.url).map_err(engine_failure)?;

        let timeout = Duration::from_secs(self.config.dynamic.max_wait_for_dynamic_content_seconds);
        if self.wait.wait_for(&self.config, page, session, timeout) == WaitOutcome::TimedOut {
            warn!("Wait for dynamic content loading timed out for {}", page.url);
        }

        let source = session.current_source().map_err(engine_failure)?;
        let encoding = rendered_encoding(page, &source, self.inner.default_charset())
            .map_err(|e| ParseError::content(&page.url, e))?;
        debug!(
            "Rendered {} ({} chars, encoding as {})",
            page.url,
            source.len(),
            encoding.name()
        );

        Ok(charset::encode(&source, encoding))
    }
}

impl ContentParser for DynamicContentParser {
    fn parse(&self, page: &mut Page, context_url: &str) -> crate::Result<ParseResult> {
        self.parse_as(&WorkerId::current(), page, context_url)
    }
}

/// Encoding for the rendered source
///
/// The page's declared charset wins, then the Content-Type parameter. With no
/// declaration, a `<meta>` charset in the rendered markup is honored so the
/// bytes decode the way the markup says; otherwise `default_charset`, which
/// the static parse decodes undeclared content with.
fn rendered_encoding(
    page: &Page,
    source: &str,
    default_charset: &str,
) -> Result<&'static Encoding, ContentError> {
    let declared = page.declared_charset().or_else(|| {
        page.content_type
            .as_deref()
            .and_then(charset::charset_from_content_type)
    });
    if let Some(label) = declared {
        return charset::require(label);
    }

    match charset::sniff_meta_charset(source.as_bytes()).and_then(|label| charset::lookup(&label)) {
        Some(encoding) => Ok(encoding),
        None => charset::require(default_charset),
    }
}
