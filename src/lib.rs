//! Ripple-Parse: content extraction for a web crawl pipeline
//!
//! This crate turns fetched page bytes into structured content (title, body text,
//! meta tags, outgoing links). Pages that only materialize their content after
//! client-side rendering are routed through a per-worker rendering session first,
//! then handed to the same static extraction path.

pub mod config;
pub mod parser;
pub mod render;
pub mod url;

use render::{RenderError, WorkerId};
use thiserror::Error;

/// Failure of a single page parse
///
/// Both variants are recoverable at the page level: the page is marked failed
/// (or skipped) and the crawl continues.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not parse [{url}]: {source}")]
    Content {
        url: String,
        #[source]
        source: ContentError,
    },

    #[error("page [{url}] is {size} bytes, larger than the {max} byte download limit")]
    PageTooLarge { url: String, size: usize, max: usize },
}

impl ParseError {
    pub(crate) fn content(url: &str, source: impl Into<ContentError>) -> Self {
        Self::Content {
            url: url.to_string(),
            source: source.into(),
        }
    }

    /// Returns true if the failure points at a worker wiring defect rather than bad content
    pub fn is_setup_defect(&self) -> bool {
        matches!(
            self,
            Self::Content {
                source: ContentError::NoSession(_),
                ..
            }
        )
    }
}

/// Underlying cause of a content failure
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("tokenization failed: {0}")]
    Tokenize(#[from] parser::TokenizeError),

    #[error("unsupported charset: {0}")]
    UnsupportedCharset(String),

    #[error(transparent)]
    NoSession(#[from] NoSessionBoundError),

    #[error("render session failure: {0}")]
    Render(#[from] RenderError),
}

/// A worker asked for its render session before its startup hook bound one
#[derive(Debug, Clone, Error)]
#[error("no render session bound for worker {0}")]
pub struct NoSessionBoundError(pub WorkerId);

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for parse operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use parser::{
    ContentParser, DynamicContentParser, ExtractedLink, Page, ParseResult, StaticContentParser,
};
pub use render::{RenderSessionRegistry, WaitOutcome, WaitStrategy};
pub use url::canonicalize_url;
