//! Rendering sessions for pages that build their content client-side
//!
//! This module contains:
//! - The [`RenderSession`] capability and its WebDriver implementation
//! - The per-worker [`RenderSessionRegistry`] and worker lifecycle hooks
//! - [`WaitStrategy`], the condition that decides rendering has settled
//! - Browser launch flag assembly

mod options;
mod registry;
mod wait;
mod webdriver;

pub use options::{launch_flags, DEFAULT_WINDOW_SIZE};
pub use registry::{on_worker_start, on_worker_stop, RenderSessionRegistry, SessionHandle};
pub use wait::{WaitOutcome, WaitStrategy, DEFAULT_POLL_INTERVAL};
pub use webdriver::{capabilities, WebDriverSession, WebDriverSessionFactory};

use std::fmt;
use thiserror::Error;

/// Errors raised by a rendering engine
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("WebDriver request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("WebDriver error {error}: {message}")]
    Protocol { error: String, message: String },

    #[error("unexpected WebDriver response: {0}")]
    UnexpectedResponse(String),

    #[error("render session is closed")]
    Closed,

    #[error("render engine failure: {0}")]
    Engine(String),
}

/// Identity of a crawl worker
///
/// Keys the [`RenderSessionRegistry`]. Workers normally use
/// [`WorkerId::current`]; explicit ids suit pools that name their workers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity of the calling thread
    pub fn current() -> Self {
        Self(format!("{:?}", std::thread::current().id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to find an element in a rendered page (W3C WebDriver strategies)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
    Id(String),
    TagName(String),
    LinkText(String),
}

impl Locator {
    /// The `(using, value)` pair of a W3C find-elements request
    ///
    /// W3C WebDriver has no id strategy; ids map to an attribute selector.
    pub fn strategy(&self) -> (&'static str, String) {
        match self {
            Self::Css(selector) => ("css selector", selector.clone()),
            Self::XPath(path) => ("xpath", path.clone()),
            Self::Id(id) => ("css selector", format!("[id=\"{}\"]", id.replace('"', "\\\""))),
            Self::TagName(name) => ("tag name", name.clone()),
            Self::LinkText(text) => ("link text", text.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (using, value) = self.strategy();
        write!(f, "{} '{}'", using, value)
    }
}

/// A live handle to one browser instance
///
/// A session belongs to exactly one worker; methods take `&mut self` and the
/// registry hands each worker its own handle.
pub trait RenderSession: Send {
    /// Loads `url` and waits for the engine's own page-load signal
    fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Serialized DOM of the current page
    fn current_source(&mut self) -> Result<String, RenderError>;

    /// Returns true if at least one element matches `locator`
    fn find_by_locator(&mut self, locator: &Locator) -> Result<bool, RenderError>;

    /// Runs a synchronous script in the page and returns its result
    fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, RenderError>;

    /// Shuts the browser down; closing twice is a no-op
    fn close(&mut self) -> Result<(), RenderError>;
}

/// Creates sessions for workers at startup
pub trait SessionFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}
