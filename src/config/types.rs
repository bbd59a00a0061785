use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Default cap on accepted outgoing links per page
pub const DEFAULT_MAX_OUTGOING_LINKS: usize = 5000;

/// Default upper bound on rendered page size (1 MiB)
pub const DEFAULT_MAX_DOWNLOAD_SIZE: usize = 1_048_576;

/// Default wait for dynamic content to settle
pub const DEFAULT_MAX_WAIT_SECONDS: u64 = 2;

/// Main configuration structure for Ripple-Parse
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub dynamic: DynamicConfig,
}

/// Static extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum number of accepted outgoing links kept per page
    #[serde(rename = "max-outgoing-links-to-follow")]
    pub max_outgoing_links_to_follow: usize,

    /// Charset used when neither the page nor the markup declares one
    #[serde(rename = "default-charset")]
    pub default_charset: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_outgoing_links_to_follow: DEFAULT_MAX_OUTGOING_LINKS,
            default_charset: "UTF-8".to_string(),
        }
    }
}

/// Dynamic (render-aware) extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamicConfig {
    /// Upper bound on the wait for dynamic content, in seconds
    #[serde(rename = "max-wait-for-dynamic-content-seconds")]
    pub max_wait_for_dynamic_content_seconds: u64,

    /// Rendered pages larger than this many bytes are skipped
    #[serde(rename = "max-download-size")]
    pub max_download_size: usize,

    /// Which browser engine the WebDriver endpoint drives
    #[serde(rename = "render-engine")]
    pub render_engine: RenderEngine,

    /// Extra browser flags, appended to the defaults and overriding duplicates
    #[serde(rename = "render-engine-launch-flags")]
    pub render_engine_launch_flags: Vec<String>,

    /// Base URL of the WebDriver endpoint (geckodriver, chromedriver, grid)
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,

    /// Local driver binary, checked for existence when set
    #[serde(rename = "webdriver-path")]
    pub webdriver_path: Option<PathBuf>,

    /// User agent the rendering browser announces
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            max_wait_for_dynamic_content_seconds: DEFAULT_MAX_WAIT_SECONDS,
            max_download_size: DEFAULT_MAX_DOWNLOAD_SIZE,
            render_engine: RenderEngine::default(),
            render_engine_launch_flags: Vec::new(),
            webdriver_url: "http://localhost:4444".to_string(),
            webdriver_path: None,
            user_agent: "ripple-parse (+https://github.com/ripple-parse)".to_string(),
        }
    }
}

/// Supported browser engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderEngine {
    Chrome,
    #[default]
    Firefox,
}

impl RenderEngine {
    /// Name the WebDriver protocol expects in `browserName`
    pub fn browser_name(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }
}

impl fmt::Display for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.browser_name())
    }
}
