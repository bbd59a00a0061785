//! W3C WebDriver render session
//!
//! Talks to a driver endpoint (geckodriver, chromedriver or a grid) over
//! blocking HTTP. Each [`WebDriverSession`] owns one remote browser session.

use crate::config::{DynamicConfig, RenderEngine};
use crate::render::{launch_flags, Locator, RenderError, RenderSession, SessionFactory};
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound on a single WebDriver command, page loads included
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest response excerpt kept in error messages
const ERROR_BODY_LIMIT: usize = 240;

/// Builds the `POST /session` payload for the configured engine
///
/// Launch flags go into the engine's vendor options; certificate errors are
/// accepted so self-signed crawl targets still render.
pub fn capabilities(config: &DynamicConfig) -> Value {
    let args = launch_flags(config);
    let engine = config.render_engine;

    let vendor_options = match engine {
        RenderEngine::Chrome => json!({
            "goog:chromeOptions": { "args": args }
        }),
        RenderEngine::Firefox => json!({
            "moz:firefoxOptions": {
                "args": args,
                "prefs": { "general.useragent.override": config.user_agent }
            }
        }),
    };

    let mut always_match = json!({
        "browserName": engine.browser_name(),
        "acceptInsecureCerts": true,
    });
    if let (Some(target), Some(options)) = (always_match.as_object_mut(), vendor_options.as_object())
    {
        target.extend(options.clone());
    }

    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// A remote browser session
#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Opens a new browser session on the configured endpoint
    ///
    /// # Errors
    ///
    /// * `RenderError::Transport` - The endpoint is unreachable
    /// * `RenderError::Protocol` - The driver refused to create the session
    /// * `RenderError::UnexpectedResponse` - No session id in the reply
    pub fn start(config: &DynamicConfig) -> Result<Self, RenderError> {
        let base_url = config.webdriver_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()
            .map_err(|source| RenderError::Transport {
                endpoint: base_url.clone(),
                source,
            })?;

        let mut session = Self {
            client,
            base_url,
            session_id: None,
        };

        let endpoint = format!("{}/session", session.base_url);
        let reply = session.send(Method::POST, &endpoint, Some(capabilities(config)))?;
        let session_id = reply
            .pointer("/value/sessionId")
            .or_else(|| reply.pointer("/sessionId"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RenderError::UnexpectedResponse(format!(
                    "session create reply has no sessionId: {}",
                    truncate(&reply.to_string())
                ))
            })?
            .to_string();

        info!(
            "Started {} render session {} at {}",
            config.render_engine, session_id, session.base_url
        );
        session.session_id = Some(session_id);
        Ok(session)
    }

    /// Remote session id, `None` once closed
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Runs a command against this session and returns its `value`
    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, RenderError> {
        let session_id = self.session_id.as_deref().ok_or(RenderError::Closed)?;
        let endpoint = format!("{}/session/{}{}", self.base_url, session_id, path);
        let mut reply = self.send(method, &endpoint, body)?;
        Ok(reply
            .get_mut("value")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    fn send(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Value, RenderError> {
        let transport = |source| RenderError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let mut request = self.client.request(method, endpoint);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().map_err(transport)?;
        let status = response.status();
        let text = response.text().map_err(transport)?;

        let reply: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                RenderError::UnexpectedResponse(format!(
                    "HTTP {} with unreadable body ({}): {}",
                    status.as_u16(),
                    e,
                    truncate(&text)
                ))
            })?
        };

        if let Some(error) = reply.pointer("/value/error").and_then(Value::as_str) {
            let message = reply
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown webdriver error");
            return Err(RenderError::Protocol {
                error: error.to_string(),
                message: message.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RenderError::UnexpectedResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&text)
            )));
        }

        Ok(reply)
    }
}

impl RenderSession for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        debug!("Navigating render session to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn current_source(&mut self) -> Result<String, RenderError> {
        match self.command(Method::GET, "/source", None)? {
            Value::String(source) => Ok(source),
            other => Err(RenderError::UnexpectedResponse(format!(
                "page source is not a string: {}",
                truncate(&other.to_string())
            ))),
        }
    }

    fn find_by_locator(&mut self, locator: &Locator) -> Result<bool, RenderError> {
        let (using, value) = locator.strategy();
        let body = json!({ "using": using, "value": value });
        match self.command(Method::POST, "/elements", Some(body)) {
            Ok(Value::Array(elements)) => Ok(!elements.is_empty()),
            Ok(other) => Err(RenderError::UnexpectedResponse(format!(
                "find elements returned {}",
                truncate(&other.to_string())
            ))),
            Err(RenderError::Protocol { error, .. }) if error == "no such element" => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, RenderError> {
        let body = json!({ "script": script, "args": [] });
        self.command(Method::POST, "/execute/sync", Some(body))
    }

    fn close(&mut self) -> Result<(), RenderError> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        let endpoint = format!("{}/session/{}", self.base_url, session_id);
        self.send(Method::DELETE, &endpoint, None)?;
        info!("Closed render session {}", session_id);
        Ok(())
    }
}

/// Opens one [`WebDriverSession`] per worker
#[derive(Debug, Clone)]
pub struct WebDriverSessionFactory {
    config: DynamicConfig,
}

impl WebDriverSessionFactory {
    pub fn new(config: &DynamicConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl SessionFactory for WebDriverSessionFactory {
    fn create(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Ok(Box::new(WebDriverSession::start(&self.config)?))
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= ERROR_BODY_LIMIT {
        return text.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
