//! Waiting for client-side rendering to settle

use crate::config::Config;
use crate::parser::Page;
use crate::render::{Locator, RenderSession};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Pause between two checks of the wait condition
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

type LocatorFn = dyn Fn(&Config, &Page) -> Locator + Send + Sync;
type PredicateFn = dyn Fn(&Config, &Page, &mut dyn RenderSession) -> bool + Send + Sync;

/// Result of a bounded wait
///
/// A timeout is not an error: the caller proceeds with whatever the page has
/// rendered so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    TimedOut,
}

/// Condition deciding that dynamic content has finished loading
#[derive(Clone)]
pub enum WaitStrategy {
    /// Wait until an element matching the locator is present
    Locator(Arc<LocatorFn>),

    /// Wait until a caller-supplied check returns true
    Predicate(Arc<PredicateFn>),
}

impl WaitStrategy {
    /// Waits for the same element on every page
    pub fn locator(locator: Locator) -> Self {
        Self::Locator(Arc::new(move |_: &Config, _: &Page| locator.clone()))
    }

    /// Waits for an element chosen per page
    pub fn locator_for<F>(select: F) -> Self
    where
        F: Fn(&Config, &Page) -> Locator + Send + Sync + 'static,
    {
        Self::Locator(Arc::new(select))
    }

    /// Waits until `ready` returns true
    ///
    /// The check receives the session so it can evaluate scripts or query
    /// elements itself.
    pub fn predicate<F>(ready: F) -> Self
    where
        F: Fn(&Config, &Page, &mut dyn RenderSession) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(ready))
    }

    /// Blocks the calling thread until the condition holds or `timeout` elapses
    ///
    /// The condition is checked at least once, then every
    /// [`DEFAULT_POLL_INTERVAL`]. Engine errors while looking for a locator
    /// count as "not ready yet".
    pub fn wait_for(
        &self,
        config: &Config,
        page: &Page,
        session: &mut dyn RenderSession,
        timeout: Duration,
    ) -> WaitOutcome {
        self.wait_with_interval(config, page, session, timeout, DEFAULT_POLL_INTERVAL)
    }

    /// Same as [`WaitStrategy::wait_for`] with a custom poll interval
    pub fn wait_with_interval(
        &self,
        config: &Config,
        page: &Page,
        session: &mut dyn RenderSession,
        timeout: Duration,
        poll_interval: Duration,
    ) -> WaitOutcome {
        match self {
            Self::Locator(select) => {
                let locator = select(config, page);
                poll_until(timeout, poll_interval, || {
                    match session.find_by_locator(&locator) {
                        Ok(found) => found,
                        Err(e) => {
                            debug!("Looking for {} on {} failed: {}", locator, page.url, e);
                            false
                        }
                    }
                })
            }
            Self::Predicate(ready) => {
                poll_until(timeout, poll_interval, || ready(config, page, &mut *session))
            }
        }
    }
}

impl fmt::Debug for WaitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locator(_) => f.write_str("WaitStrategy::Locator"),
            Self::Predicate(_) => f.write_str("WaitStrategy::Predicate"),
        }
    }
}

fn poll_until(
    timeout: Duration,
    poll_interval: Duration,
    mut ready: impl FnMut() -> bool,
) -> WaitOutcome {
    // A timeout too large to represent never expires
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if ready() {
            return WaitOutcome::Completed;
        }
        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return WaitOutcome::TimedOut;
                }
                poll_interval.min(deadline - now)
            }
            None => poll_interval,
        };
        thread::sleep(pause);
    }
}
