//! Locator + action pairs with explicit-wait semantics

use std::time::Duration;
use tracing::{debug, warn};

use super::wait::{ExplicitWait, WaitWindow};
use crate::config::HarnessConfig;
use crate::driver::{BrowserSession, ElementHandle, Locator, Lookup};
use crate::{Error, Result};

/// How a wait for an element ended
#[derive(Debug)]
enum Located {
    /// Matched the condition
    Ready(ElementHandle),
    /// Present at some point, never matched the condition
    Unready(ElementHandle),
    Missing,
}

/// Element operations against a borrowed session
///
/// Actions (`click`, `type_text`, `read_text`) wait strictly and fail with
/// [`Error::ElementNotFound`] once the explicit wait runs out. Checks
/// (`is_displayed*`) treat absence as `false` and never fail.
#[derive(Debug, Clone, Copy)]
pub struct ElementActions<'a> {
    session: &'a dyn BrowserSession,
    config: &'a HarnessConfig,
}

impl<'a> ElementActions<'a> {
    pub fn new(session: &'a dyn BrowserSession, config: &'a HarnessConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &'a dyn BrowserSession {
        self.session
    }

    pub fn config(&self) -> &'a HarnessConfig {
        self.config
    }

    fn explicit_wait(&self) -> ExplicitWait {
        self.wait_of(self.config.explicit_wait)
    }

    fn wait_of(&self, timeout: Duration) -> ExplicitWait {
        ExplicitWait::new(timeout, self.config.poll_interval)
    }

    /// One lookup. Later probes are cut off at the deadline.
    async fn probe(&self, locator: &Locator, window: &WaitWindow, first: bool) -> Result<Lookup> {
        if first {
            return self.session.find_element(locator).await;
        }
        match tokio::time::timeout_at(window.deadline(), self.session.find_element(locator)).await {
            Ok(lookup) => lookup,
            Err(_) => Ok(Lookup::Absent),
        }
    }

    async fn locate<F>(&self, locator: &Locator, wait: ExplicitWait, ready: F) -> Result<Located>
    where
        F: Fn(&ElementHandle) -> bool,
    {
        let window = wait.begin();
        let mut last_seen = None;
        let mut answered = false;
        let mut last_error = None;
        let mut first = true;

        loop {
            match self.probe(locator, &window, first).await {
                Ok(Lookup::Found(element)) if ready(&element) => {
                    return Ok(Located::Ready(element))
                }
                Ok(Lookup::Found(element)) => {
                    answered = true;
                    last_seen = Some(element);
                }
                Ok(Lookup::Absent) => answered = true,
                Err(e) if e.is_transient() => {
                    debug!("Probe of {} failed, retrying: {}", locator, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
            first = false;

            if window.expired() {
                debug!("Gave up on {} after {:?}", locator, window.elapsed());
                if let (false, Some(e)) = (answered, last_error) {
                    return Err(e);
                }
                return Ok(match last_seen {
                    Some(element) => Located::Unready(element),
                    None => Located::Missing,
                });
            }
            window.tick().await;
        }
    }

    async fn require<F>(&self, locator: &Locator, what: &str, ready: F) -> Result<ElementHandle>
    where
        F: Fn(&ElementHandle) -> bool,
    {
        let wait = self.explicit_wait();
        match self.locate(locator, wait, ready).await? {
            Located::Ready(element) => Ok(element),
            Located::Unready(_) => Err(Error::interaction_timeout(format!(
                "{} was present but not {} within {:?}",
                locator, what, wait.timeout
            ))),
            Located::Missing => Err(Error::element_not_found(format!(
                "{} not found within {:?}",
                locator, wait.timeout
            ))),
        }
    }

    /// Wait for the element to become interactable, then click it once
    pub async fn click(&self, locator: &Locator) -> Result<()> {
        let element = self
            .require(locator, "clickable", ElementHandle::is_interactable)
            .await?;
        debug!("Clicking {}", locator);
        self.session.click(&element).await
    }

    /// Click a link once interactable and return the `href` it pointed at
    pub async fn follow_link(&self, locator: &Locator) -> Result<Option<String>> {
        let element = self
            .require(locator, "clickable", ElementHandle::is_interactable)
            .await?;
        let href = element.attribute("href").map(String::from);
        debug!("Following {} to {:?}", locator, href);
        self.session.click(&element).await?;
        Ok(href)
    }

    /// Wait for the element to become interactable, then type into it
    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self
            .require(locator, "editable", ElementHandle::is_interactable)
            .await?;
        self.session.type_text(&element, text).await
    }

    /// Rendered text of a visible element
    pub async fn read_text(&self, locator: &Locator) -> Result<String> {
        let element = self.require(locator, "visible", |e| e.displayed).await?;
        Ok(element.text)
    }

    /// Attribute value once the element exists. `None` when the attribute is unset.
    pub async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let element = self.require(locator, "attached", |_| true).await?;
        Ok(element.attribute(name).map(String::from))
    }

    /// Whether the element becomes visible within the explicit wait
    pub async fn is_displayed(&self, locator: &Locator) -> bool {
        self.is_displayed_within(locator, self.config.explicit_wait)
            .await
    }

    /// Whether the element becomes visible within `timeout`. Never fails.
    pub async fn is_displayed_within(&self, locator: &Locator, timeout: Duration) -> bool {
        match self.locate(locator, self.wait_of(timeout), |e| e.displayed).await {
            Ok(Located::Ready(_)) => true,
            Ok(_) => false,
            Err(e) => {
                warn!("Visibility check for {} failed: {}", locator, e);
                false
            }
        }
    }

    /// Single lookup, no explicit wait
    pub async fn is_displayed_now(&self, locator: &Locator) -> bool {
        match self.session.find_element(locator).await {
            Ok(Lookup::Found(element)) => element.displayed,
            Ok(Lookup::Absent) => false,
            Err(e) => {
                warn!("Visibility check for {} failed: {}", locator, e);
                false
            }
        }
    }

    /// Poll the current URL until it contains `fragment`; returns that URL
    pub async fn wait_for_url_contains(&self, fragment: &str) -> Result<String> {
        let wait = self.explicit_wait();
        let window = wait.begin();

        let mut last_url = None;
        let mut last_error = None;

        loop {
            match self.session.current_url().await {
                Ok(url) if url.contains(fragment) => return Ok(url),
                Ok(url) => last_url = Some(url),
                // Reads fail while a click's navigation swaps the document
                Err(e) if e.is_transient() => {
                    debug!("URL read failed, retrying: {}", e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
            if window.expired() {
                return match (last_url, last_error) {
                    (None, Some(e)) => Err(e),
                    (url, _) => Err(Error::interaction_timeout(format!(
                        "URL did not contain {:?} within {:?} (last URL: {})",
                        fragment,
                        wait.timeout,
                        url.as_deref().unwrap_or("unknown")
                    ))),
                };
            }
            window.tick().await;
        }
    }

    /// Poll `document.readyState` until `complete`, bounded by the page-load timeout
    pub async fn wait_for_page_ready(&self) -> Result<()> {
        let wait = self.wait_of(self.config.page_load_timeout);
        let window = wait.begin();

        let mut last_state = None;
        let mut last_error = None;

        loop {
            match self.session.ready_state().await {
                Ok(state) if state == "complete" => return Ok(()),
                Ok(state) => last_state = Some(state),
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => return Err(e),
            }
            if window.expired() {
                return match (last_state, last_error) {
                    (None, Some(e)) => Err(e),
                    (state, _) => Err(Error::interaction_timeout(format!(
                        "page stayed {:?} for {:?}",
                        state.unwrap_or_default(),
                        wait.timeout
                    ))),
                };
            }
            window.tick().await;
        }
    }
}
