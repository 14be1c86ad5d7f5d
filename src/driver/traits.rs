//! Driver boundary traits
//!
//! The harness only talks to a browser through [`BrowserSession`]; how a
//! session comes to exist is the business of a [`DriverFactory`].

use async_trait::async_trait;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::{Error, Result};

/// Element lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Css,
    XPath,
    Id,
    LinkText,
    PartialLinkText,
}

impl Strategy {
    /// Name understood by the in-page locate script
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
            Strategy::Id => "id",
            Strategy::LinkText => "link_text",
            Strategy::PartialLinkText => "partial_link_text",
        }
    }
}

/// Immutable strategy + selector pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    selector: Cow<'static, str>,
}

impl Locator {
    pub const fn css(selector: &'static str) -> Self {
        Self::borrowed(Strategy::Css, selector)
    }

    pub const fn xpath(selector: &'static str) -> Self {
        Self::borrowed(Strategy::XPath, selector)
    }

    pub const fn id(selector: &'static str) -> Self {
        Self::borrowed(Strategy::Id, selector)
    }

    pub const fn link_text(selector: &'static str) -> Self {
        Self::borrowed(Strategy::LinkText, selector)
    }

    pub const fn partial_link_text(selector: &'static str) -> Self {
        Self::borrowed(Strategy::PartialLinkText, selector)
    }

    const fn borrowed(strategy: Strategy, selector: &'static str) -> Self {
        Self {
            strategy,
            selector: Cow::Borrowed(selector),
        }
    }

    /// Locator with a selector built at runtime
    pub fn new<S: Into<String>>(strategy: Strategy, selector: S) -> Self {
        Self {
            strategy,
            selector: Cow::Owned(selector.into()),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.strategy.as_str(), self.selector)
    }
}

/// Element bounding box in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Centre point, where clicks land
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Snapshot of an element taken when it was located
#[derive(Debug, Clone, PartialEq)]
pub struct ElementHandle {
    /// Locator that produced this handle
    pub locator: Locator,
    pub tag_name: String,
    /// Rendered text, trimmed
    pub text: String,
    pub displayed: bool,
    pub enabled: bool,
    pub attributes: HashMap<String, String>,
    pub bounds: BoundingBox,
}

impl ElementHandle {
    /// Visible and enabled
    pub fn is_interactable(&self) -> bool {
        self.displayed && self.enabled
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Result of an element lookup. Absence is data, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(ElementHandle),
    Absent,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_element(self) -> Option<ElementHandle> {
        match self {
            Lookup::Found(element) => Some(element),
            Lookup::Absent => None,
        }
    }
}

/// Timeouts applied to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Applied to every element lookup
    pub implicit_wait: Duration,
    /// Bound for a navigation to finish loading
    pub page_load: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            implicit_wait: Duration::ZERO,
            page_load: Duration::from_secs(crate::config::DEFAULT_PAGE_LOAD_TIMEOUT_SECS),
        }
    }
}

/// Browser window state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Maximized,
}

/// One live browser session
#[async_trait]
pub trait BrowserSession: Send + Sync + fmt::Debug {
    /// Session identity
    fn id(&self) -> &str;

    /// Navigate and wait for the document to finish loading
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Locate the first element matching `locator`, honouring the implicit wait
    async fn find_element(&self, locator: &Locator) -> Result<Lookup>;

    /// Click an element. Fails with [`Error::StaleElement`] if it vanished since lookup.
    async fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Focus an element and type into it
    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Full current page markup
    async fn page_source(&self) -> Result<String>;

    /// PNG screenshot of the current viewport
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// `document.readyState`
    async fn ready_state(&self) -> Result<String>;

    async fn set_timeouts(&self, timeouts: Timeouts) -> Result<()>;

    async fn timeouts(&self) -> Timeouts;

    async fn maximize_window(&self) -> Result<()>;

    async fn window_state(&self) -> WindowState;

    /// Release the browser. Later calls on this session fail with [`Error::SessionClosed`].
    async fn quit(&self) -> Result<()>;
}

/// Browser families the factory knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Chromium,
    Edge,
    Firefox,
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" | "google-chrome" => Ok(BrowserKind::Chrome),
            "chromium" => Ok(BrowserKind::Chromium),
            "edge" | "msedge" => Ok(BrowserKind::Edge),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(Error::session_acquisition(format!(
                "unknown browser {:?}",
                other
            ))),
        }
    }
}

/// What a factory needs to bootstrap a session
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub browser: String,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Attach here instead of launching
    pub cdp_endpoint: Option<String>,
    /// Executable override
    pub executable: Option<String>,
    pub launch_timeout: Duration,
    pub poll_interval: Duration,
}

impl DriverOptions {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            browser: config.browser.clone(),
            headless: config.headless,
            window_width: config.window_width,
            window_height: config.window_height,
            cdp_endpoint: config.cdp_endpoint.clone(),
            executable: config.chrome_path.clone(),
            launch_timeout: config.launch_timeout,
            poll_interval: config.poll_interval,
        }
    }
}

/// Produces ready browser sessions
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self, options: &DriverOptions) -> Result<Box<dyn BrowserSession>>;
}
