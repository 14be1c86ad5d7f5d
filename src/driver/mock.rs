//! Scripted in-memory browser for tests
//!
//! A [`MockSite`] maps paths to [`MockPage`]s. Sessions created by
//! [`MockDriverFactory`] navigate that site, follow `href`s on click and
//! honour the implicit wait, all on tokio time so tests can run with a
//! paused clock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use super::traits::*;
use crate::{Error, Result};

const MOCK_POLL: Duration = Duration::from_millis(50);

/// 1x1 transparent PNG
pub const MOCK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x64,
    0xF8, 0xCF, 0x50, 0x0F, 0x00, 0x03, 0x86, 0x01, 0x80, 0x5A, 0x34, 0x7D, 0x6B, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// One element on a mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    locator: Locator,
    tag_name: String,
    text: String,
    attributes: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    appears_after: Duration,
    stale_on_click: bool,
}

impl MockElement {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            tag_name: "a".to_string(),
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            enabled: true,
            appears_after: Duration::ZERO,
            stale_on_click: false,
        }
    }

    pub fn tag(mut self, tag_name: &str) -> Self {
        self.tag_name = tag_name.to_string();
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Clicking follows this link
    pub fn href(self, href: &str) -> Self {
        self.attr("href", href)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Attach to the DOM only this long after the page loads
    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    /// Detach from the DOM between lookup and click
    pub fn stale_on_click(mut self) -> Self {
        self.stale_on_click = true;
        self
    }

    fn handle(&self) -> ElementHandle {
        ElementHandle {
            locator: self.locator.clone(),
            tag_name: self.tag_name.clone(),
            text: self.text.clone(),
            displayed: self.displayed,
            enabled: self.enabled,
            attributes: self.attributes.clone(),
            bounds: BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 120.0,
                height: 32.0,
            },
        }
    }
}

/// One page of a mock site
#[derive(Debug, Clone)]
pub struct MockPage {
    html: String,
    elements: Vec<MockElement>,
    never_loads: bool,
}

impl MockPage {
    pub fn new(title: &str) -> Self {
        Self {
            html: format!(
                "<html><head><title>{}</title></head><body><h1>{}</h1></body></html>",
                title, title
            ),
            elements: Vec::new(),
            never_loads: false,
        }
    }

    pub fn html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn with(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// `readyState` stays `loading`
    pub fn never_loads(mut self) -> Self {
        self.never_loads = true;
        self
    }

    fn element(&self, locator: &Locator) -> Option<&MockElement> {
        self.elements.iter().find(|e| &e.locator == locator)
    }
}

/// Pages keyed by path, served under one origin
#[derive(Debug, Clone)]
pub struct MockSite {
    origin: String,
    pages: HashMap<String, MockPage>,
    fallback: Option<MockPage>,
}

impl MockSite {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            pages: HashMap::new(),
            fallback: None,
        }
    }

    pub fn page(mut self, path: &str, page: MockPage) -> Self {
        self.pages.insert(path.to_string(), page);
        self
    }

    /// Served for any path on the origin without its own page
    pub fn fallback(mut self, page: MockPage) -> Self {
        self.fallback = Some(page);
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.origin, href)
        } else {
            format!("{}/{}", self.origin, href)
        }
    }

    fn lookup(&self, url: &str) -> Option<&MockPage> {
        let rest = url.strip_prefix(self.origin.as_str())?;
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        let path = if path.is_empty() { "/" } else { path };
        self.pages.get(path).or(self.fallback.as_ref())
    }
}

/// Counters shared by a factory and every session it creates
#[derive(Debug, Default)]
pub struct MockStats {
    created: AtomicUsize,
    quit: AtomicUsize,
    maximized: AtomicUsize,
    screenshots: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    last_timeouts: Mutex<Option<Timeouts>>,
}

impl MockStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn quit(&self) -> usize {
        self.quit.load(Ordering::SeqCst)
    }

    pub fn maximized(&self) -> usize {
        self.maximized.load(Ordering::SeqCst)
    }

    pub fn screenshots(&self) -> usize {
        self.screenshots.load(Ordering::SeqCst)
    }

    /// Every URL navigated to, in order, across sessions
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn last_timeouts(&self) -> Option<Timeouts> {
        self.last_timeouts.lock().ok().and_then(|t| *t)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    create: bool,
    screenshot: bool,
    page_source: bool,
    maximize: bool,
    quit: bool,
}

/// Factory producing [`MockSession`]s over one site
#[derive(Debug)]
pub struct MockDriverFactory {
    site: Arc<MockSite>,
    stats: Arc<MockStats>,
    faults: Faults,
}

impl MockDriverFactory {
    pub fn new(site: MockSite) -> Self {
        Self {
            site: Arc::new(site),
            stats: Arc::new(MockStats::default()),
            faults: Faults::default(),
        }
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    pub fn fail_create(mut self) -> Self {
        self.faults.create = true;
        self
    }

    pub fn fail_screenshot(mut self) -> Self {
        self.faults.screenshot = true;
        self
    }

    pub fn fail_page_source(mut self) -> Self {
        self.faults.page_source = true;
        self
    }

    pub fn fail_maximize(mut self) -> Self {
        self.faults.maximize = true;
        self
    }

    pub fn fail_quit(mut self) -> Self {
        self.faults.quit = true;
        self
    }
}

#[async_trait]
impl DriverFactory for MockDriverFactory {
    async fn create(&self, _options: &DriverOptions) -> Result<Box<dyn BrowserSession>> {
        if self.faults.create {
            return Err(Error::session_acquisition("mock browser refused to start"));
        }
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession::new(
            Arc::clone(&self.site),
            Arc::clone(&self.stats),
            self.faults,
        )))
    }
}

#[derive(Debug)]
struct MockState {
    url: String,
    loaded_at: Instant,
    timeouts: Timeouts,
    window_state: WindowState,
    closed: bool,
}

/// Session over a [`MockSite`]
#[derive(Debug)]
pub struct MockSession {
    id: String,
    site: Arc<MockSite>,
    stats: Arc<MockStats>,
    faults: Faults,
    state: Mutex<MockState>,
}

impl MockSession {
    fn new(site: Arc<MockSite>, stats: Arc<MockStats>, faults: Faults) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            site,
            stats,
            faults,
            state: Mutex::new(MockState {
                url: "about:blank".to_string(),
                loaded_at: Instant::now(),
                timeouts: Timeouts::default(),
                window_state: WindowState::Normal,
                closed: false,
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::internal("mock session state poisoned"))?;
        if state.closed {
            return Err(Error::session_closed(&self.id));
        }
        Ok(f(&mut state))
    }

    /// Element currently attached, if any
    fn attached(&self, locator: &Locator) -> Result<Option<MockElement>> {
        let (url, loaded_at) = self.with_state(|s| (s.url.clone(), s.loaded_at))?;
        let element = self
            .site
            .lookup(&url)
            .and_then(|page| page.element(locator))
            .filter(|e| Instant::now() >= loaded_at + e.appears_after)
            .cloned();
        Ok(element)
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let page_load = self.with_state(|s| s.timeouts.page_load)?;
        if let Ok(mut navigations) = self.stats.navigations.lock() {
            navigations.push(url.to_string());
        }

        if self.site.lookup(url).map(|p| p.never_loads).unwrap_or(false) {
            tokio::time::sleep(page_load).await;
            return Err(Error::navigation_failed(format!(
                "{} did not finish loading within {:?}",
                url, page_load
            )));
        }

        self.with_state(|s| {
            s.url = url.to_string();
            s.loaded_at = Instant::now();
        })
    }

    async fn find_element(&self, locator: &Locator) -> Result<Lookup> {
        let implicit_wait = self.with_state(|s| s.timeouts.implicit_wait)?;
        let deadline = Instant::now() + implicit_wait;

        loop {
            if let Some(element) = self.attached(locator)? {
                return Ok(Lookup::Found(element.handle()));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Lookup::Absent);
            }
            tokio::time::sleep(MOCK_POLL.min(deadline - now)).await;
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let current = self
            .attached(&element.locator)?
            .filter(|e| !e.stale_on_click)
            .ok_or_else(|| {
                Error::stale_element(format!("{} is no longer attached", element.locator))
            })?;

        match current.attributes.get("href") {
            Some(href) => {
                let target = self.site.resolve(href);
                self.navigate(&target).await
            }
            None => Ok(()),
        }
    }

    async fn type_text(&self, element: &ElementHandle, _text: &str) -> Result<()> {
        self.attached(&element.locator)?
            .map(|_| ())
            .ok_or_else(|| {
                Error::stale_element(format!("{} is no longer attached", element.locator))
            })
    }

    async fn current_url(&self) -> Result<String> {
        self.with_state(|s| s.url.clone())
    }

    async fn page_source(&self) -> Result<String> {
        let url = self.with_state(|s| s.url.clone())?;
        if self.faults.page_source {
            return Err(Error::cdp("mock page source unavailable"));
        }
        Ok(self
            .site
            .lookup(&url)
            .map(|p| p.html.clone())
            .unwrap_or_else(|| "<html><body>Not Found</body></html>".to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.with_state(|_| ())?;
        if self.faults.screenshot {
            return Err(Error::cdp("mock screenshot failed"));
        }
        self.stats.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(MOCK_PNG.to_vec())
    }

    async fn ready_state(&self) -> Result<String> {
        let url = self.with_state(|s| s.url.clone())?;
        let loading = self.site.lookup(&url).map(|p| p.never_loads).unwrap_or(false);
        Ok(if loading { "loading" } else { "complete" }.to_string())
    }

    async fn set_timeouts(&self, timeouts: Timeouts) -> Result<()> {
        self.with_state(|s| s.timeouts = timeouts)?;
        if let Ok(mut last) = self.stats.last_timeouts.lock() {
            *last = Some(timeouts);
        }
        Ok(())
    }

    async fn timeouts(&self) -> Timeouts {
        self.state
            .lock()
            .map(|s| s.timeouts)
            .unwrap_or_default()
    }

    async fn maximize_window(&self) -> Result<()> {
        self.with_state(|_| ())?;
        if self.faults.maximize {
            return Err(Error::cdp("mock window manager unavailable"));
        }
        self.with_state(|s| s.window_state = WindowState::Maximized)?;
        self.stats.maximized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn window_state(&self) -> WindowState {
        self.state
            .lock()
            .map(|s| s.window_state)
            .unwrap_or(WindowState::Normal)
    }

    async fn quit(&self) -> Result<()> {
        let already_closed = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| Error::internal("mock session state poisoned"))?;
            std::mem::replace(&mut state.closed, true)
        };
        if already_closed {
            return Ok(());
        }

        self.stats.quit.fetch_add(1, Ordering::SeqCst);
        if self.faults.quit {
            return Err(Error::websocket("mock connection reset during quit"));
        }
        Ok(())
    }
}
