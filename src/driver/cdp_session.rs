//! Browser session over the Chrome DevTools Protocol

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::launcher::LaunchedBrowser;
use super::scripts::{self, LocateAction, LocateResult};
use super::traits::*;
use crate::cdp::{CdpClient, CdpEndpoint};
use crate::{Error, Result};

#[derive(Debug)]
struct SessionSettings {
    timeouts: Timeouts,
    window_state: WindowState,
}

/// [`BrowserSession`] backed by one CDP page target
#[derive(Debug)]
pub struct CdpSession {
    id: String,
    client: CdpClient,
    endpoint: CdpEndpoint,
    target_id: String,
    headless: bool,
    window_size: (u32, u32),
    poll_interval: Duration,
    settings: Mutex<SessionSettings>,
    closed: AtomicBool,
    process: tokio::sync::Mutex<Option<LaunchedBrowser>>,
}

impl CdpSession {
    pub fn new(
        client: CdpClient,
        endpoint: CdpEndpoint,
        target_id: String,
        options: &DriverOptions,
        process: Option<LaunchedBrowser>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            client,
            endpoint,
            target_id,
            headless: options.headless,
            window_size: (options.window_width, options.window_height),
            poll_interval: options.poll_interval,
            settings: Mutex::new(SessionSettings {
                timeouts: Timeouts::default(),
                window_state: WindowState::Normal,
            }),
            closed: AtomicBool::new(false),
            process: tokio::sync::Mutex::new(process),
        }
    }

    /// Page target this session drives
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::session_closed(&self.id));
        }
        Ok(())
    }

    fn current_timeouts(&self) -> Timeouts {
        self.settings
            .lock()
            .map(|s| s.timeouts)
            .unwrap_or_default()
    }

    fn set_window_state(&self, state: WindowState) {
        if let Ok(mut settings) = self.settings.lock() {
            settings.window_state = state;
        }
    }

    async fn locate(
        &self,
        locator: &Locator,
        action: LocateAction,
    ) -> Result<Option<ElementHandle>> {
        let value = self.client.evaluate(&scripts::locate(locator, action)).await?;
        let result: LocateResult = serde_json::from_value(value).map_err(|e| {
            Error::script_execution_failed(format!(
                "unexpected locate result for {}: {}",
                locator, e
            ))
        })?;
        Ok(result.into_handle(locator))
    }

    async fn wait_for_load(&self, url: &str, page_load: Duration) -> Result<()> {
        let deadline = Instant::now() + page_load;
        loop {
            match self.client.evaluate_string(scripts::READY_STATE).await {
                Ok(state) if state == "complete" => return Ok(()),
                Ok(state) => debug!("readyState is {} for {}", state, url),
                // Evaluation can race the document swap
                Err(e) if e.is_transient() => debug!("readyState check failed: {}", e),
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(Error::navigation_failed(format!(
                    "{} did not finish loading within {:?}",
                    url, page_load
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn dispatch_click(&self, x: f64, y: f64) -> Result<()> {
        self.client
            .call_method(
                "Input.dispatchMouseEvent",
                json!({ "type": "mouseMoved", "x": x, "y": y }),
            )
            .await?;

        for kind in ["mousePressed", "mouseReleased"] {
            self.client
                .call_method(
                    "Input.dispatchMouseEvent",
                    json!({
                        "type": kind,
                        "x": x,
                        "y": y,
                        "button": "left",
                        "clickCount": 1,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    async fn emulate_window_size(&self) -> Result<()> {
        let (width, height) = self.window_size;
        self.client
            .call_method(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": width,
                    "height": height,
                    "deviceScaleFactor": 1,
                    "mobile": false,
                }),
            )
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl BrowserSession for CdpSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        info!("Navigating to {}", url);

        let page_load = self.current_timeouts().page_load;
        match tokio::time::timeout(page_load, self.client.navigate(url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::navigation_failed(format!(
                    "{} did not respond within {:?}",
                    url, page_load
                )))
            }
        }

        self.wait_for_load(url, page_load).await
    }

    async fn find_element(&self, locator: &Locator) -> Result<Lookup> {
        self.ensure_open()?;
        let implicit_wait = self.current_timeouts().implicit_wait;
        let deadline = Instant::now() + implicit_wait;

        // Only an error that every attempt hit is reported
        let mut answered = false;
        let mut last_error = None;

        loop {
            match self.locate(locator, LocateAction::Probe).await {
                Ok(Some(element)) => return Ok(Lookup::Found(element)),
                Ok(None) => answered = true,
                Err(e) if e.is_transient() => {
                    debug!("Lookup of {} failed, retrying: {}", locator, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return match last_error {
                    Some(e) if !answered => Err(e),
                    _ => {
                        debug!("No element for {} after {:?}", locator, implicit_wait);
                        Ok(Lookup::Absent)
                    }
                };
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        self.ensure_open()?;
        let current = self
            .locate(&element.locator, LocateAction::Scroll)
            .await?
            .ok_or_else(|| {
                Error::stale_element(format!("{} is no longer attached", element.locator))
            })?;

        let (x, y) = current.bounds.center();
        debug!("Clicking {} at ({}, {})", element.locator, x, y);
        self.dispatch_click(x, y).await
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.locate(&element.locator, LocateAction::Focus)
            .await?
            .ok_or_else(|| {
                Error::stale_element(format!("{} is no longer attached", element.locator))
            })?;

        self.client
            .call_method("Input.insertText", json!({ "text": text }))
            .await
            .map(|_| ())
    }

    async fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        self.client.evaluate_string(scripts::CURRENT_URL).await
    }

    async fn page_source(&self) -> Result<String> {
        self.ensure_open()?;
        self.client.get_content().await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        self.client.screenshot().await
    }

    async fn ready_state(&self) -> Result<String> {
        self.ensure_open()?;
        self.client.evaluate_string(scripts::READY_STATE).await
    }

    async fn set_timeouts(&self, timeouts: Timeouts) -> Result<()> {
        self.ensure_open()?;
        let mut settings = self
            .settings
            .lock()
            .map_err(|_| Error::internal("session settings lock poisoned"))?;
        settings.timeouts = timeouts;
        Ok(())
    }

    async fn timeouts(&self) -> Timeouts {
        self.current_timeouts()
    }

    async fn maximize_window(&self) -> Result<()> {
        self.ensure_open()?;

        if self.headless {
            // No window manager; size the viewport instead
            self.emulate_window_size().await?;
            self.set_window_state(WindowState::Maximized);
            return Ok(());
        }

        let window = self
            .client
            .call_method(
                "Browser.getWindowForTarget",
                json!({ "targetId": self.target_id }),
            )
            .await;

        let maximized = match window {
            Ok(window) => match window.get("windowId").and_then(|v| v.as_i64()) {
                Some(window_id) => self
                    .client
                    .call_method(
                        "Browser.setWindowBounds",
                        json!({
                            "windowId": window_id,
                            "bounds": { "windowState": "maximized" },
                        }),
                    )
                    .await
                    .map(|_| ()),
                None => Err(Error::cdp("no windowId for target")),
            },
            Err(e) => Err(e),
        };

        if let Err(e) = maximized {
            warn!("Window maximize failed ({}), emulating window size", e);
            self.emulate_window_size().await?;
        }

        self.set_window_state(WindowState::Maximized);
        Ok(())
    }

    async fn window_state(&self) -> WindowState {
        self.settings
            .lock()
            .map(|s| s.window_state)
            .unwrap_or(WindowState::Normal)
    }

    async fn quit(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("Session {} already closed", self.id);
            return Ok(());
        }
        info!("Closing session {}", self.id);

        let mut first_error = None;

        if let Err(e) = self.endpoint.close_target(&self.target_id).await {
            warn!("Failed to close target {}: {}", self.target_id, e);
            first_error.get_or_insert(e);
        }

        if let Err(e) = self.client.connection().close().await {
            warn!("Failed to close CDP connection: {}", e);
            first_error.get_or_insert(e);
        }

        if let Some(process) = self.process.lock().await.take() {
            if let Err(e) = process.shutdown().await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
