//! CDP HTTP discovery endpoint
//!
//! Opens and closes page targets through the browser's `/json/*` HTTP API.

use super::types::TargetDescriptor;
use crate::Error;
use tracing::{debug, info};

/// Browser-level DevTools endpoint
#[derive(Debug, Clone)]
pub struct CdpEndpoint {
    /// HTTP base of the endpoint (e.g., "http://localhost:9222")
    http_base: String,
    http: reqwest::Client,
}

impl CdpEndpoint {
    /// Create a new endpoint handle
    ///
    /// # Arguments
    /// * `endpoint` - `ws://`, `wss://`, `http://` or bare `host:port`
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let http_base = Self::http_base(&endpoint.into());
        info!("Using CDP endpoint {}", http_base);
        Self {
            http_base,
            http: reqwest::Client::new(),
        }
    }

    /// HTTP endpoint for a local port
    pub fn local(port: u16) -> Self {
        Self::new(format!("http://127.0.0.1:{}", port))
    }

    fn http_base(endpoint: &str) -> String {
        let endpoint = endpoint.trim_end_matches('/');
        let converted = if let Some(rest) = endpoint.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else if let Some(rest) = endpoint.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        // A browser-level ws URL carries a /devtools/browser/<id> path; keep only the origin
        match converted.find("/devtools/") {
            Some(idx) => converted[..idx].to_string(),
            None => converted,
        }
    }

    /// HTTP base URL
    pub fn base_url(&self) -> &str {
        &self.http_base
    }

    /// Open a new page target
    pub async fn new_target(&self, url: &str) -> Result<TargetDescriptor, Error> {
        let new_url = format!("{}/json/new?{}", self.http_base, url);
        debug!("Creating new page via {}", new_url);

        let target: TargetDescriptor = self
            .http
            .put(&new_url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Failed to create target via {}: {}", new_url, e)))?
            .error_for_status()?
            .json()
            .await?;

        if target.web_socket_debugger_url.is_empty() {
            return Err(Error::http("No webSocketDebuggerUrl in new target response"));
        }

        info!("Created target {}", target.id);
        Ok(target)
    }

    /// Close a page target
    pub async fn close_target(&self, target_id: &str) -> Result<(), Error> {
        let url = format!("{}/json/close/{}", self.http_base, target_id);
        debug!("Closing target via {}", url);

        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Failed to close target {}: {}", target_id, e)))?
            .error_for_status()?;

        Ok(())
    }
}
