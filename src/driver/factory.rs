//! Chromium-family driver factory

use async_trait::async_trait;
use tracing::{info, warn};

use super::cdp_session::CdpSession;
use super::launcher::{self, LaunchedBrowser};
use super::traits::*;
use crate::cdp::{CdpClient, CdpEndpoint, CdpWebSocketConnection};
use crate::{Error, Result};

/// Creates [`CdpSession`]s, either attaching to a running browser or
/// launching a private one per session
#[derive(Debug, Default, Clone)]
pub struct ChromeDriverFactory;

impl ChromeDriverFactory {
    pub fn new() -> Self {
        Self
    }

    async fn discard_target(endpoint: &CdpEndpoint, target_id: &str) {
        if let Err(e) = endpoint.close_target(target_id).await {
            warn!("Failed to close half-open target {}: {}", target_id, e);
        }
    }

    async fn attach(
        endpoint: CdpEndpoint,
        options: &DriverOptions,
        process: Option<LaunchedBrowser>,
    ) -> std::result::Result<CdpSession, (Error, Option<LaunchedBrowser>)> {
        let target = match endpoint.new_target("about:blank").await {
            Ok(target) => target,
            Err(e) => return Err((e, process)),
        };

        let connection = match CdpWebSocketConnection::new(&target.web_socket_debugger_url).await {
            Ok(connection) => connection,
            Err(e) => {
                Self::discard_target(&endpoint, &target.id).await;
                return Err((e, process));
            }
        };
        let client = CdpClient::new(connection);

        for domain in ["Page", "Runtime"] {
            if let Err(e) = client.enable_domain(domain).await {
                Self::discard_target(&endpoint, &target.id).await;
                return Err((e, process));
            }
        }

        Ok(CdpSession::new(client, endpoint, target.id, options, process))
    }
}

#[async_trait]
impl DriverFactory for ChromeDriverFactory {
    async fn create(&self, options: &DriverOptions) -> Result<Box<dyn BrowserSession>> {
        let kind: BrowserKind = options.browser.parse()?;
        if kind == BrowserKind::Firefox {
            return Err(Error::session_acquisition(
                "firefox has no DevTools protocol backend; use chrome, chromium or edge",
            ));
        }

        let (endpoint, process) = match &options.cdp_endpoint {
            Some(url) => {
                info!("Attaching to browser at {}", url);
                (CdpEndpoint::new(url.as_str()), None)
            }
            None => {
                let launched = launcher::launch(kind, options).await?;
                (CdpEndpoint::local(launched.port()), Some(launched))
            }
        };

        match Self::attach(endpoint, options, process).await {
            Ok(session) => {
                info!("Session {} ready on target {}", session.id(), session.target_id());
                Ok(Box::new(session))
            }
            Err((e, process)) => {
                if let Some(process) = process {
                    if let Err(shutdown) = process.shutdown().await {
                        warn!("Failed to shut down browser after setup error: {}", shutdown);
                    }
                }
                Err(Error::session_acquisition(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal `/json/*` endpoint whose targets point at a dead websocket.
    /// Returns the base URL and the request lines it has seen.
    async fn dead_socket_endpoint() -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let line = request.lines().next().unwrap_or_default().to_string();
                log.lock().unwrap().push(line.clone());

                let body = if line.contains("/json/new") {
                    concat!(
                        r#"{"id":"T1","type":"page","#,
                        r#""webSocketDebuggerUrl":"ws://127.0.0.1:1/devtools/page/T1"}"#
                    )
                } else {
                    "Target is closing"
                };
                let reply = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(reply.as_bytes()).await;
            }
        });

        (base, seen)
    }

    #[tokio::test]
    async fn test_firefox_is_rejected() {
        let mut config = HarnessConfig::default();
        config.browser = "firefox".to_string();

        let err = ChromeDriverFactory::new()
            .create(&DriverOptions::from_config(&config))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionAcquisition(ref msg) if msg.contains("firefox")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_acquisition_error() {
        let mut config = HarnessConfig::default();
        config.cdp_endpoint = Some("ws://127.0.0.1:1".to_string());

        let err = ChromeDriverFactory::new()
            .create(&DriverOptions::from_config(&config))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionAcquisition(_)));
    }

    #[tokio::test]
    async fn test_target_is_closed_when_websocket_fails() {
        let (base, seen) = dead_socket_endpoint().await;
        let mut config = HarnessConfig::default();
        config.cdp_endpoint = Some(base);

        let err = ChromeDriverFactory::new()
            .create(&DriverOptions::from_config(&config))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionAcquisition(_)));

        let seen = seen.lock().unwrap().clone();
        assert!(seen[0].starts_with("PUT /json/new"), "{:?}", seen);
        assert!(seen.iter().any(|line| line.starts_with("GET /json/close/T1")), "{:?}", seen);
    }
}
