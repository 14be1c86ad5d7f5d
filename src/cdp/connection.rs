//! CDP WebSocket connection implementation
//!
//! This module provides WebSocket-based connection to Chrome DevTools Protocol.

use super::traits::{CdpConnection, CdpError, CdpResponse};
use super::types::{CdpRequest, CdpRpcResponse};
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>;

/// CDP timeout configuration
#[derive(Debug, Clone)]
struct CdpTimeoutConfig {
    /// Default timeout for most commands (seconds)
    default_timeout_secs: u64,
    /// Timeout for screenshot commands (seconds)
    screenshot_timeout_secs: u64,
    /// Timeout for page navigation commands (seconds)
    navigation_timeout_secs: u64,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            screenshot_timeout_secs: 90,
            navigation_timeout_secs: 60,
        }
    }
}

impl CdpTimeoutConfig {
    /// Get timeout duration for a specific command method
    fn for_method(&self, method: &str) -> tokio::time::Duration {
        let secs = match method {
            "Page.captureScreenshot" => self.screenshot_timeout_secs,
            "Page.navigate" | "Page.reload" => self.navigation_timeout_secs,
            _ => self.default_timeout_secs,
        };
        tokio::time::Duration::from_secs(secs)
    }
}

/// CDP WebSocket connection implementation
///
/// Writes go through the split sink; a background task owns the read half and
/// routes each response to the command waiting on its id.
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the WebSocket
    sink: Mutex<Option<SplitSink<WsStream, Message>>>,
    /// Pending commands (ID -> response sender)
    pending: PendingMap,
    /// Next command ID
    next_id: AtomicU64,
    /// Is connection active
    is_active: Arc<AtomicBool>,
    /// Reader task
    reader: std::sync::Mutex<Option<JoinHandle<()>>>,
    /// Timeout configuration
    timeouts: CdpTimeoutConfig,
}

impl CdpWebSocketConnection {
    /// Connect to a target WebSocket
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn new<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to CDP target {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;

        let (sink, stream) = ws_stream.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let is_active = Arc::new(AtomicBool::new(true));

        let reader = tokio::spawn(Self::read_loop(
            stream,
            Arc::clone(&pending),
            Arc::clone(&is_active),
        ));

        Ok(Arc::new(Self {
            url,
            sink: Mutex::new(Some(sink)),
            pending,
            next_id: AtomicU64::new(1),
            is_active,
            reader: std::sync::Mutex::new(Some(reader)),
            timeouts: CdpTimeoutConfig::default(),
        }))
    }

    /// WebSocket URL of this connection
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn read_loop(
        mut stream: SplitStream<WsStream>,
        pending: PendingMap,
        is_active: Arc<AtomicBool>,
    ) {
        debug!("CDP reader started");

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => Self::dispatch(&text, &pending).await,
                Ok(Message::Close(_)) => {
                    info!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket read failed: {}", e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);
        // Dropping the senders wakes every waiter with a closed-channel error
        pending.lock().await.clear();
        debug!("CDP reader exited");
    }

    async fn dispatch(text: &str, pending: &PendingMap) {
        let response = match serde_json::from_str::<CdpRpcResponse>(text) {
            Ok(response) => response,
            Err(_) => {
                debug!("Ignoring CDP event: {}", text);
                return;
            }
        };

        let sender = pending.lock().await.remove(&response.id);
        match sender {
            Some(sender) => {
                let error = response.error.map(|e| CdpError {
                    code: e.code,
                    message: e.message,
                    data: e.data,
                });
                let id = response.id;
                let delivered = sender.send(CdpResponse {
                    id,
                    result: response.result,
                    error,
                });
                if delivered.is_err() {
                    debug!("Caller for command {} stopped waiting", id);
                }
            }
            None => warn!("Response for unknown command id {}", response.id),
        }
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    async fn send_command(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<CdpResponse, Error> {
        if !self.is_active() {
            return Err(Error::websocket(format!("Connection to {} is closed", self.url)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: Some(params),
        };
        let payload = serde_json::to_string(&request)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        debug!("CDP -> #{} {}", id, method);
        {
            let mut sink = self.sink.lock().await;
            let sink = sink
                .as_mut()
                .ok_or_else(|| Error::websocket("Connection is closed"))?;
            if let Err(e) = sink.send(Message::Text(payload)).await {
                self.pending.lock().await.remove(&id);
                return Err(Error::websocket(format!("Failed to send {}: {}", method, e)));
            }
        }

        match tokio::time::timeout(self.timeouts.for_method(method), rx).await {
            Ok(Ok(response)) => {
                debug!("CDP <- #{} {}", id, method);
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed while waiting for {}",
                method
            ))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(Error::cdp(format!("Command {} timed out", method)))
            }
        }
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            debug!("Connection to {} already closed", self.url);
        }

        if let Some(mut sink) = self.sink.lock().await.take() {
            if let Err(e) = sink.close().await {
                warn!("Failed to close WebSocket {}: {}", self.url, e);
            }
        }

        let reader = self
            .reader
            .lock()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .take();
        if let Some(handle) = reader {
            handle.abort();
        }

        self.pending.lock().await.clear();
        info!("Closed CDP connection {}", self.url);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
