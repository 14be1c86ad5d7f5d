//! Mock CDP implementation for testing
//!
//! A connection whose replies come from a handler closure. Every command is
//! recorded so tests can assert on the protocol traffic.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::cdp::traits::*;
use crate::Error;

type Handler = dyn Fn(&str, &Value) -> Result<Value, CdpError> + Send + Sync;

/// Mock CDP connection
pub struct MockCdpConnection {
    handler: Box<Handler>,
    calls: Mutex<Vec<(String, Value)>>,
    is_active: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for MockCdpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCdpConnection")
            .field("is_active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl MockCdpConnection {
    /// Create a connection with canned replies for common methods
    pub fn new() -> Self {
        Self::with_handler(|method, _| Ok(default_reply(method)))
    }

    /// Create a connection answering through `handler`
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, CdpError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            is_active: Arc::new(AtomicBool::new(true)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Commands received so far, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Methods received so far, in order
    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Canned reply used by [`MockCdpConnection::new`]
pub fn default_reply(method: &str) -> Value {
    match method {
        "Page.navigate" => serde_json::json!({
            "frameId": uuid::Uuid::new_v4().to_string(),
            "loaderId": uuid::Uuid::new_v4().to_string(),
        }),
        "Runtime.evaluate" => serde_json::json!({
            "result": { "type": "string", "value": "complete" }
        }),
        "Page.captureScreenshot" => serde_json::json!({
            "data": "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg=="
        }),
        "Browser.getWindowForTarget" => serde_json::json!({ "windowId": 1 }),
        _ => serde_json::json!({}),
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is closed"));
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push((method.to_string(), params.clone()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response = match (self.handler)(method, &params) {
            Ok(result) => CdpResponse {
                id,
                result: Some(result),
                error: None,
            },
            Err(error) => CdpResponse {
                id,
                result: None,
                error: Some(error),
            },
        };

        Ok(response)
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_connection() {
        let conn = MockCdpConnection::new();
        assert!(conn.is_active());

        let response = conn
            .send_command("Runtime.evaluate", serde_json::json!({}))
            .await
            .unwrap();
        assert!(response.result.is_some());
        assert!(response.error.is_none());
        assert_eq!(conn.methods(), vec!["Runtime.evaluate".to_string()]);
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_commands() {
        let conn = MockCdpConnection::new();
        conn.close().await.unwrap();

        assert!(!conn.is_active());
        assert!(conn
            .send_command("Page.enable", serde_json::json!({}))
            .await
            .is_err());
    }
}
