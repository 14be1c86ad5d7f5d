//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for common operations.

use super::traits::*;
use super::types::*;
use crate::Error;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// CDP client over a single page target connection
#[derive(Debug, Clone)]
pub struct CdpClient {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClient {
    /// Create a new CDP client
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    /// Get the underlying connection
    pub fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    /// Call a raw CDP method, mapping protocol errors to [`Error::Cdp`]
    pub async fn call_method(&self, method: &str, params: Value) -> Result<Value, Error> {
        let response = self.connection.send_command(method, params).await?;

        if let Some(error) = response.error {
            return Err(Error::cdp(format!(
                "{} failed: {} (code {})",
                method, error.message, error.code
            )));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Enable a domain
    pub async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        self.call_method(&format!("{}.enable", domain), serde_json::json!({}))
            .await
            .map(|_| ())
    }

    /// Start a navigation. Does not wait for the load to finish.
    pub async fn navigate(&self, url: &str) -> Result<(), Error> {
        let params = serde_json::to_value(NavigateParams { url: url.to_string() })?;
        let result = self.call_method("Page.navigate", params).await?;

        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(Error::navigation_failed(format!("{}: {}", url, error_text)));
        }

        Ok(())
    }

    /// Evaluate JavaScript in the page and return its value.
    ///
    /// `undefined` and `null` both come back as [`Value::Null`].
    pub async fn evaluate(&self, script: &str) -> Result<Value, Error> {
        debug!("Evaluating script ({} bytes)", script.len());

        let params = serde_json::to_value(EvaluateParams {
            expression: script.to_string(),
            await_promise: true,
            return_by_value: true,
        })?;

        let result = self.call_method("Runtime.evaluate", params).await?;
        let response: EvaluateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse EvaluateResponse: {}", e)))?;

        if let Some(exception) = response.exception_details {
            return Err(Error::script_execution_failed(exception.describe()));
        }

        Ok(Self::remote_value(response.result))
    }

    fn remote_value(obj: RemoteObject) -> Value {
        match obj.r#type.as_str() {
            "undefined" => Value::Null,
            _ => obj.value.unwrap_or(Value::Null),
        }
    }

    /// Evaluate a script that must produce a string
    pub async fn evaluate_string(&self, script: &str) -> Result<String, Error> {
        match self.evaluate(script).await? {
            Value::String(s) => Ok(s),
            other => Err(Error::script_execution_failed(format!(
                "expected a string result, got {}",
                other
            ))),
        }
    }

    /// Capture a PNG screenshot of the viewport
    pub async fn screenshot(&self) -> Result<Vec<u8>, Error> {
        let params = serde_json::json!({ "format": "png" });
        let result = self.call_method("Page.captureScreenshot", params).await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No data in screenshot result"))?;

        BASE64
            .decode(data)
            .map_err(|e| Error::cdp(format!("Failed to decode screenshot: {}", e)))
    }

    /// Full page markup
    pub async fn get_content(&self) -> Result<String, Error> {
        self.evaluate_string("document.documentElement.outerHTML").await
    }
}
