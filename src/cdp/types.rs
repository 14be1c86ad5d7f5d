//! CDP (Chrome DevTools Protocol) type definitions
//!
//! This module defines the wire structures for CDP communication.

use serde::{Deserialize, Serialize};

/// CDP JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Request ID
    pub id: u64,
    /// Method name (e.g., "Page.navigate")
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// CDP JSON-RPC response
///
/// Events carry no `id`, so they fail to parse as a response and are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error if any
    #[serde(default)]
    pub error: Option<CdpErrorDetail>,
}

/// CDP error detail
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorDetail {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Page navigation parameters
#[derive(Debug, Clone, Serialize)]
pub struct NavigateParams {
    /// URL to navigate to
    pub url: String,
}

/// Runtime.evaluate parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// JavaScript expression
    pub expression: String,
    /// Await a returned promise
    pub await_promise: bool,
    /// Return the value itself instead of a remote handle
    pub return_by_value: bool,
}

/// Runtime remote object
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type ("string", "number", "object", "undefined", ...)
    pub r#type: String,
    /// Object subtype ("null", "array", ...)
    #[serde(default)]
    pub subtype: Option<String>,
    /// Value when returned by value
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

/// Runtime.evaluate response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// Evaluation result
    pub result: RemoteObject,
    /// Present when the expression threw
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// Exception raised during evaluation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Short message
    #[serde(default)]
    pub text: String,
    /// Thrown value
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Best available description of the exception
    pub fn describe(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or_else(|| self.text.clone())
    }
}

/// Target descriptor returned by `/json/new` and `/json/list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
    /// Target ID
    pub id: String,
    /// Target type ("page", "service_worker", ...)
    #[serde(rename = "type", default)]
    pub target_type: String,
    /// Current URL
    #[serde(default)]
    pub url: String,
    /// WebSocket URL for this target
    #[serde(default)]
    pub web_socket_debugger_url: String,
}
