//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interface for CDP communication.

use async_trait::async_trait;
use serde_json::Value;

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a Chrome DevTools Protocol target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for its response
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}
