//! # Chrome DevTools Protocol (CDP) layer
//!
//! JSON-RPC over WebSocket to a Chromium page target, plus the HTTP discovery
//! endpoints used to open and close targets.
//!
//! ## Module structure
//! - `traits`: the connection seam and protocol-level result types
//! - `types`: wire types for requests, responses and discovery payloads
//! - `connection`: WebSocket connection with a background reader task
//! - `client`: typed helpers over a connection (evaluate, screenshot, ...)
//! - `browser`: HTTP discovery endpoint (`/json/version`, `/json/new`, `/json/close`)
//! - `mock`: scripted connection for tests
//!
//! ## Example
//! ```rust,no_run
//! use oxide_e2e::cdp::{CdpClient, CdpEndpoint, CdpWebSocketConnection};
//!
//! # async fn example() -> oxide_e2e::Result<()> {
//! let endpoint = CdpEndpoint::new("ws://localhost:9222");
//! let target = endpoint.new_target("about:blank").await?;
//! let connection = CdpWebSocketConnection::new(&target.web_socket_debugger_url).await?;
//! let client = CdpClient::new(connection);
//! let title = client.evaluate("document.title").await?;
//! println!("title: {}", title);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod mock;

pub use traits::{CdpConnection, CdpError, CdpResponse};

pub use browser::CdpEndpoint;
pub use client::CdpClient;
pub use connection::CdpWebSocketConnection;

pub use mock::MockCdpConnection;
