//! Oxide-E2E: browser-driven end-to-end test harness
//!
//! Drives a Chromium-family browser over the Chrome DevTools Protocol against
//! a deployed web application, one session per test, and keeps a screenshot
//! plus DOM snapshot for every failure.

pub mod error;
pub mod config;

pub mod cdp;
pub mod driver;
pub mod interaction;
pub mod pages;
pub mod session;
pub mod evidence;
pub mod report;
pub mod runner;
pub mod suites;

// Re-exports
pub use config::{HarnessConfig, Settings};
pub use driver::{BrowserSession, DriverFactory, Locator, Lookup};
pub use error::{Error, Result};
pub use report::{RunListener, RunReporter, RunSummary};
pub use runner::{Harness, TestCase, TestContext};
pub use session::TestOutcome;

/// Oxide-E2E library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
