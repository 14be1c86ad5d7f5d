//! # Driver layer
//!
//! Bootstraps browser sessions and exposes them behind [`BrowserSession`].
//!
//! - `traits`: locators, element handles, the session and factory seams
//! - `scripts`: in-page JavaScript for element lookup
//! - `cdp_session`: session over one CDP page target
//! - `launcher`: starts a private Chromium-family process
//! - `factory`: [`ChromeDriverFactory`], attach-or-launch
//! - `mock`: scripted in-memory browser for tests

pub mod traits;
pub mod scripts;
pub mod cdp_session;
pub mod launcher;
pub mod factory;
pub mod mock;

pub use traits::{
    BoundingBox, BrowserKind, BrowserSession, DriverFactory, DriverOptions, ElementHandle,
    Locator, Lookup, Strategy, Timeouts, WindowState,
};

pub use cdp_session::CdpSession;
pub use factory::ChromeDriverFactory;
pub use launcher::LaunchedBrowser;
pub use mock::{MockDriverFactory, MockElement, MockPage, MockSession, MockSite, MockStats};
