//! # Session lifecycle
//!
//! Exactly one browser session per test: opened by
//! [`SessionLifecycle::begin_session`], closed by
//! [`SessionLifecycle::end_session`] whatever the outcome. Evidence is
//! captured on failure before the session goes away.
//!
//! ```text
//! begin_session -> Active -> (CapturingEvidence) -> Closed
//! ```

pub mod manager;
pub mod outcome;

pub use manager::{ManagedSession, SessionLifecycle, SessionState};
pub use outcome::TestOutcome;
