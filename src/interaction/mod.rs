//! Element interaction layer
//!
//! Every page object is built on [`ElementActions`].

pub mod wait;
pub mod actions;

pub use actions::ElementActions;
pub use wait::{ExplicitWait, WaitWindow};
