//! Terminal classification of one test

use serde::Serialize;
use std::fmt;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed(String),
    Skipped(String),
}

impl TestOutcome {
    /// [`Error::Skipped`] skips, any other error fails
    pub fn from_result(result: &Result<()>) -> Self {
        match result {
            Ok(()) => TestOutcome::Passed,
            Err(Error::Skipped(reason)) => TestOutcome::Skipped(reason.clone()),
            Err(e) => TestOutcome::Failed(e.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestOutcome::Passed => "PASSED",
            TestOutcome::Failed(_) => "FAILED",
            TestOutcome::Skipped(_) => "SKIPPED",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "{}", self.label()),
            TestOutcome::Failed(reason) | TestOutcome::Skipped(reason) => {
                write!(f, "{}: {}", self.label(), reason)
            }
        }
    }
}
