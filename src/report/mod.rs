//! Run listener and summary reporter

use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

use crate::evidence::EvidenceArtifact;

/// Receives run events in chronological order
pub trait RunListener: Send {
    fn on_start(&mut self, total: usize);

    fn on_test_start(&mut self, name: &str);

    fn on_test_pass(&mut self, name: &str);

    fn on_test_fail(&mut self, name: &str, reason: &str, artifact: Option<&EvidenceArtifact>);

    fn on_test_skip(&mut self, name: &str, reason: &str);

    fn on_finish(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub name: String,
    pub reason: String,
    pub artifact: Option<EvidenceArtifact>,
}

/// Aggregate outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tests: {} passed, {} failed, {} skipped",
            self.total(),
            self.passed,
            self.failed,
            self.skipped
        )
    }
}

/// Counts outcomes for one run
///
/// State is reset at `on_start`. A test that starts and never reports is
/// counted as failed when the next test starts or the run finishes.
#[derive(Debug, Default)]
pub struct RunReporter {
    summary: RunSummary,
    in_flight: Option<String>,
    finished: bool,
}

impl RunReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary so far; final once `on_finish` ran
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn settle(&mut self, name: &str) {
        if self.in_flight.as_deref() == Some(name) {
            self.in_flight = None;
        }
    }

    fn fail_unreported(&mut self) {
        if let Some(name) = self.in_flight.take() {
            warn!("{} started but reported no outcome", name);
            self.summary.failed += 1;
            self.summary.failures.push(FailureRecord {
                name,
                reason: "no outcome reported".to_string(),
                artifact: None,
            });
        }
    }
}

impl RunListener for RunReporter {
    fn on_start(&mut self, total: usize) {
        self.summary = RunSummary::default();
        self.in_flight = None;
        self.finished = false;
        info!("Starting run of {} tests", total);
    }

    fn on_test_start(&mut self, name: &str) {
        self.fail_unreported();
        self.in_flight = Some(name.to_string());
        info!("▶ {}", name);
    }

    fn on_test_pass(&mut self, name: &str) {
        self.settle(name);
        self.summary.passed += 1;
        info!("✔ {} passed", name);
    }

    fn on_test_fail(&mut self, name: &str, reason: &str, artifact: Option<&EvidenceArtifact>) {
        self.settle(name);
        self.summary.failed += 1;
        match artifact.and_then(EvidenceArtifact::primary_path) {
            Some(path) => error!("✘ {} failed: {} (evidence: {})", name, reason, path.display()),
            None => error!("✘ {} failed: {}", name, reason),
        }
        self.summary.failures.push(FailureRecord {
            name: name.to_string(),
            reason: reason.to_string(),
            artifact: artifact.cloned(),
        });
    }

    fn on_test_skip(&mut self, name: &str, reason: &str) {
        self.settle(name);
        self.summary.skipped += 1;
        info!("↷ {} skipped: {}", name, reason);
    }

    fn on_finish(&mut self) {
        self.fail_unreported();
        self.finished = true;
        info!("{}", self.summary);
    }
}

/// Prints one line per outcome to stdout
#[derive(Debug, Default)]
pub struct ConsoleListener {
    started: Option<std::time::Instant>,
}

impl ConsoleListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunListener for ConsoleListener {
    fn on_start(&mut self, total: usize) {
        self.started = Some(std::time::Instant::now());
        println!("running {} tests", total);
    }

    fn on_test_start(&mut self, _name: &str) {}

    fn on_test_pass(&mut self, name: &str) {
        println!("test {} ... ok", name);
    }

    fn on_test_fail(&mut self, name: &str, reason: &str, artifact: Option<&EvidenceArtifact>) {
        println!("test {} ... FAILED", name);
        println!("    {}", reason);
        if let Some(artifact) = artifact {
            for path in [&artifact.screenshot_path, &artifact.dom_path].into_iter().flatten() {
                println!("    evidence: {}", path.display());
            }
        }
    }

    fn on_test_skip(&mut self, name: &str, reason: &str) {
        println!("test {} ... skipped ({})", name, reason);
    }

    fn on_finish(&mut self) {
        if let Some(started) = self.started.take() {
            println!("finished in {:.2}s", started.elapsed().as_secs_f64());
        }
    }
}
