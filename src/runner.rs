//! Sequential test runner
//!
//! Each test gets its own session. The body runs under `test.timeout` with
//! panics caught, and teardown runs on every exit path.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::debug;

use crate::config::{self, HarnessConfig};
use crate::driver::{BrowserSession, DriverFactory};
use crate::evidence::{EvidenceArtifact, EvidenceCapture};
use crate::interaction::ElementActions;
use crate::pages::*;
use crate::report::{RunListener, RunReporter, RunSummary};
use crate::session::{ManagedSession, SessionLifecycle, TestOutcome};
use crate::{Error, Result};

/// One end-to-end test
#[async_trait]
pub trait TestCase: Send + Sync {
    fn name(&self) -> &str;

    /// Return [`Error::Skipped`] to skip
    async fn run(&self, ctx: &TestContext<'_>) -> Result<()>;
}

/// What a test body can reach
#[derive(Debug, Clone, Copy)]
pub struct TestContext<'a> {
    session: &'a dyn BrowserSession,
    config: &'a HarnessConfig,
}

impl<'a> TestContext<'a> {
    pub fn new(session: &'a dyn BrowserSession, config: &'a HarnessConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &'a dyn BrowserSession {
        self.session
    }

    pub fn config(&self) -> &'a HarnessConfig {
        self.config
    }

    pub fn actions(&self) -> ElementActions<'a> {
        ElementActions::new(self.session, self.config)
    }

    pub fn home(&self) -> HomePage<'a> {
        HomePage::new(self.actions())
    }

    pub fn pricing(&self) -> PricingPage<'a> {
        PricingPage::new(self.actions())
    }

    pub fn product(&self) -> ProductPage<'a> {
        ProductPage::new(self.actions())
    }

    pub fn industries(&self) -> IndustriesPage<'a> {
        IndustriesPage::new(self.actions())
    }

    pub fn security(&self) -> SecurityPage<'a> {
        SecurityPage::new(self.actions())
    }

    pub fn contact(&self) -> ContactPage<'a> {
        ContactPage::new(self.actions())
    }

    pub fn signup(&self) -> SignupPage<'a> {
        SignupPage::new(self.actions())
    }

    pub fn accept_invite<S: Into<String>>(&self, token: S) -> AcceptInvitePage<'a> {
        AcceptInvitePage::new(self.actions(), token)
    }

    /// Out-of-band secret; absence fails the test
    pub fn require_env(&self, name: &str) -> Result<String> {
        config::require_env(name)
    }
}

/// Fail with `message` unless `condition` holds
pub fn ensure<S: Into<String>>(condition: bool, message: S) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::assertion(message))
    }
}

/// Forwards every event to the run-scoped reporter and the caller's listener
struct Broadcast<'a> {
    reporter: RunReporter,
    listener: &'a mut dyn RunListener,
}

impl RunListener for Broadcast<'_> {
    fn on_start(&mut self, total: usize) {
        self.reporter.on_start(total);
        self.listener.on_start(total);
    }

    fn on_test_start(&mut self, name: &str) {
        self.reporter.on_test_start(name);
        self.listener.on_test_start(name);
    }

    fn on_test_pass(&mut self, name: &str) {
        self.reporter.on_test_pass(name);
        self.listener.on_test_pass(name);
    }

    fn on_test_fail(&mut self, name: &str, reason: &str, artifact: Option<&EvidenceArtifact>) {
        self.reporter.on_test_fail(name, reason, artifact);
        self.listener.on_test_fail(name, reason, artifact);
    }

    fn on_test_skip(&mut self, name: &str, reason: &str) {
        self.reporter.on_test_skip(name, reason);
        self.listener.on_test_skip(name, reason);
    }

    fn on_finish(&mut self) {
        self.reporter.on_finish();
        self.listener.on_finish();
    }
}

/// Runs tests one after another against a fixed configuration
pub struct Harness {
    config: HarnessConfig,
    lifecycle: SessionLifecycle,
}

impl Harness {
    pub fn new(config: HarnessConfig, factory: Arc<dyn DriverFactory>) -> Self {
        let evidence = EvidenceCapture::new(config.evidence_dir.clone());
        Self {
            config,
            lifecycle: SessionLifecycle::new(factory, evidence),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Release sessions left open by an abandoned run
    pub async fn shutdown(&self) -> usize {
        self.lifecycle.release_all().await
    }

    /// Run every test in order and return the aggregate
    pub async fn run_all(
        &self,
        tests: &[Box<dyn TestCase>],
        listener: &mut dyn RunListener,
    ) -> RunSummary {
        let mut events = Broadcast {
            reporter: RunReporter::new(),
            listener,
        };

        events.on_start(tests.len());
        for test in tests {
            self.run_one(test.as_ref(), &mut events).await;
        }
        events.on_finish();

        events.reporter.summary().clone()
    }

    /// Run a single test with its own session
    pub async fn run_one(
        &self,
        test: &dyn TestCase,
        listener: &mut dyn RunListener,
    ) -> TestOutcome {
        let name = test.name();
        listener.on_test_start(name);

        let managed = match self.lifecycle.begin_session(&self.config, name).await {
            Ok(managed) => managed,
            Err(e) => {
                let reason = e.to_string();
                listener.on_test_fail(name, &reason, None);
                return TestOutcome::Failed(reason);
            }
        };

        let result = self.execute(test, &managed).await;
        let outcome = TestOutcome::from_result(&result);
        debug!("{} finished: {}", name, outcome);

        let artifact = self.lifecycle.end_session(managed, &outcome).await;

        match &outcome {
            TestOutcome::Passed => listener.on_test_pass(name),
            TestOutcome::Failed(reason) => listener.on_test_fail(name, reason, artifact.as_ref()),
            TestOutcome::Skipped(reason) => listener.on_test_skip(name, reason),
        }
        outcome
    }

    async fn execute(&self, test: &dyn TestCase, managed: &ManagedSession) -> Result<()> {
        let ctx = TestContext::new(managed.browser(), &self.config);
        let body = AssertUnwindSafe(test.run(&ctx)).catch_unwind();

        match tokio::time::timeout(self.config.test_timeout, body).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(Error::internal(format!(
                "test panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Err(_) => Err(Error::test_timeout(format!(
                "timed out after {:?}",
                self.config.test_timeout
            ))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Keep tests whose name contains `filter`
pub fn select(tests: Vec<Box<dyn TestCase>>, filter: Option<&str>) -> Vec<Box<dyn TestCase>> {
    match filter {
        Some(filter) => tests
            .into_iter()
            .filter(|t| t.name().contains(filter))
            .collect(),
        None => tests,
    }
}
