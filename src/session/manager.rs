//! Per-test session acquisition and release

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::outcome::TestOutcome;
use crate::config::HarnessConfig;
use crate::driver::{BrowserSession, DriverFactory, DriverOptions, Timeouts};
use crate::evidence::{EvidenceArtifact, EvidenceCapture};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    CapturingEvidence,
    Closed,
}

/// A session owned by the lifecycle manager for one test
///
/// Page objects borrow it through [`ManagedSession::browser`] and never
/// close it themselves.
#[derive(Debug)]
pub struct ManagedSession {
    session: Arc<dyn BrowserSession>,
    state: SessionState,
    test_name: String,
    open: OpenSessions,
}

impl ManagedSession {
    pub fn browser(&self) -> &dyn BrowserSession {
        self.session.as_ref()
    }

    pub fn id(&self) -> &str {
        self.session.id()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }
}

impl Drop for ManagedSession {
    fn drop(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        warn!(
            "Session {} for {} dropped in state {:?}; releasing in background",
            self.session.id(),
            self.test_name,
            self.state
        );
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let session = Arc::clone(&self.session);
            let open = self.open.clone();
            handle.spawn(async move {
                if let Err(e) = session.quit().await {
                    warn!("Background release of {} failed: {}", session.id(), e);
                }
                open.remove(session.id());
            });
        }
    }
}

/// Sessions handed out and not yet released
#[derive(Debug, Clone, Default)]
struct OpenSessions(Arc<Mutex<HashMap<String, Arc<dyn BrowserSession>>>>);

impl OpenSessions {
    fn insert(&self, session: &Arc<dyn BrowserSession>) {
        if let Ok(mut open) = self.0.lock() {
            open.insert(session.id().to_string(), Arc::clone(session));
        }
    }

    fn remove(&self, id: &str) {
        if let Ok(mut open) = self.0.lock() {
            open.remove(id);
        }
    }

    fn drain(&self) -> Vec<Arc<dyn BrowserSession>> {
        self.0
            .lock()
            .map(|mut open| open.drain().map(|(_, session)| session).collect())
            .unwrap_or_default()
    }
}

/// Opens and closes the session around each test
pub struct SessionLifecycle {
    factory: Arc<dyn DriverFactory>,
    evidence: EvidenceCapture,
    open: OpenSessions,
}

impl SessionLifecycle {
    pub fn new(factory: Arc<dyn DriverFactory>, evidence: EvidenceCapture) -> Self {
        Self {
            factory,
            evidence,
            open: OpenSessions::default(),
        }
    }

    pub fn evidence(&self) -> &EvidenceCapture {
        &self.evidence
    }

    /// Obtain a configured session. Any failure here is fatal for the test.
    pub async fn begin_session(
        &self,
        config: &HarnessConfig,
        test_name: &str,
    ) -> Result<ManagedSession> {
        info!("Starting {} session for {}", config.browser, test_name);

        let options = DriverOptions::from_config(config);
        let session: Arc<dyn BrowserSession> = match self.factory.create(&options).await {
            Ok(session) => Arc::from(session),
            Err(e @ Error::SessionAcquisition(_)) => return Err(e),
            Err(e) => return Err(Error::session_acquisition(e.to_string())),
        };

        let timeouts = Timeouts {
            implicit_wait: config.implicit_wait,
            page_load: config.page_load_timeout,
        };
        if let Err(e) = session.set_timeouts(timeouts).await {
            if let Err(quit) = session.quit().await {
                warn!("Failed to release unusable session {}: {}", session.id(), quit);
            }
            return Err(Error::session_acquisition(format!(
                "failed to apply timeouts: {}",
                e
            )));
        }

        if let Err(e) = session.maximize_window().await {
            warn!("Could not maximize window for {}: {}", test_name, e);
        }

        debug!("Session {} active for {}", session.id(), test_name);
        self.open.insert(&session);
        Ok(ManagedSession {
            session,
            state: SessionState::Active,
            test_name: test_name.to_string(),
            open: self.open.clone(),
        })
    }

    /// Capture evidence if the test failed, then release the session.
    ///
    /// Release errors are logged only.
    pub async fn end_session(
        &self,
        mut managed: ManagedSession,
        outcome: &TestOutcome,
    ) -> Option<EvidenceArtifact> {
        let artifact = if outcome.is_failed() {
            managed.state = SessionState::CapturingEvidence;
            self.evidence
                .capture(managed.browser(), &managed.test_name)
                .await
        } else {
            None
        };

        match managed.session.quit().await {
            Ok(()) => debug!("Session {} closed", managed.id()),
            Err(e) => warn!("Failed to release session {}: {}", managed.id(), e),
        }
        managed.state = SessionState::Closed;
        self.open.remove(managed.id());

        artifact
    }

    /// Release every session still open, e.g. one abandoned by an interrupted
    /// run. Returns how many were released.
    pub async fn release_all(&self) -> usize {
        let sessions = self.open.drain();
        for session in &sessions {
            info!("Releasing abandoned session {}", session.id());
            if let Err(e) = session.quit().await {
                warn!("Failed to release session {}: {}", session.id(), e);
            }
        }
        sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockDriverFactory, MockPage, MockSite, WindowState};
    use std::time::Duration;

    fn site() -> MockSite {
        MockSite::new("http://localhost:3000").page("/", MockPage::new("Home"))
    }

    fn lifecycle(factory: MockDriverFactory, dir: &std::path::Path) -> SessionLifecycle {
        SessionLifecycle::new(Arc::new(factory), EvidenceCapture::new(dir))
    }

    #[tokio::test]
    async fn test_begin_applies_timeouts_and_maximizes() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockDriverFactory::new(site());
        let stats = factory.stats();
        let lifecycle = lifecycle(factory, dir.path());

        let managed = lifecycle
            .begin_session(&HarnessConfig::default(), "defaults")
            .await
            .unwrap();
        assert_eq!(managed.state(), SessionState::Active);
        assert_eq!(
            stats.last_timeouts().unwrap().implicit_wait,
            Duration::from_secs(10)
        );
        assert_eq!(managed.browser().window_state().await, WindowState::Maximized);

        lifecycle.end_session(managed, &TestOutcome::Passed).await;
        assert_eq!(stats.quit(), 1);
    }

    #[tokio::test]
    async fn test_acquisition_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let lifecycle = lifecycle(MockDriverFactory::new(site()).fail_create(), dir.path());

        let err = lifecycle
            .begin_session(&HarnessConfig::default(), "broken")
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_maximize_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let lifecycle = lifecycle(MockDriverFactory::new(site()).fail_maximize(), dir.path());

        let managed = lifecycle
            .begin_session(&HarnessConfig::default(), "small")
            .await
            .unwrap();
        assert_eq!(managed.browser().window_state().await, WindowState::Normal);
        lifecycle.end_session(managed, &TestOutcome::Passed).await;
    }

    #[tokio::test]
    async fn test_failed_outcome_captures_before_release() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockDriverFactory::new(site());
        let stats = factory.stats();
        let lifecycle = lifecycle(factory, dir.path());

        let managed = lifecycle
            .begin_session(&HarnessConfig::default(), "testFails")
            .await
            .unwrap();
        managed.browser().navigate("http://localhost:3000/").await.unwrap();

        let artifact = lifecycle
            .end_session(managed, &TestOutcome::Failed("boom".to_string()))
            .await
            .unwrap();
        assert!(artifact.is_complete());
        assert_eq!(stats.screenshots(), 1);
        assert_eq!(stats.quit(), 1);
    }

    #[tokio::test]
    async fn test_release_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockDriverFactory::new(site()).fail_quit();
        let stats = factory.stats();
        let lifecycle = lifecycle(factory, dir.path());

        let managed = lifecycle
            .begin_session(&HarnessConfig::default(), "quitFails")
            .await
            .unwrap();
        let artifact = lifecycle
            .end_session(managed, &TestOutcome::Skipped("later".to_string()))
            .await;
        assert!(artifact.is_none());
        assert_eq!(stats.quit(), 1);
    }
}
