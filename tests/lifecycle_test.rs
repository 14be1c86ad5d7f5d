//! Session lifecycle properties

mod common;

use common::*;
use oxide_e2e::config::{HarnessConfig, Settings};
use oxide_e2e::driver::{MockDriverFactory, WindowState};
use oxide_e2e::evidence::EvidenceCapture;
use oxide_e2e::session::{SessionLifecycle, SessionState, TestOutcome};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_missing_implicit_wait_key_configures_ten_seconds() {
    let settings = Settings::from_properties("browser=chrome\n");
    let config = HarnessConfig::from_settings(&settings).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let factory = MockDriverFactory::new(healthy_site());
    let stats = factory.stats();
    let lifecycle = SessionLifecycle::new(Arc::new(factory), EvidenceCapture::new(dir.path()));

    let managed = lifecycle.begin_session(&config, "defaults").await.unwrap();
    let timeouts = managed.browser().timeouts().await;
    assert_eq!(timeouts.implicit_wait, Duration::from_secs(10));
    assert_eq!(timeouts.page_load, Duration::from_secs(30));
    assert_eq!(stats.last_timeouts(), Some(timeouts));
    assert_eq!(managed.browser().window_state().await, WindowState::Maximized);

    lifecycle.end_session(managed, &TestOutcome::Passed).await;
}

#[tokio::test]
async fn test_evidence_only_for_failed_outcome() {
    let outcomes = [
        TestOutcome::Passed,
        TestOutcome::Skipped("not today".to_string()),
        TestOutcome::Failed("expected /auth/signup".to_string()),
    ];

    let root = tempfile::tempdir().unwrap();
    let config = fast_config(root.path());
    let factory = MockDriverFactory::new(healthy_site());
    let stats = factory.stats();
    let lifecycle = SessionLifecycle::new(
        Arc::new(factory),
        EvidenceCapture::new(config.evidence_dir.clone()),
    );

    let mut artifacts = Vec::new();
    for outcome in &outcomes {
        let managed = lifecycle.begin_session(&config, "property").await.unwrap();
        assert_eq!(managed.state(), SessionState::Active);
        managed.browser().navigate(&config.url("/pricing")).await.unwrap();
        artifacts.push(lifecycle.end_session(managed, outcome).await);
    }

    assert!(artifacts[0].is_none());
    assert!(artifacts[1].is_none());
    assert!(artifacts[2].as_ref().map(|a| a.is_complete()).unwrap_or(false));
    assert_eq!(files_with_extension(&config.evidence_dir, "png").len(), 1);
    assert_eq!((stats.created(), stats.quit()), (3, 3));
}

#[tokio::test]
async fn test_release_failure_does_not_mask_outcome() {
    let root = tempfile::tempdir().unwrap();
    let config = fast_config(root.path());
    let factory = MockDriverFactory::new(healthy_site()).fail_quit();
    let stats = factory.stats();
    let lifecycle = SessionLifecycle::new(
        Arc::new(factory),
        EvidenceCapture::new(config.evidence_dir.clone()),
    );

    let managed = lifecycle.begin_session(&config, "quitFails").await.unwrap();
    managed.browser().navigate(&config.url("/")).await.unwrap();
    let artifact = lifecycle
        .end_session(managed, &TestOutcome::Failed("boom".to_string()))
        .await;

    assert!(artifact.is_some());
    assert_eq!(stats.quit(), 1);
}

#[tokio::test]
async fn test_evidence_failure_still_releases_session() {
    let root = tempfile::tempdir().unwrap();
    let config = fast_config(root.path());
    let factory = MockDriverFactory::new(healthy_site())
        .fail_screenshot()
        .fail_page_source();
    let stats = factory.stats();
    let lifecycle = SessionLifecycle::new(
        Arc::new(factory),
        EvidenceCapture::new(config.evidence_dir.clone()),
    );

    let managed = lifecycle.begin_session(&config, "noEvidence").await.unwrap();
    let artifact = lifecycle
        .end_session(managed, &TestOutcome::Failed("boom".to_string()))
        .await;

    assert!(artifact.is_none());
    assert_eq!(stats.quit(), 1);
    assert!(files_with_extension(&config.evidence_dir, "png").is_empty());
}

#[tokio::test]
async fn test_dropped_session_is_released_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let factory = MockDriverFactory::new(healthy_site());
    let stats = factory.stats();
    let lifecycle = SessionLifecycle::new(Arc::new(factory), EvidenceCapture::new(dir.path()));

    let managed = lifecycle
        .begin_session(&HarnessConfig::default(), "abandoned")
        .await
        .unwrap();
    drop(managed);

    for _ in 0..10 {
        if stats.quit() == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(stats.quit(), 1);
}

#[tokio::test]
async fn test_release_all_closes_only_open_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let factory = MockDriverFactory::new(healthy_site());
    let stats = factory.stats();
    let lifecycle = SessionLifecycle::new(Arc::new(factory), EvidenceCapture::new(dir.path()));
    let config = HarnessConfig::default();

    let finished = lifecycle.begin_session(&config, "finished").await.unwrap();
    lifecycle.end_session(finished, &TestOutcome::Passed).await;
    let _abandoned = lifecycle.begin_session(&config, "abandoned").await.unwrap();

    assert_eq!(lifecycle.release_all().await, 1);
    assert_eq!(stats.quit(), 2);
    assert_eq!(lifecycle.release_all().await, 0);
}
