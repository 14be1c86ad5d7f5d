//! Wait-bound properties of the interaction layer, on virtual time
//!
//! Sessions come from the lifecycle manager with default configuration, so
//! the 10s implicit wait and 20s explicit wait are both in play.

mod common;

use common::*;
use oxide_e2e::config::HarnessConfig;
use oxide_e2e::driver::{Locator, MockDriverFactory, MockElement, MockPage, MockSite};
use oxide_e2e::evidence::EvidenceCapture;
use oxide_e2e::interaction::ElementActions;
use oxide_e2e::pages::PageObject;
use oxide_e2e::session::{ManagedSession, SessionLifecycle, TestOutcome};
use oxide_e2e::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const ERROR_BANNER: Locator = Locator::css("[role=\"alert\"]");
const MISSING: Locator = Locator::id("does-not-exist");

async fn open(site: MockSite) -> (SessionLifecycle, ManagedSession) {
    let lifecycle = SessionLifecycle::new(
        Arc::new(MockDriverFactory::new(site)),
        EvidenceCapture::new("unused-evidence"),
    );
    let managed = lifecycle
        .begin_session(&HarnessConfig::default(), "interaction")
        .await
        .unwrap();
    managed.browser().navigate(ORIGIN).await.unwrap();
    (lifecycle, managed)
}

#[tokio::test(start_paused = true)]
async fn test_is_displayed_on_absent_locator_is_false_and_bounded() {
    let (lifecycle, managed) = open(healthy_site()).await;
    let config = HarnessConfig::default();
    let actions = ElementActions::new(managed.browser(), &config);

    let start = Instant::now();
    assert!(!actions.is_displayed(&MISSING).await);
    let elapsed = start.elapsed();
    assert!(elapsed >= config.explicit_wait);
    assert!(elapsed <= config.explicit_wait + config.implicit_wait);

    lifecycle.end_session(managed, &TestOutcome::Passed).await;
}

#[tokio::test(start_paused = true)]
async fn test_click_on_absent_locator_waits_full_explicit_wait() {
    let (lifecycle, managed) = open(healthy_site()).await;
    let config = HarnessConfig::default();
    let actions = ElementActions::new(managed.browser(), &config);

    let start = Instant::now();
    let err = actions.click(&MISSING).await.unwrap_err();
    assert!(matches!(err, Error::ElementNotFound(_)), "{:?}", err);
    assert!(start.elapsed() >= Duration::from_secs(20));

    lifecycle.end_session(managed, &TestOutcome::Passed).await;
}

#[tokio::test(start_paused = true)]
async fn test_error_banner_appearing_late_is_seen() {
    let site = MockSite::new(ORIGIN).page(
        "/",
        MockPage::new("Form").with(
            MockElement::new(ERROR_BANNER)
                .tag("div")
                .text("Something went wrong")
                .appears_after(Duration::from_secs(15)),
        ),
    );
    let (lifecycle, managed) = open(site).await;
    let config = HarnessConfig::default();
    let actions = ElementActions::new(managed.browser(), &config);

    assert!(!actions.is_displayed_now(&ERROR_BANNER).await);
    assert!(actions.is_displayed(&ERROR_BANNER).await);
    assert_eq!(
        actions.read_text(&ERROR_BANNER).await.unwrap(),
        "Something went wrong"
    );

    lifecycle.end_session(managed, &TestOutcome::Passed).await;
}

#[tokio::test(start_paused = true)]
async fn test_page_that_never_loads_fails_navigation() {
    let site = healthy_site().page("/slow", MockPage::new("Slow").never_loads());
    let (lifecycle, managed) = open(site).await;

    let start = Instant::now();
    let err = managed
        .browser()
        .navigate("http://localhost:3000/slow")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NavigationFailed(_)));
    assert!(start.elapsed() >= Duration::from_secs(30));

    lifecycle.end_session(managed, &TestOutcome::Passed).await;
}

#[tokio::test(start_paused = true)]
async fn test_signup_page_accepts_credentials() {
    let (lifecycle, managed) = open(healthy_site()).await;
    let config = HarnessConfig::default();
    let actions = ElementActions::new(managed.browser(), &config);
    let signup = oxide_e2e::pages::SignupPage::new(actions);

    signup.open().await.unwrap();
    assert!(signup.is_loaded().await);
    signup
        .enter_credentials("qa@example.com", "correct horse battery staple")
        .await
        .unwrap();

    lifecycle.end_session(managed, &TestOutcome::Passed).await;
}
