//! Common test utilities
//!
//! Mock sites shaped like the marketing application, fast configurations and
//! a listener that records run events.

#![allow(dead_code)]

use oxide_e2e::config::HarnessConfig;
use oxide_e2e::driver::{Locator, MockElement, MockPage, MockSite};
use oxide_e2e::evidence::EvidenceArtifact;
use oxide_e2e::report::RunListener;
use std::path::Path;
use std::time::Duration;

pub const ORIGIN: &str = "http://localhost:3000";

pub const HEADING: Locator = Locator::css("h1");
pub const SIGNUP_CTA: Locator = Locator::css("a[href^=\"/auth/signup\"]");
pub const CONTACT_CTA: Locator = Locator::css("a[href=\"/contact\"]");
pub const PRICING_LINK: Locator = Locator::css("a[href=\"/pricing\"]");
pub const CONTACT_FORM: Locator = Locator::css("form");
pub const EMAIL_INPUT: Locator = Locator::css("input[type=\"email\"]");
pub const PASSWORD_INPUT: Locator = Locator::css("input[type=\"password\"]");
pub const ACCEPT_BUTTON: Locator = Locator::xpath("//button[contains(., 'Accept')]");

fn heading(text: &str) -> MockElement {
    MockElement::new(HEADING).tag("h1").text(text)
}

fn signup_cta(text: &str) -> MockElement {
    MockElement::new(SIGNUP_CTA).text(text).href("/auth/signup")
}

fn contact_cta(text: &str) -> MockElement {
    MockElement::new(CONTACT_CTA).text(text).href("/contact")
}

fn marketing_page(title: &str) -> MockPage {
    MockPage::new(title).with(heading(title))
}

/// Home page whose "Start Free Trial" control leads to `trial_href`
pub fn home_page(trial_href: &str) -> MockPage {
    marketing_page("Compliance, operationalized")
        .with(
            MockElement::new(SIGNUP_CTA)
                .text("Start Free Trial")
                .href(trial_href),
        )
        .with(contact_cta("Request Demo"))
        .with(MockElement::new(PRICING_LINK).text("Pricing").href("/pricing"))
}

/// Every route the suites visit, wired correctly
pub fn healthy_site() -> MockSite {
    site_with_home(home_page("/auth/signup"))
}

/// Home trial CTA mistakenly points at /contact
pub fn broken_trial_site() -> MockSite {
    site_with_home(home_page("/contact"))
}

fn site_with_home(home: MockPage) -> MockSite {
    MockSite::new(ORIGIN)
        .page("/", home)
        .page(
            "/pricing",
            marketing_page("Pricing")
                .with(signup_cta("Start Free"))
                .with(contact_cta("Contact Sales")),
        )
        .page(
            "/product",
            marketing_page("Product")
                .with(signup_cta("Get Started"))
                .with(contact_cta("Request Demo")),
        )
        .page("/industries", marketing_page("Industries").with(signup_cta("Start Free")))
        .page("/security", marketing_page("Security").with(signup_cta("Start Free")))
        .page(
            "/contact",
            MockPage::new("Contact")
                .html("<html><body><h1>Talk to sales</h1><form></form></body></html>")
                .with(MockElement::new(CONTACT_FORM).tag("form")),
        )
        .page(
            "/auth/signup",
            MockPage::new("Sign up")
                .with(MockElement::new(EMAIL_INPUT).tag("input"))
                .with(MockElement::new(PASSWORD_INPUT).tag("input")),
        )
}

/// Invitation page with the given heading
pub fn invite_page(title: &str) -> MockPage {
    MockPage::new(title).with(heading(title))
}

/// Usable invitation: heading plus an accept button
pub fn open_invite_page(title: &str) -> MockPage {
    invite_page(title).with(
        MockElement::new(ACCEPT_BUTTON)
            .tag("button")
            .text("Accept Invitation"),
    )
}

/// Config with short waits, writing evidence under `root`
pub fn fast_config(root: &Path) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.base_url = ORIGIN.to_string();
    config.implicit_wait = Duration::ZERO;
    config.explicit_wait = Duration::from_millis(300);
    config.page_load_timeout = Duration::from_secs(2);
    config.poll_interval = Duration::from_millis(20);
    config.test_timeout = Duration::from_secs(10);
    config.evidence_dir = root.join("test-results").join("screenshots");
    config
}

/// Files in `dir` with the given extension
pub fn files_with_extension(dir: &Path, extension: &str) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|x| x == extension).unwrap_or(false))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// Records every event as a short string
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<String>,
}

impl RunListener for RecordingListener {
    fn on_start(&mut self, total: usize) {
        self.events.push(format!("start:{}", total));
    }

    fn on_test_start(&mut self, name: &str) {
        self.events.push(format!("begin:{}", name));
    }

    fn on_test_pass(&mut self, name: &str) {
        self.events.push(format!("pass:{}", name));
    }

    fn on_test_fail(&mut self, name: &str, _reason: &str, artifact: Option<&EvidenceArtifact>) {
        let tag = if artifact.is_some() { "fail+evidence" } else { "fail" };
        self.events.push(format!("{}:{}", tag, name));
    }

    fn on_test_skip(&mut self, name: &str, _reason: &str) {
        self.events.push(format!("skip:{}", name));
    }

    fn on_finish(&mut self) {
        self.events.push("finish".to_string());
    }
}
