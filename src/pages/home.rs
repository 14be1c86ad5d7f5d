//! Marketing home page

use async_trait::async_trait;

use super::PageObject;
use crate::driver::Locator;
use crate::interaction::ElementActions;
use crate::Result;

const HERO_HEADING: Locator = Locator::css("h1");
const START_FREE_TRIAL: Locator = Locator::css("a[href^=\"/auth/signup\"]");
const REQUEST_DEMO: Locator = Locator::css("a[href=\"/contact\"]");
const PRICING_LINK: Locator = Locator::css("a[href=\"/pricing\"]");

#[derive(Debug, Clone, Copy)]
pub struct HomePage<'a> {
    actions: ElementActions<'a>,
}

impl<'a> HomePage<'a> {
    pub fn new(actions: ElementActions<'a>) -> Self {
        Self { actions }
    }

    /// Each CTA returns the `href` it followed
    pub async fn click_start_free_trial(&self) -> Result<Option<String>> {
        self.actions.follow_link(&START_FREE_TRIAL).await
    }

    pub async fn click_request_demo(&self) -> Result<Option<String>> {
        self.actions.follow_link(&REQUEST_DEMO).await
    }

    pub async fn navigate_to_pricing(&self) -> Result<Option<String>> {
        self.actions.follow_link(&PRICING_LINK).await
    }
}

#[async_trait]
impl PageObject for HomePage<'_> {
    fn path(&self) -> String {
        "/".to_string()
    }

    fn actions(&self) -> &ElementActions<'_> {
        &self.actions
    }

    async fn is_loaded(&self) -> bool {
        self.actions.is_displayed(&HERO_HEADING).await
    }
}
