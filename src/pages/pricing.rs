//! Pricing page

use async_trait::async_trait;

use super::PageObject;
use crate::driver::Locator;
use crate::interaction::ElementActions;
use crate::Result;

const PLANS_HEADING: Locator = Locator::css("h1");
const START_FREE: Locator = Locator::css("a[href^=\"/auth/signup\"]");
const CONTACT_SALES: Locator = Locator::css("a[href=\"/contact\"]");

#[derive(Debug, Clone, Copy)]
pub struct PricingPage<'a> {
    actions: ElementActions<'a>,
}

impl<'a> PricingPage<'a> {
    pub fn new(actions: ElementActions<'a>) -> Self {
        Self { actions }
    }

    pub async fn click_start_free(&self) -> Result<Option<String>> {
        self.actions.follow_link(&START_FREE).await
    }

    pub async fn click_contact_sales(&self) -> Result<Option<String>> {
        self.actions.follow_link(&CONTACT_SALES).await
    }
}

#[async_trait]
impl PageObject for PricingPage<'_> {
    fn path(&self) -> String {
        "/pricing".to_string()
    }

    fn actions(&self) -> &ElementActions<'_> {
        &self.actions
    }

    async fn is_loaded(&self) -> bool {
        self.actions.is_displayed(&PLANS_HEADING).await
    }
}
