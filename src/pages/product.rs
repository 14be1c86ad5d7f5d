//! Product overview page

use async_trait::async_trait;

use super::PageObject;
use crate::driver::Locator;
use crate::interaction::ElementActions;
use crate::Result;

const PRODUCT_HEADING: Locator = Locator::css("h1");
const GET_STARTED: Locator = Locator::css("a[href^=\"/auth/signup\"]");
const REQUEST_DEMO: Locator = Locator::css("a[href=\"/contact\"]");

#[derive(Debug, Clone, Copy)]
pub struct ProductPage<'a> {
    actions: ElementActions<'a>,
}

impl<'a> ProductPage<'a> {
    pub fn new(actions: ElementActions<'a>) -> Self {
        Self { actions }
    }

    pub async fn click_get_started(&self) -> Result<Option<String>> {
        self.actions.follow_link(&GET_STARTED).await
    }

    pub async fn click_request_demo(&self) -> Result<Option<String>> {
        self.actions.follow_link(&REQUEST_DEMO).await
    }
}

#[async_trait]
impl PageObject for ProductPage<'_> {
    fn path(&self) -> String {
        "/product".to_string()
    }

    fn actions(&self) -> &ElementActions<'_> {
        &self.actions
    }

    async fn is_loaded(&self) -> bool {
        self.actions.is_displayed(&PRODUCT_HEADING).await
    }
}
