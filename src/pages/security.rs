use async_trait::async_trait;

use super::PageObject;
use crate::driver::Locator;
use crate::interaction::ElementActions;
use crate::Result;

const SECURITY_HEADING: Locator = Locator::css("h1");
const START_FREE: Locator = Locator::css("a[href^=\"/auth/signup\"]");

#[derive(Debug, Clone, Copy)]
pub struct SecurityPage<'a> {
    actions: ElementActions<'a>,
}

impl<'a> SecurityPage<'a> {
    pub fn new(actions: ElementActions<'a>) -> Self {
        Self { actions }
    }

    pub async fn click_start_free(&self) -> Result<Option<String>> {
        self.actions.follow_link(&START_FREE).await
    }
}

#[async_trait]
impl PageObject for SecurityPage<'_> {
    fn path(&self) -> String {
        "/security".to_string()
    }

    fn actions(&self) -> &ElementActions<'_> {
        &self.actions
    }

    async fn is_loaded(&self) -> bool {
        self.actions.is_displayed(&SECURITY_HEADING).await
    }
}
