//! Contact / demo request page

use async_trait::async_trait;

use super::PageObject;
use crate::driver::Locator;
use crate::interaction::ElementActions;

const CONTACT_FORM: Locator = Locator::css("form");

#[derive(Debug, Clone, Copy)]
pub struct ContactPage<'a> {
    actions: ElementActions<'a>,
}

impl<'a> ContactPage<'a> {
    pub fn new(actions: ElementActions<'a>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl PageObject for ContactPage<'_> {
    fn path(&self) -> String {
        "/contact".to_string()
    }

    fn actions(&self) -> &ElementActions<'_> {
        &self.actions
    }

    async fn is_loaded(&self) -> bool {
        self.actions.is_displayed(&CONTACT_FORM).await
    }
}
