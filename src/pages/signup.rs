//! Account signup page

use async_trait::async_trait;

use super::PageObject;
use crate::driver::Locator;
use crate::interaction::ElementActions;
use crate::Result;

const EMAIL_INPUT: Locator = Locator::css("input[type=\"email\"]");
const PASSWORD_INPUT: Locator = Locator::css("input[type=\"password\"]");

#[derive(Debug, Clone, Copy)]
pub struct SignupPage<'a> {
    actions: ElementActions<'a>,
}

impl<'a> SignupPage<'a> {
    pub fn new(actions: ElementActions<'a>) -> Self {
        Self { actions }
    }

    /// Fill the credential fields without submitting
    pub async fn enter_credentials(&self, email: &str, password: &str) -> Result<()> {
        self.actions.type_text(&EMAIL_INPUT, email).await?;
        self.actions.type_text(&PASSWORD_INPUT, password).await
    }
}

#[async_trait]
impl PageObject for SignupPage<'_> {
    fn path(&self) -> String {
        "/auth/signup".to_string()
    }

    fn actions(&self) -> &ElementActions<'_> {
        &self.actions
    }

    async fn is_loaded(&self) -> bool {
        self.actions.is_displayed(&EMAIL_INPUT).await
    }
}
