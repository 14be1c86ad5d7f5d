//! Team invitation acceptance page

use async_trait::async_trait;

use super::PageObject;
use crate::driver::Locator;
use crate::interaction::ElementActions;
use crate::Result;

const TITLE: Locator = Locator::css("h1");
const ACCEPT_BUTTON: Locator = Locator::xpath("//button[contains(., 'Accept')]");

/// Headings shown when a token cannot be used
pub const ERROR_TITLES: [&str; 3] =
    ["Invalid Invitation", "Invitation Expired", "Already Accepted"];

#[derive(Debug, Clone)]
pub struct AcceptInvitePage<'a> {
    actions: ElementActions<'a>,
    token: String,
}

impl<'a> AcceptInvitePage<'a> {
    pub fn new<S: Into<String>>(actions: ElementActions<'a>, token: S) -> Self {
        Self {
            actions,
            token: token.into(),
        }
    }

    pub async fn title(&self) -> Result<String> {
        self.actions.read_text(&TITLE).await
    }

    /// Title is one of [`ERROR_TITLES`]
    pub async fn shows_error(&self) -> Result<bool> {
        let title = self.title().await?;
        Ok(ERROR_TITLES.iter().any(|t| title.contains(t)))
    }

    /// A usable invitation offers an accept action
    pub async fn can_accept(&self) -> bool {
        self.actions.is_displayed(&ACCEPT_BUTTON).await
    }
}

#[async_trait]
impl PageObject for AcceptInvitePage<'_> {
    fn path(&self) -> String {
        format!("/accept-invite/{}", self.token)
    }

    fn actions(&self) -> &ElementActions<'_> {
        &self.actions
    }

    async fn is_loaded(&self) -> bool {
        self.actions.is_displayed(&TITLE).await
    }
}
