//! Invitation acceptance flows

use async_trait::async_trait;

use crate::pages::PageObject;
use crate::runner::{ensure, TestCase, TestContext};
use crate::Result;

/// Environment variable holding a valid, unused invitation token
pub const INVITE_TOKEN_ENV: &str = "E2E_INVITE_TOKEN";

/// A real token opens the invitation without an error title
#[derive(Debug, Default)]
pub struct AcceptInviteWithToken;

#[async_trait]
impl TestCase for AcceptInviteWithToken {
    fn name(&self) -> &str {
        "testAcceptInviteWithToken"
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<()> {
        let token = ctx.require_env(INVITE_TOKEN_ENV)?;

        let page = ctx.accept_invite(token);
        page.open().await?;
        ensure(page.is_loaded().await, "invitation page did not render")?;

        let title = page.title().await?;
        ensure(
            !page.shows_error().await?,
            format!("invitation was rejected: {}", title),
        )?;
        ensure(page.can_accept().await, format!("{:?} offers no accept action", title))
    }
}

/// A made-up token is rejected with an error title
#[derive(Debug, Default)]
pub struct InvalidInviteShowsError;

#[async_trait]
impl TestCase for InvalidInviteShowsError {
    fn name(&self) -> &str {
        "testInvalidInviteShowsError"
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<()> {
        let token = format!("invalid-{}", uuid::Uuid::new_v4().simple());

        let page = ctx.accept_invite(token);
        page.open().await?;

        let title = page.title().await?;
        ensure(
            page.shows_error().await?,
            format!("expected an error title, got {:?}", title),
        )
    }
}

pub fn all() -> Vec<Box<dyn TestCase>> {
    vec![
        Box::new(AcceptInviteWithToken),
        Box::new(InvalidInviteShowsError),
    ]
}
