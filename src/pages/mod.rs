//! Page objects
//!
//! One type per page of the application. Locators stay private to the page
//! that owns them; callers only see user-intent methods.

use async_trait::async_trait;

use crate::interaction::ElementActions;
use crate::Result;

pub mod home;
pub mod pricing;
pub mod product;
pub mod industries;
pub mod security;
pub mod contact;
pub mod signup;
pub mod invite;

pub use contact::ContactPage;
pub use home::HomePage;
pub use industries::IndustriesPage;
pub use invite::AcceptInvitePage;
pub use pricing::PricingPage;
pub use product::ProductPage;
pub use security::SecurityPage;
pub use signup::SignupPage;

/// Capabilities shared by every page
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Path under `base.url`
    fn path(&self) -> String;

    fn actions(&self) -> &ElementActions<'_>;

    /// Navigate here and wait for the document to settle
    async fn open(&self) -> Result<()> {
        let actions = self.actions();
        let url = actions.config().url(&self.path());
        actions.session().navigate(&url).await?;
        actions.wait_for_page_ready().await
    }

    /// The page's landmark element is visible
    async fn is_loaded(&self) -> bool;
}
