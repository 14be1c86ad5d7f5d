//! Call-to-action navigation flows

use async_trait::async_trait;
use tracing::info;

use crate::pages::PageObject;
use crate::runner::{ensure, TestCase, TestContext};
use crate::{Error, Result};

/// Control clicked to start a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cta {
    HomeStartFreeTrial,
    HomeRequestDemo,
    HomePricing,
    PricingStartFree,
    PricingContactSales,
    ProductGetStarted,
    ProductRequestDemo,
    IndustriesStartFree,
    SecurityStartFree,
}

impl Cta {
    /// Open the source page and click the control; returns the link's `href`
    async fn follow(self, ctx: &TestContext<'_>) -> Result<Option<String>> {
        match self {
            Cta::HomeStartFreeTrial | Cta::HomeRequestDemo | Cta::HomePricing => {
                let home = ctx.home();
                home.open().await?;
                match self {
                    Cta::HomeStartFreeTrial => home.click_start_free_trial().await,
                    Cta::HomeRequestDemo => home.click_request_demo().await,
                    _ => home.navigate_to_pricing().await,
                }
            }
            Cta::PricingStartFree | Cta::PricingContactSales => {
                let pricing = ctx.pricing();
                pricing.open().await?;
                if self == Cta::PricingStartFree {
                    pricing.click_start_free().await
                } else {
                    pricing.click_contact_sales().await
                }
            }
            Cta::ProductGetStarted | Cta::ProductRequestDemo => {
                let product = ctx.product();
                product.open().await?;
                if self == Cta::ProductGetStarted {
                    product.click_get_started().await
                } else {
                    product.click_request_demo().await
                }
            }
            Cta::IndustriesStartFree => {
                let industries = ctx.industries();
                industries.open().await?;
                industries.click_start_free().await
            }
            Cta::SecurityStartFree => {
                let security = ctx.security();
                security.open().await?;
                security.click_start_free().await
            }
        }
    }
}

/// Where a flow should end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Signup,
    Contact,
    Pricing,
}

impl Landing {
    pub fn path(&self) -> &'static str {
        match self {
            Landing::Signup => "/auth/signup",
            Landing::Contact => "/contact",
            Landing::Pricing => "/pricing",
        }
    }

    async fn is_loaded(&self, ctx: &TestContext<'_>) -> bool {
        match self {
            Landing::Signup => ctx.signup().is_loaded().await,
            Landing::Contact => ctx.contact().is_loaded().await,
            Landing::Pricing => ctx.pricing().is_loaded().await,
        }
    }
}

/// Click a CTA and expect to land on a given page
#[derive(Debug, Clone)]
pub struct CtaFlow {
    name: &'static str,
    cta: Cta,
    landing: Landing,
}

impl CtaFlow {
    pub const fn new(name: &'static str, cta: Cta, landing: Landing) -> Self {
        Self { name, cta, landing }
    }
}

#[async_trait]
impl TestCase for CtaFlow {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, ctx: &TestContext<'_>) -> Result<()> {
        let href = self.cta.follow(ctx).await?;
        let href = href.as_deref().unwrap_or("(none)");
        info!("{:?} followed href {}", self.cta, href);

        let url = match ctx.actions().wait_for_url_contains(self.landing.path()).await {
            Ok(url) => url,
            Err(Error::InteractionTimeout(msg)) => {
                return Err(Error::interaction_timeout(format!("{}; link href was {}", msg, href)))
            }
            Err(e) => return Err(e),
        };
        info!("{:?} landed on {}", self.cta, url);

        ensure(
            self.landing.is_loaded(ctx).await,
            format!("{} did not render at {}", self.landing.path(), url),
        )
    }
}

const FLOWS: [CtaFlow; 9] = [
    CtaFlow::new("testStartFreeTrialFromHome", Cta::HomeStartFreeTrial, Landing::Signup),
    CtaFlow::new("testRequestDemoFromHome", Cta::HomeRequestDemo, Landing::Contact),
    CtaFlow::new("testNavigateToPricingFromHome", Cta::HomePricing, Landing::Pricing),
    CtaFlow::new("testStartFreeFromPricing", Cta::PricingStartFree, Landing::Signup),
    CtaFlow::new("testContactSalesFromPricing", Cta::PricingContactSales, Landing::Contact),
    CtaFlow::new("testGetStartedFromProduct", Cta::ProductGetStarted, Landing::Signup),
    CtaFlow::new("testRequestDemoFromProduct", Cta::ProductRequestDemo, Landing::Contact),
    CtaFlow::new("testStartFreeFromIndustries", Cta::IndustriesStartFree, Landing::Signup),
    CtaFlow::new("testStartFreeFromSecurity", Cta::SecurityStartFree, Landing::Signup),
];

pub fn all() -> Vec<Box<dyn TestCase>> {
    FLOWS
        .iter()
        .cloned()
        .map(|flow| Box::new(flow) as Box<dyn TestCase>)
        .collect()
}
