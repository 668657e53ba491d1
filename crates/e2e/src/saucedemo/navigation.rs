//! Navigation and UI Elements

use plancheck_harness::{expect_locator, expect_page, CaseContext, HarnessResult, Suite};

use super::selectors::*;
use super::{add_to_cart_button, first_item, login_standard_user, ui_case, SauceDemo, INVENTORY_SIZE};

pub const SUITE: &str = "Navigation and UI Elements";

pub fn suite(site: &SauceDemo) -> Suite {
    Suite::new(SUITE)
        .with_setup_state(site.clone(), login_standard_user)
        .case(ui_case("Logout Functionality", site, logout).tag("navigation"))
        .case(ui_case("Continue Shopping from Cart", site, continue_shopping).tag("navigation"))
}

async fn logout(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    page.click(MENU_BUTTON).await?;
    page.click(LOGOUT_LINK).await?;

    expect_page(&page).to_have_url(&site.login_page()).await?;
    expect_locator(&page.locator(USERNAME_INPUT)).to_be_visible().await?;
    expect_locator(&page.locator(PASSWORD_INPUT)).to_be_visible().await?;

    // The session is gone: the inventory bounces back to the login page
    page.goto(&site.inventory()).await?;
    expect_page(&page).to_have_url(&site.login_page()).await
}

async fn continue_shopping(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    add_to_cart_button(&first_item(&page)).click().await?;
    let badge = page
        .locator(CART_BADGE)
        .text_content()
        .await?
        .unwrap_or_else(|| "1".to_string());

    page.click(CART_LINK).await?;
    expect_page(&page).to_have_url(&site.cart()).await?;
    page.click(CONTINUE_SHOPPING).await?;

    expect_page(&page).to_have_url(&site.inventory()).await?;
    expect_locator(&page.locator(INVENTORY_ITEM)).to_have_count(INVENTORY_SIZE).await?;
    expect_locator(&page.locator(CART_BADGE)).to_have_text(&badge).await?;

    page.click(CART_LINK).await?;
    expect_locator(&page.locator(CART_ITEM)).to_have_count(1).await
}
