//! Authentication

use plancheck_harness::{expect_locator, expect_page, CaseContext, HarnessResult, Suite};

use super::selectors::*;
use super::{open_login, submit_login, ui_case, SauceDemo, INVENTORY_SIZE, LOCKED_OUT_USER, PASSWORD, STANDARD_USER};

pub const SUITE: &str = "Authentication";

pub fn suite(site: &SauceDemo) -> Suite {
    Suite::new(SUITE)
        .with_setup_state(site.clone(), open_login)
        .case(ui_case("Successful Login", site, successful_login).tag("auth"))
        .case(ui_case("Failed Login - Invalid Credentials", site, invalid_credentials).tag("auth"))
        .case(ui_case("Failed Login - Locked Out User", site, locked_out_user).tag("auth"))
}

async fn successful_login(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    expect_locator(&page.locator(USERNAME_INPUT)).to_be_visible().await?;
    expect_locator(&page.locator(PASSWORD_INPUT)).to_be_visible().await?;

    submit_login(&page, STANDARD_USER, PASSWORD).await?;

    expect_page(&page).to_have_url(&site.inventory()).await?;
    expect_locator(&page.locator(INVENTORY_ITEM)).to_have_count(INVENTORY_SIZE).await?;
    expect_locator(&page.locator(APP_LOGO)).to_be_visible().await?;
    expect_locator(&page.locator(CART_LINK)).to_be_visible().await?;
    expect_locator(&page.locator(ERROR)).not().to_be_visible().await
}

async fn invalid_credentials(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    submit_login(&page, "invalid_user", "wrong_password").await?;

    expect_page(&page).to_have_url(&site.login_page()).await?;
    let error = page.locator(ERROR);
    expect_locator(&error).to_be_visible().await?;
    expect_locator(&error)
        .to_contain_text("Username and password do not match any user in this service")
        .await?;
    expect_locator(&page.locator(USERNAME_INPUT)).to_be_visible().await?;
    expect_locator(&page.locator(PASSWORD_INPUT)).to_be_visible().await
}

async fn locked_out_user(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    submit_login(&page, LOCKED_OUT_USER, PASSWORD).await?;

    expect_page(&page).to_have_url(&site.login_page()).await?;
    let error = page.locator(ERROR);
    expect_locator(&error).to_be_visible().await?;
    expect_locator(&error).to_contain_text("Sorry, this user has been locked out.").await?;
    expect_locator(&page.locator(USERNAME_INPUT)).to_be_visible().await?;
    expect_locator(&page.locator(PASSWORD_INPUT)).to_be_visible().await
}
