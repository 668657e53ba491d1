//! Checkout Flow
//!
//! Setup logs in and puts the first product in the cart.

use plancheck_harness::{expect_locator, expect_page, CaseContext, HarnessResult, Suite};

use super::selectors::*;
use super::{add_to_cart_button, first_item, login_standard_user, ui_case, SauceDemo};

pub const SUITE: &str = "Checkout Flow";

pub fn suite(site: &SauceDemo) -> Suite {
    Suite::new(SUITE)
        .with_setup_state(site.clone(), login_with_item)
        .case(ui_case("Complete Checkout - Happy Path", site, happy_path).tag("checkout"))
        .case(ui_case("Checkout - Missing Required Fields", site, missing_fields).tag("checkout"))
        .case(ui_case("Cancel Checkout", site, cancel_checkout).tag("checkout"))
}

async fn login_with_item(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    login_standard_user(ctx.clone(), site).await?;
    add_to_cart_button(&first_item(&ctx.page()?)).click().await
}

/// Cart page, then the checkout information form
async fn start_checkout(ctx: &CaseContext, site: &SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    page.click(CART_LINK).await?;
    expect_page(&page).to_have_url(&site.cart()).await?;
    page.click(CHECKOUT).await
}

async fn happy_path(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    start_checkout(&ctx, &site).await?;

    expect_page(&page).to_have_url(&site.checkout_information()).await?;
    page.fill(FIRST_NAME, "John").await?;
    page.fill(LAST_NAME, "Doe").await?;
    page.fill(POSTAL_CODE, "12345").await?;
    page.click(CONTINUE).await?;

    expect_page(&page).to_have_url(&site.checkout_overview()).await?;
    expect_locator(&page.locator(CART_ITEM)).to_be_visible().await?;
    for label in ["Payment Information", "Shipping Information"] {
        expect_locator(&page.locator(SUMMARY_INFO_LABEL).filter_has_text(label))
            .to_be_visible()
            .await?;
    }
    for price_line in [SUBTOTAL, TAX, TOTAL] {
        expect_locator(&page.locator(price_line)).to_be_visible().await?;
    }

    page.click(FINISH).await?;
    expect_page(&page).to_have_url(&site.checkout_complete()).await?;
    expect_locator(&page.locator(COMPLETE_HEADER)).to_contain_text("Thank you for your order!").await?;
    expect_locator(&page.locator(COMPLETE_TEXT)).to_be_visible().await?;
    expect_locator(&page.locator(BACK_HOME)).to_be_visible().await
}

async fn missing_fields(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    start_checkout(&ctx, &site).await?;

    // All fields left empty
    page.click(CONTINUE).await?;

    let error = page.locator(ERROR);
    expect_locator(&error).to_be_visible().await?;
    expect_locator(&error).to_contain_text("required").await?;
    expect_page(&page).to_have_url(&site.checkout_information()).await?;
    for field in [FIRST_NAME, LAST_NAME, POSTAL_CODE] {
        expect_locator(&page.locator(field)).to_be_visible().await?;
    }
    Ok(())
}

async fn cancel_checkout(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    start_checkout(&ctx, &site).await?;

    page.click(CANCEL).await?;

    expect_page(&page).to_have_url(&site.cart()).await?;
    expect_locator(&page.locator(CART_ITEM)).to_have_count(1).await?;
    expect_locator(&page.locator(CHECKOUT)).to_be_visible().await
}
