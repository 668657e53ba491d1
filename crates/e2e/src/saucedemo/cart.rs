//! Shopping Cart Operations

use plancheck_harness::{expect_locator, expect_page, CaseContext, HarnessResult, Suite};

use super::selectors::*;
use super::{add_to_cart_button, first_item, login_standard_user, ui_case, SauceDemo};

pub const SUITE: &str = "Shopping Cart Operations";

pub fn suite(site: &SauceDemo) -> Suite {
    Suite::new(SUITE)
        .with_setup_state(site.clone(), login_standard_user)
        .case(ui_case("Add Single Item to Cart", site, add_single_item).tag("cart"))
        .case(ui_case("Add Multiple Items to Cart", site, add_multiple_items).tag("cart"))
        .case(ui_case("Remove Item from Cart", site, remove_item).tag("cart"))
}

async fn add_single_item(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    let product = first_item(&page);
    let product_name = product.locator(ITEM_NAME).text_content().await?.unwrap_or_default();

    add_to_cart_button(&product).click().await?;
    expect_locator(&product.locator("button")).to_contain_text("Remove").await?;

    page.click(CART_LINK).await?;
    expect_locator(&page.locator(CART_BADGE)).to_have_text("1").await?;
    expect_page(&page).to_have_url(&site.cart()).await?;
    expect_locator(&page.locator(CART_ITEM)).to_contain_text(&product_name).await?;
    expect_locator(&page.locator(ITEM_PRICE)).to_be_visible().await?;
    expect_locator(&page.locator("button").filter_has_text("Remove")).to_be_visible().await?;
    expect_locator(&page.locator(CONTINUE_SHOPPING)).to_be_visible().await?;
    expect_locator(&page.locator(CHECKOUT)).to_be_visible().await
}

async fn add_multiple_items(ctx: CaseContext, _site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    let items = page.locator(INVENTORY_ITEM);
    for index in 0..3 {
        add_to_cart_button(&items.nth(index)).click().await?;
    }

    page.click(CART_LINK).await?;
    expect_locator(&page.locator(CART_BADGE)).to_have_text("3").await?;

    let cart_items = page.locator(CART_ITEM);
    expect_locator(&cart_items).to_have_count(3).await?;
    for index in 0..3 {
        let item = cart_items.nth(index);
        expect_locator(&item.locator(ITEM_NAME)).to_be_visible().await?;
        expect_locator(&item.locator(ITEM_DESC)).to_be_visible().await?;
        expect_locator(&item.locator(ITEM_PRICE)).to_be_visible().await?;
        expect_locator(&item.locator("button").filter_has_text("Remove")).to_be_visible().await?;
    }
    Ok(())
}

async fn remove_item(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    add_to_cart_button(&first_item(&page)).click().await?;
    expect_locator(&page.locator(CART_BADGE)).to_have_text("1").await?;

    page.click(CART_LINK).await?;
    expect_page(&page).to_have_url(&site.cart()).await?;

    page.locator("button").filter_has_text("Remove").first().click().await?;
    expect_locator(&page.locator(CART_ITEM)).to_have_count(0).await?;
    expect_locator(&page.locator(CART_BADGE)).not().to_be_visible().await
}
