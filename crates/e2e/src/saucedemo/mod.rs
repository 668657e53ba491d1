//! SauceDemo web UI suites
//!
//! Setup hooks play the role of a `beforeEach`: they run against the
//! fresh page of every case, under the case deadline.

use plancheck_harness::config::join_url;
use plancheck_harness::{expect_page, Case, CaseContext, HarnessResult, Locator, Page};
use std::future::Future;
use std::sync::Arc;

pub mod authentication;
pub mod cart;
pub mod checkout;
pub mod navigation;

pub const STANDARD_USER: &str = "standard_user";
pub const LOCKED_OUT_USER: &str = "locked_out_user";
pub const PASSWORD: &str = "secret_sauce";

/// Number of products in the SauceDemo catalogue
pub const INVENTORY_SIZE: usize = 6;

pub mod selectors {
    pub const USERNAME_INPUT: &str = "#user-name";
    pub const PASSWORD_INPUT: &str = "#password";
    pub const LOGIN_BUTTON: &str = "#login-button";
    pub const ERROR: &str = r#"[data-test="error"]"#;

    pub const APP_LOGO: &str = ".app_logo";
    pub const MENU_BUTTON: &str = "#react-burger-menu-btn";
    pub const LOGOUT_LINK: &str = "#logout_sidebar_link";
    pub const CART_LINK: &str = ".shopping_cart_link";
    pub const CART_BADGE: &str = ".shopping_cart_badge";

    pub const INVENTORY_ITEM: &str = ".inventory_item";
    pub const ITEM_NAME: &str = ".inventory_item_name";
    pub const ITEM_DESC: &str = ".inventory_item_desc";
    pub const ITEM_PRICE: &str = ".inventory_item_price";
    pub const CART_ITEM: &str = ".cart_item";

    pub const CONTINUE_SHOPPING: &str = r#"[data-test="continue-shopping"]"#;
    pub const CHECKOUT: &str = r#"[data-test="checkout"]"#;
    pub const FIRST_NAME: &str = r#"[data-test="firstName"]"#;
    pub const LAST_NAME: &str = r#"[data-test="lastName"]"#;
    pub const POSTAL_CODE: &str = r#"[data-test="postalCode"]"#;
    pub const CONTINUE: &str = r#"[data-test="continue"]"#;
    pub const CANCEL: &str = r#"[data-test="cancel"]"#;
    pub const FINISH: &str = r#"[data-test="finish"]"#;
    pub const BACK_HOME: &str = r#"[data-test="back-to-products"]"#;

    pub const SUMMARY_INFO_LABEL: &str = ".summary_info_label";
    pub const SUBTOTAL: &str = ".summary_subtotal_label";
    pub const TAX: &str = ".summary_tax_label";
    pub const TOTAL: &str = ".summary_total_label";
    pub const COMPLETE_HEADER: &str = ".complete-header";
    pub const COMPLETE_TEXT: &str = ".complete-text";
}

use selectors::*;

/// Page URLs of one SauceDemo deployment
#[derive(Debug, Clone)]
pub struct SauceDemo {
    base: Arc<str>,
}

impl SauceDemo {
    pub fn new(base: &str) -> Self {
        Self { base: base.into() }
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base, path)
    }

    pub fn login_page(&self) -> String {
        self.url("")
    }

    pub fn inventory(&self) -> String {
        self.url("inventory.html")
    }

    pub fn cart(&self) -> String {
        self.url("cart.html")
    }

    pub fn checkout_information(&self) -> String {
        self.url("checkout-step-one.html")
    }

    pub fn checkout_overview(&self) -> String {
        self.url("checkout-step-two.html")
    }

    pub fn checkout_complete(&self) -> String {
        self.url("checkout-complete.html")
    }
}

/// A browser case tagged `ui` that receives the site
pub(crate) fn ui_case<F, Fut>(name: &str, site: &SauceDemo, procedure: F) -> Case
where
    F: Fn(CaseContext, SauceDemo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HarnessResult<()>> + Send + 'static,
{
    Case::with_state(name, site.clone(), procedure).browser().tag("ui")
}

/// Setup: open the login page
pub async fn open_login(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    ctx.page()?.goto(&site.login_page()).await
}

/// Setup: log in as `standard_user` and land on the inventory
pub async fn login_standard_user(ctx: CaseContext, site: SauceDemo) -> HarnessResult<()> {
    let page = ctx.page()?;
    page.goto(&site.login_page()).await?;
    submit_login(&page, STANDARD_USER, PASSWORD).await?;
    expect_page(&page).to_have_url(&site.inventory()).await
}

pub async fn submit_login(page: &Page, username: &str, password: &str) -> HarnessResult<()> {
    page.fill(USERNAME_INPUT, username).await?;
    page.fill(PASSWORD_INPUT, password).await?;
    page.click(LOGIN_BUTTON).await
}

/// The "Add to cart" button of an inventory item
pub fn add_to_cart_button(item: &Locator) -> Locator {
    item.locator("button").filter_has_text("Add to cart")
}

pub fn first_item(page: &Page) -> Locator {
    page.locator(INVENTORY_ITEM).first()
}
