//! Scripted SauceDemo storefront behind the browser traits
//!
//! Each screen is rendered into a small element tree carrying the real
//! storefront's tags, ids, classes, `data-test` attributes and messages.
//! Locator chains resolve against that tree with Playwright's strictness:
//! acting on a chain that matches several elements is an error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use plancheck_harness::browser::SelectorPart;
use plancheck_harness::config::join_url;
use plancheck_harness::{BrowserLauncher, BrowserSession, HarnessError, HarnessResult, Selector};

pub const FAKE_SAUCEDEMO_URL: &str = "https://saucedemo.test/";

const PRODUCTS: [(&str, &str, &str); 6] = [
    ("Sauce Labs Backpack", "carry.allTheThings() with the sleek, streamlined Sly Pack.", "$29.99"),
    ("Sauce Labs Bike Light", "A red light isn't the desired state in testing but it sure helps when riding your bike at night.", "$9.99"),
    ("Sauce Labs Bolt T-Shirt", "Get your testing superhero on with the Sauce Labs bolt T-shirt.", "$15.99"),
    ("Sauce Labs Fleece Jacket", "It's not every day that you come across a midweight quarter-zip fleece jacket.", "$49.99"),
    ("Sauce Labs Onesie", "Rib snap infant onesie for the junior automation engineer in development.", "$7.99"),
    ("Test.allTheThings() T-Shirt (Red)", "This classic Sauce Labs t-shirt is perfect to wear when cozying up to your keyboard.", "$15.99"),
];

/// Launcher counting the sessions it hands out
#[derive(Clone)]
pub struct FakeSauceDemo {
    inventory_size: usize,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeSauceDemo {
    pub fn new() -> Self {
        Self::with_inventory(PRODUCTS.len())
    }

    /// Storefront listing only the first `size` products
    pub fn with_inventory(size: usize) -> Self {
        Self {
            inventory_size: size.min(PRODUCTS.len()),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeSauceDemo {
    async fn open(&self) -> HarnessResult<Arc<dyn BrowserSession>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeSession {
            state: Mutex::new(SiteState::new(self.inventory_size)),
            closed: self.closed.clone(),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Login,
    Inventory,
    Cart,
    CheckoutInformation,
    CheckoutOverview,
    CheckoutComplete,
}

impl Screen {
    fn path(self) -> &'static str {
        match self {
            Screen::Blank | Screen::Login => "",
            Screen::Inventory => "inventory.html",
            Screen::Cart => "cart.html",
            Screen::CheckoutInformation => "checkout-step-one.html",
            Screen::CheckoutOverview => "checkout-step-two.html",
            Screen::CheckoutComplete => "checkout-complete.html",
        }
    }

    fn from_path(path: &str) -> Option<Self> {
        match path {
            "" | "index.html" => Some(Screen::Login),
            "inventory.html" => Some(Screen::Inventory),
            "cart.html" => Some(Screen::Cart),
            "checkout-step-one.html" => Some(Screen::CheckoutInformation),
            "checkout-step-two.html" => Some(Screen::CheckoutOverview),
            "checkout-complete.html" => Some(Screen::CheckoutComplete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    FirstName,
    LastName,
    PostalCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Input(Field),
    Login,
    OpenMenu,
    CloseMenu,
    AllItems,
    Logout,
    ResetApp,
    CartLink,
    AddToCart(usize),
    RemoveFromCart(usize),
    ContinueShopping,
    Checkout,
    Continue,
    Cancel,
    Finish,
    BackHome,
}

#[derive(Debug, Default)]
struct Form {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    postal_code: String,
}

#[derive(Debug)]
struct SiteState {
    inventory_size: usize,
    screen: Screen,
    user: Option<String>,
    cart: Vec<usize>,
    menu_open: bool,
    error: Option<String>,
    form: Form,
}

impl SiteState {
    fn new(inventory_size: usize) -> Self {
        Self {
            inventory_size,
            screen: Screen::Blank,
            user: None,
            cart: Vec::new(),
            menu_open: false,
            error: None,
            form: Form::default(),
        }
    }

    fn show(&mut self, screen: Screen) {
        self.screen = screen;
        self.menu_open = false;
        self.error = None;
    }

    fn goto(&mut self, url: &str) -> HarnessResult<()> {
        let base = FAKE_SAUCEDEMO_URL.trim_end_matches('/');
        let path = url
            .strip_prefix(base)
            .ok_or_else(|| HarnessError::collaborator(format!("net::ERR_NAME_NOT_RESOLVED at {url}")))?
            .trim_matches('/');
        let screen =
            Screen::from_path(path).ok_or_else(|| HarnessError::collaborator(format!("404 Not Found at {url}")))?;

        if screen == Screen::Login || self.user.is_some() {
            self.show(screen);
            self.form.username.clear();
            self.form.password.clear();
        } else {
            self.show(Screen::Login);
            self.error = Some(format!(
                "Epic sadface: You can only access '/{path}' when you are logged in."
            ));
        }
        Ok(())
    }

    fn fill(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Username => &mut self.form.username,
            Field::Password => &mut self.form.password,
            Field::FirstName => &mut self.form.first_name,
            Field::LastName => &mut self.form.last_name,
            Field::PostalCode => &mut self.form.postal_code,
        };
        *slot = value.to_string();
    }

    fn perform(&mut self, action: Action) -> HarnessResult<()> {
        match action {
            Action::Input(_) => {}
            Action::Login => self.login(),
            Action::OpenMenu => self.menu_open = true,
            Action::CloseMenu => self.menu_open = false,
            Action::AllItems => self.show(Screen::Inventory),
            Action::Logout => {
                self.user = None;
                self.cart.clear();
                self.form = Form::default();
                self.show(Screen::Login);
            }
            Action::ResetApp => self.cart.clear(),
            Action::CartLink => self.show(Screen::Cart),
            Action::AddToCart(index) => {
                if !self.cart.contains(&index) {
                    self.cart.push(index);
                }
            }
            Action::RemoveFromCart(index) => self.cart.retain(|&i| i != index),
            Action::ContinueShopping => self.show(Screen::Inventory),
            Action::Checkout => {
                self.form.first_name.clear();
                self.form.last_name.clear();
                self.form.postal_code.clear();
                self.show(Screen::CheckoutInformation);
            }
            Action::Continue => {
                let missing = [
                    (&self.form.first_name, "First Name"),
                    (&self.form.last_name, "Last Name"),
                    (&self.form.postal_code, "Postal Code"),
                ]
                .into_iter()
                .find(|(value, _)| value.is_empty())
                .map(|(_, label)| label);
                match missing {
                    Some(label) => self.error = Some(format!("Error: {label} is required")),
                    None => self.show(Screen::CheckoutOverview),
                }
            }
            Action::Cancel => match self.screen {
                Screen::CheckoutInformation => self.show(Screen::Cart),
                _ => self.show(Screen::Inventory),
            },
            Action::Finish => {
                self.cart.clear();
                self.show(Screen::CheckoutComplete);
            }
            Action::BackHome => self.show(Screen::Inventory),
        }
        Ok(())
    }

    fn login(&mut self) {
        let Form { username, password, .. } = &self.form;
        let error = if username.is_empty() {
            Some("Epic sadface: Username is required")
        } else if password.is_empty() {
            Some("Epic sadface: Password is required")
        } else if password != "secret_sauce" || !matches!(username.as_str(), "standard_user" | "locked_out_user") {
            Some("Epic sadface: Username and password do not match any user in this service")
        } else if username == "locked_out_user" {
            Some("Epic sadface: Sorry, this user has been locked out.")
        } else {
            None
        };

        match error {
            Some(message) => self.error = Some(message.to_string()),
            None => {
                self.user = Some(username.clone());
                self.show(Screen::Inventory);
            }
        }
    }

    fn render(&self) -> Node {
        let body = match self.screen {
            Screen::Blank => Vec::new(),
            Screen::Login => self.login_page(),
            Screen::Inventory => self.with_header(self.inventory_page()),
            Screen::Cart => self.with_header(self.cart_page()),
            Screen::CheckoutInformation => self.with_header(self.information_page()),
            Screen::CheckoutOverview => self.with_header(self.overview_page()),
            Screen::CheckoutComplete => self.with_header(self.complete_page()),
        };
        Node::new("body").children(body)
    }

    fn error_banner(&self) -> Option<Node> {
        self.error.as_ref().map(|message| {
            Node::new("div").class("error-message-container error").child(
                Node::new("h3").attr("data-test", "error").text(message).child(
                    Node::new("button")
                        .class("error-button")
                        .attr("data-test", "error-button"),
                ),
            )
        })
    }

    fn login_page(&self) -> Vec<Node> {
        let mut form = vec![
            Node::new("input")
                .id("user-name")
                .attr("data-test", "username")
                .value(&self.form.username)
                .action(Action::Input(Field::Username)),
            Node::new("input")
                .id("password")
                .attr("data-test", "password")
                .value(&self.form.password)
                .action(Action::Input(Field::Password)),
        ];
        form.extend(self.error_banner());
        form.push(
            Node::new("input")
                .id("login-button")
                .class("submit-button btn_action")
                .attr("data-test", "login-button")
                .action(Action::Login),
        );
        vec![
            Node::new("div").class("login_logo").text("Swag Labs"),
            Node::new("form").children(form),
        ]
    }

    fn with_header(&self, content: Vec<Node>) -> Vec<Node> {
        let menu_link = |id: &str, label: &str, action: Action| {
            Node::new("a")
                .id(id)
                .class("bm-item menu-item")
                .text(label)
                .visible(self.menu_open)
                .action(action)
        };

        let mut cart_link = Node::new("a")
            .class("shopping_cart_link")
            .attr("data-test", "shopping-cart-link")
            .action(Action::CartLink);
        if !self.cart.is_empty() {
            cart_link = cart_link.child(
                Node::new("span")
                    .class("shopping_cart_badge")
                    .attr("data-test", "shopping-cart-badge")
                    .text(&self.cart.len().to_string()),
            );
        }

        let header = Node::new("div").class("primary_header").children(vec![
            Node::new("button")
                .id("react-burger-menu-btn")
                .text("Open Menu")
                .action(Action::OpenMenu),
            Node::new("nav").class("bm-item-list").children(vec![
                menu_link("inventory_sidebar_link", "All Items", Action::AllItems),
                menu_link("about_sidebar_link", "About", Action::CloseMenu),
                menu_link("logout_sidebar_link", "Logout", Action::Logout),
                menu_link("reset_sidebar_link", "Reset App State", Action::ResetApp),
            ]),
            Node::new("button")
                .id("react-burger-cross-btn")
                .text("Close Menu")
                .visible(self.menu_open)
                .action(Action::CloseMenu),
            Node::new("div").class("app_logo").text("Swag Labs"),
            Node::new("div").id("shopping_cart_container").child(cart_link),
        ]);

        let mut page = vec![header];
        page.extend(content);
        page
    }

    fn inventory_page(&self) -> Vec<Node> {
        let items = PRODUCTS
            .iter()
            .take(self.inventory_size)
            .enumerate()
            .map(|(index, (name, desc, price))| {
                let in_cart = self.cart.contains(&index);
                let slug = slug(name);
                let button = if in_cart {
                    Node::new("button")
                        .class("btn btn_secondary btn_small btn_inventory")
                        .attr("data-test", &format!("remove-{slug}"))
                        .text("Remove")
                        .action(Action::RemoveFromCart(index))
                } else {
                    Node::new("button")
                        .class("btn btn_primary btn_small btn_inventory")
                        .attr("data-test", &format!("add-to-cart-{slug}"))
                        .text("Add to cart")
                        .action(Action::AddToCart(index))
                };
                Node::new("div")
                    .class("inventory_item")
                    .attr("data-test", "inventory-item")
                    .child(
                        Node::new("div").class("inventory_item_description").children(vec![
                            Node::new("div").class("inventory_item_label").children(vec![
                                Node::new("a").child(Node::new("div").class("inventory_item_name").text(name)),
                                Node::new("div").class("inventory_item_desc").text(desc),
                            ]),
                            Node::new("div").class("pricebar").children(vec![
                                Node::new("div").class("inventory_item_price").text(price),
                                button,
                            ]),
                        ]),
                    )
            })
            .collect();

        vec![
            Node::new("span").class("title").text("Products"),
            Node::new("div").class("inventory_list").children(items),
        ]
    }

    fn cart_items(&self, removable: bool) -> Vec<Node> {
        self.cart
            .iter()
            .map(|&index| {
                let (name, desc, price) = PRODUCTS[index];
                let mut pricebar = Node::new("div")
                    .class("item_pricebar")
                    .child(Node::new("div").class("inventory_item_price").text(price));
                if removable {
                    pricebar = pricebar.child(
                        Node::new("button")
                            .class("btn btn_secondary btn_small cart_button")
                            .attr("data-test", &format!("remove-{}", slug(name)))
                            .text("Remove")
                            .action(Action::RemoveFromCart(index)),
                    );
                }
                Node::new("div").class("cart_item").children(vec![
                    Node::new("div").class("cart_quantity").text("1"),
                    Node::new("div").class("cart_item_label").children(vec![
                        Node::new("a").child(Node::new("div").class("inventory_item_name").text(name)),
                        Node::new("div").class("inventory_item_desc").text(desc),
                        pricebar,
                    ]),
                ])
            })
            .collect()
    }

    fn cart_page(&self) -> Vec<Node> {
        vec![
            Node::new("span").class("title").text("Your Cart"),
            Node::new("div").class("cart_list").children(self.cart_items(true)),
            Node::new("button")
                .id("continue-shopping")
                .class("btn btn_secondary back btn_medium")
                .attr("data-test", "continue-shopping")
                .text("Continue Shopping")
                .action(Action::ContinueShopping),
            Node::new("button")
                .id("checkout")
                .class("btn btn_action btn_medium checkout_button")
                .attr("data-test", "checkout")
                .text("Checkout")
                .action(Action::Checkout),
        ]
    }

    fn information_page(&self) -> Vec<Node> {
        let input = |id: &str, field: Field, value: &str| {
            Node::new("input")
                .id(id)
                .class("input_error form_input")
                .attr("data-test", id)
                .value(value)
                .action(Action::Input(field))
        };
        let mut form = vec![
            input("first-name", Field::FirstName, &self.form.first_name).attr("data-test", "firstName"),
            input("last-name", Field::LastName, &self.form.last_name).attr("data-test", "lastName"),
            input("postal-code", Field::PostalCode, &self.form.postal_code).attr("data-test", "postalCode"),
        ];
        form.extend(self.error_banner());
        form.push(
            Node::new("button")
                .id("cancel")
                .class("btn btn_secondary back btn_medium cart_cancel_link")
                .attr("data-test", "cancel")
                .text("Cancel")
                .action(Action::Cancel),
        );
        form.push(
            Node::new("input")
                .id("continue")
                .class("submit-button btn btn_primary cart_button btn_action")
                .attr("data-test", "continue")
                .action(Action::Continue),
        );
        vec![
            Node::new("span").class("title").text("Checkout: Your Information"),
            Node::new("form").children(form),
        ]
    }

    fn overview_page(&self) -> Vec<Node> {
        let subtotal: f64 = self
            .cart
            .iter()
            .filter_map(|&index| PRODUCTS[index].2.trim_start_matches('$').parse::<f64>().ok())
            .sum();
        let tax = (subtotal * 0.08 * 100.0).round() / 100.0;

        vec![
            Node::new("span").class("title").text("Checkout: Overview"),
            Node::new("div").class("cart_list").children(self.cart_items(false)),
            Node::new("div").class("summary_info").children(vec![
                Node::new("div").class("summary_info_label").text("Payment Information:"),
                Node::new("div").class("summary_value_label").text("SauceCard #31337"),
                Node::new("div").class("summary_info_label").text("Shipping Information:"),
                Node::new("div").class("summary_value_label").text("Free Pony Express Delivery!"),
                Node::new("div").class("summary_info_label").text("Price Total"),
                Node::new("div")
                    .class("summary_subtotal_label")
                    .text(&format!("Item total: ${subtotal:.2}")),
                Node::new("div").class("summary_tax_label").text(&format!("Tax: ${tax:.2}")),
                Node::new("div")
                    .class("summary_total_label")
                    .text(&format!("Total: ${:.2}", subtotal + tax)),
            ]),
            Node::new("button")
                .id("cancel")
                .class("btn btn_secondary back btn_medium cart_cancel_link")
                .attr("data-test", "cancel")
                .text("Cancel")
                .action(Action::Cancel),
            Node::new("button")
                .id("finish")
                .class("btn btn_action btn_medium cart_button")
                .attr("data-test", "finish")
                .text("Finish")
                .action(Action::Finish),
        ]
    }

    fn complete_page(&self) -> Vec<Node> {
        vec![
            Node::new("span").class("title").text("Checkout: Complete!"),
            Node::new("h2").class("complete-header").text("Thank you for your order!"),
            Node::new("div").class("complete-text").text(
                "Your order has been dispatched, and will arrive just as fast as the pony can get there!",
            ),
            Node::new("button")
                .id("back-to-products")
                .class("btn btn_primary btn_small")
                .attr("data-test", "back-to-products")
                .text("Back Home")
                .action(Action::BackHome),
        ]
    }
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '(' || c == ')' { c } else { '-' })
        .collect()
}

/// One element of a rendered screen
#[derive(Debug, Clone)]
struct Node {
    tag: &'static str,
    attrs: Vec<(String, String)>,
    text: String,
    visible: bool,
    action: Option<Action>,
    children: Vec<Node>,
}

impl Node {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            text: String::new(),
            visible: true,
            action: None,
            children: Vec::new(),
        }
    }

    fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.retain(|(n, _)| n != name);
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    fn class(self, classes: &str) -> Self {
        self.attr("class", classes)
    }

    fn value(self, value: &str) -> Self {
        self.attr("value", value)
    }

    fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    fn children(mut self, children: Vec<Node>) -> Self {
        self.children.extend(children);
        self
    }

    fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn text_content(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            text.push_str(&child.text_content());
        }
        text
    }

    fn at(&self, path: &[usize]) -> &Node {
        path.iter().fold(self, |node, &index| &node.children[index])
    }

    /// Paths of every descendant in document order
    fn descendants(&self, from: &[usize], out: &mut Vec<Vec<usize>>) {
        for (index, child) in self.at(from).children.iter().enumerate() {
            let mut path = from.to_vec();
            path.push(index);
            out.push(path.clone());
            self.descendants(&path, out);
        }
    }

    /// Visible when the element and all its ancestors are
    fn is_visible(&self, path: &[usize]) -> bool {
        let mut node = self;
        for &index in path {
            if !node.visible {
                return false;
            }
            node = &node.children[index];
        }
        node.visible
    }
}

fn is_marker(c: char) -> bool {
    matches!(c, '#' | '.' | '[')
}

/// `tag#id.class[attr="value"]` with any part optional
#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

impl Compound {
    fn parse(raw: &str) -> HarnessResult<Self> {
        let invalid = || HarnessError::collaborator(format!("unsupported selector '{raw}'"));
        let mut compound = Compound::default();
        let mut rest = raw;

        let tag_end = rest.find(is_marker).unwrap_or(rest.len());
        if tag_end > 0 {
            compound.tag = Some(rest[..tag_end].to_string());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            rest = &rest[1..];
            match marker {
                '#' | '.' => {
                    let end = rest.find(is_marker).unwrap_or(rest.len());
                    let name = rest[..end].to_string();
                    if name.is_empty() {
                        return Err(invalid());
                    }
                    if marker == '#' {
                        compound.id = Some(name);
                    } else {
                        compound.classes.push(name);
                    }
                    rest = &rest[end..];
                }
                '[' => {
                    let end = rest.find(']').ok_or_else(invalid)?;
                    let (name, value) = rest[..end].split_once('=').ok_or_else(invalid)?;
                    compound
                        .attrs
                        .push((name.trim().to_string(), value.trim().trim_matches('"').to_string()));
                    rest = &rest[end + 1..];
                }
                _ => return Err(invalid()),
            }
        }
        Ok(compound)
    }

    fn matches(&self, node: &Node) -> bool {
        self.tag.as_deref().map_or(true, |tag| tag == node.tag)
            && self.id.as_deref().map_or(true, |id| node.get_attr("id") == Some(id))
            && self.classes.iter().all(|class| node.has_class(class))
            && self
                .attrs
                .iter()
                .all(|(name, value)| node.get_attr(name) == Some(value.as_str()))
    }
}

/// Resolve a locator chain to element paths, in document order
fn resolve(root: &Node, selector: &Selector) -> HarnessResult<Vec<Vec<usize>>> {
    let mut matches: Vec<Vec<usize>> = vec![Vec::new()];
    for part in selector.parts() {
        matches = match part {
            SelectorPart::Css(css) => {
                let mut scopes = matches;
                // Descendant combinator: each compound narrows the previous scope
                for raw in css.split_whitespace() {
                    let compound = Compound::parse(raw)?;
                    let mut found: Vec<Vec<usize>> = Vec::new();
                    for scope in &scopes {
                        let mut all = Vec::new();
                        root.descendants(scope, &mut all);
                        for path in all {
                            if compound.matches(root.at(&path)) && !found.contains(&path) {
                                found.push(path);
                            }
                        }
                    }
                    found.sort();
                    scopes = found;
                }
                scopes
            }
            SelectorPart::First => matches.into_iter().take(1).collect(),
            SelectorPart::Nth(index) => matches.into_iter().skip(*index).take(1).collect(),
            SelectorPart::HasText(text) => {
                let needle = text.to_lowercase();
                matches
                    .into_iter()
                    .filter(|path| root.at(path).text_content().to_lowercase().contains(&needle))
                    .collect()
            }
        };
    }
    Ok(matches)
}

fn strict_violation(selector: &Selector, count: usize) -> HarnessError {
    HarnessError::collaborator(format!(
        "strict mode violation: locator('{selector}') resolved to {count} elements"
    ))
}

/// Exactly one element, for actions and single-element reads
fn resolve_one(root: &Node, selector: &Selector) -> HarnessResult<Option<Vec<usize>>> {
    let mut paths = resolve(root, selector)?;
    match paths.len() {
        0 => Ok(None),
        1 => Ok(paths.pop()),
        count => Err(strict_violation(selector, count)),
    }
}

struct FakeSession {
    state: Mutex<SiteState>,
    closed: Arc<AtomicUsize>,
}

impl FakeSession {
    /// Target of an action: present, unique and visible
    fn actionable(&self, selector: &Selector) -> HarnessResult<Option<Action>> {
        let state = self.state.lock();
        let root = state.render();
        let path = resolve_one(&root, selector)?
            .ok_or_else(|| HarnessError::collaborator(format!("no element matches locator('{selector}')")))?;
        if !root.is_visible(&path) {
            return Err(HarnessError::collaborator(format!(
                "element is not visible: locator('{selector}')"
            )));
        }
        Ok(root.at(&path).action)
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&self, url: &str) -> HarnessResult<()> {
        self.state.lock().goto(url)
    }

    async fn fill(&self, target: &Selector, value: &str) -> HarnessResult<()> {
        match self.actionable(target)? {
            Some(Action::Input(field)) => {
                self.state.lock().fill(field, value);
                Ok(())
            }
            _ => Err(HarnessError::collaborator(format!(
                "element is not an <input>: locator('{target}')"
            ))),
        }
    }

    async fn click(&self, target: &Selector) -> HarnessResult<()> {
        match self.actionable(target)? {
            Some(action) => self.state.lock().perform(action),
            None => Ok(()),
        }
    }

    async fn current_url(&self) -> HarnessResult<String> {
        let state = self.state.lock();
        if state.screen == Screen::Blank {
            return Ok("about:blank".to_string());
        }
        Ok(join_url(FAKE_SAUCEDEMO_URL, state.screen.path()))
    }

    async fn text_content(&self, target: &Selector) -> HarnessResult<Option<String>> {
        let root = self.state.lock().render();
        Ok(resolve_one(&root, target)?.map(|path| root.at(&path).text_content()))
    }

    async fn is_visible(&self, target: &Selector) -> HarnessResult<bool> {
        let root = self.state.lock().render();
        Ok(resolve_one(&root, target)?.map_or(false, |path| root.is_visible(&path)))
    }

    async fn count(&self, target: &Selector) -> HarnessResult<usize> {
        let root = self.state.lock().render();
        Ok(resolve(&root, target)?.len())
    }

    async fn close(&self) -> HarnessResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
