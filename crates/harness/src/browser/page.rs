//! Page and locator handles bound to a case, plus web-first expectations

use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::assertion::{evaluate, render, AssertionKind};
use crate::browser::{BrowserSession, Selector};
use crate::error::{HarnessError, HarnessResult};
use crate::journal::{AssertionRecord, Journal, StepRecord};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The browser page of one case
#[derive(Clone)]
pub struct Page {
    session: Arc<dyn BrowserSession>,
    journal: Arc<Journal>,
    expect_timeout: Duration,
}

impl Page {
    pub fn new(session: Arc<dyn BrowserSession>, journal: Arc<Journal>, expect_timeout: Duration) -> Self {
        Self {
            session,
            journal,
            expect_timeout,
        }
    }

    pub async fn goto(&self, url: &str) -> HarnessResult<()> {
        record(&self.journal, format!("goto:{url}"), json!({ "url": url }), self.session.goto(url)).await
    }

    pub async fn fill(&self, selector: &str, value: &str) -> HarnessResult<()> {
        self.locator(selector).fill(value).await
    }

    pub async fn click(&self, selector: &str) -> HarnessResult<()> {
        self.locator(selector).click().await
    }

    pub async fn url(&self) -> HarnessResult<String> {
        self.session.current_url().await
    }

    pub fn locator(&self, selector: &str) -> Locator {
        Locator {
            page: self.clone(),
            selector: Selector::css(selector),
        }
    }

    pub(crate) async fn close(&self) -> HarnessResult<()> {
        self.session.close().await
    }
}

/// A lazily evaluated element query on a [`Page`]
#[derive(Clone)]
pub struct Locator {
    page: Page,
    selector: Selector,
}

impl Locator {
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn first(&self) -> Locator {
        self.refine(self.selector.first())
    }

    pub fn nth(&self, index: usize) -> Locator {
        self.refine(self.selector.nth(index))
    }

    pub fn locator(&self, selector: &str) -> Locator {
        self.refine(self.selector.locator(selector))
    }

    pub fn filter_has_text(&self, text: &str) -> Locator {
        self.refine(self.selector.filter_has_text(text))
    }

    pub async fn click(&self) -> HarnessResult<()> {
        let session = &self.page.session;
        record(
            &self.page.journal,
            format!("click:{}", self.selector),
            json!({ "selector": self.selector.to_string() }),
            session.click(&self.selector),
        )
        .await
    }

    pub async fn fill(&self, value: &str) -> HarnessResult<()> {
        let session = &self.page.session;
        record(
            &self.page.journal,
            format!("fill:{}", self.selector),
            json!({ "selector": self.selector.to_string(), "value": value }),
            session.fill(&self.selector, value),
        )
        .await
    }

    pub async fn text_content(&self) -> HarnessResult<Option<String>> {
        self.page.session.text_content(&self.selector).await
    }

    pub async fn count(&self) -> HarnessResult<usize> {
        self.page.session.count(&self.selector).await
    }

    pub async fn is_visible(&self) -> HarnessResult<bool> {
        self.page.session.is_visible(&self.selector).await
    }

    fn refine(&self, selector: Selector) -> Locator {
        Locator {
            page: self.page.clone(),
            selector,
        }
    }
}

async fn record<F>(journal: &Journal, action: String, input: Value, action_future: F) -> HarnessResult<()>
where
    F: Future<Output = HarnessResult<()>>,
{
    let start = Instant::now();
    debug!("Executing step: {}", action);
    let result = action_future.await;
    journal.record_step(StepRecord {
        action,
        input: Some(input),
        output: None,
        duration_ms: start.elapsed().as_millis() as u64,
        success: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
    });
    result
}

/// `expect(page)`: URL expectations
pub fn expect_page(page: &Page) -> PageExpectation {
    PageExpectation {
        page: page.clone(),
        negated: false,
    }
}

/// `expect(locator)`: element expectations
pub fn expect_locator(locator: &Locator) -> LocatorExpectation {
    LocatorExpectation {
        locator: locator.clone(),
        negated: false,
    }
}

pub struct PageExpectation {
    page: Page,
    negated: bool,
}

impl PageExpectation {
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub async fn to_have_url(&self, url: &str) -> HarnessResult<()> {
        let session = self.page.session.clone();
        settle(&self.page, "page URL", AssertionKind::HasUrl, json!(url), self.negated, || {
            let session = session.clone();
            async move { Ok(Value::String(session.current_url().await?)) }
        })
        .await
    }
}

pub struct LocatorExpectation {
    locator: Locator,
    negated: bool,
}

impl LocatorExpectation {
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub async fn to_be_visible(&self) -> HarnessResult<()> {
        // `not().to_be_visible()` is its own kind so reports read "to be hidden"
        let kind = if self.negated {
            AssertionKind::NotVisible
        } else {
            AssertionKind::Visible
        };
        self.observe(kind, Value::Null, false, |session, selector| async move {
            Ok(Value::Bool(session.is_visible(&selector).await?))
        })
        .await
    }

    pub async fn to_have_text(&self, text: &str) -> HarnessResult<()> {
        self.observe(AssertionKind::HasText, json!(text), self.negated, text_of).await
    }

    pub async fn to_contain_text(&self, text: &str) -> HarnessResult<()> {
        self.observe(AssertionKind::ContainsText, json!(text), self.negated, text_of).await
    }

    pub async fn to_have_count(&self, count: usize) -> HarnessResult<()> {
        self.observe(AssertionKind::HasCount, json!(count), self.negated, |session, selector| async move {
            Ok(Value::from(session.count(&selector).await?))
        })
        .await
    }

    async fn observe<F, Fut>(&self, kind: AssertionKind, expected: Value, negated: bool, read: F) -> HarnessResult<()>
    where
        F: Fn(Arc<dyn BrowserSession>, Selector) -> Fut,
        Fut: Future<Output = HarnessResult<Value>>,
    {
        let label = self.locator.selector.to_string();
        let session = self.locator.page.session.clone();
        let selector = self.locator.selector.clone();
        settle(&self.locator.page, &label, kind, expected, negated, || {
            read(session.clone(), selector.clone())
        })
        .await
    }
}

async fn text_of(session: Arc<dyn BrowserSession>, selector: Selector) -> HarnessResult<Value> {
    Ok(session
        .text_content(&selector)
        .await?
        .map(Value::String)
        .unwrap_or(Value::Null))
}

/// Re-read the actual value until the assertion holds or the page's
/// expect timeout elapses. Collaborator errors end the wait immediately.
async fn settle<F, Fut>(
    page: &Page,
    label: &str,
    kind: AssertionKind,
    expected: Value,
    negated: bool,
    mut read: F,
) -> HarnessResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<Value>>,
{
    let deadline = Instant::now() + page.expect_timeout;
    loop {
        let actual = read().await?;
        let result = evaluate(label, &actual, &expected, kind, negated);
        let expired = Instant::now() >= deadline;
        if result.is_ok() || expired {
            page.journal.record_assertion(AssertionRecord {
                label: label.to_string(),
                kind,
                negated,
                expected: render(&expected),
                actual: render(&actual),
                passed: result.is_ok(),
            });
            return result.map_err(HarnessError::from);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
