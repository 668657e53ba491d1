//! Browser collaborator
//!
//! The harness never renders pages itself. A [`BrowserLauncher`] opens one
//! isolated [`BrowserSession`] (context + page) per case; cases address
//! elements through [`Selector`] chains that mirror Playwright locators.

pub mod page;
pub mod playwright;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::HarnessResult;

/// One refinement in a locator chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SelectorPart {
    /// CSS selector evaluated inside the previous matches
    Css(String),
    First,
    Nth(usize),
    /// Keep matches whose text contains the value
    HasText(String),
}

/// Locator chain, e.g. `.inventory_item >> nth=1 >> button >> has-text="Add to cart"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector {
    parts: Vec<SelectorPart>,
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            parts: vec![SelectorPart::Css(selector.into())],
        }
    }

    pub fn parts(&self) -> &[SelectorPart] {
        &self.parts
    }

    pub fn locator(&self, selector: impl Into<String>) -> Self {
        self.with(SelectorPart::Css(selector.into()))
    }

    pub fn first(&self) -> Self {
        self.with(SelectorPart::First)
    }

    pub fn nth(&self, index: usize) -> Self {
        self.with(SelectorPart::Nth(index))
    }

    pub fn filter_has_text(&self, text: impl Into<String>) -> Self {
        self.with(SelectorPart::HasText(text.into()))
    }

    fn with(&self, part: SelectorPart) -> Self {
        let mut parts = self.parts.clone();
        parts.push(part);
        Self { parts }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            match part {
                SelectorPart::Css(css) => write!(f, "{css}")?,
                SelectorPart::First => f.write_str("nth=0")?,
                SelectorPart::Nth(n) => write!(f, "nth={n}")?,
                SelectorPart::HasText(text) => write!(f, "has-text={text:?}")?,
            }
        }
        Ok(())
    }
}

/// An open page driven by a browser automation backend.
///
/// Read operations report the current state without waiting; settling
/// is done by the assertion layer. `text_content` returns `None` when
/// nothing matches.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> HarnessResult<()>;
    async fn fill(&self, target: &Selector, value: &str) -> HarnessResult<()>;
    async fn click(&self, target: &Selector) -> HarnessResult<()>;
    async fn current_url(&self) -> HarnessResult<String>;
    async fn text_content(&self, target: &Selector) -> HarnessResult<Option<String>>;
    async fn is_visible(&self, target: &Selector) -> HarnessResult<bool>;
    async fn count(&self, target: &Selector) -> HarnessResult<usize>;
    async fn close(&self) -> HarnessResult<()>;
}

/// Opens fresh, isolated sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn open(&self) -> HarnessResult<Arc<dyn BrowserSession>>;
}
