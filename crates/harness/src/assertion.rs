//! Assertion engine
//!
//! Every expectation, whether it targets an HTTP body or the rendered
//! state of a page, funnels into [`evaluate`]. UI observations are
//! converted to JSON values first (`true`/`false` for visibility, a
//! string for text and URLs, a number for counts) so that one comparison
//! routine and one failure format serve both collaborators.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{HarnessError, HarnessResult};
use crate::journal::{AssertionRecord, Journal};

/// Comparison performed by an assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    /// Deep structural equality
    Equals,
    /// Substring of a string, or element of an array
    Contains,
    /// Object defines the named field
    HasProperty,
    /// Length of an array or string
    Count,
    /// Equal to one member of a set
    OneOf,
    Visible,
    NotVisible,
    /// Whitespace-normalised full text match
    HasText,
    /// Whitespace-normalised substring match
    ContainsText,
    HasUrl,
    /// Number of elements matched by a locator
    HasCount,
}

impl AssertionKind {
    pub fn describe(&self) -> &'static str {
        match self {
            AssertionKind::Equals => "to equal",
            AssertionKind::Contains => "to contain",
            AssertionKind::HasProperty => "to have property",
            AssertionKind::Count => "to have length",
            AssertionKind::OneOf => "to be one of",
            AssertionKind::Visible => "to be visible",
            AssertionKind::NotVisible => "to be hidden",
            AssertionKind::HasText => "to have text",
            AssertionKind::ContainsText => "to contain text",
            AssertionKind::HasUrl => "to have URL",
            AssertionKind::HasCount => "to have count",
        }
    }

    fn takes_expected(&self) -> bool {
        !matches!(self, AssertionKind::Visible | AssertionKind::NotVisible)
    }
}

/// An expectation that was not met
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionFailure {
    pub label: String,
    pub kind: AssertionKind,
    pub negated: bool,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = if self.negated { "not " } else { "" };
        if self.kind.takes_expected() {
            write!(
                f,
                "{}: expected {}{} {}\n  received: {}",
                self.label,
                not,
                self.kind.describe(),
                self.expected,
                self.actual
            )
        } else {
            write!(f, "{}: expected {}{}\n  received: {}", self.label, not, self.kind.describe(), self.actual)
        }
    }
}

impl std::error::Error for AssertionFailure {}

/// `assert(actual, expected, kind)` with a generic label
pub fn assert(actual: &Value, expected: &Value, kind: AssertionKind) -> Result<(), AssertionFailure> {
    evaluate("value", actual, expected, kind, false)
}

/// Evaluate one assertion, optionally negated
pub fn evaluate(
    label: &str,
    actual: &Value,
    expected: &Value,
    kind: AssertionKind,
    negated: bool,
) -> Result<(), AssertionFailure> {
    if holds(actual, expected, kind) != negated {
        Ok(())
    } else {
        Err(AssertionFailure {
            label: label.to_string(),
            kind,
            negated,
            expected: render(expected),
            actual: render(actual),
        })
    }
}

fn holds(actual: &Value, expected: &Value, kind: AssertionKind) -> bool {
    match kind {
        AssertionKind::Equals | AssertionKind::HasUrl | AssertionKind::HasCount => {
            values_equal(actual, expected)
        }
        AssertionKind::Contains => match (actual, expected) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
            _ => false,
        },
        AssertionKind::HasProperty => match (actual, expected) {
            (Value::Object(map), Value::String(field)) => map.contains_key(field),
            _ => false,
        },
        AssertionKind::Count => match (actual.as_array(), expected.as_u64()) {
            (Some(items), Some(want)) => items.len() as u64 == want,
            _ => false,
        },
        AssertionKind::OneOf => expected
            .as_array()
            .is_some_and(|set| set.iter().any(|member| values_equal(actual, member))),
        AssertionKind::Visible => actual.as_bool() == Some(true),
        AssertionKind::NotVisible => actual.as_bool() != Some(true),
        AssertionKind::HasText => match (actual.as_str(), expected.as_str()) {
            (Some(text), Some(want)) => normalize_whitespace(text) == normalize_whitespace(want),
            _ => false,
        },
        AssertionKind::ContainsText => match (actual.as_str(), expected.as_str()) {
            (Some(text), Some(want)) => normalize_whitespace(text).contains(&normalize_whitespace(want)),
            _ => false,
        },
    }
}

/// Structural equality where `1` and `1.0` are the same number
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a value for failure messages: compact scalars, pretty composites
pub fn render(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        _ => value.to_string(),
    }
}

/// Fluent expectation over a captured value.
///
/// Created with [`Expect::new`] or, inside a case, with
/// `CaseContext::expect` so the outcome lands in the case journal.
#[derive(Debug, Clone)]
pub struct Expect {
    label: String,
    actual: Value,
    negated: bool,
    journal: Option<Arc<Journal>>,
}

impl Expect {
    pub fn new(label: impl Into<String>, actual: Value) -> Self {
        Self {
            label: label.into(),
            actual,
            negated: false,
            journal: None,
        }
    }

    pub(crate) fn journaled(label: impl Into<String>, actual: Value, journal: Arc<Journal>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::new(label, actual)
        }
    }

    /// Invert the next check
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn actual(&self) -> &Value {
        &self.actual
    }

    pub fn to_equal<T: Serialize + ?Sized>(&self, expected: &T) -> HarnessResult<()> {
        self.check(serde_json::to_value(expected)?, AssertionKind::Equals)
    }

    pub fn to_contain<T: Serialize + ?Sized>(&self, expected: &T) -> HarnessResult<()> {
        self.check(serde_json::to_value(expected)?, AssertionKind::Contains)
    }

    pub fn to_have_property(&self, name: &str) -> HarnessResult<()> {
        self.check(Value::String(name.to_string()), AssertionKind::HasProperty)
    }

    pub fn to_have_length(&self, len: usize) -> HarnessResult<()> {
        self.check(Value::from(len), AssertionKind::Count)
    }

    pub fn to_be_one_of<T: Serialize>(&self, set: &[T]) -> HarnessResult<()> {
        self.check(serde_json::to_value(set)?, AssertionKind::OneOf)
    }

    fn check(&self, expected: Value, kind: AssertionKind) -> HarnessResult<()> {
        let result = evaluate(&self.label, &self.actual, &expected, kind, self.negated);
        if let Some(journal) = &self.journal {
            journal.record_assertion(AssertionRecord {
                label: self.label.clone(),
                kind,
                negated: self.negated,
                expected: render(&expected),
                actual: render(&self.actual),
                passed: result.is_ok(),
            });
        }
        result.map_err(HarnessError::from)
    }
}

/// Unjournaled `expect(value)`
pub fn expect_value(actual: &Value) -> Expect {
    Expect::new("value", actual.clone())
}
