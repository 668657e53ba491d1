//! Error types for the harness

use thiserror::Error;

use crate::assertion::AssertionFailure;

#[derive(Error, Debug)]
pub enum HarnessError {
    /// An expectation was not met. Reported as a failed case.
    #[error("{0}")]
    Assertion(#[from] AssertionFailure),

    /// A collaborator could not produce a value (transport failure,
    /// malformed response, driver exception). Reported as an errored case.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Timeout after {ms} ms: {what}")]
    Timeout { what: String, ms: u64 },

    #[error("Playwright not found. Install with: npm i playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Case spec parse error: {0}")]
    SpecParse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HarnessError {
    pub fn collaborator(message: impl Into<String>) -> Self {
        HarnessError::Collaborator(message.into())
    }

    /// True when the error is an unmet expectation rather than a failure
    /// to obtain the actual value.
    pub fn is_assertion(&self) -> bool {
        matches!(self, HarnessError::Assertion(_))
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
