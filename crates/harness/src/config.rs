//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};

/// Default config file looked up by the e2e binary
pub const DEFAULT_CONFIG_FILE: &str = "plancheck.toml";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the pet-store REST API
    pub petstore_url: String,

    /// Base URL of the SauceDemo web UI
    pub saucedemo_url: String,

    /// Deadline for one case, setup hook included
    pub case_timeout_ms: u64,

    /// How long UI assertions keep re-checking before failing
    pub expect_timeout_ms: u64,

    /// Deadline for a single HTTP request
    pub request_timeout_ms: u64,

    /// Deadline for each deferred cleanup
    pub cleanup_timeout_ms: u64,

    /// Cases of one suite allowed in flight at once
    pub max_parallel: usize,

    /// Browser configuration
    pub browser: BrowserConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            petstore_url: "https://petstore.swagger.io/v2".to_string(),
            saucedemo_url: "https://www.saucedemo.com/".to_string(),
            case_timeout_ms: 30_000,
            expect_timeout_ms: 5_000,
            request_timeout_ms: 15_000,
            cleanup_timeout_ms: 10_000,
            max_parallel: 1,
            browser: BrowserConfig::default(),
        }
    }
}

/// Browser-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Browser engine
    pub kind: BrowserKind,

    /// Run without a visible window
    pub headless: bool,

    /// Node.js executable used to host the Playwright bridge
    pub node_binary: String,

    /// Viewport width
    pub viewport_width: u32,

    /// Viewport height
    pub viewport_height: u32,

    /// Playwright default action timeout (click, fill, goto)
    pub action_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chromium,
            headless: true,
            node_binary: "node".to_string(),
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" | "safari" => Ok(BrowserKind::Webkit),
            other => Err(HarnessError::InvalidConfig(format!("unknown browser '{other}'"))),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runner cannot work with
    pub fn validate(&self) -> HarnessResult<()> {
        for (field, url) in [("petstore_url", &self.petstore_url), ("saucedemo_url", &self.saucedemo_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(HarnessError::InvalidConfig(format!(
                    "{field} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.max_parallel == 0 {
            return Err(HarnessError::InvalidConfig("max_parallel must be at least 1".into()));
        }
        for (field, value) in [
            ("case_timeout_ms", self.case_timeout_ms),
            ("expect_timeout_ms", self.expect_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("cleanup_timeout_ms", self.cleanup_timeout_ms),
        ] {
            if value == 0 {
                return Err(HarnessError::InvalidConfig(format!("{field} must be positive")));
            }
        }
        Ok(())
    }

    pub fn case_timeout(&self) -> Duration {
        Duration::from_millis(self.case_timeout_ms)
    }

    pub fn expect_timeout(&self) -> Duration {
        Duration::from_millis(self.expect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_millis(self.cleanup_timeout_ms)
    }
}

/// Join a base URL and a path with exactly one slash between them.
///
/// Absolute URLs are returned untouched so specs may mix both forms.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}")
    }
}
