//! Offline stand-ins for the pet store and SauceDemo used by the suite tests

#![allow(dead_code)]

pub mod saucedemo;

use std::sync::Arc;
use std::time::Duration;

use plancheck_harness::{Collaborators, HarnessConfig, ReqwestClient, RunnerConfig, SuiteRunner};

pub use petstore::{FakePetStore, StoreMode};
pub use saucedemo::{FakeSauceDemo, FAKE_SAUCEDEMO_URL};

/// Short deadlines: every fake answers immediately
pub fn runner_config(max_parallel: usize) -> RunnerConfig {
    RunnerConfig {
        case_timeout: Duration::from_secs(10),
        expect_timeout: Duration::from_millis(500),
        cleanup_timeout: Duration::from_secs(2),
        max_parallel,
    }
}

pub fn harness_config(petstore_url: &str) -> HarnessConfig {
    HarnessConfig {
        petstore_url: petstore_url.to_string(),
        saucedemo_url: FAKE_SAUCEDEMO_URL.to_string(),
        ..HarnessConfig::default()
    }
}

pub fn http() -> Arc<ReqwestClient> {
    Arc::new(ReqwestClient::new(Duration::from_secs(5)).unwrap())
}

/// Runner over the real HTTP client and, when given, a fake storefront
pub fn runner(browser: Option<&FakeSauceDemo>, max_parallel: usize) -> SuiteRunner {
    let mut collaborators = Collaborators::new(http());
    if let Some(site) = browser {
        collaborators = collaborators.with_browser(Arc::new(site.clone()));
    }
    SuiteRunner::new(collaborators, runner_config(max_parallel))
}
