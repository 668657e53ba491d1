//! PlanCheck E2E Suites
//!
//! The concrete suites run by the `e2e` binary:
//! - Pet-store REST API: smoke, CRUD and negative cases
//! - SauceDemo storefront UI: authentication, cart, checkout and navigation
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    plancheck-e2e                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  petstore::PetStoreApi    URLs, Pet model, tracked fixtures │
//! │    ├── smoke              Smoke Test                        │
//! │    ├── crud               Pet CRUD Operations               │
//! │    └── negative           Negative Test Cases               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  saucedemo::SauceDemo     URLs, selectors, login helpers    │
//! │    ├── authentication     Authentication                    │
//! │    ├── cart               Shopping Cart Operations          │
//! │    ├── checkout           Checkout Flow                     │
//! │    └── navigation         Navigation and UI Elements        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  output                   text / JSON run reports           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod output;
pub mod petstore;
pub mod saucedemo;

use plancheck_harness::{HarnessConfig, Suite};

pub use output::{print_report, OutputFormat};
pub use petstore::PetStoreApi;
pub use saucedemo::SauceDemo;

/// REST API suites against the configured pet store
pub fn api_suites(config: &HarnessConfig) -> Vec<Suite> {
    let api = PetStoreApi::new(&config.petstore_url);
    vec![
        petstore::smoke::suite(&api),
        petstore::crud::suite(&api),
        petstore::negative::suite(&api),
    ]
}

/// Browser suites against the configured storefront
pub fn ui_suites(config: &HarnessConfig) -> Vec<Suite> {
    let site = SauceDemo::new(&config.saucedemo_url);
    vec![
        saucedemo::authentication::suite(&site),
        saucedemo::cart::suite(&site),
        saucedemo::checkout::suite(&site),
        saucedemo::navigation::suite(&site),
    ]
}

/// Every built-in suite, API first
pub fn all_suites(config: &HarnessConfig) -> Vec<Suite> {
    let mut suites = api_suites(config);
    suites.extend(ui_suites(config));
    suites
}
