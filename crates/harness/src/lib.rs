//! PlanCheck Harness
//!
//! This crate provides the execution and assertion layer behind the
//! PlanCheck suites:
//! - Drives an HTTP collaborator (reqwest) and a browser collaborator
//!   (Playwright over a JSON-lines bridge)
//! - Evaluates structured assertions with readable expected/actual output
//! - Runs cases under per-case timeouts with unconditional cleanup
//! - Parses declarative YAML case specs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SuiteRunner                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  run_suite(&Suite) -> SuiteReport                           │
//! │    for each Case:                                           │
//! │      ├── open_page()            (browser cases only)        │
//! │      ├── setup hook  ─┐                                     │
//! │      ├── procedure   ─┴─ under case_timeout                 │
//! │      ├── deferred cleanups (LIFO, always)                   │
//! │      └── CaseReport { outcome, steps, assertions, notes }   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CaseContext                                                │
//! │    ├── get / post / put / delete  -> HttpClient             │
//! │    ├── page()                     -> BrowserSession         │
//! │    ├── expect(..) / expect_page / expect_locator            │
//! │    ├── diverge(..) / note(..)                               │
//! │    └── defer_cleanup(..) / fresh_id()                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod assertion;
pub mod browser;
pub mod case;
pub mod config;
pub mod error;
pub mod http;
pub mod journal;
pub mod runner;
pub mod spec;
pub mod suite;

pub use assertion::{assert, expect_value, AssertionFailure, AssertionKind, Expect};
pub use browser::page::{expect_locator, expect_page, Locator, Page};
pub use browser::{BrowserLauncher, BrowserSession, Selector};
pub use case::{Case, CaseContext, Divergence, FixtureIds, Outcome};
pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use http::{HttpClient, HttpMethod, HttpResponse, ReqwestClient};
pub use runner::{CaseFilter, CaseReport, Collaborators, RunReport, RunnerConfig, SuiteReport, SuiteRunner};
pub use spec::{CaseSpec, SuiteSpec};
pub use suite::Suite;
