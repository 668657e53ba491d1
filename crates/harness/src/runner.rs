//! Suite runner that orchestrates collaborators, deadlines and cleanup

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::browser::page::Page;
use crate::browser::BrowserLauncher;
use crate::case::{Case, CaseContext, FixtureIds, Outcome};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::http::HttpClient;
use crate::journal::{AssertionRecord, Journal, StepRecord};
use crate::suite::Suite;

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub suite: String,
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub message: Option<String>,
    pub notes: Vec<String>,
    pub steps: Vec<StepRecord>,
    pub assertions: Vec<AssertionRecord>,
}

/// Result of running one suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    fn from_cases(suite: &str, started_at: DateTime<Utc>, duration: Duration, cases: Vec<CaseReport>) -> Self {
        let count = |pred: fn(&Outcome) -> bool| cases.iter().filter(|c| pred(&c.outcome)).count();
        Self {
            suite: suite.to_string(),
            started_at,
            total: cases.len(),
            passed: count(|o| matches!(o, Outcome::Passed)),
            failed: count(|o| matches!(o, Outcome::Failed { .. })),
            errored: count(|o| matches!(o, Outcome::Errored { .. })),
            skipped: count(|o| matches!(o, Outcome::Skipped { .. })),
            duration_ms: duration.as_millis() as u64,
            cases,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }
}

/// Result of running several suites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub suites: Vec<SuiteReport>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// The external systems cases drive
#[derive(Clone)]
pub struct Collaborators {
    pub http: Arc<dyn HttpClient>,
    pub browser: Option<Arc<dyn BrowserLauncher>>,
}

impl Collaborators {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http, browser: None }
    }

    pub fn with_browser(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = Some(launcher);
        self
    }
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub case_timeout: Duration,
    pub expect_timeout: Duration,
    pub cleanup_timeout: Duration,
    pub max_parallel: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from(&HarnessConfig::default())
    }
}

impl From<&HarnessConfig> for RunnerConfig {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            case_timeout: config.case_timeout(),
            expect_timeout: config.expect_timeout(),
            cleanup_timeout: config.cleanup_timeout(),
            max_parallel: config.max_parallel,
        }
    }
}

/// Selects which cases run. Empty filters select everything.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    /// Run cases carrying any of these tags
    pub tags: Vec<String>,
    /// Case-insensitive substring of the case name
    pub name: Option<String>,
}

impl CaseFilter {
    pub fn matches(&self, case: &Case) -> bool {
        let tag_ok = self.tags.is_empty() || case.tags().iter().any(|t| self.tags.contains(t));
        let name_ok = self
            .name
            .as_ref()
            .map(|n| case.name().to_lowercase().contains(&n.to_lowercase()))
            .unwrap_or(true);
        tag_ok && name_ok
    }
}

/// Runs suites against a set of collaborators
pub struct SuiteRunner {
    collaborators: Collaborators,
    config: RunnerConfig,
    filter: CaseFilter,
    ids: Arc<FixtureIds>,
}

impl SuiteRunner {
    pub fn new(collaborators: Collaborators, config: RunnerConfig) -> Self {
        Self {
            collaborators,
            config,
            filter: CaseFilter::default(),
            ids: Arc::new(FixtureIds::seeded()),
        }
    }

    pub fn with_filter(mut self, filter: CaseFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_fixture_ids(mut self, ids: Arc<FixtureIds>) -> Self {
        self.ids = ids;
        self
    }

    /// Run suites one after another
    pub async fn run_all(&self, suites: &[Suite]) -> RunReport {
        let start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        info!(%run_id, suites = suites.len(), "Starting run");

        let mut reports = Vec::with_capacity(suites.len());
        for suite in suites {
            reports.push(self.run_suite(suite).await);
        }

        let sum = |f: fn(&SuiteReport) -> usize| reports.iter().map(f).sum::<usize>();
        let report = RunReport {
            run_id,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            total: sum(|r| r.total),
            passed: sum(|r| r.passed),
            failed: sum(|r| r.failed),
            errored: sum(|r| r.errored),
            skipped: sum(|r| r.skipped),
            suites: reports,
        };

        info!(
            "Run Results: {} passed, {} failed, {} errored, {} skipped ({} ms)",
            report.passed, report.failed, report.errored, report.skipped, report.duration_ms
        );
        report
    }

    /// Run every selected case of a suite. A failing case never stops the
    /// remaining ones.
    pub async fn run_suite(&self, suite: &Suite) -> SuiteReport {
        let start = Instant::now();
        let started_at = Utc::now();
        let selected: Vec<&Case> = suite.cases().iter().filter(|c| self.filter.matches(c)).collect();
        let parallel = if suite.is_sequential() {
            1
        } else {
            self.config.max_parallel.max(1)
        };

        info!(suite = suite.name(), parallel, "Running {} case(s)...", selected.len());

        // `buffered` keeps declaration order in the report
        let cases: Vec<CaseReport> = stream::iter(selected)
            .map(|case| self.run_case(suite, case))
            .buffered(parallel)
            .collect()
            .await;

        let report = SuiteReport::from_cases(suite.name(), started_at, start.elapsed(), cases);
        info!(
            suite = suite.name(),
            "Suite Results: {} passed, {} failed, {} errored, {} skipped ({} ms)",
            report.passed,
            report.failed,
            report.errored,
            report.skipped,
            report.duration_ms
        );
        report
    }

    /// Run one case: setup hook and procedure under the case deadline,
    /// then deferred cleanups, then the browser session is closed.
    pub async fn run_case(&self, suite: &Suite, case: &Case) -> CaseReport {
        let start = Instant::now();
        let journal = Arc::new(Journal::default());

        if let Some(reason) = case.skip_reason() {
            let outcome = Outcome::Skipped { reason: reason.to_string() };
            return self.finish(suite, case, outcome, start, &journal);
        }

        debug!(suite = suite.name(), "Running case: {}", case.name());

        let page = if case.needs_browser() {
            match self.open_page(journal.clone()).await {
                Ok(page) => Some(page),
                Err(e) => {
                    let outcome = Outcome::Errored {
                        message: format!("could not open browser: {e}"),
                    };
                    return self.finish(suite, case, outcome, start, &journal);
                }
            }
        } else {
            None
        };

        let ctx = CaseContext::new(
            case.name(),
            self.collaborators.http.clone(),
            page.clone(),
            journal.clone(),
            self.ids.clone(),
        );

        let body = async {
            if let Some(setup) = suite.setup() {
                setup(ctx.clone()).await?;
            }
            case.start(ctx.clone()).await
        };

        let result = match tokio::time::timeout(self.config.case_timeout, body).await {
            Ok(result) => result,
            Err(_) => Err(HarnessError::Timeout {
                what: format!("case '{}'", case.name()),
                ms: self.config.case_timeout.as_millis() as u64,
            }),
        };

        let mut outcome = Outcome::from_result(&result);

        if let Some(cleanup_error) = self.run_cleanups(&ctx).await {
            let message = format!("cleanup failed: {cleanup_error}");
            journal.note(message.clone());
            if outcome.is_passed() {
                outcome = Outcome::Errored { message };
            }
        }

        if let Some(page) = page {
            if let Err(e) = page.close().await {
                warn!(case = case.name(), "Failed to close browser session: {}", e);
            }
        }

        self.finish(suite, case, outcome, start, &journal)
    }

    async fn open_page(&self, journal: Arc<Journal>) -> HarnessResult<Page> {
        let launcher = self
            .collaborators
            .browser
            .as_ref()
            .ok_or_else(|| HarnessError::collaborator("no browser collaborator configured"))?;
        let session = launcher.open().await?;
        Ok(Page::new(session, journal, self.config.expect_timeout))
    }

    /// Run every registered cleanup once. Returns the first failure.
    async fn run_cleanups(&self, ctx: &CaseContext) -> Option<String> {
        let mut first_error = None;
        for cleanup in ctx.take_cleanups() {
            let label = cleanup.label.clone();
            debug!(case = ctx.case_name(), "Running cleanup: {}", label);
            let result = match tokio::time::timeout(self.config.cleanup_timeout, cleanup.start(ctx.clone())).await {
                Ok(result) => result,
                Err(_) => Err(HarnessError::Timeout {
                    what: format!("cleanup '{label}'"),
                    ms: self.config.cleanup_timeout.as_millis() as u64,
                }),
            };
            if let Err(e) = result {
                warn!(case = ctx.case_name(), "Cleanup '{}' failed: {}", label, e);
                first_error.get_or_insert_with(|| format!("{label}: {e}"));
            }
        }
        first_error
    }

    fn finish(&self, suite: &Suite, case: &Case, outcome: Outcome, start: Instant, journal: &Journal) -> CaseReport {
        let duration_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Outcome::Passed => info!("✓ {} ({} ms)", case.name(), duration_ms),
            Outcome::Failed { message } => error!("✗ {} - {}", case.name(), message),
            Outcome::Errored { message } => error!("! {} - {}", case.name(), message),
            Outcome::Skipped { reason } => info!("- {} (skipped: {})", case.name(), reason),
        }

        CaseReport {
            suite: suite.name().to_string(),
            name: case.name().to_string(),
            message: outcome.message().map(str::to_string),
            outcome,
            duration_ms,
            notes: journal.notes(),
            steps: journal.steps(),
            assertions: journal.assertions(),
        }
    }
}
