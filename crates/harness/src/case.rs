//! Test cases and the per-case execution context

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::assertion::Expect;
use crate::browser::page::Page;
use crate::error::{HarnessError, HarnessResult};
use crate::http::{excerpt, HttpClient, HttpMethod, HttpResponse};
use crate::journal::{Journal, StepRecord};

/// Boxed body of a case, setup hook or cleanup
pub type CaseFuture = BoxFuture<'static, HarnessResult<()>>;

pub(crate) type Procedure = Arc<dyn Fn(CaseContext) -> CaseFuture + Send + Sync>;

type CleanupFn = Box<dyn FnOnce(CaseContext) -> CaseFuture + Send>;

/// Terminal result of a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// First unmet expectation
    Failed { message: String },
    /// Collaborator failure, timeout or cleanup failure
    Errored { message: String },
    Skipped { reason: String },
}

impl Outcome {
    pub fn from_result(result: &HarnessResult<()>) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(e) if e.is_assertion() => Outcome::Failed { message: e.to_string() },
            Err(e) => Outcome::Errored { message: e.to_string() },
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed { message } | Outcome::Errored { message } => Some(message),
            Outcome::Skipped { reason } => Some(reason),
        }
    }
}

/// Which arm of a documented divergence a case took.
///
/// `Permissive` means the collaborator accepted something the nominal
/// contract says it should reject; the case runs a reduced assertion set
/// and records an advisory note instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Divergence {
    Strict,
    Permissive,
}

/// Source of fixture identifiers that are unique for the whole process.
///
/// Seeded from the wall clock so that ids also differ between runs
/// against a shared remote service.
#[derive(Debug)]
pub struct FixtureIds {
    next: AtomicI64,
}

impl FixtureIds {
    pub fn seeded() -> Self {
        let jitter: i64 = rand::thread_rng().gen_range(0..1_000);
        Self::starting_at(Utc::now().timestamp_millis() * 1_000 + jitter)
    }

    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for FixtureIds {
    fn default() -> Self {
        Self::seeded()
    }
}

/// One documented scenario
#[derive(Clone)]
pub struct Case {
    name: String,
    tags: Vec<String>,
    needs_browser: bool,
    skip: Option<String>,
    procedure: Procedure,
}

impl Case {
    pub fn new<F, Fut>(name: impl Into<String>, procedure: F) -> Self
    where
        F: Fn(CaseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            needs_browser: false,
            skip: None,
            procedure: Arc::new(move |ctx| procedure(ctx).boxed()),
        }
    }

    /// Like [`Case::new`], handing a clone of `state` to every run
    pub fn with_state<S, F, Fut>(name: impl Into<String>, state: S, procedure: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(CaseContext, S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        Self::new(name, move |ctx| procedure(ctx, state.clone()))
    }

    /// Request a fresh browser page for this case
    pub fn browser(mut self) -> Self {
        self.needs_browser = true;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Report the case as skipped without running it
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn needs_browser(&self) -> bool {
        self.needs_browser
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip.as_deref()
    }

    pub(crate) fn start(&self, ctx: CaseContext) -> CaseFuture {
        (self.procedure)(ctx)
    }
}

impl std::fmt::Debug for Case {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Case")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("needs_browser", &self.needs_browser)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

pub(crate) struct Cleanup {
    pub(crate) label: String,
    run: CleanupFn,
}

impl Cleanup {
    pub(crate) fn start(self, ctx: CaseContext) -> CaseFuture {
        (self.run)(ctx)
    }
}

/// Everything a running case may touch.
///
/// Cheap to clone; all clones share the same journal and cleanup list.
#[derive(Clone)]
pub struct CaseContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    case_name: String,
    http: Arc<dyn HttpClient>,
    page: Option<Page>,
    journal: Arc<Journal>,
    ids: Arc<FixtureIds>,
    cleanups: Mutex<Vec<Cleanup>>,
}

impl CaseContext {
    pub fn new(
        case_name: impl Into<String>,
        http: Arc<dyn HttpClient>,
        page: Option<Page>,
        journal: Arc<Journal>,
        ids: Arc<FixtureIds>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                case_name: case_name.into(),
                http,
                page,
                journal,
                ids,
                cleanups: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn case_name(&self) -> &str {
        &self.inner.case_name
    }

    pub fn journal(&self) -> &Arc<Journal> {
        &self.inner.journal
    }

    /// Send a request and journal it as a step
    pub async fn request(&self, method: HttpMethod, url: &str, body: Option<Value>) -> HarnessResult<HttpResponse> {
        let start = Instant::now();
        let action = format!("{method} {url}");
        debug!(case = %self.inner.case_name, "Executing step: {}", action);

        let result = self.inner.http.request(method, url, body.as_ref()).await;

        let (output, error) = match &result {
            Ok(response) => (
                Some(json!({
                    "status": response.status,
                    "body": response.json().unwrap_or_else(|_| Value::String(excerpt(&response.body, 200))),
                })),
                None,
            ),
            Err(e) => (None, Some(e.to_string())),
        };
        self.inner.journal.record_step(StepRecord {
            action,
            input: body,
            output,
            duration_ms: start.elapsed().as_millis() as u64,
            success: result.is_ok(),
            error,
        });
        result
    }

    pub async fn get(&self, url: &str) -> HarnessResult<HttpResponse> {
        self.request(HttpMethod::Get, url, None).await
    }

    pub async fn post<B: Serialize + Sync + ?Sized>(&self, url: &str, body: &B) -> HarnessResult<HttpResponse> {
        let body = serde_json::to_value(body)?;
        self.request(HttpMethod::Post, url, Some(body)).await
    }

    pub async fn put<B: Serialize + Sync + ?Sized>(&self, url: &str, body: &B) -> HarnessResult<HttpResponse> {
        let body = serde_json::to_value(body)?;
        self.request(HttpMethod::Put, url, Some(body)).await
    }

    pub async fn delete(&self, url: &str) -> HarnessResult<HttpResponse> {
        self.request(HttpMethod::Delete, url, None).await
    }

    /// The browser page of this case
    pub fn page(&self) -> HarnessResult<Page> {
        self.inner.page.clone().ok_or_else(|| {
            HarnessError::collaborator(format!(
                "case '{}' has no browser page; declare it with Case::browser()",
                self.inner.case_name
            ))
        })
    }

    /// Journaled expectation over a captured value
    pub fn expect(&self, label: impl Into<String>, actual: &Value) -> Expect {
        Expect::journaled(label, actual.clone(), self.inner.journal.clone())
    }

    /// Journaled expectation over a response status
    pub fn expect_status(&self, response: &HttpResponse) -> Expect {
        Expect::journaled("status", Value::from(response.status), self.inner.journal.clone())
    }

    /// Advisory note: reported with the case, never changes its outcome
    pub fn note(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(case = %self.inner.case_name, "{}", message);
        self.inner.journal.note(message);
    }

    /// A fixture id no other case in this process will receive
    pub fn fresh_id(&self) -> i64 {
        self.inner.ids.next_id()
    }

    /// Resolve a documented divergence once. When `permissive` holds the
    /// advisory note is recorded immediately.
    pub fn diverge(&self, permissive: bool, note: impl Into<String>) -> Divergence {
        if permissive {
            self.note(note);
            Divergence::Permissive
        } else {
            Divergence::Strict
        }
    }

    /// Register a cleanup that runs exactly once after the procedure ends,
    /// whatever its outcome. Cleanups run last-registered first.
    pub fn defer_cleanup<F, Fut>(&self, label: impl Into<String>, cleanup: F)
    where
        F: FnOnce(CaseContext) -> Fut + Send + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        self.inner.cleanups.lock().push(Cleanup {
            label: label.into(),
            run: Box::new(move |ctx| cleanup(ctx).boxed()),
        });
    }

    /// Drain registered cleanups in execution order
    pub(crate) fn take_cleanups(&self) -> Vec<Cleanup> {
        let mut cleanups = std::mem::take(&mut *self.inner.cleanups.lock());
        cleanups.reverse();
        cleanups
    }
}
