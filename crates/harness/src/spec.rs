//! Declarative YAML case specifications
//!
//! A suite file lists cases as sequences of browser and HTTP steps:
//!
//! ```yaml
//! name: Smoke Test
//! cases:
//!   - name: Health Check - Get Pet by Invalid ID
//!     steps:
//!       - action: request
//!         method: GET
//!         path: /pet/${id}
//!       - action: expect_status
//!         status: 404
//!       - action: expect_json
//!         pointer: /message
//!         contains: Pet not found
//! ```
//!
//! `${id}` expands to a fixture id that is fresh for every case run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::browser::page::{expect_locator, expect_page};
use crate::case::{Case, CaseContext};
use crate::config::{join_url, HarnessConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::http::{HttpMethod, HttpResponse};
use crate::suite::Suite;

const ID_PLACEHOLDER: &str = "${id}";

/// A suite parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Base for relative paths. When absent, HTTP steps resolve against
    /// the configured pet-store URL and browser steps against SauceDemo.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Run the cases of this suite one at a time
    #[serde(default)]
    pub sequential: bool,

    /// Steps run at the start of every case
    #[serde(default)]
    pub setup: Vec<Step>,

    pub cases: Vec<CaseSpec>,
}

/// A single case within a [`SuiteSpec`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Report the case as skipped with this reason
    #[serde(default)]
    pub skip: Option<String>,

    pub steps: Vec<Step>,

    /// Steps run after the case whatever its outcome
    #[serde(default)]
    pub cleanup: Vec<Step>,
}

/// A single step of a case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a URL (relative to the UI base)
    Navigate { url: String },

    Fill { selector: String, value: String },

    Click { selector: String },

    /// Assert the current page URL
    ExpectUrl { url: String },

    /// Assert something about an element
    Expect {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Send an HTTP request (path relative to the API base)
    Request {
        method: HttpMethod,
        path: String,
        #[serde(default)]
        body: Option<Value>,
    },

    /// Assert the status of the last response
    ExpectStatus {
        #[serde(default)]
        status: Option<u16>,
        #[serde(default)]
        one_of: Vec<u16>,
    },

    /// Assert a value inside the last response body, addressed by JSON pointer
    ExpectJson {
        pointer: String,
        #[serde(default)]
        equals: Option<Value>,
        #[serde(default)]
        contains: Option<Value>,
        #[serde(default)]
        has_property: Option<String>,
    },

    /// Log a message (for debugging)
    Log { message: String },
}

impl Step {
    fn needs_browser(&self) -> bool {
        matches!(
            self,
            Step::Navigate { .. } | Step::Fill { .. } | Step::Click { .. } | Step::ExpectUrl { .. } | Step::Expect { .. }
        )
    }

    fn needs_response(&self) -> bool {
        matches!(self, Step::ExpectStatus { .. } | Step::ExpectJson { .. })
    }

    fn check(&self) -> Result<(), String> {
        match self {
            Step::Expect {
                selector,
                visible: None,
                text: None,
                text_contains: None,
                count: None,
            } => Err(format!("expect on '{selector}' has nothing to check")),
            Step::ExpectStatus { status: None, one_of } if one_of.is_empty() => {
                Err("expect_status needs `status` or `one_of`".into())
            }
            Step::ExpectJson {
                pointer,
                equals: None,
                contains: None,
                has_property: None,
            } => Err(format!("expect_json on '{pointer}' has nothing to check")),
            Step::ExpectJson { pointer, .. } if !pointer.is_empty() && !pointer.starts_with('/') => {
                Err(format!("JSON pointer '{pointer}' must start with '/'"))
            }
            _ => Ok(()),
        }
    }
}

impl SuiteSpec {
    /// Parse and validate a suite from a YAML string
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| HarnessError::SpecParse(format!("{}: {e}", path.display())))
    }

    /// Load every `.yaml`/`.yml` suite under a directory, in file name order
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            debug!("Loading suite spec {}", entry.path().display());
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    /// Reject suites that could only fail for structural reasons
    pub fn validate(&self) -> HarnessResult<()> {
        let fail = |msg: String| -> HarnessResult<()> {
            Err(HarnessError::SpecParse(format!("suite '{}': {msg}", self.name)))
        };

        if self.cases.is_empty() {
            return fail("declares no cases".into());
        }
        for case in &self.cases {
            if case.name.trim().is_empty() {
                return fail("a case has an empty name".into());
            }
            if self.cases.iter().filter(|c| c.name == case.name).count() > 1 {
                return fail(format!("case '{}' is declared twice", case.name));
            }
            let body = self.setup.iter().chain(case.steps.iter());
            if let Err(msg) = check_sequence(body).and_then(|_| check_sequence(case.cleanup.iter())) {
                return fail(format!("case '{}': {msg}", case.name));
            }
        }
        Ok(())
    }

    /// Compile into a runnable suite
    pub fn into_suite(self, config: &HarnessConfig) -> HarnessResult<Suite> {
        self.validate()?;

        let bases = Arc::new(Bases {
            api: self.base_url.clone().unwrap_or_else(|| config.petstore_url.clone()),
            ui: self.base_url.clone().unwrap_or_else(|| config.saucedemo_url.clone()),
        });
        let setup = Arc::new(self.setup);

        let mut suite = Suite::new(self.name);
        if self.sequential {
            suite = suite.sequential();
        }

        for spec in self.cases {
            let plan = Arc::new(CasePlan {
                setup: setup.clone(),
                steps: spec.steps,
                cleanup: spec.cleanup,
                bases: bases.clone(),
            });
            let needs_browser = plan.needs_browser();

            let mut case = Case::with_state(spec.name, plan, |ctx, plan: Arc<CasePlan>| plan.run(ctx));
            if needs_browser {
                case = case.browser();
            }
            for tag in spec.tags {
                case = case.tag(tag);
            }
            if let Some(reason) = spec.skip {
                case = case.skip(reason);
            }
            suite = suite.case(case);
        }

        Ok(suite)
    }
}

fn check_sequence<'a>(steps: impl Iterator<Item = &'a Step>) -> Result<(), String> {
    let mut have_response = false;
    for step in steps {
        step.check()?;
        if step.needs_response() && !have_response {
            return Err("response assertion before any request".into());
        }
        if matches!(step, Step::Request { .. }) {
            have_response = true;
        }
    }
    Ok(())
}

struct Bases {
    api: String,
    ui: String,
}

struct CasePlan {
    setup: Arc<Vec<Step>>,
    steps: Vec<Step>,
    cleanup: Vec<Step>,
    bases: Arc<Bases>,
}

impl CasePlan {
    fn needs_browser(&self) -> bool {
        self.setup
            .iter()
            .chain(&self.steps)
            .chain(&self.cleanup)
            .any(Step::needs_browser)
    }

    async fn run(self: Arc<Self>, ctx: CaseContext) -> HarnessResult<()> {
        let id = ctx.fresh_id();

        if !self.cleanup.is_empty() {
            let plan = self.clone();
            ctx.defer_cleanup("cleanup steps", move |ctx| async move {
                StepExecutor::new(&ctx, &plan.bases, id).run_all(&plan.cleanup).await
            });
        }

        let mut executor = StepExecutor::new(&ctx, &self.bases, id);
        executor.run_all(&self.setup).await?;
        executor.run_all(&self.steps).await
    }
}

struct StepExecutor<'a> {
    ctx: &'a CaseContext,
    bases: &'a Bases,
    id: i64,
    last: Option<HttpResponse>,
}

impl<'a> StepExecutor<'a> {
    fn new(ctx: &'a CaseContext, bases: &'a Bases, id: i64) -> Self {
        Self {
            ctx,
            bases,
            id,
            last: None,
        }
    }

    async fn run_all(&mut self, steps: &[Step]) -> HarnessResult<()> {
        for step in steps {
            self.run(step).await?;
        }
        Ok(())
    }

    async fn run(&mut self, step: &Step) -> HarnessResult<()> {
        match step {
            Step::Navigate { url } => self.ctx.page()?.goto(&self.ui_url(url)).await,

            Step::Fill { selector, value } => self.ctx.page()?.fill(selector, &self.expand(value)).await,

            Step::Click { selector } => self.ctx.page()?.click(selector).await,

            Step::ExpectUrl { url } => expect_page(&self.ctx.page()?).to_have_url(&self.ui_url(url)).await,

            Step::Expect {
                selector,
                visible,
                text,
                text_contains,
                count,
            } => {
                let locator = self.ctx.page()?.locator(selector);
                match visible {
                    Some(true) => expect_locator(&locator).to_be_visible().await?,
                    Some(false) => expect_locator(&locator).not().to_be_visible().await?,
                    None => {}
                }
                if let Some(text) = text {
                    expect_locator(&locator).to_have_text(&self.expand(text)).await?;
                }
                if let Some(fragment) = text_contains {
                    expect_locator(&locator).to_contain_text(&self.expand(fragment)).await?;
                }
                if let Some(count) = count {
                    expect_locator(&locator).to_have_count(*count).await?;
                }
                Ok(())
            }

            Step::Request { method, path, body } => {
                let url = join_url(&self.bases.api, &self.expand(path));
                let body = body.as_ref().map(|b| self.expand_json(b));
                self.last = Some(self.ctx.request(*method, &url, body).await?);
                Ok(())
            }

            Step::ExpectStatus { status, one_of } => {
                let expect = self.ctx.expect_status(self.response()?);
                if let Some(status) = status {
                    expect.to_equal(status)?;
                }
                if !one_of.is_empty() {
                    expect.to_be_one_of(one_of.as_slice())?;
                }
                Ok(())
            }

            Step::ExpectJson {
                pointer,
                equals,
                contains,
                has_property,
            } => {
                let pointer = self.expand(pointer);
                let body = self.response()?.json()?;
                let actual = body.pointer(&pointer).cloned().unwrap_or(Value::Null);
                let expect = self.ctx.expect(format!("body{pointer}"), &actual);
                if let Some(expected) = equals {
                    expect.to_equal(&self.expand_json(expected))?;
                }
                if let Some(expected) = contains {
                    expect.to_contain(&self.expand_json(expected))?;
                }
                if let Some(name) = has_property {
                    expect.to_have_property(&self.expand(name))?;
                }
                Ok(())
            }

            Step::Log { message } => {
                info!(case = self.ctx.case_name(), "{}", self.expand(message));
                Ok(())
            }
        }
    }

    fn response(&self) -> HarnessResult<&HttpResponse> {
        self.last
            .as_ref()
            .ok_or_else(|| HarnessError::SpecParse("response assertion before any request".into()))
    }

    fn ui_url(&self, url: &str) -> String {
        join_url(&self.bases.ui, &self.expand(url))
    }

    fn expand(&self, text: &str) -> String {
        text.replace(ID_PLACEHOLDER, &self.id.to_string())
    }

    /// A string that is exactly `${id}` becomes a JSON number
    fn expand_json(&self, value: &Value) -> Value {
        match value {
            Value::String(s) if s == ID_PLACEHOLDER => Value::from(self.id),
            Value::String(s) => Value::String(self.expand(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.expand_json(v)).collect()),
            Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (self.expand(k), self.expand_json(v))).collect()),
            other => other.clone(),
        }
    }
}
