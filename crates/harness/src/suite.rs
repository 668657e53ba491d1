//! Named groups of cases sharing a setup hook

use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

use crate::case::{Case, CaseContext, CaseFuture};
use crate::error::HarnessResult;

pub(crate) type SetupHook = Arc<dyn Fn(CaseContext) -> CaseFuture + Send + Sync>;

#[derive(Clone)]
pub struct Suite {
    name: String,
    cases: Vec<Case>,
    setup: Option<SetupHook>,
    sequential: bool,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            setup: None,
            sequential: false,
        }
    }

    /// Hook run against each case's fresh context before its procedure.
    ///
    /// It shares the case deadline, and a failure in it is the case's
    /// failure.
    pub fn with_setup<F, Fut>(mut self, setup: F) -> Self
    where
        F: Fn(CaseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        self.setup = Some(Arc::new(move |ctx| setup(ctx).boxed()));
        self
    }

    pub fn with_setup_state<S, F, Fut>(self, state: S, setup: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(CaseContext, S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        self.with_setup(move |ctx| setup(ctx, state.clone()))
    }

    pub fn case(mut self, case: Case) -> Self {
        self.cases.push(case);
        self
    }

    /// Never run two cases of this suite at the same time
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn is_sequential(&self) -> bool {
        self.sequential
    }

    pub(crate) fn setup(&self) -> Option<&SetupHook> {
        self.setup.as_ref()
    }
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("cases", &self.cases)
            .field("has_setup", &self.setup.is_some())
            .field("sequential", &self.sequential)
            .finish()
    }
}
