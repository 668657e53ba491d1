//! Per-case record of steps, assertions and advisory notes

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertion::AssertionKind;

/// One collaborator interaction performed by a case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub action: String,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

/// One evaluated assertion, passed or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionRecord {
    pub label: String,
    pub kind: AssertionKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// Append-only journal owned by a single case.
///
/// Entries are kept in the order they were recorded, which is the
/// declaration order of the case's steps.
#[derive(Debug, Default)]
pub struct Journal {
    steps: Mutex<Vec<StepRecord>>,
    assertions: Mutex<Vec<AssertionRecord>>,
    notes: Mutex<Vec<String>>,
}

impl Journal {
    pub fn record_step(&self, step: StepRecord) {
        self.steps.lock().push(step);
    }

    pub fn record_assertion(&self, record: AssertionRecord) {
        self.assertions.lock().push(record);
    }

    pub fn note(&self, message: impl Into<String>) {
        self.notes.lock().push(message.into());
    }

    pub fn steps(&self) -> Vec<StepRecord> {
        self.steps.lock().clone()
    }

    pub fn assertions(&self) -> Vec<AssertionRecord> {
        self.assertions.lock().clone()
    }

    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().clone()
    }
}
