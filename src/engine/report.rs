use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A recovered failure: something was skipped but the run went on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub column: Option<usize>,
    pub operation: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(column: Option<usize>, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            column,
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(c) => write!(f, "[{} on column {}] {}", self.operation, c, self.message),
            None => write!(f, "[{}] {}", self.operation, self.message),
        }
    }
}

/// What one strategy run did to its dataset.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: String,
    pub started_at: DateTime<Utc>,
    pub columns: Vec<usize>,
    pub cells_mutated: usize,
    pub rows_appended: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            started_at: Utc::now(),
            columns: Vec::new(),
            cells_mutated: 0,
            rows_appended: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: super::MutationOutcome) {
        if !self.columns.contains(&outcome.column) {
            self.columns.push(outcome.column);
        }
        self.cells_mutated += outcome.mutated;
        self.diagnostics.extend(outcome.diagnostic);
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// No recovered failures.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
