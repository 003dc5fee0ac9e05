//! Validation report for one mapped record.

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, Severity};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema: String,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            issues: Vec::new(),
        }
    }

    pub fn add(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn error_count(&self) -> usize {
        self.blocking().count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
            .count()
    }

    /// Issues that refuse the `approve` transition.
    pub fn blocking(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_blocking())
    }

    pub fn blocks_approval(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors first, then warnings; stable within a severity.
    pub fn sorted_by_severity(&self) -> Vec<&Issue> {
        let mut issues: Vec<_> = self.issues.iter().collect();
        issues.sort_by_key(|i| match i.severity() {
            Severity::Error => 0,
            Severity::Warning => 1,
        });
        issues
    }
}
