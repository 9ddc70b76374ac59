//! Validation Issues and Reports
//!
//! Every failure mode in the engine - parse, schema, range, reference,
//! cycle, vocabulary, migration - surfaces as a [`ValidationIssue`] inside
//! a [`ValidationReport`]. There is no separate exception hierarchy for
//! callers to unpack; UI and tooling handle one shape.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// One problem at one addressable location in a document.
///
/// `path` uses dotted/bracketed addressing ("hazards[2]",
/// "sockets[0].position.x") stable enough for editors to highlight the
/// offending field. The addressing scheme is part of the external contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
            suggestion: None,
        }
    }

    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
            suggestion: None,
        }
    }

    pub fn info(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Info,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    // Taxonomy constructors. These exist so call sites read as the failure
    // class they report, while the wire shape stays uniform.

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error("root", message)
    }

    pub fn schema_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::error(path, message)
    }

    pub fn range_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::error(path, message)
    }

    pub fn reference_error(path: impl Into<String>, missing: &str) -> Self {
        Self::error(path, format!("unknown reference \"{missing}\""))
    }

    pub fn cycle_error(path: impl Into<String>, node: &str) -> Self {
        Self::error(
            path,
            format!("prerequisite cycle detected at node \"{node}\""),
        )
    }

    pub fn vocabulary_error(path: impl Into<String>, token: &str, vocabulary: &str) -> Self {
        Self::error(
            path,
            format!("unknown {vocabulary} token \"{token}\""),
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)
    }
}

/// Ordered aggregate of issues for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let mut report = Self { issues };
        report.sort();
        report
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    /// Canonical report order: severity first (errors lead), then path,
    /// then message.
    pub fn sort(&mut self) {
        self.issues.sort_by(|a, b| {
            (a.severity, &a.path, &a.message).cmp(&(b.severity, &b.path, &b.message))
        });
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "clean");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_sorts_errors_first() {
        let mut report = ValidationReport::new();
        report.push(ValidationIssue::warning("b", "later"));
        report.push(ValidationIssue::error("z", "an error"));
        report.push(ValidationIssue::info("a", "a note"));
        report.sort();

        let severities: Vec<_> = report.issues().iter().map(|i| i.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Error, Severity::Warning, Severity::Info]
        );
    }

    #[test]
    fn report_sorts_by_path_within_severity() {
        let report = ValidationReport::from_issues(vec![
            ValidationIssue::error("nodes[2].tier", "second"),
            ValidationIssue::error("nodes[1].tier", "first"),
        ]);
        assert_eq!(report.issues()[0].path, "nodes[1].tier");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let report =
            ValidationReport::from_issues(vec![ValidationIssue::warning("hazards", "dup")]);
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);
    }
}
