//! Core types for check violations and results.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How seriously a violation is taken. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, never fails the run.
    Info,
    /// Reported, does not fail the run.
    Warning,
    /// Fails the run.
    Error,
}

impl Severity {
    /// Lower-case name, as written in `gochecks.toml`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the project a violation was found.
///
/// A line of 0 means the violation refers to a whole file or directory
/// rather than a position inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File or directory, relative to the project directory.
    pub file: PathBuf,
    /// 1-based line, 0 for none.
    pub line: usize,
    /// 1-based byte column.
    pub column: usize,
    /// Byte offset of the highlighted span, filled in for rich output.
    #[serde(default, skip_serializing)]
    pub offset: usize,
    /// Byte length of the highlighted span.
    #[serde(default, skip_serializing)]
    pub length: usize,
}

impl Location {
    /// A position inside `file`.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Creates a location that points at a whole file or directory.
    #[must_use]
    pub fn path_only(file: PathBuf) -> Self {
        Self::new(file, 0, 0)
    }

    /// Attaches the byte span to highlight.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }

    /// Returns true if this location has a line/column position.
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.line > 0
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_position() {
            write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
        } else {
            write!(f, "{}", self.file.display())
        }
    }
}

/// A fix hint attached to a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// What to change.
    pub message: String,
}

impl Suggestion {
    /// Creates a fix hint.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A problem reported by a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Check code, e.g. `GC001`.
    pub code: String,
    /// Check name, e.g. `extimport`.
    pub check: String,
    /// Effective severity, after configuration overrides.
    pub severity: Severity,
    /// Where the problem is.
    pub location: Location,
    /// Diagnostic text, without the location prefix.
    pub message: String,
    /// Fix hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

impl Violation {
    /// Creates a violation without a fix hint.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        check: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            check: check.into(),
            severity,
            location,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attaches a fix hint.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Multi-line rendering: header, severity line and optional hint.
    #[must_use]
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("{} {} at {}", self.code, self.check, self.location),
            format!("  {}: {}", self.severity, self.message),
        ];
        if let Some(suggestion) = &self.suggestion {
            lines.push(format!("  = help: {}", suggestion.message));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    /// Single-line rendering with severity and code.
    #[must_use]
    pub fn format_compact(&self) -> String {
        format!(
            "{}: {} [{}] {}",
            self.location, self.severity, self.code, self.message
        )
    }
}

/// `path:line:col: message`, or the bare message for path-only locations.
impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.location.has_position() {
            write!(f, "{}: {}", self.location, self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

/// A violation shaped for `miette` rendering against its source file.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{check}")]
    span: SourceSpan,
    check: String,
}

impl From<&Violation> for ViolationDiagnostic {
    fn from(violation: &Violation) -> Self {
        Self {
            message: format!("{} [{}] {}", violation.severity, violation.code, violation.message),
            help: violation.suggestion.as_ref().map(|s| s.message.clone()),
            span: (violation.location.offset, violation.location.length).into(),
            check: violation.check.clone(),
        }
    }
}

/// Number of violations at each severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    /// Error-level violations.
    pub errors: usize,
    /// Warning-level violations.
    pub warnings: usize,
    /// Info-level violations.
    pub infos: usize,
}

/// Outcome of a check run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// Violations, ordered by location once the run completes.
    pub violations: Vec<Violation>,
    /// How many checks ran (disabled checks excluded).
    pub checks_run: usize,
}

impl LintResult {
    /// An empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the output of one check.
    pub fn record(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.violations.extend(violations);
        self.checks_run += 1;
    }

    /// Orders violations by file, line and column.
    pub fn sort(&mut self) {
        self.violations.sort_by(|a, b| {
            let key = |v: &Violation| (v.location.file.clone(), v.location.line, v.location.column);
            key(a).cmp(&key(b))
        });
    }

    /// Whether any violation is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.severity_counts().errors > 0
    }

    /// Tallies violations per severity.
    #[must_use]
    pub fn severity_counts(&self) -> SeverityCounts {
        self.violations
            .iter()
            .fold(SeverityCounts::default(), |mut counts, v| {
                match v.severity {
                    Severity::Error => counts.errors += 1,
                    Severity::Warning => counts.warnings += 1,
                    Severity::Info => counts.infos += 1,
                }
                counts
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn external_import(severity: Severity) -> Violation {
        Violation::new(
            "GC001",
            "extimport",
            severity,
            Location::new(PathBuf::from("foo/foo.go"), 1, 22),
            "imports external package bar",
        )
    }

    #[test]
    fn display_uses_go_tool_format() {
        assert_eq!(
            external_import(Severity::Error).to_string(),
            "foo/foo.go:1:22: imports external package bar"
        );
    }

    #[test]
    fn display_without_position_prints_message_only() {
        let v = Violation::new(
            "GC002",
            "novendor",
            Severity::Warning,
            Location::path_only(PathBuf::from("vendor/github.com/org/lib")),
            "github.com/org/lib",
        );
        assert_eq!(v.to_string(), "github.com/org/lib");
        assert_eq!(v.location.to_string(), "vendor/github.com/org/lib");
    }

    #[test]
    fn compact_includes_severity_and_code() {
        assert_eq!(
            external_import(Severity::Warning).format_compact(),
            "foo/foo.go:1:22: warning [GC001] imports external package bar"
        );
    }

    #[test]
    fn format_includes_hint() {
        let v = external_import(Severity::Error).with_suggestion(Suggestion::new("vendor it"));
        assert_eq!(
            v.format(),
            "GC001 extimport at foo/foo.go:1:22\n  error: imports external package bar\n  = help: vendor it\n"
        );
    }

    #[test]
    fn record_counts_checks_and_severities() {
        let mut result = LintResult::new();
        result.record(vec![
            external_import(Severity::Error),
            external_import(Severity::Warning),
        ]);
        result.record(vec![external_import(Severity::Warning)]);
        result.record(Vec::new());

        assert_eq!(result.checks_run, 3);
        assert_eq!(
            result.severity_counts(),
            SeverityCounts {
                errors: 1,
                warnings: 2,
                infos: 0
            }
        );
        assert!(result.has_errors());
    }

    #[test]
    fn sort_orders_by_position() {
        let at = |file: &str, line| {
            let mut v = external_import(Severity::Info);
            v.location = Location::new(PathBuf::from(file), line, 1);
            v
        };
        let mut result = LintResult::new();
        result.record(vec![at("b.go", 1), at("a.go", 9), at("a.go", 2)]);
        result.sort();

        let order: Vec<String> = result.violations.iter().map(|v| v.location.to_string()).collect();
        assert_eq!(order, vec!["a.go:2:1", "a.go:9:1", "b.go:1:1"]);
    }

    #[test]
    fn severity_names_round_trip_through_toml_names() {
        assert_eq!(Severity::Warning.as_str(), "warning");
        assert!(Severity::Error > Severity::Warning);
    }
}
