//! Runner that executes project checks and collects their violations.

use crate::check::{Check, CheckBox, CheckError};
use crate::config::Config;
use crate::context::ProjectContext;
use crate::types::{LintResult, Violation};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while running checks.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// IO error resolving the project directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The project directory does not exist.
    #[error("Project directory not found: {}", .0.display())]
    MissingRoot(PathBuf),

    /// A check could not complete.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Builder for configuring a [`Runner`].
#[derive(Default)]
pub struct RunnerBuilder {
    root: Option<PathBuf>,
    checks: Vec<CheckBox>,
    packages: Vec<String>,
    config: Option<Config>,
}

impl RunnerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project directory to check.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a check to the runner.
    #[must_use]
    pub fn check<C: Check + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Adds boxed checks to the runner.
    #[must_use]
    pub fn checks(mut self, checks: impl IntoIterator<Item = CheckBox>) -> Self {
        self.checks.extend(checks);
        self
    }

    /// Restricts checks to the given package directories.
    #[must_use]
    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages.extend(packages.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the project directory doesn't exist.
    pub fn build(self) -> Result<Runner, RunnerError> {
        let root = self
            .root
            .or_else(|| self.config.as_ref().map(|c| c.project.root.clone()))
            .unwrap_or_else(|| PathBuf::from("."));

        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        if !root.is_dir() {
            return Err(RunnerError::MissingRoot(root));
        }

        Ok(Runner {
            root,
            checks: self.checks,
            packages: self.packages,
            config: self.config.unwrap_or_default(),
        })
    }
}

/// Executes checks against a project directory.
///
/// Use [`Runner::builder()`] to construct an instance.
pub struct Runner {
    root: PathBuf,
    checks: Vec<CheckBox>,
    packages: Vec<String>,
    config: Config,
}

impl Runner {
    /// Creates a new builder for configuring a runner.
    #[must_use]
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    /// Returns the project directory being checked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered checks.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Runs every enabled check and returns the collected violations,
    /// sorted by file, line, and column.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a check.
    pub fn run(&self) -> Result<LintResult, RunnerError> {
        info!("Running checks at {:?}", self.root);

        let ctx = ProjectContext::new(&self.root, &self.config).with_packages(self.packages.clone());
        let mut result = LintResult::new();

        for check in &self.checks {
            if !self.config.is_check_enabled(check.name()) {
                debug!("Skipping disabled check: {}", check.name());
                continue;
            }

            debug!("Running check: {}", check.name());
            let violations = check.check_project(&ctx)?;
            let violations = self.apply_severity_override(check.name(), violations);
            result.record(violations);
        }
        result.sort();

        info!(
            "Checks complete: {} violations from {} checks",
            result.violations.len(),
            result.checks_run
        );

        Ok(result)
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        check_name: &str,
        mut violations: Vec<Violation>,
    ) -> Vec<Violation> {
        if let Some(severity) = self.config.check_severity(check_name) {
            for v in &mut violations {
                v.severity = severity;
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Severity};

    struct Fixed(&'static str, Vec<(&'static str, usize)>);

    impl Check for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn code(&self) -> &'static str {
            "GC900"
        }

        fn check_project(&self, _ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
            Ok(self
                .1
                .iter()
                .map(|(file, line)| {
                    Violation::new(
                        self.code(),
                        self.name(),
                        Severity::Error,
                        Location::new(PathBuf::from(file), *line, 1),
                        "found",
                    )
                })
                .collect())
        }
    }

    struct Failing;

    impl Check for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn code(&self) -> &'static str {
            "GC901"
        }

        fn check_project(&self, _ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
            Err(CheckError::analysis(self.name(), "boom"))
        }
    }

    #[test]
    fn test_builder_requires_existing_root() {
        let result = Runner::builder().root("/definitely/not/here").build();
        assert!(matches!(result, Err(RunnerError::MissingRoot(_))));
    }

    #[test]
    fn test_violations_sorted_and_counted() {
        let runner = Runner::builder()
            .root(".")
            .check(Fixed("b", vec![("b.go", 3), ("a.go", 9)]))
            .check(Fixed("a", vec![("a.go", 2)]))
            .build()
            .expect("Failed to build runner");

        let result = runner.run().expect("run");
        assert_eq!(result.checks_run, 2);
        let order: Vec<_> = result
            .violations
            .iter()
            .map(|v| (v.location.file.display().to_string(), v.location.line))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.go".to_string(), 2),
                ("a.go".to_string(), 9),
                ("b.go".to_string(), 3)
            ]
        );
    }

    #[test]
    fn test_config_disables_and_overrides() {
        let config = Config::parse(
            "[checks.a]\nenabled = false\n\n[checks.b]\nseverity = \"info\"\n",
        )
        .expect("config");
        let runner = Runner::builder()
            .root(".")
            .config(config)
            .check(Fixed("a", vec![("a.go", 1)]))
            .check(Fixed("b", vec![("b.go", 1)]))
            .build()
            .expect("Failed to build runner");

        let result = runner.run().expect("run");
        assert_eq!(result.checks_run, 1);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, Severity::Info);
    }

    #[test]
    fn test_check_error_propagates() {
        let runner = Runner::builder()
            .root(".")
            .check(Failing)
            .build()
            .expect("Failed to build runner");
        let err = runner.run().unwrap_err();
        assert_eq!(err.to_string(), "failing failed: boom");
    }
}
