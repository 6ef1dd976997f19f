//! The trait implemented by every project check.

use crate::context::ProjectContext;
use crate::types::{Severity, Violation};
use thiserror::Error;

/// A project-wide check over a Go source tree.
///
/// Checks receive the project context and return the violations they found.
/// A check fails with a [`CheckError`] only when it cannot analyze the
/// project at all (unreadable directories, unparseable sources).
///
/// # Example
///
/// ```ignore
/// use gochecks_core::{Check, CheckError, Location, ProjectContext, Severity, Violation};
///
/// pub struct RequireGoMod;
///
/// impl Check for RequireGoMod {
///     fn name(&self) -> &'static str { "require-go-mod" }
///     fn code(&self) -> &'static str { "GC100" }
///
///     fn check_project(&self, ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
///         if ctx.root.join("go.mod").exists() {
///             return Ok(vec![]);
///         }
///         Ok(vec![Violation::new(
///             self.code(),
///             self.name(),
///             self.default_severity(),
///             Location::path_only("go.mod".into()),
///             "project has no go.mod",
///         )])
///     }
/// }
/// ```
pub trait Check: Send + Sync {
    /// Returns the name of this check (e.g., "extimport").
    fn name(&self) -> &'static str;

    /// Returns the check code (e.g., "GC001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this check verifies.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this check.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks the project and returns any violations found.
    ///
    /// # Errors
    ///
    /// Returns an error if the project could not be analyzed.
    fn check_project(&self, ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError>;
}

/// Type alias for boxed Check trait objects.
pub type CheckBox = Box<dyn Check>;

/// Errors raised by a check that could not run to completion.
#[derive(Debug, Error)]
pub enum CheckError {
    /// IO error while reading the project.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid check option.
    #[error("Invalid option for {check}: {message}")]
    Option {
        /// Check name.
        check: &'static str,
        /// What is wrong with the option.
        message: String,
    },

    /// Analysis of the project failed.
    #[error("{check} failed: {source}")]
    Analysis {
        /// Check name.
        check: &'static str,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CheckError {
    /// Wraps an analysis error raised while running `check`.
    pub fn analysis(
        check: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Analysis {
            check,
            source: source.into(),
        }
    }
}
