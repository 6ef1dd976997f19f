//! # gochecks-core
//!
//! Core framework for the gochecks Go source checks.
//!
//! This crate provides the check-independent pieces:
//!
//! - [`Check`] trait for project-wide checks
//! - [`Runner`] for executing checks with configuration applied
//! - [`Violation`] for representing findings
//! - [`Config`] for `gochecks.toml`
//!
//! ## Example
//!
//! ```ignore
//! use gochecks_core::Runner;
//!
//! let runner = Runner::builder()
//!     .root("./go/src/github.com/org/product")
//!     .check(MyCheck::new())
//!     .build()?;
//!
//! let result = runner.run()?;
//! for violation in &result.violations {
//!     println!("{violation}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod check;
mod config;
mod context;
mod runner;
mod types;

pub use check::{Check, CheckBox, CheckError};
pub use config::{BuildConfig, CheckConfig, Config, ConfigError, ProjectConfig};
pub use context::{offset_for, ProjectContext};
pub use runner::{Runner, RunnerBuilder, RunnerError};
pub use types::{
    LintResult, Location, Severity, SeverityCounts, Suggestion, Violation, ViolationDiagnostic,
};
