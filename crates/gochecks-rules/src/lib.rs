//! # gochecks-rules
//!
//! Built-in checks for Go projects.
//!
//! ## Available Checks
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | GC001 | `extimport` | Forbids imports of packages outside the project |
//! | GC002 | `novendor` | Reports vendored packages nothing uses |
//! | GC003 | `importalias` | Requires one alias per imported package |
//! | GC004 | `ptimports` | Requires imports grouped as std, third-party, project |
//! | GC005 | `gogenerate` | Requires generated code to match its generators |
//!
//! ## Usage
//!
//! ```ignore
//! use gochecks_core::Runner;
//! use gochecks_rules::{ExtImport, Novendor};
//!
//! let runner = Runner::builder()
//!     .root("./go/src/github.com/org/product")
//!     .check(ExtImport::new())
//!     .check(Novendor::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;

use gochecks_go::classifier::{go_files, is_ignored_file_name};
use gochecks_go::{GoError, GoProject};

pub mod extimport;
pub mod gogenerate;
pub mod importalias;
pub mod novendor;
mod presets;
pub mod ptimports;

pub use extimport::ExtImport;
pub use gogenerate::GoGenerate;
pub use importalias::ImportAlias;
pub use novendor::Novendor;
pub use presets::{all_checks, check_by_name};
pub use ptimports::PtImports;

/// Re-export core types for convenience.
pub use gochecks_core::{Check, Severity, Violation};

/// Lists the `.go` files of the given project-relative package
/// directories, or of every project package when `packages` is empty.
/// Files the Go toolchain ignores (leading `_` or `.`) are left out.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn project_go_files(project: &GoProject, packages: &[String]) -> Result<Vec<PathBuf>, GoError> {
    let mut files = Vec::new();
    for dir in project.package_dirs(packages)? {
        for file in go_files(&dir)? {
            let ignored = file
                .file_name()
                .is_some_and(|n| is_ignored_file_name(&n.to_string_lossy()));
            if !ignored {
                files.push(file);
            }
        }
    }
    Ok(files)
}
