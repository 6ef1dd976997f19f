//! Classifies the Go files of a directory into packages.
//!
//! A directory yields at most one primary package, its internal tests
//! (`_test.go` files in the primary package) and its external tests
//! (`_test.go` files in package `<name>_test`). Files excluded by build
//! constraints or by a leading `_` or `.` in their name are left out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::constraint::{header_constraint, BuildContext};
use crate::error::GoError;
use crate::extractor::{GoExtractor, ImportSpec};

/// A Go file that passed build constraint filtering.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Declared package name.
    pub package: String,
    /// Import specs in source order.
    pub imports: Vec<ImportSpec>,
    /// Whether the file carries a build constraint.
    pub constrained: bool,
}

/// Files of one package within a directory.
#[derive(Debug, Clone, Default)]
pub struct PackageFiles {
    /// Package name.
    pub name: String,
    /// Member files, sorted by path.
    pub files: Vec<SourceFile>,
}

impl PackageFiles {
    fn unconstrained(&self) -> usize {
        self.files.iter().filter(|f| !f.constrained).count()
    }
}

/// The packages found in a single directory.
#[derive(Debug, Clone, Default)]
pub struct DirPackages {
    /// Directory that was classified.
    pub dir: PathBuf,
    /// Number of `.go` files directly in the directory, before any filtering.
    pub n_go_files: usize,
    /// The directory's package, if it has non-test files.
    pub primary: Option<PackageFiles>,
    /// Non-test packages that lost the primary election.
    pub other_packages: Vec<PackageFiles>,
    /// `_test.go` files that are not in an external test package.
    pub internal_tests: Vec<SourceFile>,
    /// `_test.go` files in package `<name>_test`.
    pub external_tests: Vec<SourceFile>,
}

impl DirPackages {
    /// Returns true if the directory has no buildable non-test files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }

    /// Returns true if the directory has buildable test files.
    #[must_use]
    pub fn has_tests(&self) -> bool {
        !self.internal_tests.is_empty() || !self.external_tests.is_empty()
    }

    /// Name of the package under test, derived from the primary package or
    /// from the test files when there is none.
    #[must_use]
    pub fn test_package_name(&self) -> Option<String> {
        if let Some(primary) = &self.primary {
            return Some(primary.name.clone());
        }
        if let Some(file) = self.internal_tests.first() {
            return Some(file.package.clone());
        }
        self.external_tests.first().map(|f| {
            f.package
                .strip_suffix("_test")
                .unwrap_or(&f.package)
                .to_string()
        })
    }
}

/// Reports whether a file name is ignored by the Go toolchain.
#[must_use]
pub fn is_ignored_file_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Lists the `.go` files directly in `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn go_files(dir: &Path) -> Result<Vec<PathBuf>, GoError> {
    let entries = std::fs::read_dir(dir).map_err(|e| GoError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GoError::io(dir, e))?;
        let path = entry.path();
        let is_file = entry
            .file_type()
            .map_err(|e| GoError::io(&path, e))?
            .is_file();
        if is_file && path.extension().is_some_and(|ext| ext == "go") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Classifies the Go files of `dir` under `ctx`.
///
/// # Errors
///
/// Returns an error if the directory or a file cannot be read, or if an
/// included file fails to parse.
pub fn classify_dir(
    dir: &Path,
    ctx: &BuildContext,
    extractor: &GoExtractor,
) -> Result<DirPackages, GoError> {
    let paths = go_files(dir)?;
    let mut result = DirPackages {
        dir: dir.to_path_buf(),
        n_go_files: paths.len(),
        ..DirPackages::default()
    };

    let mut groups: BTreeMap<String, PackageFiles> = BTreeMap::new();
    let mut tests = Vec::new();

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_ignored_file_name(&name) || !ctx.matches_file_name(&name) {
            trace!("Skipping {} by name", path.display());
            continue;
        }

        let source = std::fs::read_to_string(&path).map_err(|e| GoError::io(&path, e))?;
        let constraint = header_constraint(&path, &source)?;
        if let Some(expr) = &constraint {
            if !ctx.matches(expr) {
                trace!("Skipping {} by build constraint", path.display());
                continue;
            }
        }

        let parsed = extractor.analyze(&path, &source)?;
        let file = SourceFile {
            path,
            package: parsed.package.name,
            imports: parsed.imports,
            constrained: constraint.is_some(),
        };

        if name.ends_with("_test.go") {
            tests.push(file);
        } else {
            groups
                .entry(file.package.clone())
                .or_insert_with(|| PackageFiles {
                    name: file.package.clone(),
                    files: Vec::new(),
                })
                .files
                .push(file);
        }
    }

    let mut packages: Vec<PackageFiles> = groups.into_values().collect();
    // Most unconstrained files, then most files, then smallest name.
    packages.sort_by(|a, b| {
        b.unconstrained()
            .cmp(&a.unconstrained())
            .then(b.files.len().cmp(&a.files.len()))
            .then(a.name.cmp(&b.name))
    });
    let mut packages = packages.into_iter();
    result.primary = packages.next();
    result.other_packages = packages.collect();

    if !result.other_packages.is_empty() {
        debug!(
            "{} holds multiple packages, using {:?}",
            dir.display(),
            result.primary.as_ref().map(|p| p.name.as_str())
        );
    }

    for file in tests {
        if file.package.ends_with("_test") && file.package != "_test" {
            result.external_tests.push(file);
        } else {
            result.internal_tests.push(file);
        }
    }

    Ok(result)
}
