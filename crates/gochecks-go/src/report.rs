//! Classification of a project's external imports.
//!
//! Every external package directly imported by a project package lands in
//! exactly one bucket: imported by a library package, else by a `main`
//! package, else only by tests. Packages sharing a directory with the
//! primary package are bucketed by their own name.

use std::fmt::Write;

use serde::Serialize;

use crate::counter::GoFileCounter;
use crate::graph::{DependencyGraph, PkgMode};

/// An external package and who imports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReportPkg {
    /// Resolved import path.
    pub path: String,
    /// Number of `.go` files in the package's directory.
    pub n_go_files: usize,
    /// Files in the package's transitive dependencies.
    pub n_imported_go_files: usize,
    /// Project packages importing it, sorted.
    pub import_src: Vec<String>,
}

/// External imports of a project, bucketed by importer kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Import path of the project.
    pub project: String,
    /// Imported by at least one non-`main` library package.
    pub imports: Vec<ImportReportPkg>,
    /// Imported by `main` packages but no library package.
    pub main_only_imports: Vec<ImportReportPkg>,
    /// Imported only by test packages.
    pub test_only_imports: Vec<ImportReportPkg>,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Core,
    Main,
    Test,
}

impl ImportReport {
    /// Builds the report for the project packages of `graph`.
    #[must_use]
    pub fn create(graph: &DependencyGraph) -> Self {
        let mut counter = GoFileCounter::new(graph);
        let mut entries: std::collections::BTreeMap<String, (Bucket, Vec<String>)> =
            std::collections::BTreeMap::new();

        for node in graph.project_nodes() {
            let bucket = match node.mode {
                PkgMode::Test => Bucket::Test,
                PkgMode::Default if node.is_main() => Bucket::Main,
                PkgMode::Default => Bucket::Core,
            };
            let others = node.other_packages.iter().map(|other| {
                let bucket = if other.is_main() { Bucket::Main } else { Bucket::Core };
                (bucket, &other.imports)
            });
            for (bucket, imports) in std::iter::once((bucket, &node.imports)).chain(others) {
                for target in imports.keys().filter(|t| is_external(graph, t)) {
                    let entry = entries
                        .entry(target.clone())
                        .or_insert_with(|| (bucket, Vec::new()));
                    entry.0 = entry.0.min(bucket);
                    entry.1.push(node.path.clone());
                }
            }
        }

        let mut report = Self {
            project: graph.project_path().unwrap_or_default(),
            ..Self::default()
        };
        for (path, (bucket, mut import_src)) in entries {
            import_src.sort();
            import_src.dedup();
            let pkg = ImportReportPkg {
                n_go_files: counter.n_go_files(&path).unwrap_or(0),
                n_imported_go_files: counter.n_imported_go_files(&path).unwrap_or(0),
                path,
                import_src,
            };
            match bucket {
                Bucket::Core => report.imports.push(pkg),
                Bucket::Main => report.main_only_imports.push(pkg),
                Bucket::Test => report.test_only_imports.push(pkg),
            }
        }
        report
    }

    /// Renders the report as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the report as plain text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Project: {}", self.project);
        for (title, pkgs) in [
            ("Imports", &self.imports),
            ("Main-only imports", &self.main_only_imports),
            ("Test-only imports", &self.test_only_imports),
        ] {
            let _ = writeln!(out, "\n{title} ({}):", pkgs.len());
            for pkg in pkgs {
                let _ = writeln!(
                    out,
                    "  {} ({} files, {} imported files)",
                    pkg.path, pkg.n_go_files, pkg.n_imported_go_files
                );
                for src in &pkg.import_src {
                    let _ = writeln!(out, "    <- {src}");
                }
            }
        }
        out
    }
}

/// Returns true if `path` is a third-party package from the project's
/// point of view: outside the project or vendored inside it, and not
/// part of the standard library.
#[must_use]
pub fn is_external(graph: &DependencyGraph, path: &str) -> bool {
    if graph.is_standard(path) {
        return false;
    }
    !graph.is_project(path) || crate::vendor::is_vendored(path)
}
