//! GC001: project packages must not import packages from outside the
//! project, directly or through other project packages.
//!
//! Vendored packages count as part of the project, so importing them is
//! fine, but whatever they pull in from outside is reported against the
//! project import that leads there.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use gochecks_core::{Check, CheckError, Location, ProjectContext, Severity, Violation};
use gochecks_go::vendor::unvendored;
use gochecks_go::{DependencyGraph, GoProject, PackageNode};
use tracing::debug;

/// Check code.
pub const CODE: &str = "GC001";
/// Check name.
pub const NAME: &str = "extimport";

/// An import that leads out of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalImport {
    /// File holding the import spec.
    pub file: PathBuf,
    /// Line of the import path literal.
    pub line: usize,
    /// Column of the import path literal.
    pub column: usize,
    /// The external package.
    pub external: String,
    /// Project packages between the import and the external package,
    /// starting with the imported one. Empty for a direct import.
    pub via: Vec<String>,
}

impl ExternalImport {
    /// Message without the position prefix.
    #[must_use]
    pub fn message(&self) -> String {
        if self.via.is_empty() {
            format!("imports external package {}", self.external)
        } else {
            let chain: Vec<&str> = self.via.iter().map(|p| unvendored(p)).collect();
            format!(
                "imports external package {} transitively via {}",
                self.external,
                chain.join(" -> ")
            )
        }
    }
}

impl fmt::Display for ExternalImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.message()
        )
    }
}

fn is_external(graph: &DependencyGraph, path: &str) -> bool {
    !graph.is_standard(path) && !graph.is_project(path)
}

fn selected<'g>(
    graph: &'g DependencyGraph,
    dirs: &'g [PathBuf],
) -> impl Iterator<Item = &'g PackageNode> {
    graph
        .project_nodes()
        .filter(move |node| dirs.is_empty() || dirs.contains(&node.dir))
}

/// Finds the external imports of the project packages, ordered by
/// package, then position.
///
/// `dirs` restricts the packages examined; empty means all of them.
#[must_use]
pub fn find_external_imports(graph: &DependencyGraph, dirs: &[PathBuf]) -> Vec<ExternalImport> {
    let mut found = Vec::new();
    for node in selected(graph, dirs) {
        let mut for_node = Vec::new();
        for (target, edge) in &node.imports {
            if graph.is_standard(target) {
                continue;
            }
            let reached: Vec<(String, Vec<String>)> = if graph.is_project(target) {
                external_via(graph, target)
            } else {
                vec![(target.clone(), Vec::new())]
            };
            for site in &edge.sites {
                for (external, via) in &reached {
                    for_node.push(ExternalImport {
                        file: site.file.clone(),
                        line: site.line,
                        column: site.column,
                        external: external.clone(),
                        via: via.clone(),
                    });
                }
            }
        }
        for_node.sort_by(|a, b| {
            (&a.file, a.line, a.column, &a.external).cmp(&(&b.file, b.line, b.column, &b.external))
        });
        found.extend(for_node);
    }
    found
}

/// External packages reachable from the project package `start` through
/// project packages only, each with the chain that first reaches it.
fn external_via(graph: &DependencyGraph, start: &str) -> Vec<(String, Vec<String>)> {
    let mut visited = BTreeSet::new();
    let mut reported = BTreeSet::new();
    let mut found = Vec::new();
    let mut chain = Vec::new();
    visit(graph, start, &mut chain, &mut visited, &mut reported, &mut found);
    found
}

fn visit(
    graph: &DependencyGraph,
    current: &str,
    chain: &mut Vec<String>,
    visited: &mut BTreeSet<String>,
    reported: &mut BTreeSet<String>,
    found: &mut Vec<(String, Vec<String>)>,
) {
    if !visited.insert(current.to_string()) {
        return;
    }
    chain.push(current.to_string());
    if let Some(imports) = graph.direct_imports_of(current) {
        for target in imports.keys() {
            if graph.is_standard(target) {
                continue;
            }
            if graph.is_project(target) {
                visit(graph, target, chain, visited, reported, found);
            } else if reported.insert(target.clone()) {
                found.push((target.clone(), chain.clone()));
            }
        }
    }
    chain.pop();
}

/// The external packages the project reaches, directly or through
/// project packages. With `all`, the external packages those in turn
/// depend on are included.
#[must_use]
pub fn list_external_imports(
    graph: &DependencyGraph,
    dirs: &[PathBuf],
    all: bool,
) -> BTreeSet<String> {
    let mut externals: BTreeSet<String> = find_external_imports(graph, dirs)
        .into_iter()
        .map(|f| f.external)
        .collect();
    if all {
        let closure: Vec<String> = externals
            .iter()
            .flat_map(|ext| graph.transitive_imports_of(ext))
            .filter(|dep| is_external(graph, dep))
            .collect();
        externals.extend(closure);
    }
    externals
}

/// Check that reports external imports.
#[derive(Debug, Default)]
pub struct ExtImport;

impl ExtImport {
    /// Creates the check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for ExtImport {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Project packages must not import packages from outside the project"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check_project(&self, ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
        let project = GoProject::from_context(ctx).map_err(|e| CheckError::analysis(NAME, e))?;
        let dirs = filter_dirs(&project, &ctx.packages)?;
        let graph = project.graph().map_err(|e| CheckError::analysis(NAME, e))?;

        let found = find_external_imports(&graph, &dirs);
        debug!("Found {} external imports", found.len());
        Ok(found
            .into_iter()
            .map(|f| {
                Violation::new(
                    CODE,
                    NAME,
                    self.default_severity(),
                    Location::new(project.relative(&f.file), f.line, f.column),
                    f.message(),
                )
            })
            .collect())
    }
}

/// Canonical directories of the package filters; empty when unfiltered.
///
/// # Errors
///
/// Returns [`CheckError::Option`] for a filter that is not a directory.
pub fn filter_dirs(project: &GoProject, packages: &[String]) -> Result<Vec<PathBuf>, CheckError> {
    if packages.is_empty() {
        return Ok(Vec::new());
    }
    project
        .package_dirs(packages)
        .map_err(|e| CheckError::Option {
            check: NAME,
            message: e.to_string(),
        })
}
