//! Extimport command implementation.

use anyhow::{Context, Result};
use gochecks_rules::extimport::{filter_dirs, find_external_imports, list_external_imports};
use std::path::Path;

/// Runs the extimport command. Returns true if external imports were
/// reported.
pub fn run(path: &Path, pkgs: &[String], list: bool, all: bool, config: Option<&Path>) -> Result<bool> {
    let (_, project) = super::open_project(path, config)?;
    let dirs = filter_dirs(&project, pkgs)?;
    let graph = project.graph().context("Failed to build dependency graph")?;

    if list {
        for pkg in list_external_imports(&graph, &dirs, all) {
            println!("{pkg}");
        }
        return Ok(false);
    }

    let found = find_external_imports(&graph, &dirs);
    for import in &found {
        println!(
            "{}:{}:{}: {}",
            project.relative(&import.file).display(),
            import.line,
            import.column,
            import.message()
        );
    }
    Ok(!found.is_empty())
}
