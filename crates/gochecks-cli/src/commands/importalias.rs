//! Importalias command implementation.

use anyhow::{Context, Result};
use gochecks_rules::importalias::collect_aliases;
use std::path::Path;

/// Runs the importalias command. Returns true if inconsistent aliases
/// were found.
pub fn run(path: &Path, pkgs: &[String], verbose: bool, config: Option<&Path>) -> Result<bool> {
    let (_, project) = super::open_project(path, config)?;
    let index = collect_aliases(&project, pkgs).context("Failed to collect import aliases")?;

    let mismatches = index.mismatches();
    if verbose {
        print!("{}", index.verbose());
    } else {
        for mismatch in &mismatches {
            println!("{}: {}", mismatch.site, mismatch.message);
        }
    }
    Ok(!mismatches.is_empty())
}
