//! Check command implementation.

use anyhow::{Context, Result};
use gochecks_core::{CheckBox, Runner};
use gochecks_rules::{all_checks, check_by_name};
use std::path::Path;

use crate::OutputFormat;

/// Runs the check command. Returns true if error-level violations were
/// found.
pub fn run(
    path: &Path,
    format: OutputFormat,
    checks_filter: Option<String>,
    config: Option<&Path>,
) -> Result<bool> {
    let config = super::load_config(path, config)?;
    let root = super::project_root(path, &config);

    let checks = if let Some(filter) = checks_filter {
        let names: Vec<&str> = filter.split(',').map(str::trim).collect();
        filter_checks(&names)
    } else {
        all_checks()
    };

    let runner = Runner::builder()
        .root(&root)
        .config(config)
        .checks(checks)
        .build()
        .context("Failed to build runner")?;

    tracing::info!("Checking {:?} with {} checks", root, runner.check_count());

    let result = runner.run().context("Check failed")?;

    super::output::print(&result, format, &root)?;

    Ok(result.has_errors())
}

fn filter_checks(names: &[&str]) -> Vec<CheckBox> {
    let mut checks = Vec::new();
    for name in names {
        match check_by_name(name) {
            Some(check) => checks.push(check),
            None => tracing::warn!("Unknown check: {}", name),
        }
    }
    checks
}
