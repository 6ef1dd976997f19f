//! Novendor command implementation.

use anyhow::{Context, Result};
use gochecks_rules::novendor::{find_unused, NovendorOptions, NAME};
use std::path::Path;

/// Runs the novendor command. Returns true if unused vendored packages
/// were reported.
pub fn run(
    path: &Path,
    full: bool,
    group: bool,
    ignore: Vec<String>,
    config: Option<&Path>,
) -> Result<bool> {
    let (config, project) = super::open_project(path, config)?;

    let mut options = NovendorOptions {
        group,
        full,
        ignore,
    };
    if let Some(check) = config.check_config(NAME) {
        options.ignore.extend(check.get_str_array("ignore"));
    }

    let unused = find_unused(&project, &options).context("Failed to compute vendored package usage")?;
    for pkg in &unused {
        println!("{}", pkg.display(full));
    }
    Ok(!unused.is_empty())
}
