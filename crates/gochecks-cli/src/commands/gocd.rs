//! Gocd command implementation.

use anyhow::{Context, Result};
use gochecks_go::ImportReport;
use std::path::Path;

use crate::ReportFormat;

/// Runs the gocd command.
pub fn run(path: &Path, format: ReportFormat, config: Option<&Path>) -> Result<()> {
    let (_, project) = super::open_project(path, config)?;
    let graph = project.graph().context("Failed to build dependency graph")?;
    let report = ImportReport::create(&graph);

    match format {
        ReportFormat::Text => print!("{}", report.to_text()),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
