//! Shared output formatting for check results.

use anyhow::Result;
use gochecks_core::{offset_for, LintResult, Severity, Violation, ViolationDiagnostic};
use miette::{NamedSource, Report};
use std::path::Path;

use crate::OutputFormat;

/// Print check results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat, root: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Rich => print_rich(result, root),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    let counts = result.severity_counts();

    for violation in &result.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}",
            violation.code, violation.check, violation.location
        );
        println!("  {}: {}", severity_indicator, violation.message);
        if let Some(suggestion) = &violation.suggestion {
            println!("  = help: {}", suggestion.message);
        }
        println!();
    }

    let summary_color = if counts.errors > 0 {
        "\x1b[31m"
    } else if counts.warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) from {} check(s)\x1b[0m",
        summary_color, counts.errors, counts.warnings, counts.infos, result.checks_run
    );
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for violation in &result.violations {
        println!("{}", violation.format_compact());
    }
}

fn print_rich(result: &LintResult, root: &Path) {
    for violation in &result.violations {
        match rich_report(violation, root) {
            Some(report) => println!("{report:?}"),
            None => print!("{}", violation.format()),
        }
    }
}

/// Renders a violation against its source file. Returns `None` when the
/// violation has no position or the file cannot be read.
fn rich_report(violation: &Violation, root: &Path) -> Option<Report> {
    if !violation.location.has_position() {
        return None;
    }
    let file = root.join(&violation.location.file);
    let content = std::fs::read_to_string(&file).ok()?;

    let mut located = violation.clone();
    let offset = offset_for(&content, located.location.line, located.location.column);
    let rest = content.get(offset..)?;
    let length = rest
        .find(|c: char| c.is_whitespace() || c == ';' || c == ')')
        .unwrap_or(rest.len());
    located.location = located.location.with_span(offset, length);

    let diagnostic = ViolationDiagnostic::from(&located);
    let name = violation.location.file.display().to_string();
    Some(Report::new(diagnostic).with_source_code(NamedSource::new(name, content)))
}
