//! Gogenerate command implementation.

use anyhow::{Context, Result};
use gochecks_rules::gogenerate::{generators_from, run as run_generators, Generators, NAME};
use std::path::Path;

/// Runs the configured generators. With `verify`, returns true if any of
/// them changed its output.
pub fn run(path: &Path, verify: bool, config: Option<&Path>) -> Result<bool> {
    let config = super::load_config(path, config)?;
    let root = super::project_root(path, &config);

    let generators = match config.check_config(NAME) {
        Some(check) => generators_from(check)?,
        None => Generators::new(),
    };
    if generators.is_empty() {
        tracing::warn!("No generators configured in [checks.{NAME}.generators]");
        return Ok(false);
    }

    let report = run_generators(&root, &generators, verify)
        .with_context(|| format!("Failed to run generators in {}", root.display()))?;
    if report.is_empty() {
        return Ok(false);
    }
    eprintln!("{report}");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn nothing_to_do_without_generators() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("gochecks.toml");
        fs::write(&config, "[checks.gogenerate]\nenabled = true\n").unwrap();
        assert!(!run(tmp.path(), true, Some(&config)).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn verify_reports_drift() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("gen")).unwrap();
        fs::write(tmp.path().join("gen/output.txt"), "stale").unwrap();
        let config = tmp.path().join("gochecks.toml");
        fs::write(
            &config,
            r#"
[checks.gogenerate.generators.foo]
dir = "gen"
paths = ["gen/output.txt"]
command = ["sh", "-c", "printf fresh > output.txt"]
"#,
        )
        .unwrap();

        assert!(run(tmp.path(), true, Some(&config)).unwrap());
        assert!(!run(tmp.path(), true, Some(&config)).unwrap());
        assert!(!run(tmp.path(), false, Some(&config)).unwrap());
    }
}
