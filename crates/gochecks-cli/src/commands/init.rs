//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# gochecks configuration

[project]
# Project directory (default: current directory)
# root = "."

# Import path of the project directory (default: read from go.mod)
# module = "github.com/org/product"

# GOPATH-style source root for non-module imports (default: $GOPATH/src)
# source_root = "/go/src"

# Glob patterns of package directories to leave out
exclude = []

[build]
# Treat every build constraint as satisfied
all_tags = true
# goos = "linux"
# goarch = "amd64"
# tags = ["integration"]
cgo = true

# Check configurations
# Each check can be enabled/disabled and have its severity overridden

[checks.extimport]
enabled = true
# severity = "warning"  # Override default severity

[checks.novendor]
enabled = true
# Package directories treated as used
ignore = []

[checks.importalias]
enabled = true

[checks.ptimports]
enabled = true
# local_prefix = "github.com/org/product/"

[checks.gogenerate]
enabled = true
# Generators run by `gochecks gogenerate`, verified by `gochecks check`
# [checks.gogenerate.generators.stringer]
# dir = "internal/kind"
# paths = ["internal/kind/kind_string.go"]
# names = ["*_string.go"]
# environment = { GOOS = "linux" }
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("gochecks.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created gochecks.toml");
    println!("\nNext steps:");
    println!("  1. Edit gochecks.toml to configure checks");
    println!("  2. Run: gochecks check");

    Ok(())
}
