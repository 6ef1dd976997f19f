//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gochecks_core::{Config, ProjectContext};
use gochecks_go::GoProject;

use crate::config_resolver::ConfigResolver;

pub mod check;
pub mod extimport;
pub mod gocd;
pub mod gogenerate;
pub mod importalias;
pub mod init;
pub mod list_checks;
pub mod novendor;
pub mod output;
pub mod ptimports;

/// Resolves and loads the configuration for the project at `path`.
pub fn load_config(path: &Path, explicit: Option<&Path>) -> Result<Config> {
    ConfigResolver::new().resolve(path, explicit).load()
}

/// The project directory: `path`, unless it was left at its default and
/// the configuration names another root.
pub fn project_root(path: &Path, config: &Config) -> PathBuf {
    if path == Path::new(".") {
        config.project.root.clone()
    } else {
        path.to_path_buf()
    }
}

/// Loads the configuration and opens the Go project at `path`.
pub fn open_project(path: &Path, explicit: Option<&Path>) -> Result<(Config, GoProject)> {
    let config = load_config(path, explicit)?;
    let root = project_root(path, &config);
    let ctx = ProjectContext::new(&root, &config);
    let project = GoProject::from_context(&ctx)
        .with_context(|| format!("Failed to open project {}", root.display()))?;
    tracing::debug!("Project {} ({:?})", project.dir.display(), project.roots);
    Ok((config, project))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_configured_root() {
        let mut config = Config::default();
        config.project.root = PathBuf::from("go/src/product");
        assert_eq!(
            project_root(Path::new("other"), &config),
            PathBuf::from("other")
        );
        assert_eq!(
            project_root(Path::new("."), &config),
            PathBuf::from("go/src/product")
        );
    }
}
