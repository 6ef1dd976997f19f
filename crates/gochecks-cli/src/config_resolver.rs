//! Locating `gochecks.toml`.
//!
//! Lookup order: the `--config` flag (or `$GOCHECKS_CONFIG`), then
//! `gochecks.toml` / `.gochecks.toml` in the project directory, then
//! `config.toml` in the user's gochecks directory. Without any of those
//! the built-in defaults apply.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gochecks_core::Config;

const PROJECT_FILES: [&str; 2] = ["gochecks.toml", ".gochecks.toml"];
const USER_FILE: &str = "config.toml";

/// Origin of the configuration in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Named on the command line.
    Flag(PathBuf),
    /// Found next to the Go project.
    Project(PathBuf),
    /// Found in the user's gochecks directory.
    User(PathBuf),
    /// Nothing found.
    Builtin,
}

impl ConfigOrigin {
    /// The file backing this origin.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Flag(file) | Self::Project(file) | Self::User(file) => Some(file),
            Self::Builtin => None,
        }
    }

    /// Reads and parses the configuration.
    pub fn load(&self) -> Result<Config> {
        let Some(file) = self.file() else {
            return Ok(Config::default());
        };
        if matches!(self, Self::User(_)) {
            tracing::info!("Using user config: {}", file.display());
        }
        Config::from_file(file).with_context(|| format!("Failed to load config: {}", file.display()))
    }
}

/// Finds the configuration for a project directory.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    user_dir: Option<PathBuf>,
}

impl ConfigResolver {
    /// A resolver consulting `$GOCHECKS_CONFIG_DIR`, or `~/.gochecks`.
    #[must_use]
    pub fn new() -> Self {
        let user_dir = std::env::var_os("GOCHECKS_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|| home::home_dir().map(|home| home.join(".gochecks")));
        Self::with_user_dir(user_dir)
    }

    /// A resolver with an explicit user directory, or none.
    #[must_use]
    pub fn with_user_dir(user_dir: Option<PathBuf>) -> Self {
        Self { user_dir }
    }

    /// Determines where the configuration for `project_dir` comes from.
    #[must_use]
    pub fn resolve(&self, project_dir: &Path, flag: Option<&Path>) -> ConfigOrigin {
        if let Some(file) = flag {
            return ConfigOrigin::Flag(file.to_path_buf());
        }

        let project_file = PROJECT_FILES
            .iter()
            .map(|name| project_dir.join(name))
            .find(|file| file.is_file());
        if let Some(file) = project_file {
            tracing::debug!("Project config {}", file.display());
            return ConfigOrigin::Project(file);
        }

        match self.user_dir.as_ref().map(|dir| dir.join(USER_FILE)) {
            Some(file) if file.is_file() => {
                tracing::debug!("User config {}", file.display());
                ConfigOrigin::User(file)
            }
            _ => ConfigOrigin::Builtin,
        }
    }
}
