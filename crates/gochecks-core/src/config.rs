//! Configuration types for gochecks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level configuration, loaded from `gochecks.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project layout settings.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Build constraint evaluation settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Per-check configurations.
    #[serde(default)]
    pub checks: HashMap<String, CheckConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a check is enabled. Checks are enabled unless configured otherwise.
    #[must_use]
    pub fn is_check_enabled(&self, check_name: &str) -> bool {
        self.checks
            .get(check_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a check.
    #[must_use]
    pub fn check_severity(&self, check_name: &str) -> Option<crate::Severity> {
        self.checks.get(check_name).and_then(|c| c.severity)
    }

    /// Gets the configuration table for a check.
    #[must_use]
    pub fn check_config(&self, check_name: &str) -> Option<&CheckConfig> {
        self.checks.get(check_name)
    }
}

/// Project layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project directory (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Module import path of the project directory. Read from `go.mod`
    /// when not set.
    #[serde(default)]
    pub module: Option<String>,

    /// GOPATH-style `src` directory used to resolve non-module imports.
    /// Falls back to `$GOPATH/src` when not set.
    #[serde(default)]
    pub source_root: Option<PathBuf>,

    /// Glob patterns (relative to the project root) of package
    /// directories to leave out.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            module: None,
            source_root: None,
            exclude: Vec::new(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// Build constraint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Treat every build constraint as satisfied.
    #[serde(default = "default_true")]
    pub all_tags: bool,

    /// Target operating system (default: the host's).
    #[serde(default)]
    pub goos: Option<String>,

    /// Target architecture (default: the host's).
    #[serde(default)]
    pub goarch: Option<String>,

    /// Additional build tags considered satisfied.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether the `cgo` tag is satisfied.
    #[serde(default = "default_true")]
    pub cgo: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            all_tags: true,
            goos: None,
            goarch: None,
            tags: Vec::new(),
            cgo: true,
        }
    }
}

/// Per-check configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Whether this check is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this check.
    #[serde(default)]
    pub severity: Option<crate::Severity>,

    /// Check-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl CheckConfig {
    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets a string option.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Gets a string array option.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.build.all_tags);
        assert!(config.build.cgo);
        assert_eq!(config.project.root, PathBuf::from("."));
        assert!(config.checks.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[project]
root = "./go"
module = "github.com/org/product"
exclude = ["internal/generated/**"]

[build]
all_tags = false
goos = "linux"
goarch = "amd64"
tags = ["integration"]

[checks.ptimports]
severity = "warning"
local_prefix = "github.com/org/product/"

[checks.novendor]
enabled = false
ignore = ["./vendor/github.com/org/library"]
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.project.root, PathBuf::from("./go"));
        assert_eq!(
            config.project.module.as_deref(),
            Some("github.com/org/product")
        );
        assert!(!config.build.all_tags);
        assert_eq!(config.build.goos.as_deref(), Some("linux"));
        assert_eq!(config.build.tags, vec!["integration".to_string()]);

        assert!(config.is_check_enabled("ptimports"));
        assert!(!config.is_check_enabled("novendor"));
        assert!(config.is_check_enabled("extimport"));
        assert_eq!(
            config.check_severity("ptimports"),
            Some(crate::Severity::Warning)
        );

        let ptimports = config.check_config("ptimports").expect("ptimports table");
        assert_eq!(ptimports.get_str("local_prefix"), Some("github.com/org/product/"));
        let novendor = config.check_config("novendor").expect("novendor table");
        assert_eq!(
            novendor.get_str_array("ignore"),
            vec!["./vendor/github.com/org/library".to_string()]
        );
    }

    #[test]
    fn test_parse_invalid_config() {
        let err = Config::parse("[build]\nall_tags = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
