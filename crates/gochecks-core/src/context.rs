//! Context types for check execution.

use crate::config::{CheckConfig, Config};
use std::path::Path;

/// Context provided to project checks.
#[derive(Debug, Clone)]
pub struct ProjectContext<'a> {
    /// Project directory being checked.
    pub root: &'a Path,
    /// Active configuration.
    pub config: &'a Config,
    /// Package directories (relative to the root) to restrict the check
    /// to. Empty means every package in the project.
    pub packages: Vec<String>,
}

impl<'a> ProjectContext<'a> {
    /// Creates a new project context.
    #[must_use]
    pub fn new(root: &'a Path, config: &'a Config) -> Self {
        Self {
            root,
            config,
            packages: Vec::new(),
        }
    }

    /// Restricts the context to the given package directories.
    #[must_use]
    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }

    /// Returns the configuration table for a check, if any.
    #[must_use]
    pub fn check_config(&self, check_name: &str) -> Option<&'a CheckConfig> {
        self.config.check_config(check_name)
    }
}

/// Calculates the byte offset for a 1-indexed line and column.
///
/// Returns 0 when `line` is 0 and the end of the content when the line
/// is out of bounds.
#[must_use]
pub fn offset_for(content: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }

    let mut offset = 0;
    for (i, line_content) in content.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return offset + column.saturating_sub(1);
        }
        offset += line_content.len();
    }

    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_for_first_line() {
        assert_eq!(offset_for("package main; import \"fmt\"\n", 1, 22), 21);
    }

    #[test]
    fn offset_for_later_line() {
        let src = "package foo\n\nimport \"bar\"\n";
        assert_eq!(offset_for(src, 3, 8), 20);
        assert_eq!(&src[20..25], "\"bar\"");
    }

    #[test]
    fn offset_for_line_zero() {
        assert_eq!(offset_for("package foo\n", 0, 4), 0);
    }

    #[test]
    fn packages_filter_defaults_to_empty() {
        let config = Config::default();
        let ctx = ProjectContext::new(Path::new("."), &config);
        assert!(ctx.packages.is_empty());
        let ctx = ctx.with_packages(vec!["./foo".to_string()]);
        assert_eq!(ctx.packages, vec!["./foo".to_string()]);
        assert!(ctx.check_config("extimport").is_none());
    }
}
