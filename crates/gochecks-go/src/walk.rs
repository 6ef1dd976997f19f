//! Discovery of the package directories of a project.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::GoError;
use crate::roots::slash_path;

/// Reports whether the Go toolchain skips a directory when matching `./...`.
#[must_use]
pub fn is_skipped_dir_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_') || name == "testdata" || name == "vendor"
}

/// Lists `project_dir` and every directory below it that may hold a
/// project package, sorted by path.
///
/// Hidden, `_`-prefixed, `testdata` and `vendor` directories are pruned,
/// as are directories whose project-relative path matches an `exclude`
/// glob.
///
/// # Errors
///
/// Returns an error if a directory cannot be read or a pattern is invalid.
pub fn package_dirs(project_dir: &Path, exclude: &[String]) -> Result<Vec<PathBuf>, GoError> {
    let patterns = exclude
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<Result<Vec<_>, _>>()?;

    let excluded = |entry: &DirEntry| {
        let rel = entry
            .path()
            .strip_prefix(project_dir)
            .ok()
            .and_then(slash_path)
            .unwrap_or_default();
        patterns.iter().any(|p| p.matches(&rel))
    };

    let walker = WalkDir::new(project_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || (e.file_type().is_dir()
                    && !is_skipped_dir_name(&e.file_name().to_string_lossy())
                    && !excluded(e))
        });

    let mut dirs = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| project_dir.to_path_buf(), Path::to_path_buf);
            GoError::io(path, e.into())
        })?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prunes_special_directories() {
        let tmp = TempDir::new().expect("tempdir");
        for dir in [
            "foo/bar",
            ".git/objects",
            "_build",
            "testdata/pkg",
            "vendor/github.com/org/lib",
            "gen/proto",
        ] {
            std::fs::create_dir_all(tmp.path().join(dir)).expect("mkdir");
        }

        let dirs = package_dirs(tmp.path(), &["gen/**".to_string(), "gen".to_string()])
            .expect("walk");
        let rel: Vec<_> = dirs
            .iter()
            .map(|d| slash_path(d.strip_prefix(tmp.path()).expect("prefix")).expect("utf8"))
            .collect();
        assert_eq!(rel, vec!["", "foo", "foo/bar"]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let tmp = TempDir::new().expect("tempdir");
        let err = package_dirs(tmp.path(), &["[".to_string()]).unwrap_err();
        assert!(matches!(err, GoError::Glob(_)));
    }
}
