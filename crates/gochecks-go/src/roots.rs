//! Mapping between import paths and directories.
//!
//! A [`SourceRoot`] pairs an import path prefix with the directory that
//! holds it: the module directory declared by `go.mod`, or a GOPATH-style
//! `src` directory whose prefix is empty. Lookups prefer the longest match.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::GoError;

/// An import path prefix rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    /// Import path of `dir` (empty for a GOPATH `src` directory).
    pub prefix: String,
    /// Directory holding packages under `prefix`.
    pub dir: PathBuf,
}

/// Ordered set of source roots.
#[derive(Debug, Clone, Default)]
pub struct SourceRoots {
    roots: Vec<SourceRoot>,
}

impl SourceRoots {
    /// Creates an empty set of roots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots holding a single GOPATH-style `src` directory.
    #[must_use]
    pub fn gopath(src_dir: impl AsRef<Path>) -> Self {
        Self::new().with_root("", src_dir)
    }

    /// Adds a root. Directories are canonicalized when possible.
    #[must_use]
    pub fn with_root(mut self, prefix: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        self.roots.push(SourceRoot {
            prefix,
            dir: canonical(dir.as_ref()),
        });
        // Longest directory first so nested roots win in reverse lookups.
        self.roots
            .sort_by(|a, b| b.dir.as_os_str().len().cmp(&a.dir.as_os_str().len()));
        self
    }

    /// Discovers the roots for a project directory.
    ///
    /// The module root comes from `module` or the nearest `go.mod` at or
    /// above `project_dir`. The GOPATH root comes from `source_root` or
    /// `$GOPATH/src` when it contains the project. When neither applies,
    /// the project directory's parent is used as a GOPATH-style root.
    ///
    /// # Errors
    ///
    /// Returns an error if `go.mod` exists but cannot be read.
    pub fn discover(
        project_dir: &Path,
        module: Option<&str>,
        source_root: Option<&Path>,
    ) -> Result<Self, GoError> {
        let project_dir = canonical(project_dir);
        let mut roots = Self::new();

        if let Some(module) = module {
            roots = roots.with_root(module, &project_dir);
        } else if let Some((module, dir)) = find_go_mod(&project_dir)? {
            debug!("Using module {} rooted at {}", module, dir.display());
            roots = roots.with_root(module, dir);
        }

        let gopath_src = source_root.map(Path::to_path_buf).or_else(|| {
            std::env::var_os("GOPATH")
                .and_then(|p| std::env::split_paths(&p).next())
                .map(|p| p.join("src"))
        });
        if let Some(src) = gopath_src {
            let src = canonical(&src);
            if source_root.is_some() || project_dir.starts_with(&src) {
                roots = roots.with_root("", src);
            }
        }

        if roots.roots.is_empty() {
            if let Some(parent) = project_dir.parent() {
                debug!(
                    "No module or GOPATH found, using {} as source root",
                    parent.display()
                );
                roots = roots.with_root("", parent);
            }
        }

        Ok(roots)
    }

    /// Returns the roots, most specific directory first.
    #[must_use]
    pub fn roots(&self) -> &[SourceRoot] {
        &self.roots
    }

    /// Returns the root whose directory contains `dir`.
    #[must_use]
    pub fn root_of(&self, dir: &Path) -> Option<&SourceRoot> {
        self.roots.iter().find(|r| dir.starts_with(&r.dir))
    }

    /// Computes the import path of a package directory.
    #[must_use]
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        let root = self.root_of(dir)?;
        let rel = dir.strip_prefix(&root.dir).ok()?;
        let rel = slash_path(rel)?;
        Some(join_import(&root.prefix, &rel))
    }

    /// Finds the directory holding an import path, if it exists.
    #[must_use]
    pub fn dir_of(&self, import_path: &str) -> Option<PathBuf> {
        let mut candidates: Vec<&SourceRoot> = self
            .roots
            .iter()
            .filter(|r| {
                r.prefix.is_empty()
                    || import_path == r.prefix
                    || import_path
                        .strip_prefix(&r.prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .collect();
        candidates.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        candidates.into_iter().find_map(|r| {
            let rest = import_path[r.prefix.len()..].trim_start_matches('/');
            let dir = rest
                .split('/')
                .filter(|s| !s.is_empty())
                .fold(r.dir.clone(), |acc, part| acc.join(part));
            dir.is_dir().then_some(dir)
        })
    }
}

/// Joins an import path prefix and a slash-separated relative path.
#[must_use]
pub fn join_import(prefix: &str, rel: &str) -> String {
    match (prefix.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{rel}"),
    }
}

/// Renders a relative path with `/` separators.
#[must_use]
pub fn slash_path(rel: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(s) => parts.push(s.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn find_go_mod(start: &Path) -> Result<Option<(String, PathBuf)>, GoError> {
    for dir in start.ancestors() {
        let go_mod = dir.join("go.mod");
        if !go_mod.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&go_mod).map_err(|e| GoError::io(&go_mod, e))?;
        return Ok(parse_module_directive(&content).map(|m| (m, dir.to_path_buf())));
    }
    Ok(None)
}

/// Extracts the module path from the `module` directive of a `go.mod` file.
#[must_use]
pub fn parse_module_directive(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let module = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!module.is_empty()).then(|| module.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_module_directive() {
        let go_mod = "// comment\nmodule github.com/org/product // trailing\n\ngo 1.21\n";
        assert_eq!(
            parse_module_directive(go_mod).as_deref(),
            Some("github.com/org/product")
        );
        assert_eq!(
            parse_module_directive("module \"example.com/quoted\"\n").as_deref(),
            Some("example.com/quoted")
        );
        assert_eq!(parse_module_directive("go 1.21\n"), None);
    }

    #[test]
    fn gopath_round_trip() {
        let tmp = TempDir::new().expect("tempdir");
        let pkg = tmp.path().join("github.com/org/product/foo");
        std::fs::create_dir_all(&pkg).expect("mkdir");

        let roots = SourceRoots::gopath(tmp.path());
        assert_eq!(
            roots.import_path_of(&canonical(&pkg)).as_deref(),
            Some("github.com/org/product/foo")
        );
        assert_eq!(
            roots.dir_of("github.com/org/product/foo"),
            Some(canonical(&pkg))
        );
        assert_eq!(roots.dir_of("github.com/org/missing"), None);
    }

    #[test]
    fn module_root_takes_precedence() {
        let tmp = TempDir::new().expect("tempdir");
        let project = tmp.path().join("checkout");
        std::fs::create_dir_all(project.join("bar")).expect("mkdir");

        let roots = SourceRoots::gopath(tmp.path()).with_root("example.com/mod", &project);
        let bar = canonical(&project.join("bar"));
        assert_eq!(
            roots.import_path_of(&bar).as_deref(),
            Some("example.com/mod/bar")
        );
        assert_eq!(roots.dir_of("example.com/mod/bar"), Some(bar.clone()));
        assert_eq!(roots.dir_of("checkout/bar"), Some(bar));
        assert_eq!(
            roots.import_path_of(&canonical(&project)).as_deref(),
            Some("example.com/mod")
        );
    }

    #[test]
    fn discover_reads_go_mod() {
        let tmp = TempDir::new().expect("tempdir");
        let project = tmp.path().join("proj");
        std::fs::create_dir_all(project.join("sub")).expect("mkdir");
        std::fs::write(project.join("go.mod"), "module example.com/proj\n").expect("write");

        let roots = SourceRoots::discover(&project.join("sub"), None, Some(tmp.path()))
            .expect("discover");
        assert_eq!(
            roots
                .import_path_of(&canonical(&project.join("sub")))
                .as_deref(),
            Some("example.com/proj/sub")
        );
    }

    #[test]
    fn join_import_handles_empty_parts() {
        assert_eq!(join_import("", "foo/bar"), "foo/bar");
        assert_eq!(join_import("example.com/m", ""), "example.com/m");
        assert_eq!(join_import("example.com/m", "x"), "example.com/m/x");
    }
}
