//! A Go project directory together with its resolution settings.

use std::path::{Path, PathBuf};

use gochecks_core::ProjectContext;

use crate::constraint::BuildContext;
use crate::error::GoError;
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::roots::SourceRoots;
use crate::walk::package_dirs;

/// A project directory plus the roots and build context used to analyze it.
#[derive(Debug, Clone)]
pub struct GoProject {
    /// Canonical project directory.
    pub dir: PathBuf,
    /// Source roots for import resolution.
    pub roots: SourceRoots,
    /// Build context for constraint evaluation.
    pub context: BuildContext,
    /// Exclude globs for project package directories.
    pub exclude: Vec<String>,
}

impl GoProject {
    /// Creates a project with explicit roots and build context.
    ///
    /// # Errors
    ///
    /// Returns [`GoError::ProjectDir`] if `dir` is not a directory.
    pub fn new(dir: &Path, roots: SourceRoots, context: BuildContext) -> Result<Self, GoError> {
        if !dir.is_dir() {
            return Err(GoError::ProjectDir(dir.to_path_buf()));
        }
        let dir = std::fs::canonicalize(dir).map_err(|e| GoError::io(dir, e))?;
        Ok(Self {
            dir,
            roots,
            context,
            exclude: Vec::new(),
        })
    }

    /// Creates a project from a check context, discovering its roots from
    /// the `[project]` configuration, `go.mod` and `$GOPATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project directory is missing or `go.mod`
    /// cannot be read.
    pub fn from_context(ctx: &ProjectContext) -> Result<Self, GoError> {
        let project = &ctx.config.project;
        let roots = SourceRoots::discover(
            ctx.root,
            project.module.as_deref(),
            project.source_root.as_deref(),
        )?;
        let mut result = Self::new(ctx.root, roots, BuildContext::from_config(&ctx.config.build))?;
        result.exclude.clone_from(&project.exclude);
        Ok(result)
    }

    /// Replaces the build context.
    #[must_use]
    pub fn with_context(mut self, context: BuildContext) -> Self {
        self.context = context;
        self
    }

    /// Returns a graph builder for this project.
    #[must_use]
    pub fn builder(&self) -> GraphBuilder<'_> {
        GraphBuilder::new(&self.roots, self.context.clone()).exclude(self.exclude.clone())
    }

    /// Builds the dependency graph of the project.
    ///
    /// # Errors
    ///
    /// Propagates [`GraphBuilder::build`] errors.
    pub fn graph(&self) -> Result<DependencyGraph, GoError> {
        self.builder().build(&self.dir)
    }

    /// Package directories to analyze: the given project-relative
    /// directories, or every package directory when `filters` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`GoError::ProjectDir`] for a filter that is not a directory.
    pub fn package_dirs(&self, filters: &[String]) -> Result<Vec<PathBuf>, GoError> {
        if filters.is_empty() {
            return package_dirs(&self.dir, &self.exclude);
        }
        let mut dirs = Vec::new();
        for filter in filters {
            let dir = self.dir.join(filter);
            if !dir.is_dir() {
                return Err(GoError::ProjectDir(dir));
            }
            dirs.push(std::fs::canonicalize(&dir).map_err(|e| GoError::io(&dir, e))?);
        }
        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }

    /// Returns `path` relative to the project directory when it is inside it.
    #[must_use]
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.dir)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}
