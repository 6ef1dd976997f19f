//! Package dependency graph over a Go project and everything it imports.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::classifier::{classify_dir, DirPackages, SourceFile};
use crate::constraint::BuildContext;
use crate::error::GoError;
use crate::extractor::GoExtractor;
use crate::roots::SourceRoots;
use crate::vendor::VendorResolver;
use crate::walk::package_dirs;

/// Which files of a directory a node is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PkgMode {
    /// Non-test files.
    Default,
    /// Internal and external `_test.go` files.
    Test,
}

/// Position of one import spec.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ImportSite {
    /// Importing file.
    pub file: PathBuf,
    /// Line of the path literal (1-indexed).
    pub line: usize,
    /// Column of the path literal (1-indexed).
    pub column: usize,
}

/// All imports of one target by one package.
#[derive(Debug, Clone, Serialize)]
pub struct ImportEdge {
    /// Resolved import path of the target.
    pub target: String,
    /// Every import spec contributing to this edge.
    pub sites: BTreeSet<ImportSite>,
}

impl ImportEdge {
    /// Files that import the target.
    #[must_use]
    pub fn files(&self) -> BTreeSet<&Path> {
        self.sites.iter().map(|s| s.file.as_path()).collect()
    }
}

/// A package in the graph.
#[derive(Debug, Clone, Serialize)]
pub struct PackageNode {
    /// Resolved import path (`_test` suffixed for test nodes).
    pub path: String,
    /// Declared package name.
    pub name: String,
    /// Directory holding the package.
    pub dir: PathBuf,
    /// Files the node was built from.
    pub mode: PkgMode,
    /// Number of `.go` files directly in the directory.
    pub n_go_files: usize,
    /// Other non-test packages sharing the directory, each with its own
    /// imports. Default nodes only.
    pub other_packages: Vec<OtherPackage>,
    /// Direct imports of the package's own files, keyed by resolved
    /// target path.
    pub imports: BTreeMap<String, ImportEdge>,
}

/// A non-test package that lost the primary slot of its directory, such
/// as a `// +build ignore` generator. Its imports never count as imports
/// of the primary package.
#[derive(Debug, Clone, Serialize)]
pub struct OtherPackage {
    /// Declared package name.
    pub name: String,
    /// Direct imports keyed by resolved target path.
    pub imports: BTreeMap<String, ImportEdge>,
}

impl OtherPackage {
    /// Returns true for a `main` package.
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.name == "main"
    }
}

impl PackageNode {
    /// Returns true for a `main` package built in default mode.
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.mode == PkgMode::Default && self.name == "main"
    }

    /// Targets imported by any file of the directory in this mode, other
    /// packages included.
    pub fn referenced(&self) -> impl Iterator<Item = &String> {
        self.imports
            .keys()
            .chain(self.other_packages.iter().flat_map(|p| p.imports.keys()))
    }
}

/// Import path of the test node for a package path.
#[must_use]
pub fn test_path(path: &str) -> String {
    format!("{path}_test")
}

/// Builds [`DependencyGraph`]s. Holds everything one invocation needs.
pub struct GraphBuilder<'a> {
    roots: &'a SourceRoots,
    context: BuildContext,
    extractor: GoExtractor,
    exclude: Vec<String>,
    seeds: Vec<PathBuf>,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder resolving imports through `roots`.
    #[must_use]
    pub fn new(roots: &'a SourceRoots, context: BuildContext) -> Self {
        Self {
            roots,
            context,
            extractor: GoExtractor::new(),
            exclude: Vec::new(),
            seeds: Vec::new(),
        }
    }

    /// Leaves out project directories matching these globs.
    #[must_use]
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        self.exclude.extend(patterns);
        self
    }

    /// Also loads the default-mode package of `dir` (and its dependencies)
    /// even when nothing imports it.
    #[must_use]
    pub fn seed(mut self, dir: impl Into<PathBuf>) -> Self {
        self.seeds.push(dir.into());
        self
    }

    /// Returns the build context constraints are evaluated against.
    #[must_use]
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Builds the node for `dir` in the given mode.
    ///
    /// Returns `Ok(None)` when the directory has no eligible files for the
    /// mode, or when it is outside every source root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a file fails
    /// to parse.
    pub fn dir_node(&self, dir: &Path, mode: PkgMode) -> Result<Option<PackageNode>, GoError> {
        let Some(path) = self.roots.import_path_of(dir) else {
            return Ok(None);
        };
        let pkgs = classify_dir(dir, &self.context, &self.extractor)?;
        Ok(self.node_from(&path, &pkgs, mode))
    }

    /// Builds the node for `import_path` as imported from `importer_dir`,
    /// resolving vendored copies first.
    ///
    /// # Errors
    ///
    /// Same as [`GraphBuilder::dir_node`].
    pub fn import_node(
        &self,
        import_path: &str,
        importer_dir: &Path,
        mode: PkgMode,
    ) -> Result<Option<PackageNode>, GoError> {
        let resolver = VendorResolver::new(self.roots);
        let resolved = resolver.resolve(import_path, importer_dir);
        match resolver.locate(&resolved) {
            Some(dir) => self.dir_node(&dir, mode),
            None => Ok(None),
        }
    }

    /// Builds the graph of `project_dir`'s packages and every package they
    /// transitively import that can be located.
    ///
    /// # Errors
    ///
    /// Returns [`GoError::ProjectDir`] if `project_dir` is not a directory
    /// and propagates read and parse errors. No partial graph is returned.
    pub fn build(&self, project_dir: &Path) -> Result<DependencyGraph, GoError> {
        if !project_dir.is_dir() {
            return Err(GoError::ProjectDir(project_dir.to_path_buf()));
        }
        let project_dir = std::fs::canonicalize(project_dir)
            .map_err(|e| GoError::io(project_dir, e))?;
        info!("Building dependency graph for {}", project_dir.display());

        let mut nodes = BTreeMap::new();
        let mut visited = BTreeSet::new();

        for dir in package_dirs(&project_dir, &self.exclude)? {
            let Some(path) = self.roots.import_path_of(&dir) else {
                continue;
            };
            let pkgs = classify_dir(&dir, &self.context, &self.extractor)?;
            for mode in [PkgMode::Default, PkgMode::Test] {
                if let Some(node) = self.node_from(&path, &pkgs, mode) {
                    insert_node(&mut nodes, node);
                }
            }
            visited.insert(path);
        }
        debug!("Found {} project nodes", nodes.len());

        let mut queue: VecDeque<String> = nodes
            .values()
            .flat_map(|n: &PackageNode| n.referenced().cloned())
            .collect();
        for seed in &self.seeds {
            let seed = std::fs::canonicalize(seed).map_err(|e| GoError::io(seed, e))?;
            if let Some(path) = self.roots.import_path_of(&seed) {
                queue.push_back(path);
            }
        }

        let mut unresolved = BTreeSet::new();
        while let Some(path) = queue.pop_front() {
            let loaded = nodes
                .get(&path)
                .is_some_and(|n: &PackageNode| n.mode == PkgMode::Default);
            if loaded || !visited.insert(path.clone()) {
                continue;
            }
            let Some(dir) = self.roots.dir_of(&path) else {
                trace!("No directory for {}", path);
                unresolved.insert(path);
                continue;
            };
            let pkgs = classify_dir(&dir, &self.context, &self.extractor)?;
            if let Some(node) = self.node_from(&path, &pkgs, PkgMode::Default) {
                queue.extend(node.referenced().cloned());
                insert_node(&mut nodes, node);
            }
        }

        info!(
            "Dependency graph has {} nodes ({} unresolved imports)",
            nodes.len(),
            unresolved.len()
        );

        Ok(DependencyGraph {
            project_dir,
            roots: self.roots.clone(),
            nodes,
            unresolved,
        })
    }

    fn node_from(&self, path: &str, pkgs: &DirPackages, mode: PkgMode) -> Option<PackageNode> {
        let (node_path, name, files, other_packages) = match mode {
            PkgMode::Default => {
                let primary = pkgs.primary.as_ref()?;
                let others = pkgs
                    .other_packages
                    .iter()
                    .map(|p| OtherPackage {
                        name: p.name.clone(),
                        imports: self.edges(&pkgs.dir, p.files.iter()),
                    })
                    .collect();
                let files: Vec<&SourceFile> = primary.files.iter().collect();
                (path.to_string(), primary.name.clone(), files, others)
            }
            PkgMode::Test => {
                if !pkgs.has_tests() {
                    return None;
                }
                let files = pkgs
                    .internal_tests
                    .iter()
                    .chain(pkgs.external_tests.iter())
                    .collect();
                (test_path(path), pkgs.test_package_name()?, files, Vec::new())
            }
        };

        Some(PackageNode {
            path: node_path,
            name,
            dir: pkgs.dir.clone(),
            mode,
            n_go_files: pkgs.n_go_files,
            other_packages,
            imports: self.edges(&pkgs.dir, files),
        })
    }

    fn edges<'f>(
        &self,
        dir: &Path,
        files: impl IntoIterator<Item = &'f SourceFile>,
    ) -> BTreeMap<String, ImportEdge> {
        let resolver = VendorResolver::new(self.roots);
        let mut imports: BTreeMap<String, ImportEdge> = BTreeMap::new();
        for file in files {
            for spec in &file.imports {
                let target = resolver.resolve(&spec.path, dir);
                imports
                    .entry(target.clone())
                    .or_insert_with(|| ImportEdge {
                        target,
                        sites: BTreeSet::new(),
                    })
                    .sites
                    .insert(ImportSite {
                        file: file.path.clone(),
                        line: spec.line,
                        column: spec.column,
                    });
            }
        }
        imports
    }
}

/// Adds `node`, settling key clashes between a Test node (`<dir>_test`)
/// and the Default node of a sibling directory literally named so. The
/// directory's own package wins.
fn insert_node(nodes: &mut BTreeMap<String, PackageNode>, node: PackageNode) {
    match nodes.get(&node.path) {
        None => {
            nodes.insert(node.path.clone(), node);
        }
        Some(existing) if existing.mode == PkgMode::Default && node.mode == PkgMode::Test => {
            debug!(
                "Test package of {} clashes with package {}, dropping the tests",
                node.dir.display(),
                existing.dir.display()
            );
        }
        Some(existing) => {
            debug!(
                "Package {} replaces node {} from {}",
                node.dir.display(),
                node.path,
                existing.dir.display()
            );
            nodes.insert(node.path.clone(), node);
        }
    }
}

/// A project's packages and their resolvable dependencies.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    project_dir: PathBuf,
    roots: SourceRoots,
    nodes: BTreeMap<String, PackageNode>,
    unresolved: BTreeSet<String>,
}

impl DependencyGraph {
    /// Canonical project directory the graph was built for.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Import path of the project directory.
    #[must_use]
    pub fn project_path(&self) -> Option<String> {
        self.roots.import_path_of(&self.project_dir)
    }

    /// Source roots used to build the graph.
    #[must_use]
    pub fn roots(&self) -> &SourceRoots {
        &self.roots
    }

    /// Looks up a node by resolved import path.
    #[must_use]
    pub fn node(&self, path: &str) -> Option<&PackageNode> {
        self.nodes.get(path)
    }

    /// All nodes, ordered by path.
    pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
        self.nodes.values()
    }

    /// Nodes of the project's own (non-vendored) packages, ordered by path.
    pub fn project_nodes(&self) -> impl Iterator<Item = &PackageNode> {
        self.nodes.values().filter(|n| {
            n.dir
                .strip_prefix(&self.project_dir)
                .is_ok_and(|rel| !rel.components().any(|c| c.as_os_str() == "vendor"))
        })
    }

    /// Imports that did not map to any directory.
    #[must_use]
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    /// Directory of a resolved import path, if it exists.
    #[must_use]
    pub fn dir_of(&self, path: &str) -> Option<PathBuf> {
        self.nodes
            .get(path)
            .map(|n| n.dir.clone())
            .or_else(|| self.roots.dir_of(path))
    }

    /// Returns true if the package lives inside the project directory,
    /// vendored packages included.
    #[must_use]
    pub fn is_project(&self, path: &str) -> bool {
        self.dir_of(path)
            .is_some_and(|dir| dir.starts_with(&self.project_dir))
    }

    /// Returns true if the path looks like a standard library package: its
    /// first element has no dot and it does not map to a directory.
    #[must_use]
    pub fn is_standard(&self, path: &str) -> bool {
        let first = path.split('/').next().unwrap_or(path);
        !first.contains('.') && self.dir_of(path).is_none()
    }

    /// Immediate imports of a package.
    #[must_use]
    pub fn direct_imports_of(&self, path: &str) -> Option<&BTreeMap<String, ImportEdge>> {
        self.nodes.get(path).map(|n| &n.imports)
    }

    /// Every package reachable from `path` through imports, excluding
    /// `path` itself. Targets without nodes are included but not expanded.
    #[must_use]
    pub fn transitive_imports_of(&self, path: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self
            .direct_imports_of(path)
            .map(|imports| imports.keys().map(String::as_str).collect())
            .unwrap_or_default();

        while let Some(current) = stack.pop() {
            if current == path || !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(imports) = self.direct_imports_of(current) {
                stack.extend(imports.keys().map(String::as_str));
            }
        }

        visited
    }

    /// Like [`DependencyGraph::transitive_imports_of`], but also follows
    /// the imports of other packages sharing a directory with a visited
    /// package. This is every package some file could reference.
    #[must_use]
    pub fn transitive_references_of(&self, path: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self
            .nodes
            .get(path)
            .map(|n| n.referenced().map(String::as_str).collect())
            .unwrap_or_default();

        while let Some(current) = stack.pop() {
            if current == path || !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.referenced().map(String::as_str));
            }
        }

        visited
    }
}
