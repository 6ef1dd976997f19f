//! File counts over the dependency graph.

use std::collections::HashMap;

use crate::graph::DependencyGraph;

/// Counts Go files of packages and of their transitive dependencies.
///
/// Totals are memoised per package path for the lifetime of the counter.
/// The memo is only valid for the graph the counter borrows; a rebuilt
/// graph needs a new counter.
pub struct GoFileCounter<'g> {
    graph: &'g DependencyGraph,
    totals: HashMap<String, usize>,
}

impl<'g> GoFileCounter<'g> {
    /// Creates a counter over `graph`.
    #[must_use]
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            totals: HashMap::new(),
        }
    }

    /// Number of `.go` files directly in the package's directory.
    #[must_use]
    pub fn n_go_files(&self, path: &str) -> Option<usize> {
        self.graph.node(path).map(|n| n.n_go_files)
    }

    /// Files of the package plus the files of every package in its
    /// transitive closure, each package counted once.
    pub fn n_total_go_files(&mut self, path: &str) -> Option<usize> {
        if let Some(total) = self.totals.get(path) {
            return Some(*total);
        }
        let own = self.n_go_files(path)?;
        let total = own
            + self
                .graph
                .transitive_imports_of(path)
                .iter()
                .filter_map(|dep| self.n_go_files(dep))
                .sum::<usize>();
        self.totals.insert(path.to_string(), total);
        Some(total)
    }

    /// Files of the package's transitive closure, excluding its own files.
    pub fn n_imported_go_files(&mut self, path: &str) -> Option<usize> {
        let own = self.n_go_files(path)?;
        self.n_total_go_files(path).map(|total| total - own)
    }
}
