//! Vendor-aware import resolution.

use std::path::{Path, PathBuf};

use crate::roots::{join_import, SourceRoots};

/// Resolves raw import paths against `vendor` directories.
#[derive(Debug, Clone, Copy)]
pub struct VendorResolver<'a> {
    roots: &'a SourceRoots,
}

impl<'a> VendorResolver<'a> {
    /// Creates a resolver over the given source roots.
    #[must_use]
    pub fn new(roots: &'a SourceRoots) -> Self {
        Self { roots }
    }

    /// Resolves `import_path` as imported from a file in `importer_dir`.
    ///
    /// Walks from `importer_dir` up to its source root and returns
    /// `<level>/vendor/<import_path>` for the nearest level whose vendor
    /// directory holds the package. Levels inside hidden directories are
    /// skipped. Returns `import_path` unchanged when no vendored copy
    /// exists, which makes resolution idempotent.
    #[must_use]
    pub fn resolve(&self, import_path: &str, importer_dir: &Path) -> String {
        if import_path == "C" || import_path.starts_with('.') || import_path.is_empty() {
            return import_path.to_string();
        }
        let Some(root) = self.roots.root_of(importer_dir) else {
            return import_path.to_string();
        };

        for level in importer_dir.ancestors() {
            if !level.starts_with(&root.dir) {
                break;
            }
            if has_hidden_component(level.strip_prefix(&root.dir).unwrap_or(level)) {
                continue;
            }
            let candidate = import_path
                .split('/')
                .fold(level.join("vendor"), |acc, part| acc.join(part));
            if candidate.is_dir() {
                if let Some(level_path) = self.roots.import_path_of(level) {
                    return join_import(&join_import(&level_path, "vendor"), import_path);
                }
            }
        }

        import_path.to_string()
    }

    /// Finds the directory of a resolved import path.
    #[must_use]
    pub fn locate(&self, resolved: &str) -> Option<PathBuf> {
        self.roots.dir_of(resolved)
    }
}

/// Reports whether any component of a relative path starts with `.`.
#[must_use]
pub fn has_hidden_component(rel: &Path) -> bool {
    rel.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.') && c.as_os_str() != ".")
}

/// Reports whether a resolved import path points into a `vendor` directory.
#[must_use]
pub fn is_vendored(import_path: &str) -> bool {
    import_path.split('/').any(|part| part == "vendor")
}

/// Strips the vendor prefix from a resolved import path, giving the path
/// as it is written in import statements.
#[must_use]
pub fn unvendored(import_path: &str) -> &str {
    if let Some(idx) = import_path.rfind("/vendor/") {
        return &import_path[idx + "/vendor/".len()..];
    }
    import_path.strip_prefix("vendor/").unwrap_or(import_path)
}
