//! GC002: every vendored package must be used by the project.
//!
//! Usage is computed with every build constraint satisfied, so a package
//! needed only on some platform still counts as used.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use gochecks_core::{Check, CheckError, Location, ProjectContext, Severity, Violation};
use gochecks_go::classifier::go_files;
use gochecks_go::vendor::unvendored;
use gochecks_go::{BuildContext, DependencyGraph, GoError, GoProject};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Check code.
pub const CODE: &str = "GC002";
/// Check name.
pub const NAME: &str = "novendor";

/// How unused vendored packages are reported.
#[derive(Debug, Clone, Default)]
pub struct NovendorOptions {
    /// Report repository groups instead of single packages.
    pub group: bool,
    /// Show full import paths instead of vendor-relative ones.
    pub full: bool,
    /// Project-relative package directories treated as used, together
    /// with everything they import.
    pub ignore: Vec<String>,
}

/// A vendored package, or repository group, that nothing uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedVendored {
    /// Import path including the vendor directory.
    pub full_path: String,
    /// Import path as written in import statements.
    pub vendor_path: String,
    /// Directory of the package or group.
    pub dir: PathBuf,
}

impl UnusedVendored {
    /// The path to show.
    #[must_use]
    pub fn display(&self, full: bool) -> &str {
        if full {
            &self.full_path
        } else {
            &self.vendor_path
        }
    }
}

#[derive(Debug)]
struct Vendored {
    full_path: String,
    dir: PathBuf,
}

impl Vendored {
    fn vendor_path(&self) -> &str {
        unvendored(&self.full_path)
    }

    /// Import path up to and including the last `vendor/`.
    fn vendor_root(&self) -> &str {
        let rel = self.vendor_path();
        &self.full_path[..self.full_path.len() - rel.len()]
    }
}

/// The repository a vendored package belongs to: two path elements for
/// `gopkg.in`, three for other hosts with a dot in their name, the full
/// path otherwise.
#[must_use]
pub fn repository_group(vendor_path: &str) -> &str {
    let parts: Vec<&str> = vendor_path.split('/').collect();
    let keep = match parts.first() {
        Some(&"gopkg.in") => 2,
        Some(host) if host.contains('.') => 3,
        _ => parts.len(),
    };
    if parts.len() <= keep {
        return vendor_path;
    }
    let len = parts[..keep].iter().map(|p| p.len()).sum::<usize>() + keep - 1;
    &vendor_path[..len]
}

/// Finds vendored packages of `project` that no project package uses.
///
/// # Errors
///
/// Returns [`GoError::ProjectDir`] for an ignore entry that is not a
/// directory, and propagates graph build errors.
pub fn find_unused(
    project: &GoProject,
    options: &NovendorOptions,
) -> Result<Vec<UnusedVendored>, GoError> {
    let project = project.clone().with_context(BuildContext::all_tags());

    let mut seeds = Vec::new();
    for entry in &options.ignore {
        let dir = project.dir.join(entry);
        if !dir.is_dir() {
            return Err(GoError::ProjectDir(dir));
        }
        seeds.push(std::fs::canonicalize(&dir).map_err(|e| GoError::io(&dir, e))?);
    }

    let graph = seeds
        .iter()
        .fold(project.builder(), |builder, seed| builder.seed(seed.clone()))
        .build(&project.dir)?;
    let used = used_packages(&graph, &project, &seeds);

    let vendored = vendored_packages(&project)?;
    info!(
        "{} vendored packages, {} packages used",
        vendored.len(),
        used.len()
    );

    let mut unused = if options.group {
        unused_groups(&vendored, &used)
    } else {
        vendored
            .iter()
            .filter(|v| !used.contains(&v.full_path))
            .map(|v| UnusedVendored {
                full_path: v.full_path.clone(),
                vendor_path: v.vendor_path().to_string(),
                dir: v.dir.clone(),
            })
            .collect()
    };
    unused.sort_by(|a, b| a.full_path.cmp(&b.full_path));
    Ok(unused)
}

fn used_packages(graph: &DependencyGraph, project: &GoProject, seeds: &[PathBuf]) -> BTreeSet<String> {
    let mut roots: Vec<String> = graph.project_nodes().map(|n| n.path.clone()).collect();
    roots.extend(seeds.iter().filter_map(|s| project.roots.import_path_of(s)));

    let mut used = BTreeSet::new();
    for path in roots {
        used.extend(graph.transitive_references_of(&path));
        used.insert(path);
    }
    used
}

fn unused_groups(vendored: &[Vendored], used: &BTreeSet<String>) -> Vec<UnusedVendored> {
    // (vendor root, group) -> (group dir, any member used)
    let mut groups: BTreeMap<(&str, &str), (PathBuf, bool)> = BTreeMap::new();
    for pkg in vendored {
        let group = repository_group(pkg.vendor_path());
        let entry = groups
            .entry((pkg.vendor_root(), group))
            .or_insert_with(|| (group_dir(pkg, group), false));
        entry.1 |= used.contains(&pkg.full_path);
    }

    groups
        .into_iter()
        .filter(|(_, (_, used))| !used)
        .map(|((root, group), (dir, _))| UnusedVendored {
            full_path: format!("{root}{group}"),
            vendor_path: group.to_string(),
            dir,
        })
        .collect()
}

fn group_dir(pkg: &Vendored, group: &str) -> PathBuf {
    let extra = pkg.vendor_path()[group.len()..]
        .split('/')
        .filter(|p| !p.is_empty())
        .count();
    pkg.dir
        .ancestors()
        .nth(extra)
        .map_or_else(|| pkg.dir.clone(), Path::to_path_buf)
}

/// Directories below a `vendor` directory of the project that hold `.go`
/// files, hidden directories excluded.
fn vendored_packages(project: &GoProject) -> Result<Vec<Vendored>, GoError> {
    let walker = WalkDir::new(&project.dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map_or_else(|| project.dir.clone(), Path::to_path_buf);
            GoError::io(path, e.into())
        })?;
        if !entry.file_type().is_dir() || entry.file_name() == "vendor" {
            continue;
        }
        let in_vendor = entry
            .path()
            .strip_prefix(&project.dir)
            .is_ok_and(|rel| rel.components().any(|c| c.as_os_str() == "vendor"));
        if !in_vendor || go_files(entry.path())?.is_empty() {
            continue;
        }
        if let Some(full_path) = project.roots.import_path_of(entry.path()) {
            debug!("Vendored package {}", full_path);
            found.push(Vendored {
                full_path,
                dir: entry.path().to_path_buf(),
            });
        }
    }
    Ok(found)
}

/// Check that reports unused vendored packages.
#[derive(Debug, Default)]
pub struct Novendor;

impl Novendor {
    /// Creates the check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for Novendor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Vendored packages must be used by the project"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_project(&self, ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
        let project = GoProject::from_context(ctx).map_err(|e| CheckError::analysis(NAME, e))?;
        let options = ctx.check_config(NAME).map_or_else(
            || NovendorOptions {
                group: true,
                ..NovendorOptions::default()
            },
            |c| NovendorOptions {
                group: c.get_bool("group", true),
                full: c.get_bool("full", false),
                ignore: c.get_str_array("ignore"),
            },
        );

        let unused = find_unused(&project, &options).map_err(|e| CheckError::analysis(NAME, e))?;
        Ok(unused
            .iter()
            .map(|u| {
                Violation::new(
                    CODE,
                    NAME,
                    self.default_severity(),
                    Location::path_only(project.relative(&u.dir)),
                    format!("vendored package {} is not used", u.display(options.full)),
                )
            })
            .collect())
    }
}
