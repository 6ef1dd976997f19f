//! GC005 `gogenerate`: runs the configured code generators and reports
//! generated output that no longer matches what is checked in.
//!
//! Generators are declared in `gochecks.toml`:
//!
//! ```toml
//! [checks.gogenerate.generators.foo]
//! dir = "gen"                      # where `go generate` runs
//! paths = ["gen/output.txt"]       # generated files or directories
//! names = ["*_string.go"]          # generated file names under `dir`
//! environment = { GOOS = "darwin" }
//! ```
//!
//! In verify mode every generated path is snapshotted (file checksums and
//! directory entries) before and after the generator runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use gochecks_core::{
    Check, CheckConfig, CheckError, Location, ProjectContext, Severity, Suggestion, Violation,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Check code.
pub const CODE: &str = "GC005";
/// Check name, also the `[checks.*]` key of its configuration.
pub const NAME: &str = "gogenerate";

/// One code generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Generator {
    /// Directory the generator runs in, relative to the project.
    pub dir: PathBuf,
    /// Generated files or directories, relative to the project.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    /// Globs of generated file names anywhere below `dir`.
    #[serde(default)]
    pub names: Vec<String>,
    /// Environment overrides for the generator process.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Command line replacing `go generate`.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

/// Generators by name, run in name order.
pub type Generators = BTreeMap<String, Generator>;

/// Reads the `generators` table of the check's configuration.
///
/// # Errors
///
/// Returns [`CheckError::Option`] when the table does not match
/// [`Generator`].
pub fn generators_from(config: &CheckConfig) -> Result<Generators, CheckError> {
    let Some(value) = config.options.get("generators") else {
        return Ok(Generators::new());
    };
    value
        .clone()
        .try_into::<Generators>()
        .map_err(|e: toml::de::Error| CheckError::Option {
            check: NAME,
            message: e.to_string(),
        })
}

/// Errors running generators.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A generated path could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A generator name pattern is not a valid glob.
    #[error("generator {generator}: {source}")]
    Pattern {
        /// Generator name.
        generator: String,
        /// Underlying error.
        #[source]
        source: glob::PatternError,
    },

    /// The generator command is empty.
    #[error("generator {0} has an empty command")]
    EmptyCommand(String),

    /// The generator process could not be started.
    #[error("generator {generator}: failed to run {program}: {source}")]
    Spawn {
        /// Generator name.
        generator: String,
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The generator exited unsuccessfully.
    #[error("generator {generator} failed ({status}): {stderr}")]
    Failed {
        /// Generator name.
        generator: String,
        /// Exit status.
        status: std::process::ExitStatus,
        /// Captured standard error.
        stderr: String,
    },
}

/// How a generated path changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The path appeared.
    Created,
    /// The path disappeared.
    Removed,
    /// A file became a directory.
    FileToDir,
    /// A directory became a file.
    DirToFile,
    /// File content changed.
    Modified {
        /// SHA-256 before the run.
        before: String,
        /// SHA-256 after the run.
        after: String,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("did not exist before, now exists"),
            Self::Removed => f.write_str("existed before, no longer exists"),
            Self::FileToDir => f.write_str("was previously a file, is now a directory"),
            Self::DirToFile => f.write_str("was previously a directory, is now a file"),
            Self::Modified { before, after } => write!(
                f,
                "previously had checksum {before}, now has checksum {after}"
            ),
        }
    }
}

/// A changed path, relative to the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    /// Changed path.
    pub path: PathBuf,
    /// What happened to it.
    pub change: Change,
}

/// Changes one generator made to its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// Generator name.
    pub generator: String,
    /// Changed paths, sorted.
    pub changes: Vec<PathChange>,
}

/// Every drifted generator of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport(pub Vec<Drift>);

impl DriftReport {
    /// Returns true if no generator changed its output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|d| d.generator.as_str()).collect();
        write!(
            f,
            "Generators produced output that differed from what already exists: [{}]",
            names.join(" ")
        )?;
        for drift in &self.0 {
            write!(f, "\n  {}:", drift.generator)?;
            for change in &drift.changes {
                write!(f, "\n    {}: {}", change.path.display(), change.change)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    File(String),
    Dir,
}

type Snapshot = BTreeMap<PathBuf, Entry>;

/// Runs every generator in `root`. With `verify`, returns the generators
/// whose output differs from what existed before the run.
///
/// # Errors
///
/// Fails on the first generator that cannot run or exits unsuccessfully,
/// and when generated paths cannot be read.
pub fn run(
    root: &Path,
    generators: &Generators,
    verify: bool,
) -> Result<DriftReport, GenerateError> {
    let mut report = DriftReport::default();
    for (name, generator) in generators {
        let before = if verify {
            Some(snapshot(root, name, generator)?)
        } else {
            None
        };

        run_generator(root, name, generator)?;

        if let Some(before) = before {
            let changes = diff(&before, &snapshot(root, name, generator)?);
            if !changes.is_empty() {
                debug!("Generator {} changed {} paths", name, changes.len());
                report.0.push(Drift {
                    generator: name.clone(),
                    changes,
                });
            }
        }
    }
    Ok(report)
}

fn run_generator(root: &Path, name: &str, generator: &Generator) -> Result<(), GenerateError> {
    let go_generate = ["go".to_string(), "generate".to_string()];
    let argv = generator.command.as_deref().unwrap_or(&go_generate);
    let Some((program, args)) = argv.split_first() else {
        return Err(GenerateError::EmptyCommand(name.to_string()));
    };

    let dir = root.join(&generator.dir);
    info!("Running generator {} in {}", name, dir.display());
    let output = Command::new(program)
        .args(args)
        .current_dir(&dir)
        .envs(&generator.environment)
        .output()
        .map_err(|source| GenerateError::Spawn {
            generator: name.to_string(),
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(GenerateError::Failed {
            generator: name.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn snapshot(root: &Path, name: &str, generator: &Generator) -> Result<Snapshot, GenerateError> {
    let mut entries = Snapshot::new();
    for path in &generator.paths {
        record(root, &root.join(path), &mut entries)?;
    }

    if generator.names.is_empty() {
        return Ok(entries);
    }
    let patterns = generator
        .names
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| GenerateError::Pattern {
            generator: name.to_string(),
            source,
        })?;
    let dir = root.join(&generator.dir);
    for entry in WalkDir::new(&dir).into_iter().filter_map(Result::ok) {
        let file_name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && patterns.iter().any(|p| p.matches(&file_name)) {
            record(root, entry.path(), &mut entries)?;
        }
    }
    Ok(entries)
}

/// Records `path` and, for a directory, everything below it.
fn record(root: &Path, path: &Path, entries: &mut Snapshot) -> Result<(), GenerateError> {
    let io = |source: std::io::Error| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io(e)),
    };
    let rel = |p: &Path| p.strip_prefix(root).unwrap_or(p).to_path_buf();

    if !meta.is_dir() {
        entries.insert(rel(path), Entry::File(checksum(path)?));
        return Ok(());
    }
    entries.insert(rel(path), Entry::Dir);
    for entry in WalkDir::new(path).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| io(e.into()))?;
        let value = if entry.file_type().is_dir() {
            Entry::Dir
        } else {
            Entry::File(checksum(entry.path())?)
        };
        entries.insert(rel(entry.path()), value);
    }
    Ok(())
}

fn checksum(path: &Path) -> Result<String, GenerateError> {
    let content = std::fs::read(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}

fn diff(before: &Snapshot, after: &Snapshot) -> Vec<PathChange> {
    let paths: BTreeSet<&PathBuf> = before.keys().chain(after.keys()).collect();
    paths
        .into_iter()
        .filter_map(|path| {
            let change = match (before.get(path), after.get(path)) {
                (None, Some(_)) => Change::Created,
                (Some(_), None) => Change::Removed,
                (Some(Entry::File(_)), Some(Entry::Dir)) => Change::FileToDir,
                (Some(Entry::Dir), Some(Entry::File(_))) => Change::DirToFile,
                (Some(Entry::File(a)), Some(Entry::File(b))) if a != b => Change::Modified {
                    before: a.clone(),
                    after: b.clone(),
                },
                _ => return None,
            };
            Some(PathChange {
                path: path.clone(),
                change,
            })
        })
        .collect()
}

/// Check that fails when a generator's output drifts from the checked-in
/// files.
///
/// Runs nothing unless `[checks.gogenerate.generators]` is configured.
#[derive(Debug, Default)]
pub struct GoGenerate;

impl GoGenerate {
    /// Creates the check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for GoGenerate {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires generated code to match its generators"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check_project(&self, ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
        let generators = match ctx.check_config(NAME) {
            Some(config) => generators_from(config)?,
            None => Generators::new(),
        };
        if generators.is_empty() {
            return Ok(Vec::new());
        }

        let report = run(ctx.root, &generators, true).map_err(|e| CheckError::analysis(NAME, e))?;
        let violations = report
            .0
            .iter()
            .flat_map(|drift| {
                drift.changes.iter().map(move |change| {
                    Violation::new(
                        CODE,
                        NAME,
                        self.default_severity(),
                        Location::path_only(change.path.clone()),
                        format!(
                            "{}: {} (generator {})",
                            change.path.display(),
                            change.change,
                            drift.generator
                        ),
                    )
                    .with_suggestion(Suggestion::new(format!(
                        "run `gochecks gogenerate` and commit the output of {}",
                        drift.generator
                    )))
                })
            })
            .collect();
        Ok(violations)
    }
}
