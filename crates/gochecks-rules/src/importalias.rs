//! GC003: a package should be imported under the same alias everywhere
//! in the project.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use gochecks_core::{Check, CheckError, Location, ProjectContext, Severity, Suggestion, Violation};
use gochecks_go::roots::slash_path;
use gochecks_go::{GoError, GoExtractor, GoProject};
use tracing::debug;

use crate::project_go_files;

/// Check code.
pub const CODE: &str = "GC003";
/// Check name.
pub const NAME: &str = "importalias";

/// One aliased import.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AliasUse {
    /// File path relative to the project, `/`-separated.
    pub file: String,
    /// Line of the import spec.
    pub line: usize,
    /// Column of the import spec.
    pub column: usize,
}

impl std::fmt::Display for AliasUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// An aliased import that does not match the rest of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMismatch {
    /// Where the alias is used.
    pub site: AliasUse,
    /// Imported package.
    pub package: String,
    /// The alias used here.
    pub alias: String,
    /// The alias to use instead, when one is more common than all others.
    pub recommended: Option<String>,
    /// Description of the problem.
    pub message: String,
}

/// Aliases used for each imported package, with their uses.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    packages: BTreeMap<String, BTreeMap<String, Vec<AliasUse>>>,
}

impl AliasIndex {
    /// Records a use of `alias` for `package`. Blank and dot imports are
    /// not aliases and are ignored.
    pub fn record(&mut self, package: &str, alias: &str, site: AliasUse) {
        if alias == "_" || alias == "." {
            return;
        }
        self.packages
            .entry(package.to_string())
            .or_default()
            .entry(alias.to_string())
            .or_default()
            .push(site);
    }

    /// Packages imported under more than one alias, ordered by path.
    pub fn inconsistent(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vec<AliasUse>>)> {
        self.packages
            .iter()
            .filter(|(_, aliases)| aliases.len() > 1)
            .map(|(pkg, aliases)| (pkg.as_str(), aliases))
    }

    /// Every aliased import that disagrees with the project, sorted by
    /// position.
    #[must_use]
    pub fn mismatches(&self) -> Vec<AliasMismatch> {
        let mut found = Vec::new();
        for (package, aliases) in self.inconsistent() {
            let max = aliases.values().map(Vec::len).max().unwrap_or(0);
            let top: Vec<&str> = aliases
                .iter()
                .filter(|(_, uses)| uses.len() == max)
                .map(|(alias, _)| alias.as_str())
                .collect();

            for (alias, uses) in aliases {
                let (recommended, message) = match top.as_slice() {
                    [only] if *only == alias.as_str() => continue,
                    [only] => (
                        Some((*only).to_string()),
                        format!(
                            "uses alias \"{alias}\" to import package \"{package}\". Use alias \"{only}\" instead."
                        ),
                    ),
                    tied => (
                        None,
                        format!(
                            "uses alias \"{alias}\" to import package \"{package}\". No consensus alias exists for this import in the project ({}).",
                            describe_tie(tied, max)
                        ),
                    ),
                };
                for site in uses {
                    found.push(AliasMismatch {
                        site: site.clone(),
                        package: package.to_string(),
                        alias: alias.clone(),
                        recommended: recommended.clone(),
                        message: message.clone(),
                    });
                }
            }
        }
        found.sort_by(|a, b| a.site.cmp(&b.site));
        found
    }

    /// Per-package listing of the aliases in use, most used first.
    #[must_use]
    pub fn verbose(&self) -> String {
        let mut out = String::new();
        for (package, aliases) in self.inconsistent() {
            let _ = writeln!(out, "\"{package}\" is imported using multiple different aliases:");
            let mut ordered: Vec<(&String, &Vec<AliasUse>)> = aliases.iter().collect();
            ordered.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));
            for (alias, uses) in ordered {
                let noun = if uses.len() == 1 { "file" } else { "files" };
                let _ = writeln!(out, "\t{alias} ({} {noun}):", uses.len());
                let mut uses = uses.clone();
                uses.sort();
                for site in uses {
                    let _ = writeln!(out, "\t\t{site}");
                }
            }
        }
        out
    }
}

fn times(n: usize) -> String {
    match n {
        1 => "once".to_string(),
        2 => "twice".to_string(),
        n => format!("{n} times"),
    }
}

fn describe_tie(aliases: &[&str], count: usize) -> String {
    let quoted: Vec<String> = aliases.iter().map(|a| format!("\"{a}\"")).collect();
    match quoted.as_slice() {
        [a, b] => format!("{a} and {b} are both used {} each", times(count)),
        [init @ .., last] => format!(
            "{} and {last} are all used {} each",
            init.join(", "),
            times(count)
        ),
        [] => String::new(),
    }
}

/// Collects the aliased imports of the project's package directories, or
/// of the given project-relative packages.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed.
pub fn collect_aliases(project: &GoProject, packages: &[String]) -> Result<AliasIndex, GoError> {
    let extractor = GoExtractor::new();
    let mut index = AliasIndex::default();
    let files = project_go_files(project, packages)?;
    debug!("Collecting import aliases from {} files", files.len());

    for file in files {
        let source = std::fs::read_to_string(&file).map_err(|e| GoError::io(&file, e))?;
        let parsed = extractor.analyze(&file, &source)?;
        let rel = slash_path(&project.relative(&file))
            .unwrap_or_else(|| file.to_string_lossy().into_owned());
        for spec in parsed.imports {
            if let Some(alias) = &spec.alias {
                index.record(
                    &spec.path,
                    alias,
                    AliasUse {
                        file: rel.clone(),
                        line: spec.spec_line,
                        column: spec.spec_column,
                    },
                );
            }
        }
    }
    Ok(index)
}

/// Check that reports inconsistent import aliases.
#[derive(Debug, Default)]
pub struct ImportAlias;

impl ImportAlias {
    /// Creates the check.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Check for ImportAlias {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "A package must be imported under the same alias throughout the project"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_project(&self, ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
        let project = GoProject::from_context(ctx).map_err(|e| CheckError::analysis(NAME, e))?;
        let index =
            collect_aliases(&project, &ctx.packages).map_err(|e| CheckError::analysis(NAME, e))?;

        Ok(index
            .mismatches()
            .into_iter()
            .map(|m| {
                let violation = Violation::new(
                    CODE,
                    NAME,
                    self.default_severity(),
                    Location::new(m.site.file.into(), m.site.line, m.site.column),
                    m.message,
                );
                match m.recommended {
                    Some(alias) => {
                        violation.with_suggestion(Suggestion::new(format!("import as `{alias}`")))
                    }
                    None => violation,
                }
            })
            .collect())
    }
}
