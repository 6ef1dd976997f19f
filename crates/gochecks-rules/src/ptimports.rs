//! GC004: imports must be merged into one block grouped as standard
//! library, third party, then project-local packages.
//!
//! `import "C"` declarations are left untouched together with their doc
//! comments (the comment is the cgo preamble); the merged block is placed
//! after the last of them.

use std::path::Path;

use gochecks_core::{Check, CheckError, Location, ProjectContext, Severity, Suggestion, Violation};
use gochecks_go::extractor::text;
use gochecks_go::{GoError, GoExtractor, GoProject};
use tracing::debug;
use tree_sitter::Node;

use crate::project_go_files;

/// Check code.
pub const CODE: &str = "GC004";
/// Check name.
pub const NAME: &str = "ptimports";

/// Assigns imports to their group.
#[derive(Debug, Clone, Default)]
pub struct ImportGrouper {
    local_prefix: Option<String>,
}

impl ImportGrouper {
    /// Creates a grouper. Imports matching `local_prefix` form the last group.
    #[must_use]
    pub fn new(local_prefix: Option<&str>) -> Self {
        Self {
            local_prefix: local_prefix.filter(|p| !p.is_empty()).map(String::from),
        }
    }

    /// Group index: 0 for the standard library, 1 for third-party
    /// packages, 2 for project-local packages.
    #[must_use]
    pub fn import_group(&self, path: &str) -> usize {
        if let Some(prefix) = &self.local_prefix {
            if path.starts_with(prefix.as_str()) || path == prefix.trim_end_matches('/') {
                return 2;
            }
        }
        let first = path.split('/').next().unwrap_or(path);
        usize::from(first.contains('.'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Spec {
    path: String,
    alias: Option<String>,
    literal: String,
    comment: Option<String>,
    leading: Vec<String>,
}

impl Spec {
    fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.leading {
            out.push('\t');
            out.push_str(line);
            out.push('\n');
        }
        out.push('\t');
        if let Some(alias) = &self.alias {
            out.push_str(alias);
            out.push(' ');
        }
        out.push_str(&self.literal);
        if let Some(comment) = &self.comment {
            out.push(' ');
            out.push_str(comment);
        }
        out
    }
}

#[derive(Debug)]
struct Decl {
    /// Byte range of the declaration text.
    start: usize,
    end: usize,
    /// Byte range removed when the declaration is merged.
    remove_start: usize,
    remove_end: usize,
    line: usize,
    cgo: bool,
    specs: Vec<Spec>,
    dangling: Vec<String>,
}

enum Edit {
    Insert(usize),
    Remove(usize, usize),
}

impl Edit {
    fn sort_key(&self) -> (usize, u8) {
        match self {
            Self::Insert(at) => (*at, 0),
            Self::Remove(start, _) => (*start, 1),
        }
    }
}

/// Rewrites `source` so that all non-cgo imports form one grouped block.
///
/// Returns the source unchanged when it has no such imports.
///
/// # Errors
///
/// Returns [`GoError::Parse`] if the source does not parse.
pub fn group_imports(path: &Path, source: &str, grouper: &ImportGrouper) -> Result<String, GoError> {
    let decls = import_decls(path, source)?;
    let merged: Vec<&Decl> = decls.iter().filter(|d| !d.cgo).collect();
    let Some(first) = merged.first() else {
        return Ok(source.to_string());
    };

    let block = render_block(merged.iter().flat_map(|d| d.spec_iter()), grouper);
    let insert_at = decls
        .iter()
        .rev()
        .find(|d| d.cgo)
        .map_or(first.remove_start, |cgo| line_end(source, cgo.end));

    let mut edits: Vec<Edit> = merged
        .iter()
        .map(|d| Edit::Remove(d.remove_start, d.remove_end))
        .collect();
    edits.push(Edit::Insert(insert_at));
    edits.sort_by_key(Edit::sort_key);

    let mut out = String::with_capacity(source.len() + block.len());
    let mut cursor = 0;
    let mut at_edit = false;
    let mut after_block = false;
    for edit in edits {
        let (pos, next) = match edit {
            Edit::Insert(at) => (at, at),
            Edit::Remove(start, end) => (start, end),
        };
        if pos > cursor {
            push_segment(&mut out, &source[cursor..pos], at_edit, &mut after_block);
        }
        if let Edit::Insert(_) = edit {
            ensure_blank_line(&mut out);
            out.push_str(&block);
            out.push('\n');
            after_block = true;
        }
        cursor = cursor.max(next);
        at_edit = true;
    }
    push_segment(&mut out, &source[cursor..], at_edit, &mut after_block);

    Ok(out)
}

/// Reports whether the imports of `source` are already grouped.
///
/// # Errors
///
/// Returns [`GoError::Parse`] if the source does not parse.
pub fn is_grouped(path: &Path, source: &str, grouper: &ImportGrouper) -> Result<bool, GoError> {
    let decls = import_decls(path, source)?;
    let merged: Vec<&Decl> = decls.iter().filter(|d| !d.cgo).collect();
    match merged.as_slice() {
        [] => Ok(true),
        [decl] => {
            let after_cgo = decls.iter().filter(|d| d.cgo).all(|c| c.end <= decl.start);
            let rendered = render_block(decl.spec_iter(), grouper);
            Ok(after_cgo && source[decl.start..decl.end] == rendered)
        }
        _ => Ok(false),
    }
}

/// Line of the first non-cgo import declaration, if any.
///
/// # Errors
///
/// Returns [`GoError::Parse`] if the source does not parse.
pub fn first_import_line(path: &Path, source: &str) -> Result<Option<usize>, GoError> {
    Ok(import_decls(path, source)?
        .iter()
        .find(|d| !d.cgo)
        .map(|d| d.line))
}

impl Decl {
    fn spec_iter(&self) -> impl Iterator<Item = Spec> + '_ {
        let dangling = (!self.dangling.is_empty()).then(|| self.dangling.clone());
        self.specs.iter().cloned().enumerate().map(move |(i, mut spec)| {
            if i + 1 == self.specs.len() {
                if let Some(lines) = &dangling {
                    let joined = lines.join(" ");
                    spec.comment = Some(match spec.comment.take() {
                        Some(comment) => format!("{comment} {joined}"),
                        None => joined,
                    });
                }
            }
            spec
        })
    }
}

fn render_block(specs: impl Iterator<Item = Spec>, grouper: &ImportGrouper) -> String {
    let mut groups: [Vec<Spec>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for spec in specs {
        let group = &mut groups[grouper.import_group(&spec.path).min(2)];
        let duplicate = group
            .iter()
            .any(|s| s.path == spec.path && s.alias == spec.alias);
        if !duplicate {
            group.push(spec);
        }
    }

    let mut out = String::from("import (\n");
    let mut first = true;
    for group in &mut groups {
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| a.path.cmp(&b.path).then(a.alias.cmp(&b.alias)));
        if !first {
            out.push('\n');
        }
        first = false;
        for spec in group.iter() {
            out.push_str(&spec.render());
            out.push('\n');
        }
    }
    out.push(')');
    out
}

fn import_decls(path: &Path, source: &str) -> Result<Vec<Decl>, GoError> {
    let tree = GoExtractor::new().parse(path, source)?;
    let root = tree.root_node();
    let src = source.as_bytes();

    let mut decls = Vec::new();
    let mut cursor = root.walk();
    for node in root.children(&mut cursor) {
        if node.kind() == "import_declaration" {
            decls.push(decl_from_node(&node, source, src));
        }
    }
    Ok(decls)
}

fn decl_from_node(node: &Node<'_>, source: &str, src: &[u8]) -> Decl {
    let mut specs = Vec::new();
    let mut dangling = Vec::new();
    let mut end = node.end_byte();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_spec" => specs.extend(spec_from_node(&child, src, Vec::new())),
            "import_spec_list" => {
                let (list_specs, rest) = list_specs(&child, src);
                specs.extend(list_specs);
                dangling = rest;
            }
            _ => {}
        }
    }

    // A line comment right after a single-spec declaration belongs to it.
    if let Some(next) = node.next_named_sibling() {
        if next.kind() == "comment" && next.start_position().row == node.end_position().row {
            if let Some(spec) = specs.last_mut() {
                spec.comment = Some(text(&next, src).to_string());
                end = next.end_byte();
            }
        }
    }

    let cgo = specs.len() == 1 && specs[0].path == "C";
    let start = node.start_byte();
    Decl {
        start,
        end: node.end_byte(),
        remove_start: line_start_if_blank(source, start),
        remove_end: line_end_if_blank(source, end),
        line: node.start_position().row + 1,
        cgo,
        specs,
        dangling,
    }
}

fn list_specs(list: &Node<'_>, src: &[u8]) -> (Vec<Spec>, Vec<String>) {
    let mut specs: Vec<Spec> = Vec::new();
    let mut pending = Vec::new();
    let mut last_row = None;

    let mut cursor = list.walk();
    for child in list.children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                if let Some(spec) = spec_from_node(&child, src, std::mem::take(&mut pending)) {
                    specs.push(spec);
                    last_row = Some(child.end_position().row);
                }
            }
            "comment" => {
                let comment = text(&child, src).to_string();
                match specs.last_mut() {
                    Some(spec)
                        if last_row == Some(child.start_position().row)
                            && spec.comment.is_none() =>
                    {
                        spec.comment = Some(comment);
                    }
                    _ => pending.push(comment),
                }
            }
            _ => {}
        }
    }
    (specs, pending)
}

fn spec_from_node(node: &Node<'_>, src: &[u8], leading: Vec<String>) -> Option<Spec> {
    let path_node = node.child_by_field_name("path")?;
    let literal = text(&path_node, src).to_string();
    let path = literal.trim_matches(|c| c == '"' || c == '`').to_string();
    Some(Spec {
        path,
        alias: node
            .child_by_field_name("name")
            .map(|n| text(&n, src).to_string()),
        literal,
        comment: None,
        leading,
    })
}

/// Start of the line holding `pos` when only whitespace precedes it.
fn line_start_if_blank(source: &str, pos: usize) -> usize {
    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    if source[line_start..pos].trim().is_empty() {
        line_start
    } else {
        pos
    }
}

/// Position after the newline ending the line at `pos` when only
/// whitespace or a `;` follows it.
fn line_end_if_blank(source: &str, pos: usize) -> usize {
    let rest = &source[pos..];
    let line_len = rest.find('\n').map_or(rest.len(), |i| i + 1);
    let tail = rest[..line_len].trim();
    if tail.is_empty() || tail == ";" {
        pos + line_len
    } else {
        pos
    }
}

/// Position after the newline ending the line at `pos`.
fn line_end(source: &str, pos: usize) -> usize {
    source[pos..]
        .find('\n')
        .map_or(source.len(), |i| pos + i + 1)
}

fn trailing_newlines(out: &str) -> usize {
    out.bytes().rev().take_while(|b| *b == b'\n').count()
}

fn ensure_blank_line(out: &mut String) {
    if out.is_empty() {
        return;
    }
    for _ in trailing_newlines(out)..2 {
        out.push('\n');
    }
}

/// Appends `segment`, collapsing blank lines left behind by removed
/// declarations to a single one.
fn push_segment(out: &mut String, segment: &str, at_edit: bool, after_block: &mut bool) {
    let mut segment = segment;
    if at_edit {
        let allowed = 2usize.saturating_sub(trailing_newlines(out).min(2));
        let leading = segment.bytes().take_while(|b| *b == b'\n').count();
        segment = &segment[leading.saturating_sub(allowed)..];
    }
    if segment.is_empty() {
        return;
    }
    if *after_block && !segment.starts_with('\n') {
        out.push('\n');
    }
    *after_block = false;
    out.push_str(segment);
}

/// Check that reports files whose imports are not grouped.
#[derive(Debug, Default)]
pub struct PtImports {
    local_prefix: Option<String>,
}

impl PtImports {
    /// Creates the check. The local prefix comes from configuration
    /// (`local_prefix`) unless set here.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project-local import prefix.
    #[must_use]
    pub fn with_local_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.local_prefix = Some(prefix.into());
        self
    }
}

impl Check for PtImports {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Imports must form one block grouped as std, third-party, project"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check_project(&self, ctx: &ProjectContext) -> Result<Vec<Violation>, CheckError> {
        let project = GoProject::from_context(ctx).map_err(|e| CheckError::analysis(NAME, e))?;
        let configured = ctx
            .check_config(NAME)
            .and_then(|c| c.get_str("local_prefix"))
            .map(String::from);
        let prefix = self
            .local_prefix
            .clone()
            .or(configured)
            .or_else(|| {
                project
                    .roots
                    .import_path_of(&project.dir)
                    .filter(|p| !p.is_empty())
                    .map(|p| format!("{p}/"))
            });
        let grouper = ImportGrouper::new(prefix.as_deref());

        let files =
            project_go_files(&project, &ctx.packages).map_err(|e| CheckError::analysis(NAME, e))?;
        debug!("Checking import grouping of {} files", files.len());

        let mut violations = Vec::new();
        for file in files {
            let source = std::fs::read_to_string(&file)?;
            let grouped =
                is_grouped(&file, &source, &grouper).map_err(|e| CheckError::analysis(NAME, e))?;
            if grouped {
                continue;
            }
            let line = first_import_line(&file, &source)
                .map_err(|e| CheckError::analysis(NAME, e))?
                .unwrap_or(1);
            violations.push(
                Violation::new(
                    CODE,
                    NAME,
                    self.default_severity(),
                    Location::new(project.relative(&file), line, 1),
                    "imports are not grouped",
                )
                .with_suggestion(Suggestion::new("run `gochecks ptimports --write` on this file")),
            );
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(src: &str) -> String {
        let grouper = ImportGrouper::new(Some("github.com/palantir/checks/"));
        group_imports(Path::new("test.go"), src, &grouper).expect("group")
    }

    #[test]
    fn import_group_assignment() {
        let grouper = ImportGrouper::new(Some("github.com/palantir/checks/"));
        for (path, expected) in [
            ("strings", 0),
            ("net/http", 0),
            ("github.com/stretchr/testify/assert", 1),
            ("github.com/palantir/pkg/pkgpath", 1),
            ("github.com/palantir/checks", 2),
            ("github.com/palantir/checks/ptimports", 2),
        ] {
            assert_eq!(grouper.import_group(path), expected, "{path}");
        }
    }

    #[test]
    fn groups_builtin_external_and_local() {
        let src = "package foo

import \"github.com/palantir/checks/ptimports/ptimports\"
import \"bytes\"
import \"golang.org/x/tools/imports\"

func Foo() {
	_ = bytes.Buffer{}
}
";
        let want = "package foo

import (
	\"bytes\"

	\"golang.org/x/tools/imports\"

	\"github.com/palantir/checks/ptimports/ptimports\"
)

func Foo() {
	_ = bytes.Buffer{}
}
";
        assert_eq!(group(src), want);
    }

    #[test]
    fn cgo_import_with_multi_line_preamble() {
        let src = "package foo

// import \"C\"

import \"unsafe\"
import \"io\"

/*
#include <stdio.h>
*/
import \"C\"
import \"archive/tar\"


func Example() {
	_ = io.Copy
}
";
        let want = "package foo

// import \"C\"

/*
#include <stdio.h>
*/
import \"C\"

import (
	\"archive/tar\"
	\"io\"
	\"unsafe\"
)

func Example() {
	_ = io.Copy
}
";
        assert_eq!(group(src), want);
    }

    #[test]
    fn cgo_imports_with_line_and_block_preambles() {
        let src = "package foo

// #include <stdio.h>
// #include <stdlib.h>
import \"C\"
import \"unsafe\"

/*
#include <stdio.h>
*/
import \"C\"

func Print(s string) {
}
";
        let want = "package foo

// #include <stdio.h>
// #include <stdlib.h>
import \"C\"

/*
#include <stdio.h>
*/
import \"C\"

import (
	\"unsafe\"
)

func Print(s string) {
}
";
        assert_eq!(group(src), want);
    }

    #[test]
    fn keeps_aliases_and_comments() {
        let src = "package foo

import (
	b \"github.com/org/bar\" // bar
	\"fmt\"
	_ \"net/http/pprof\"
)
";
        let want = "package foo

import (
	\"fmt\"
	_ \"net/http/pprof\"

	b \"github.com/org/bar\" // bar
)
";
        assert_eq!(group(src), want);
    }

    #[test]
    fn grouped_source_is_stable() {
        let src = "package foo

import (
	\"fmt\"

	\"github.com/palantir/checks/x\"
)
";
        let grouper = ImportGrouper::new(Some("github.com/palantir/checks/"));
        assert!(is_grouped(Path::new("x.go"), src, &grouper).expect("grouped"));
        assert_eq!(group(src), src);
    }

    #[test]
    fn ungrouped_source_is_detected() {
        let src = "package foo\n\nimport \"fmt\"\nimport \"os\"\n";
        let grouper = ImportGrouper::default();
        assert!(!is_grouped(Path::new("x.go"), src, &grouper).expect("grouped"));
        assert_eq!(
            first_import_line(Path::new("x.go"), src).expect("line"),
            Some(3)
        );
    }

    #[test]
    fn no_imports_is_unchanged() {
        let src = "package foo\n\nfunc f() {}\n";
        assert_eq!(group(src), src);
    }

    #[test]
    fn parse_error_is_reported() {
        let err = group_imports(
            Path::new("bad.go"),
            "package foo\nimport (\n",
            &ImportGrouper::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GoError::Parse { .. }));
    }
}
