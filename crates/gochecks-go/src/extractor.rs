//! Go source extraction using Tree-sitter.
//!
//! Pulls the package clause and import specs out of a Go file. Positions
//! are reported 1-indexed, with columns counted in bytes as the Go
//! toolchain does.

use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::GoError;

/// The `package` clause of a Go file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageClause {
    /// Declared package name.
    pub name: String,
    /// Line of the clause (1-indexed).
    pub line: usize,
    /// Byte offset where the clause starts.
    pub start_byte: usize,
}

/// A single import spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Unquoted import path as written.
    pub path: String,
    /// Explicit package name (`foo`, `_` or `.`), if any.
    pub alias: Option<String>,
    /// Line of the path literal (1-indexed).
    pub line: usize,
    /// Column of the path literal (1-indexed).
    pub column: usize,
    /// Line where the spec starts (1-indexed).
    pub spec_line: usize,
    /// Column where the spec starts, i.e. the alias when present.
    pub spec_column: usize,
}

impl ImportSpec {
    /// Builds an import spec from an `import_spec` node.
    #[must_use]
    pub fn from_node(node: &Node<'_>, src: &[u8]) -> Option<Self> {
        let path_node = node.child_by_field_name("path")?;
        let alias = node
            .child_by_field_name("name")
            .map(|n| text(&n, src).to_owned());
        let path_pos = path_node.start_position();
        let spec_pos = node.start_position();
        Some(Self {
            path: unquote(text(&path_node, src)),
            alias,
            line: path_pos.row + 1,
            column: path_pos.column + 1,
            spec_line: spec_pos.row + 1,
            spec_column: spec_pos.column + 1,
        })
    }
}

/// Package clause and imports of a parsed Go file.
#[derive(Debug, Clone)]
pub struct GoFile {
    /// Package clause.
    pub package: PackageClause,
    /// Import specs in source order.
    pub imports: Vec<ImportSpec>,
}

/// Extracts package clauses and imports from Go source.
pub struct GoExtractor {
    language: Language,
}

impl GoExtractor {
    /// Creates a new Go extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Parses `source` into a syntax tree, failing on any syntax error.
    ///
    /// # Errors
    ///
    /// Returns [`GoError::Parse`] with the position of the first syntax error.
    pub fn parse(&self, path: &Path, source: &str) -> Result<Tree, GoError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;

        let tree = parser
            .parse(source.as_bytes(), None)
            .ok_or_else(|| GoError::Parse {
                path: path.to_path_buf(),
                line: 1,
                column: 1,
                message: "parser produced no syntax tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let node = first_error(root).unwrap_or(root);
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("expected {}", node.kind())
            } else {
                "syntax error".to_string()
            };
            return Err(GoError::Parse {
                path: path.to_path_buf(),
                line: pos.row + 1,
                column: pos.column + 1,
                message,
            });
        }

        Ok(tree)
    }

    /// Parses a Go file and extracts its package clause and imports.
    ///
    /// # Errors
    ///
    /// Returns [`GoError::Parse`] on syntax errors or a missing package clause.
    pub fn analyze(&self, path: &Path, source: &str) -> Result<GoFile, GoError> {
        let tree = self.parse(path, source)?;
        let root = tree.root_node();
        let src = source.as_bytes();

        let mut package = None;
        let mut imports = Vec::new();

        let mut cursor = root.walk();
        for node in root.children(&mut cursor) {
            match node.kind() {
                "package_clause" => package = package_clause(&node, src),
                "import_declaration" => imports.extend(import_specs(&node, src)),
                _ => {}
            }
        }

        let package = package.ok_or_else(|| GoError::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            message: "expected 'package'".to_string(),
        })?;

        Ok(GoFile { package, imports })
    }
}

impl Default for GoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the source text covered by `node`.
#[must_use]
pub fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

/// Returns the import specs of an `import_declaration` node in source order.
#[must_use]
pub fn import_specs(decl: &Node<'_>, src: &[u8]) -> Vec<ImportSpec> {
    let mut specs = Vec::new();
    let mut cursor = decl.walk();
    for child in decl.children(&mut cursor) {
        match child.kind() {
            "import_spec" => specs.extend(ImportSpec::from_node(&child, src)),
            "import_spec_list" => {
                let mut list_cursor = child.walk();
                for spec in child.children(&mut list_cursor) {
                    if spec.kind() == "import_spec" {
                        specs.extend(ImportSpec::from_node(&spec, src));
                    }
                }
            }
            _ => {}
        }
    }
    specs
}

fn package_clause(node: &Node<'_>, src: &[u8]) -> Option<PackageClause> {
    let mut cursor = node.walk();
    let name = node
        .children(&mut cursor)
        .find(|c| c.kind() == "package_identifier")?;
    Some(PackageClause {
        name: text(&name, src).to_owned(),
        line: node.start_position().row + 1,
        start_byte: node.start_byte(),
    })
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

/// Strips the quotes from an interpreted or raw string literal.
fn unquote(literal: &str) -> String {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
    {
        return raw.to_string();
    }
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('t') => out.push('\t'),
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
