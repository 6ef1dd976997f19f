//! Build constraints: `//go:build` expressions, `// +build` lines, and
//! `_GOOS_GOARCH` file name suffixes.

use std::collections::BTreeSet;

use crate::error::GoError;

/// Operating systems recognized in file name suffixes.
pub const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Architectures recognized in file name suffixes.
pub const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Highest `go1.N` release tag considered satisfied.
const GO_MINOR_RELEASE: u32 = 22;

/// The environment build constraints are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Target operating system.
    pub goos: String,
    /// Target architecture.
    pub goarch: String,
    /// Extra tags considered satisfied.
    pub tags: BTreeSet<String>,
    /// Whether the `cgo` tag is satisfied.
    pub cgo: bool,
    /// Treat every constraint, negations included, as satisfied.
    pub all_tags: bool,
}

impl BuildContext {
    /// Context for the host platform with cgo enabled.
    #[must_use]
    pub fn host() -> Self {
        Self {
            goos: host_goos().to_string(),
            goarch: host_goarch().to_string(),
            tags: BTreeSet::new(),
            cgo: true,
            all_tags: false,
        }
    }

    /// Context that includes every file regardless of its constraints.
    #[must_use]
    pub fn all_tags() -> Self {
        Self {
            all_tags: true,
            ..Self::host()
        }
    }

    /// Builds a context from the `[build]` configuration section.
    #[must_use]
    pub fn from_config(config: &gochecks_core::BuildConfig) -> Self {
        let host = Self::host();
        Self {
            goos: config.goos.clone().unwrap_or(host.goos),
            goarch: config.goarch.clone().unwrap_or(host.goarch),
            tags: config.tags.iter().cloned().collect(),
            cgo: config.cgo,
            all_tags: config.all_tags,
        }
    }

    /// Reports whether a single tag is satisfied.
    #[must_use]
    pub fn matches_tag(&self, tag: &str) -> bool {
        if self.all_tags {
            return true;
        }
        if !is_valid_tag(tag) {
            return false;
        }
        if self.tags.contains(tag) {
            return true;
        }
        match tag {
            "cgo" => self.cgo,
            "gc" => true,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" => self.goos == "linux" || self.goos == "android",
            "solaris" => self.goos == "solaris" || self.goos == "illumos",
            "darwin" => self.goos == "darwin" || self.goos == "ios",
            _ if tag == self.goos || tag == self.goarch => true,
            _ => release_minor(tag).is_some_and(|minor| minor <= GO_MINOR_RELEASE),
        }
    }

    /// Reports whether a constraint expression is satisfied.
    #[must_use]
    pub fn matches(&self, expr: &Expr) -> bool {
        self.all_tags || expr.eval(&|tag| self.matches_tag(tag))
    }

    /// Reports whether a file name's `_GOOS`, `_GOARCH` or
    /// `_GOOS_GOARCH` suffix matches this context.
    #[must_use]
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        if self.all_tags {
            return true;
        }
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        // The first element is never a constraint: "linux.go" builds everywhere.
        let Some((_, rest)) = stem.split_once('_') else {
            return true;
        };
        let parts: Vec<&str> = rest.split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        let last = parts[n - 1];
        if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
            return self.matches_tag(last);
        }
        true
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::host()
    }
}

fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

fn release_minor(tag: &str) -> Option<u32> {
    tag.strip_prefix("go1.")?.parse().ok()
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// A boolean build constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A single tag.
    Tag(String),
    /// Negation.
    Not(Box<Expr>),
    /// Conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluates the expression with `ok` deciding each tag.
    pub fn eval(&self, ok: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Tag(tag) => ok(tag),
            Self::Not(inner) => !inner.eval(ok),
            Self::And(a, b) => a.eval(ok) && b.eval(ok),
            Self::Or(a, b) => a.eval(ok) || b.eval(ok),
        }
    }

    fn and(a: Self, b: Self) -> Self {
        Self::And(Box::new(a), Box::new(b))
    }

    fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }
}

/// Parses the expression of a `//go:build` line (the text after the directive).
///
/// # Errors
///
/// Returns a description of the syntax error.
pub fn parse_go_build(expr: &str) -> Result<Expr, String> {
    let tokens = tokenize(expr)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let result = parser.or_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected token {:?}", parser.tokens[parser.pos]));
    }
    Ok(result)
}

/// Parses the options of a `// +build` line (the text after `+build`).
///
/// Space-separated options are OR'ed, comma-separated terms are AND'ed,
/// and `!` negates a term. Returns `None` for an empty line.
#[must_use]
pub fn parse_plus_build(line: &str) -> Option<Expr> {
    line.split_whitespace()
        .filter_map(|option| {
            option
                .split(',')
                .map(|term| match term.strip_prefix('!') {
                    Some(tag) => Expr::Not(Box::new(Expr::Tag(tag.to_string()))),
                    None => Expr::Tag(term.to_string()),
                })
                .reduce(Expr::and)
        })
        .reduce(Expr::or)
}

/// Extracts the build constraint from the header of a Go file: the
/// comments and blank lines before the package clause.
///
/// A `//go:build` line takes precedence. Otherwise all `// +build` lines
/// that are followed by a blank line are AND'ed together. Returns
/// `Ok(None)` for unconstrained files.
///
/// # Errors
///
/// Returns [`GoError::Constraint`] for a malformed `//go:build` line.
pub fn header_constraint(path: &std::path::Path, source: &str) -> Result<Option<Expr>, GoError> {
    let header = header_lines(source);

    let go_build = header
        .lines
        .iter()
        .find_map(|line| line.strip_prefix("//go:build"))
        .filter(|rest| rest.is_empty() || rest.starts_with([' ', '\t']));
    if let Some(expr) = go_build {
        return parse_go_build(expr)
            .map(Some)
            .map_err(|message| GoError::Constraint {
                path: path.to_path_buf(),
                message,
            });
    }

    let plus_build = header.lines[..header.last_blank]
        .iter()
        .filter_map(|line| {
            let rest = line.strip_prefix("//")?.trim_start();
            let options = rest.strip_prefix("+build")?;
            if !options.is_empty() && !options.starts_with([' ', '\t']) {
                return None;
            }
            // An empty +build line is never satisfied.
            Some(parse_plus_build(options).unwrap_or_else(|| Expr::Tag(String::new())))
        })
        .reduce(Expr::and);

    Ok(plus_build)
}

struct Header<'a> {
    /// Trimmed line comments and blank lines preceding the package clause.
    lines: Vec<&'a str>,
    /// Index one past the last blank line within `lines`.
    last_blank: usize,
}

fn header_lines(source: &str) -> Header<'_> {
    let mut lines = Vec::new();
    let mut last_blank = 0;
    let mut in_block = false;

    for raw in source.lines() {
        let line = raw.trim();
        if in_block {
            if let Some(idx) = line.find("*/") {
                in_block = false;
                if !line[idx + 2..].trim().is_empty() {
                    break;
                }
            }
            lines.push("");
            continue;
        }
        if line.is_empty() {
            lines.push(line);
            last_blank = lines.len();
        } else if line.starts_with("//") {
            lines.push(line);
        } else if let Some(rest) = line.strip_prefix("/*") {
            in_block = !rest.contains("*/");
            lines.push("");
        } else {
            break;
        }
    }

    // Lines inside block comments are kept as placeholders so that the
    // "followed by a blank line" rule only sees real blank lines.
    Header { lines, last_blank }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '!' => {
                chars.next();
                tokens.push(Token::Not);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return Err(format!("expected {c}{c}"));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            _ if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        tag.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Tag(tag));
            }
            _ => return Err(format!("invalid character {c:?}")),
        }
    }
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            left = Expr::or(left, self.and_expr()?);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.not_expr()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            left = Expr::and(left, self.not_expr()?);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Tag(tag)) => {
                self.pos += 1;
                Ok(Expr::Tag(tag))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.or_expr()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err("missing )".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
