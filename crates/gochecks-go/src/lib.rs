//! # gochecks-go
//!
//! Go source analysis built on Tree-sitter.
//!
//! - [`GoExtractor`] parses package clauses and import specs
//! - [`BuildContext`] evaluates `//go:build` / `// +build` constraints and
//!   file name suffixes
//! - [`classify_dir`] groups a directory's files into packages and tests
//! - [`SourceRoots`] and [`VendorResolver`] map import paths to
//!   directories, honoring `vendor` trees
//! - [`GraphBuilder`] builds the [`DependencyGraph`] of a project
//! - [`GoFileCounter`] and [`ImportReport`] summarize external imports

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod constraint;
pub mod counter;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod project;
pub mod report;
pub mod roots;
pub mod vendor;
pub mod walk;

pub use classifier::{classify_dir, DirPackages, PackageFiles, SourceFile};
pub use constraint::BuildContext;
pub use counter::GoFileCounter;
pub use error::GoError;
pub use extractor::{GoExtractor, GoFile, ImportSpec};
pub use graph::{
    DependencyGraph, GraphBuilder, ImportEdge, ImportSite, OtherPackage, PackageNode, PkgMode,
};
pub use project::GoProject;
pub use report::{ImportReport, ImportReportPkg};
pub use roots::SourceRoots;
pub use vendor::VendorResolver;
