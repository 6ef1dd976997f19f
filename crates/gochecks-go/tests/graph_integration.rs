//! Integration tests: dependency graph, file counts and the import report
//! over GOPATH-style fixture trees written to a temp directory.

use gochecks_go::{
    BuildContext, DependencyGraph, GoError, GoFileCounter, GraphBuilder, ImportReport, PkgMode,
    SourceRoots,
};
use std::path::Path;
use tempfile::TempDir;

/// Writes `files` (paths relative to the GOPATH `src` dir) into a fresh
/// temp directory.
fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    for (rel, src) in files {
        let path = tmp.path().join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, src).expect("write");
    }
    tmp
}

fn build(src: &Path, project: &str, ctx: BuildContext) -> DependencyGraph {
    let roots = SourceRoots::gopath(src);
    GraphBuilder::new(&roots, ctx)
        .build(&src.join(project))
        .expect("graph should build")
}

fn linux() -> BuildContext {
    BuildContext {
        goos: "linux".to_string(),
        goarch: "amd64".to_string(),
        all_tags: false,
        ..BuildContext::host()
    }
}

fn import_keys(graph: &DependencyGraph, path: &str) -> Vec<String> {
    graph
        .direct_imports_of(path)
        .map(|imports| imports.keys().cloned().collect())
        .unwrap_or_default()
}

// ── Package nodes ──

#[test]
fn default_node_has_imports_and_file_count() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo; import \"bar\""),
        ("bar/bar.go", "package bar"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());

    let node = graph.node("projectDir").expect("project node");
    assert_eq!(node.name, "foo");
    assert_eq!(node.mode, PkgMode::Default);
    assert_eq!(node.n_go_files, 1);
    assert_eq!(import_keys(&graph, "projectDir"), vec!["bar"]);
}

#[test]
fn test_node_combines_internal_and_external_tests() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo"),
        ("projectDir/foo_test.go", "package foo; import \"bar\""),
        ("projectDir/ext_test.go", "package foo_test; import \"baz\""),
        ("bar/bar.go", "package bar"),
        ("baz/baz.go", "package baz"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());

    let test = graph.node("projectDir_test").expect("test node");
    assert_eq!(test.name, "foo");
    assert_eq!(test.mode, PkgMode::Test);
    assert_eq!(import_keys(&graph, "projectDir_test"), vec!["bar", "baz"]);
    assert!(import_keys(&graph, "projectDir").is_empty());
}

#[test]
fn constrained_import_found_only_with_all_tags() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo"),
        (
            "projectDir/foo_mobile.go",
            "// +build android\n\npackage foo\n\nimport \"bar\"\n",
        ),
        ("bar/bar.go", "package bar"),
    ]);

    let all = build(tmp.path(), "projectDir", BuildContext::all_tags());
    assert_eq!(import_keys(&all, "projectDir"), vec!["bar"]);

    let concrete = build(tmp.path(), "projectDir", linux());
    assert!(import_keys(&concrete, "projectDir").is_empty());
    assert!(concrete.node("bar").is_none());
}

#[test]
fn ignored_main_file_does_not_change_package_name() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo"),
        (
            "projectDir/main.go",
            "// +build ignore\n\npackage main\n\nimport \"bar\"\n",
        ),
        ("bar/bar.go", "package bar"),
    ]);
    let graph = build(tmp.path(), "projectDir", linux());

    let node = graph.node("projectDir").expect("project node");
    assert_eq!(node.name, "foo");
    assert_eq!(node.n_go_files, 2);
    assert!(node.other_packages.is_empty());
}

#[test]
fn packages_sharing_a_directory_keep_their_own_imports() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo"),
        (
            "projectDir/gen_main.go",
            "// +build ignore\n\npackage main\n\nimport \"bar.com/gen\"\n",
        ),
        ("bar.com/gen/gen.go", "package gen"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());

    let node = graph.node("projectDir").expect("project node");
    assert_eq!(node.name, "foo");
    assert_eq!(node.n_go_files, 2);
    assert!(node.imports.is_empty());
    assert_eq!(node.other_packages.len(), 1);
    let generator = &node.other_packages[0];
    assert_eq!(generator.name, "main");
    assert!(generator.is_main());
    assert_eq!(
        generator.imports.keys().collect::<Vec<_>>(),
        vec!["bar.com/gen"]
    );

    assert!(graph.transitive_imports_of("projectDir").is_empty());
    assert!(graph
        .transitive_references_of("projectDir")
        .contains("bar.com/gen"));
    assert!(graph.node("bar.com/gen").is_some());

    let report = ImportReport::create(&graph);
    assert!(report.imports.is_empty());
    assert_eq!(report.main_only_imports.len(), 1);
    assert_eq!(report.main_only_imports[0].path, "bar.com/gen");
    assert_eq!(report.main_only_imports[0].import_src, vec!["projectDir"]);
}

#[test]
fn directory_named_like_a_test_node_keeps_its_package() {
    let tmp = write_tree(&[
        ("projectDir/foo/foo.go", "package foo"),
        ("projectDir/foo/foo_test.go", "package foo; import \"testing\""),
        ("projectDir/foo_test/x.go", "package x; import \"fmt\""),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());

    let node = graph.node("projectDir/foo_test").expect("directory node");
    assert_eq!(node.mode, PkgMode::Default);
    assert_eq!(node.name, "x");
    assert_eq!(import_keys(&graph, "projectDir/foo_test"), vec!["fmt"]);
    assert!(graph.node("projectDir/foo").is_some());
}

#[test]
fn empty_results_for_missing_files() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo"),
        ("projectDir/only_tests/bar_test.go", "package bar_test"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());

    assert!(graph.node("projectDir_test").is_none());
    assert!(graph.node("projectDir/only_tests").is_none());
    let test = graph
        .node("projectDir/only_tests_test")
        .expect("test-only package");
    assert_eq!(test.name, "bar");
    assert!(test.imports.is_empty());
}

#[test]
fn nested_vendor_directory_wins() {
    let tmp = write_tree(&[
        (
            "projectDir/foo.go",
            "package foo; import \"github.com/org/lib\"",
        ),
        (
            "projectDir/sub/sub.go",
            "package sub; import \"github.com/org/lib\"",
        ),
        ("projectDir/vendor/github.com/org/lib/lib.go", "package lib"),
        ("projectDir/sub/vendor/github.com/org/lib/lib.go", "package lib"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());

    assert_eq!(
        import_keys(&graph, "projectDir"),
        vec!["projectDir/vendor/github.com/org/lib"]
    );
    assert_eq!(
        import_keys(&graph, "projectDir/sub"),
        vec!["projectDir/sub/vendor/github.com/org/lib"]
    );
}

#[test]
fn without_vendor_directories_resolved_equals_raw() {
    let tmp = write_tree(&[
        (
            "projectDir/foo.go",
            "package foo\n\nimport (\n\t\"fmt\"\n\t\"github.com/org/lib\"\n)\n",
        ),
        ("github.com/org/lib/lib.go", "package lib"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    assert_eq!(
        import_keys(&graph, "projectDir"),
        vec!["fmt", "github.com/org/lib"]
    );
}

#[test]
fn parse_error_aborts_build() {
    let tmp = write_tree(&[("projectDir/foo.go", "package foo\n\nfunc {\n")]);
    let roots = SourceRoots::gopath(tmp.path());
    let err = GraphBuilder::new(&roots, BuildContext::all_tags())
        .build(&tmp.path().join("projectDir"))
        .unwrap_err();
    assert!(matches!(err, GoError::Parse { .. }), "got {err}");
}

// ── File counts ──

#[test]
fn counter_sums_transitive_files() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo; import \"bar\""),
        ("projectDir/foo_2.go", "package foo"),
        ("bar/bar.go", "package bar; import \"baz\""),
        ("bar/bar_2.go", "package bar"),
        ("baz/baz.go", "package baz"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let mut counter = GoFileCounter::new(&graph);

    assert_eq!(counter.n_go_files("projectDir"), Some(2));
    assert_eq!(counter.n_total_go_files("projectDir"), Some(5));
    assert_eq!(counter.n_total_go_files("projectDir"), Some(5));
    assert_eq!(counter.n_imported_go_files("projectDir"), Some(3));
    assert_eq!(counter.n_total_go_files("missing"), None);
}

#[test]
fn counter_counts_diamond_once() {
    let tmp = write_tree(&[
        (
            "projectDir/foo.go",
            "package foo\n\nimport (\n\t\"bar\"\n\t\"baz\"\n)\n",
        ),
        ("bar/bar.go", "package bar; import \"common\""),
        ("baz/baz.go", "package baz; import \"common\""),
        ("common/a.go", "package common"),
        ("common/b.go", "package common"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let mut counter = GoFileCounter::new(&graph);

    assert_eq!(counter.n_imported_go_files("projectDir"), Some(4));
}

#[test]
fn counter_totals_belong_to_the_graph_it_borrows() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo; import \"bar\""),
        ("bar/bar.go", "package bar"),
    ]);
    let before = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let mut stale = GoFileCounter::new(&before);
    assert_eq!(stale.n_total_go_files("projectDir"), Some(2));

    std::fs::write(tmp.path().join("bar/bar_2.go"), "package bar").expect("write");
    let after = build(tmp.path(), "projectDir", BuildContext::all_tags());

    assert_eq!(stale.n_total_go_files("projectDir"), Some(2));
    assert_eq!(GoFileCounter::new(&after).n_total_go_files("projectDir"), Some(3));
}

// ── Import report ──

#[test]
fn report_counts_imported_files() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo; import \"bar\""),
        ("bar/bar.go", "package bar; import \"baz\""),
        ("bar/bar_2.go", "package bar"),
        ("baz/a.go", "package baz"),
        ("baz/b.go", "package baz"),
        ("baz/c.go", "package baz"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let report = ImportReport::create(&graph);

    assert_eq!(report.imports.len(), 1);
    let bar = &report.imports[0];
    assert_eq!(bar.path, "bar");
    assert_eq!(bar.n_go_files, 2);
    assert_eq!(bar.n_imported_go_files, 3);
    assert_eq!(bar.import_src, vec!["projectDir"]);

    insta::assert_snapshot!(report.to_text(), @r"
    Project: projectDir

    Imports (1):
      bar (2 files, 3 imported files)
        <- projectDir

    Main-only imports (0):

    Test-only imports (0):
    ");
}

#[test]
fn report_core_wins_over_main() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo; import \"bar\""),
        ("projectDir/main/main.go", "package main; import \"bar\""),
        ("bar/bar.go", "package bar"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let report = ImportReport::create(&graph);

    assert_eq!(report.imports.len(), 1);
    assert_eq!(
        report.imports[0].import_src,
        vec!["projectDir", "projectDir/main"]
    );
    assert!(report.main_only_imports.is_empty());
    assert!(report.test_only_imports.is_empty());
}

#[test]
fn report_core_wins_over_test() {
    let tmp = write_tree(&[
        ("projectDir/baz/baz.go", "package baz; import \"bar\""),
        ("projectDir/foo.go", "package foo"),
        ("projectDir/foo_test.go", "package foo; import \"bar\""),
        ("bar/bar.go", "package bar"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let report = ImportReport::create(&graph);

    assert_eq!(report.imports.len(), 1);
    assert_eq!(
        report.imports[0].import_src,
        vec!["projectDir/baz", "projectDir_test"]
    );
    assert!(report.test_only_imports.is_empty());
}

#[test]
fn report_main_wins_over_test() {
    let tmp = write_tree(&[
        ("projectDir/main/main.go", "package main; import \"bar\""),
        ("projectDir/foo_test.go", "package foo; import \"bar\""),
        ("bar/bar.go", "package bar"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let report = ImportReport::create(&graph);

    assert!(report.imports.is_empty());
    assert_eq!(report.main_only_imports.len(), 1);
    assert_eq!(
        report.main_only_imports[0].import_src,
        vec!["projectDir/main", "projectDir_test"]
    );
    assert!(report.test_only_imports.is_empty());
}

#[test]
fn report_test_only_and_standard_library_excluded() {
    let tmp = write_tree(&[
        ("projectDir/foo.go", "package foo; import \"fmt\""),
        (
            "projectDir/foo_test.go",
            "package foo\n\nimport (\n\t\"testing\"\n\t\"github.com/stretchr/testify\"\n)\n",
        ),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let report = ImportReport::create(&graph);

    assert!(report.imports.is_empty());
    assert!(report.main_only_imports.is_empty());
    assert_eq!(report.test_only_imports.len(), 1);
    let testify = &report.test_only_imports[0];
    assert_eq!(testify.path, "github.com/stretchr/testify");
    assert_eq!(testify.n_go_files, 0);

    let json = report.to_json().expect("json");
    assert!(json.contains("\"test_only_imports\""));
    assert!(json.contains("\"github.com/stretchr/testify\""));
}

#[test]
fn report_treats_vendored_packages_as_external() {
    let tmp = write_tree(&[
        (
            "projectDir/foo.go",
            "package foo; import \"github.com/org/lib\"",
        ),
        ("projectDir/internal/x.go", "package internal"),
        ("projectDir/vendor/github.com/org/lib/lib.go", "package lib"),
    ]);
    let graph = build(tmp.path(), "projectDir", BuildContext::all_tags());
    let report = ImportReport::create(&graph);

    let paths: Vec<_> = report.imports.iter().map(|p| p.path.as_str()).collect();
    assert_eq!(paths, vec!["projectDir/vendor/github.com/org/lib"]);
}
