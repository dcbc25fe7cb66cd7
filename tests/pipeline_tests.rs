//! Pipeline integration tests
//!
//! End-to-end runs of the named pipelines against a conventional
//! `src/` -> `dist/` project fixture in a temporary directory.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use sitesmith::config::default_config;
use sitesmith::pipeline::{build_plan, default_plan, BuildContext};

// ============================================================================
// Test Utilities
// ============================================================================

/// Write a file, creating parent directories.
fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small but complete source tree exercising every stage.
fn create_test_project() -> (TempDir, BuildContext) {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write_file(root, "src/app.js", "var app = {};\n");
    write_file(root, "src/util.js", "var util = {};\n");
    write_file(root, "src/sass/main.scss", "@import 'base';\nbody { color: #ff0000; }\n");
    write_file(root, "src/sass/_base.scss", "h1 { margin: 0; }\n");
    write_file(
        root,
        "src/svg-sprite/logo.svg",
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 10 10\"><path d=\"M0 0 L10 10\"/></svg>",
    );
    write_file(
        root,
        "src/copy/index.html",
        "<html><body>@@include('components/header.html')</body></html>",
    );
    write_file(root, "src/copy/components/header.html", "<header>site</header>");
    write_file(root, "src/copy/robots.txt", "User-agent: *\n");

    let ctx = BuildContext::new(default_config(), root.to_path_buf());
    (temp, ctx)
}

// ============================================================================
// Default Pipeline
// ============================================================================

#[test]
fn test_default_pipeline_builds_all_artifacts() {
    let (temp, ctx) = create_test_project();
    let report = default_plan().run(&ctx);
    assert!(report.is_success(), "{}", report.summary());

    let dist = temp.path().join("dist");
    let bundle = fs::read_to_string(dist.join("js/main.js")).unwrap();
    assert_eq!(bundle, "var app = {};\nvar util = {};\n");

    assert!(dist.join("css/main.css").exists());
    assert!(dist.join("css/main.min.css").exists());

    let sprite = fs::read_to_string(dist.join("svg/sprite.svg")).unwrap();
    assert!(sprite.contains("id=\"image-logo\""));
    assert!(sprite.contains("viewBox=\"0 0 10 10\""));

    let html = fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(html.contains("<header>site</header>"));
    assert!(!html.contains("@@include"));

    assert!(dist.join("robots.txt").exists());
}

#[test]
fn test_default_pipeline_cleans_stale_output() {
    let (temp, ctx) = create_test_project();
    write_file(temp.path(), "dist/js/stale.js", "old");

    let report = default_plan().run(&ctx);
    assert!(report.is_success());
    assert!(!temp.path().join("dist/js/stale.js").exists());
    assert!(temp.path().join("dist/js/main.js").exists());
}

#[test]
fn test_double_build_is_idempotent() {
    let (temp, ctx) = create_test_project();
    assert!(default_plan().run(&ctx).is_success());
    let first = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();

    assert!(default_plan().run(&ctx).is_success());
    let second = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
    assert_eq!(first, second);
    assert!(!second.contains("@@include"));
}

#[test]
fn test_disabled_flags_suppress_all_writes() {
    let (temp, ctx) = create_test_project();
    let mut config = default_config();
    config.settings.clean = false;
    config.settings.scripts = false;
    config.settings.styles = false;
    config.settings.svgs = false;
    config.settings.copy = false;
    let ctx = BuildContext::new(config, ctx.project_root().to_path_buf());

    let report = default_plan().run(&ctx);
    assert!(report.is_success());
    assert!(!temp.path().join("dist").exists());
}

// ============================================================================
// Failure Semantics
// ============================================================================

#[test]
fn test_lint_failure_fails_run_but_siblings_complete() {
    let (temp, ctx) = create_test_project();
    write_file(temp.path(), "src/bad.js", "debugger;\n");

    let report = default_plan().run(&ctx);
    assert!(!report.is_success());

    // sibling stages in the concurrent group still ran to completion
    let bundle = fs::read_to_string(temp.path().join("dist/js/main.js")).unwrap();
    assert!(bundle.contains("debugger;"));
    assert!(temp.path().join("dist/css/main.css").exists());

    // the failed group blocks the following sequence step
    assert!(report.stage("html-include").is_none());
    let html = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
    assert!(html.contains("@@include"));
}

#[test]
fn test_includes_expand_with_copy_disabled() {
    let (temp, _ctx) = create_test_project();
    // hand-authored output file; the pipeline must still inline it
    write_file(temp.path(), "dist/index.html", "<body>@@include('parts/h.html')</body>");
    write_file(temp.path(), "dist/parts/h.html", "<h1>hand made</h1>");

    let mut config = default_config();
    config.settings.clean = false;
    config.settings.copy = false;
    let ctx = BuildContext::new(config, temp.path().to_path_buf());

    let report = default_plan().run(&ctx);
    assert!(report.is_success(), "{}", report.summary());

    let html = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
    assert!(html.contains("<h1>hand made</h1>"));
    assert!(!html.contains("@@include"));
}

#[test]
fn test_missing_fragment_fails_include_stage() {
    let (temp, ctx) = create_test_project();
    write_file(
        temp.path(),
        "src/copy/index.html",
        "<body>@@include('components/missing.html')</body>",
    );

    let report = default_plan().run(&ctx);
    assert!(!report.is_success());
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].stage, "html-include");
}

// ============================================================================
// Styles
// ============================================================================

#[test]
fn test_styles_emit_expanded_and_minified() {
    let (temp, ctx) = create_test_project();
    let report = default_plan().run(&ctx);
    assert!(report.is_success(), "{}", report.summary());

    let expanded = fs::read_to_string(temp.path().join("dist/css/main.css")).unwrap();
    let minified = fs::read_to_string(temp.path().join("dist/css/main.min.css")).unwrap();

    // partial content is inlined into both artifacts
    assert!(expanded.contains("margin"));
    assert!(minified.contains("margin"));
    // expanded carries per-fragment provenance comments, minified does not
    assert!(expanded.contains("/* from:"));
    assert!(!minified.contains("/* from:"));
    assert!(minified.len() < expanded.len());
}

// ============================================================================
// Build Pipeline
// ============================================================================

#[test]
fn test_build_pipeline_publishes_index() {
    let (temp, ctx) = create_test_project();
    let report = build_plan().run(&ctx);
    assert!(report.is_success(), "{}", report.summary());

    let published = fs::read_to_string(temp.path().join("index.html")).unwrap();
    assert!(published.contains("<header>site</header>"));
    assert!(!published.contains("@@include"));
}

#[test]
fn test_build_pipeline_production_minifies_scripts() {
    let (temp, ctx) = create_test_project();
    write_file(temp.path(), "src/app.js", "// comment\nconst x = 1;\n");
    fs::remove_file(temp.path().join("src/util.js")).unwrap();

    let ctx = ctx.with_production(true);
    let report = build_plan().run(&ctx);
    assert!(report.is_success(), "{}", report.summary());

    let bundle = fs::read_to_string(temp.path().join("dist/js/main.js")).unwrap();
    assert!(bundle.contains("var x = 1;"));
    assert!(!bundle.contains("const"));
    assert!(!bundle.contains("// comment"));
}
