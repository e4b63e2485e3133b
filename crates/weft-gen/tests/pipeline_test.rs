// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end runs over a temporary module tree.

use std::fs;
use std::path::Path;

use weft_analysis::Severity;
use weft_gen::{GeneratorConfig, PipelineError, pipeline};

const SHIPPING: &str = include_str!("fixtures/shipping.rs");
const BILLING: &str = include_str!("fixtures/billing.rs");
const BROKEN: &str = include_str!("fixtures/broken.rs");

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn config(root: &Path) -> GeneratorConfig {
    let mut config = GeneratorConfig::new(root);
    config.jobs = 2;
    config
}

#[test]
fn test_run_writes_next_to_sources() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/shipping.rs", SHIPPING);
    write(dir.path(), "src/billing/mod.rs", BILLING);
    write(dir.path(), "src/util.rs", "pub fn helper() {}\n");

    let report = pipeline::run(&config(dir.path())).unwrap();

    assert!(report.is_success());
    assert_eq!(report.units, 3);
    assert_eq!(report.artifacts.len(), 2);
    assert!(dir.path().join("src/shipping.gen.rs").is_file());
    assert!(dir.path().join("src/billing/billing.gen.rs").is_file());
    assert!(!dir.path().join("src/util.gen.rs").exists());
    assert_eq!(report.written.len(), 2);
}

#[test]
fn test_rerun_is_byte_identical_and_skips_generated_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/shipping.rs", SHIPPING);

    let first = pipeline::run(&config(dir.path())).unwrap();
    let before = fs::read(dir.path().join("src/shipping.gen.rs")).unwrap();

    let second = pipeline::run(&config(dir.path())).unwrap();
    let after = fs::read(dir.path().join("src/shipping.gen.rs")).unwrap();

    assert_eq!(before, after);
    assert_eq!(first.units, 1);
    assert_eq!(second.units, 1);
    assert_eq!(first.artifacts[0].checksum(), second.artifacts[0].checksum());
}

#[test]
fn test_out_dir_mirrors_source_tree() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(dir.path(), "src/shipping.rs", SHIPPING);

    let mut config = config(dir.path());
    config.out_dir = Some(out.path().to_path_buf());
    pipeline::run(&config).unwrap();

    assert!(out.path().join("src/shipping.gen.rs").is_file());
    assert!(!dir.path().join("src/shipping.gen.rs").exists());
}

#[test]
fn test_failing_unit_is_skipped_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/broken.rs", BROKEN);
    write(dir.path(), "src/shipping.rs", SHIPPING);

    let report = pipeline::run(&config(dir.path())).unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "src/broken.rs");
    assert!(report.failures[0].error.contains("more than one kind"));
    assert!(dir.path().join("src/shipping.gen.rs").is_file());
    assert!(!dir.path().join("src/broken.gen.rs").exists());
}

#[test]
fn test_fail_fast_aborts_with_unit_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/broken.rs", BROKEN);
    write(dir.path(), "src/shipping.rs", SHIPPING);

    let mut config = config(dir.path());
    config.fail_fast = true;
    let err = pipeline::run(&config).unwrap_err();

    match &err {
        PipelineError::Unit { path, .. } => assert_eq!(path, "src/broken.rs"),
        other => panic!("expected a unit failure, got {:?}", other),
    }
    assert!(err.to_string().contains("src/broken.rs"));
    assert!(!dir.path().join("src/shipping.gen.rs").exists());
}

#[test]
fn test_lenient_generates_ambiguous_trait() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/broken.rs", BROKEN);

    let mut config = config(dir.path());
    config.strict = false;
    let report = pipeline::run(&config).unwrap();

    assert!(report.is_success());
    let text = fs::read_to_string(dir.path().join("src/broken.gen.rs")).unwrap();
    assert!(text.contains("AmbiguousRun"));
    syn::parse_file(&text).unwrap();
}

#[test]
fn test_patterns_limit_sources() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/shipping.rs", SHIPPING);
    write(dir.path(), "other/billing.rs", BILLING);

    let mut config = config(dir.path());
    config.patterns = vec!["src/**/*.rs".to_string()];
    let report = pipeline::run(&config).unwrap();

    assert_eq!(report.units, 1);
    assert!(!dir.path().join("other/billing.gen.rs").exists());
}

#[test]
fn test_models_lists_packages_with_services() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/shipping.rs", SHIPPING);
    write(dir.path(), "src/util.rs", "pub fn helper() {}\n");

    let packages = pipeline::models(&config(dir.path())).unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "shipping");
    assert_eq!(packages[0].services[0].name, "Shipment");

    let json = serde_json::to_value(&packages).unwrap();
    assert_eq!(json[0]["services"][0]["operations"].as_array().unwrap().len(), 4);
}

#[test]
fn test_continue_on_error_keeps_analyzer_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/broken.rs", BROKEN);
    write(dir.path(), "src/shipping.rs", SHIPPING);

    let mut config = config(dir.path());
    config.continue_on_error = true;
    let report = pipeline::run(&config).unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "src/broken.rs");
    assert!(report.failures[0].error.contains("generate"));

    let error = report
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
        .expect("failed analyzer reported as a diagnostic");
    assert_eq!(error.analyzer, "generate");
    assert!(error.message.contains("more than one kind"));

    assert!(dir.path().join("src/shipping.gen.rs").is_file());
    assert!(!dir.path().join("src/broken.gen.rs").exists());
}

#[test]
fn test_continue_on_error_with_fail_fast_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/broken.rs", BROKEN);
    write(dir.path(), "src/shipping.rs", SHIPPING);

    let mut config = config(dir.path());
    config.continue_on_error = true;
    config.fail_fast = true;
    let err = pipeline::run(&config).unwrap_err();

    match &err {
        PipelineError::Analyzers { path, analyzers } => {
            assert_eq!(path, "src/broken.rs");
            assert_eq!(analyzers, &["generate"]);
        }
        other => panic!("expected failed analyzers, got {:?}", other),
    }
    assert!(!dir.path().join("src/shipping.gen.rs").exists());
}

#[test]
fn test_units_sharing_an_output_path_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("shop");
    write(
        &root,
        "src/lib.rs",
        "/// weft:activity\npub trait Alpha {\n    fn a(&self, ctx: &Context, req: A);\n}\n",
    );
    write(
        &root,
        "src/main.rs",
        "/// weft:activity\npub trait Beta {\n    fn b(&self, ctx: &Context, req: B);\n}\n",
    );

    let err = pipeline::run(&config(&root)).unwrap_err();

    match &err {
        PipelineError::Collision { path, first, second } => {
            assert_eq!(path, &Path::new("src/shop.gen.rs").to_path_buf());
            assert_eq!(first, "src/lib.rs");
            assert_eq!(second, "src/main.rs");
        }
        other => panic!("expected a collision, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("src/lib.rs") && message.contains("src/main.rs"));

    let generated: Vec<_> = fs::read_dir(root.join("src"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".gen.rs"))
        .collect();
    assert!(generated.is_empty());
}
