use crate::support::{codes, count_code, fresh_loader};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[test]
fn loads_a_schema_with_imports_from_disk() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.strata",
        r#"
schema Shop

import "lib/base" as base

type Product : base.Entity {
    name: String[1, 100]
}
"#,
    );
    write(
        dir.path(),
        "lib/base.strata",
        r#"
schema Base

abstract type Entity {
    id: UUID primary
}
"#,
    );

    let mut loader = fresh_loader();
    let outcome = loader.load_path(&dir.path().join("main.strata")).unwrap();
    assert_eq!(codes(&outcome.diagnostics), Vec::<&str>::new());
    let schema = outcome.schema.expect("shop should compile");
    assert_eq!(schema.name(), "Shop");
    assert_eq!(loader.registry().len(), 2);

    // source ids are canonical file paths
    assert!(matches!(
        schema.source(),
        strata_syntax::source::SourceId::File(_)
    ));
    // both documents landed in the shared source registry
    assert_eq!(loader.sources().len(), 2);
}

#[test]
fn relative_imports_resolve_against_the_importing_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "nested/entry.strata",
        "schema Entry\nimport \"./sibling\" as sib\ntype T : sib.Base { }\n",
    );
    write(
        dir.path(),
        "nested/sibling.strata",
        "schema Sibling\nabstract type Base { id: UUID primary }\n",
    );

    let mut loader = fresh_loader();
    let outcome = loader
        .load_path(&dir.path().join("nested/entry.strata"))
        .unwrap();
    assert_eq!(codes(&outcome.diagnostics), Vec::<&str>::new());
    assert!(outcome.schema.is_some());
}

#[test]
fn escaping_the_module_root_is_rejected_not_followed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("module");
    fs::create_dir_all(&root).unwrap();
    // a perfectly readable file outside the root
    write(dir.path(), "outside.strata", "schema Outside\n");
    write(
        &root,
        "main.strata",
        "schema Main\nimport \"../outside\"\n",
    );

    let mut loader = fresh_loader();
    let outcome = loader.load_path(&root.join("main.strata")).unwrap();
    assert!(outcome.schema.is_none());
    assert_eq!(count_code(&outcome.diagnostics, "E_PATH_ESCAPE"), 1);
}

#[test]
fn missing_imports_are_resolve_errors() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.strata", "schema Main\nimport \"gone\"\n");

    let mut loader = fresh_loader();
    let outcome = loader.load_path(&dir.path().join("main.strata")).unwrap();
    assert!(outcome.schema.is_none());
    assert_eq!(count_code(&outcome.diagnostics, "E_IMPORT_RESOLVE"), 1);
}

#[test]
fn missing_entry_is_a_fatal_error_not_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let mut loader = fresh_loader();
    let error = loader
        .load_path(&dir.path().join("never-written.strata"))
        .unwrap_err();
    assert!(matches!(
        error,
        strata_analysis::LoadError::EntryRead { .. }
    ));
}

#[test]
fn reloading_reuses_registered_schemas() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.strata", "schema Main\ntype T { id: UUID primary }\n");

    let mut loader = fresh_loader();
    let first = loader.load_path(&dir.path().join("main.strata")).unwrap();
    let second = loader.load_path(&dir.path().join("main.strata")).unwrap();
    let a = first.schema.unwrap();
    let b = second.schema.unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert_eq!(loader.registry().len(), 1);
}

#[test]
fn registry_snapshot_shares_sealed_schemas() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.strata", "schema Main\ntype T { id: UUID primary }\n");

    let mut loader = fresh_loader();
    let outcome = loader.load_path(&dir.path().join("main.strata")).unwrap();
    let schema = outcome.schema.unwrap();

    let snapshot = loader.registry().clone_snapshot();
    assert_eq!(snapshot.len(), 1);
    let via_snapshot = snapshot.by_name("Main").unwrap();
    assert!(std::sync::Arc::ptr_eq(&schema, &via_snapshot));
    let ty = snapshot.type_by_id(&schema.types()[0].id()).unwrap();
    assert_eq!(ty.name(), "T");

    // sorted, deterministic iteration
    let all = snapshot.all();
    assert_eq!(all.len(), 1);
}
