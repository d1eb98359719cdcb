use crate::support::{codes, count_code, load_memory, load_single, to_map};
use strata_analysis::model::RelationKind;

const BASE: &str = r#"
schema Base

datatype Money = Float[0.0,]

abstract type Entity {
    id: UUID primary
}
"#;

#[test]
fn imports_wire_schemas_and_datatypes_across_files() {
    let loaded = load_memory(
        &[
            (
                "main.strata",
                r#"
schema Shop

import "lib/base" as base

type Product : base.Entity {
    price: base.Money
    name: String[1, 100]
}
"#,
            ),
            ("lib/base.strata", BASE),
        ],
        Some("main.strata"),
    );
    assert_eq!(codes(&loaded.diagnostics), Vec::<&str>::new());
    let schema = loaded.schema.expect("shop should compile");
    assert_eq!(schema.name(), "Shop");
    assert_eq!(loaded.registry.len(), 2);

    let import = &schema.imports()[0];
    assert_eq!(import.alias(), "base");
    assert!(!import.resolved_source().is_zero());
    let imported = import.schema().expect("import should stay wired");
    assert_eq!(imported.name(), "Base");

    let product = schema.type_named("Product").unwrap();
    assert_eq!(product.super_types().len(), 1);
    assert_eq!(product.super_types()[0].id.name, "Entity");
    // inherited primary key arrives through linearization
    assert_eq!(product.primary_keys().len(), 1);
    assert_eq!(product.primary_keys()[0].name(), "id");
    // the alias resolved against the imported schema's datatype
    let price = product.property("price").unwrap();
    assert!(price.constraint().is_resolved());

    // back-wiring reached the imported parent
    let entity = imported.type_named("Entity").unwrap();
    let subs = entity.sub_types();
    assert!(subs.iter().any(|sub| sub.id.name == "Product"));
}

#[test]
fn entry_defaults_to_the_smallest_key() {
    let loaded = load_memory(
        &[
            ("b.strata", "schema B\n"),
            ("a.strata", "schema A\n"),
        ],
        None,
    );
    let schema = loaded.schema.expect("entry should compile");
    assert_eq!(schema.name(), "A");
}

#[test]
fn import_cycle_is_reported_once_and_marker_does_not_leak() {
    let files = [
        ("a.strata", "schema A\nimport \"b\"\n"),
        ("b.strata", "schema B\nimport \"a\"\n"),
    ];
    let loaded = load_memory(&files, Some("a.strata"));
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_IMPORT_CYCLE"), 1);
    assert!(count_code(&loaded.diagnostics, "E_UPSTREAM_FAIL") >= 1);
    assert_eq!(loaded.registry.len(), 0);

    // a second load over the same registries reports the same single cycle
    let mut loader = strata_analysis::Loader::new(
        loaded.sources,
        loaded.registry,
        strata_analysis::LoaderOptions::default(),
    );
    let outcome = loader.load_sources(to_map(&files), Some("a.strata")).unwrap();
    assert!(outcome.schema.is_none());
    assert_eq!(count_code(&outcome.diagnostics, "E_IMPORT_CYCLE"), 1);
}

#[test]
fn duplicate_paths_and_aliases_are_rejected_with_related_info() {
    let loaded = load_memory(
        &[
            (
                "main.strata",
                r#"
schema Main
import "lib/base" as one
import "lib/base" as two
import "lib/other" as one
"#,
            ),
            ("lib/base.strata", BASE),
            ("lib/other.strata", "schema Other\n"),
        ],
        Some("main.strata"),
    );
    assert!(loaded.schema.is_none());
    // one duplicate path, one duplicate alias
    assert_eq!(count_code(&loaded.diagnostics, "E_DUPLICATE_IMPORT"), 2);
    for diagnostic in loaded
        .diagnostics
        .iter()
        .filter(|d| d.code.as_str() == "E_DUPLICATE_IMPORT")
    {
        assert!(!diagnostic.related.is_empty(), "related info expected");
    }
}

#[test]
fn two_aliases_for_the_same_canonical_file_are_one_error() {
    let loaded = load_memory(
        &[
            (
                "main.strata",
                r#"
schema Main
import "lib/base" as one
import "./lib/base" as two
"#,
            ),
            ("lib/base.strata", BASE),
        ],
        Some("main.strata"),
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_DUPLICATE_IMPORT"), 1);
    let diagnostic = loaded
        .diagnostics
        .iter()
        .find(|d| d.code.as_str() == "E_DUPLICATE_IMPORT")
        .unwrap();
    assert!(diagnostic.details.contains_key("sourceId"));
}

#[test]
fn reserved_words_cannot_be_aliases() {
    let loaded = load_memory(
        &[
            ("main.strata", "schema Main\nimport \"lib/base\" as type\n"),
            ("lib/base.strata", BASE),
        ],
        Some("main.strata"),
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_INVALID_ALIAS"), 1);
}

#[test]
fn alias_colliding_with_local_declaration_is_rejected() {
    let loaded = load_memory(
        &[
            (
                "main.strata",
                r#"
schema Main
import "lib/base" as Widget

type Widget {
    id: UUID primary
}
"#,
            ),
            ("lib/base.strata", BASE),
        ],
        Some("main.strata"),
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_IMPORT_ALIAS_COLLISION"), 1);
}

#[test]
fn unresolvable_imports_are_reported_at_the_import_site() {
    let loaded = load_memory(
        &[("main.strata", "schema Main\nimport \"missing/file\"\n")],
        Some("main.strata"),
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_IMPORT_RESOLVE"), 1);
}

#[test]
fn escaping_imports_are_rejected() {
    let loaded = load_memory(
        &[("main.strata", "schema Main\nimport \"../outside\"\n")],
        Some("main.strata"),
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_PATH_ESCAPE"), 1);
}

#[test]
fn string_sources_cannot_import() {
    let loaded = load_single("inline", "schema Inline\nimport \"x\"\n");
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_IMPORT_NOT_ALLOWED"), 1);
}

#[test]
fn diagnostics_serialize_with_codes_and_details() {
    let loaded = load_single("inline", "schema Inline\nimport \"x\"\n");
    let json = serde_json::to_string(&loaded.diagnostics).unwrap();
    assert!(json.contains("E_IMPORT_NOT_ALLOWED"));
    assert!(json.contains("importPath"));
}

#[test]
fn sibling_schemas_with_the_same_name_conflict() {
    let loaded = load_memory(
        &[
            (
                "main.strata",
                "schema Main\nimport \"x\" as x\nimport \"y\" as y\n",
            ),
            ("x.strata", "schema Same\n"),
            ("y.strata", "schema Same\n"),
        ],
        Some("main.strata"),
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_DUPLICATE_TYPE"), 1);
}

#[test]
fn parse_failures_surface_as_diagnostics_with_positions() {
    let loaded = load_single("broken", "schema Broken\ntype X {\n  name String\n}\n");
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_PARSE"), 1);
    let diagnostic = loaded
        .diagnostics
        .iter()
        .find(|d| d.code.as_str() == "E_PARSE")
        .unwrap();
    assert_eq!(diagnostic.span.start.line, 3);
}

#[test]
fn compiled_schemas_are_sealed_throughout() {
    let loaded = load_memory(
        &[
            ("main.strata", "schema Main\nimport \"lib/base\" as base\ntype T : base.Entity { }\n"),
            ("lib/base.strata", BASE),
        ],
        Some("main.strata"),
    );
    let schema = loaded.schema.expect("should compile");
    assert!(schema.is_sealed());
    assert!(schema.sources().is_some());
    for ty in schema.types() {
        assert!(ty.is_sealed());
        for property in ty.all_properties() {
            assert!(property.is_sealed());
        }
    }
    for import in schema.imports() {
        assert!(import.is_sealed());
    }
    for data_type in schema.data_types() {
        assert!(data_type.is_sealed());
    }
}

#[test]
fn relations_resolve_targets_and_field_names() {
    let loaded = load_single(
        "relations",
        r#"
schema Relations

type Chapter {
    seq: Integer[0,]
}

type Book {
    id: UUID primary
    invariant HasChapters: len(chapters) > 0
    association WrittenBy -> Author ? backref wrote * {
        royalty: Float[0.0, 1.0]
    }
    composition HasChapter -> Chapter *
}

type Author {
    id: UUID primary
}
"#,
    );
    assert_eq!(codes(&loaded.diagnostics), Vec::<&str>::new());
    let schema = loaded.schema.expect("should compile");
    let book = schema.type_named("Book").unwrap();

    let written_by = &book.associations()[0];
    assert_eq!(written_by.kind(), RelationKind::Association);
    assert_eq!(written_by.field_name(), "written_by");
    assert_eq!(written_by.target_id().unwrap().name, "Author");
    assert!(written_by.is_forward_optional());
    assert_eq!(written_by.backref(), Some("wrote"));
    assert!(written_by.is_reverse_many());
    assert_eq!(written_by.properties().len(), 1);
    assert_eq!(written_by.owner(), "Book");

    let has_chapter = &book.compositions()[0];
    assert_eq!(has_chapter.kind(), RelationKind::Composition);
    assert!(has_chapter.properties().is_empty());
    assert_eq!(has_chapter.target_id().unwrap().name, "Chapter");

    let invariant = &book.invariants()[0];
    assert_eq!(invariant.name(), "HasChapters");
    assert!(invariant.is_sealed());
}
