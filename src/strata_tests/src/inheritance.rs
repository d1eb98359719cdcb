use crate::support::{codes, count_code, load_memory, load_single};

#[test]
fn valid_narrowing_compiles() {
    let loaded = load_single(
        "people",
        r#"
schema People

abstract type Person {
    id: UUID primary
    age: Integer[0, 150]
}

type Adult : Person {
    age: Integer[18, 150]
}
"#,
    );
    assert_eq!(codes(&loaded.diagnostics), Vec::<&str>::new());
    let schema = loaded.schema.expect("narrowed override should compile");
    let adult = schema.type_named("Adult").unwrap();
    // the override wins keep-first; the parent's declaration deduplicates
    let ages: Vec<_> = adult
        .all_properties()
        .iter()
        .filter(|p| p.name() == "age")
        .collect();
    assert_eq!(ages.len(), 1);
    assert_eq!(adult.all_properties().len(), 2);
    assert_eq!(adult.primary_keys().len(), 1);
}

#[test]
fn widening_narrowing_fails_with_related_info() {
    let loaded = load_single(
        "people",
        r#"
schema People

abstract type Person {
    id: UUID primary
    age: Integer[0, 150]
}

type Adult : Person {
    age: Integer[0, 200]
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_NARROWING"), 1);
    let diagnostic = loaded
        .diagnostics
        .iter()
        .find(|d| d.code.as_str() == "E_NARROWING")
        .unwrap();
    assert!(!diagnostic.related.is_empty());
    assert_eq!(diagnostic.details.get("inheritedFrom").unwrap(), "Person");
}

#[test]
fn dropping_a_bound_is_a_widening() {
    let loaded = load_single(
        "people",
        r#"
schema People

abstract type Person {
    age: Integer[0, 150]
}

type Adult : Person {
    age: Integer[18,]
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_NARROWING"), 1);
}

#[test]
fn required_cannot_become_optional() {
    let loaded = load_single(
        "people",
        r#"
schema People

abstract type Person {
    name: String[1, 80]
}

type Ghost : Person {
    optional name: String[1, 80]
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_NARROWING"), 1);
}

#[test]
fn diamond_inheritance_deduplicates_and_orders_left_first() {
    let loaded = load_single(
        "diamond",
        r#"
schema Diamond

abstract type W {
    id: UUID primary
}

abstract type Y : W { }

abstract type Z : W { }

type X : Y, Z { }
"#,
    );
    assert_eq!(codes(&loaded.diagnostics), Vec::<&str>::new());
    let schema = loaded.schema.expect("diamond should compile");
    let x = schema.type_named("X").unwrap();

    let super_names: Vec<&str> = x
        .super_types()
        .iter()
        .map(|super_ref| super_ref.id.name.as_str())
        .collect();
    assert_eq!(super_names, vec!["Y", "Z", "W"]);

    let ids: Vec<_> = x
        .all_properties()
        .iter()
        .filter(|p| p.name() == "id")
        .collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(x.primary_keys().len(), 1);

    // every type in the diamond announced itself to W
    let w = schema.type_named("W").unwrap();
    let sub_names: Vec<String> = w
        .sub_types()
        .iter()
        .map(|sub| sub.id.name.clone())
        .collect();
    assert!(sub_names.contains(&"X".to_string()));
    assert!(sub_names.contains(&"Y".to_string()));
    assert!(sub_names.contains(&"Z".to_string()));
}

#[test]
fn inheritance_cycles_are_reported_once() {
    let loaded = load_single(
        "cycle",
        r#"
schema Cycle

type A : B { }
type B : A { }
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_INHERITANCE_CYCLE"), 1);
}

#[test]
fn self_inheritance_is_a_cycle() {
    let loaded = load_single("own", "schema Own\ntype A : A { }\n");
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_INHERITANCE_CYCLE"), 1);
}

#[test]
fn alias_cycles_terminate_with_one_diagnostic() {
    let loaded = load_single(
        "aliases",
        r#"
schema Aliases

datatype A = B
datatype B = A

type T {
    x: A
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_UNKNOWN_DATATYPE"), 1);
    let diagnostic = loaded
        .diagnostics
        .iter()
        .find(|d| d.code.as_str() == "E_UNKNOWN_DATATYPE")
        .unwrap();
    assert!(diagnostic.message.contains("circular"));
}

#[test]
fn alias_chains_resolve_through_intermediate_datatypes() {
    let loaded = load_single(
        "chains",
        r#"
schema Chains

datatype Small = Integer[0, 10]
datatype Tiny = Small
datatype Nano = Tiny

type T {
    x: Nano
}
"#,
    );
    assert_eq!(codes(&loaded.diagnostics), Vec::<&str>::new());
    let schema = loaded.schema.expect("chains should compile");
    let t = schema.type_named("T").unwrap();
    let x = t.property("x").unwrap();
    assert!(x.constraint().is_resolved());
    let nano = schema.data_type_named("Nano").unwrap();
    assert!(nano.is_resolved());
    // the chain compares equal to its terminal
    let small = schema.data_type_named("Small").unwrap();
    assert!(nano.constraint().equals(small.constraint()));
}

#[test]
fn unknown_references_are_reported() {
    let loaded = load_single(
        "unknown",
        r#"
schema Unknown

datatype D = Nope

type T : Missing {
    x: AlsoMissing
    association Link -> Nowhere
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_UNKNOWN_DATATYPE"), 2);
    assert_eq!(count_code(&loaded.diagnostics, "E_UNKNOWN_TYPE"), 2);
}

#[test]
fn inherited_relations_must_match_exactly() {
    let loaded = load_single(
        "relations",
        r#"
schema Relations

type Target {
    id: UUID primary
}

abstract type Base {
    association Link -> Target ?
}

type Derived : Base {
    association Link -> Target *
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_NARROWING"), 1);
}

#[test]
fn identical_inherited_relations_deduplicate() {
    let loaded = load_single(
        "relations",
        r#"
schema Relations

type Target {
    id: UUID primary
}

abstract type Base {
    association Link -> Target ?
}

type Derived : Base {
    association Link -> Target ?
}
"#,
    );
    assert_eq!(codes(&loaded.diagnostics), Vec::<&str>::new());
    let schema = loaded.schema.expect("identical override should compile");
    let derived = schema.type_named("Derived").unwrap();
    assert_eq!(derived.all_associations().len(), 1);
}

#[test]
fn duplicate_local_declarations_keep_first() {
    let loaded = load_single(
        "dups",
        r#"
schema Dups

datatype Thing = Integer[0,]

type Thing {
    id: UUID primary
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_DUPLICATE_TYPE"), 1);
}

#[test]
fn duplicate_members_are_rejected() {
    let loaded = load_single(
        "dups",
        r#"
schema Dups

type T {
    id: UUID primary
    id: String
}
"#,
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_DUPLICATE_TYPE"), 1);
}

#[test]
fn case_insensitive_lookup_is_cached_at_seal_time() {
    let loaded = load_single(
        "lookup",
        r#"
schema Lookup

type T {
    displayName: String[1, 50]
}
"#,
    );
    let schema = loaded.schema.expect("should compile");
    let t = schema.type_named("T").unwrap();
    assert!(t.property_ignore_case("DISPLAYNAME").is_some());
    assert_eq!(t.canonical_name("displayname"), Some("displayName"));
    assert!(t.property_ignore_case("missing").is_none());
}

#[test]
fn cross_schema_narrowing_violation_points_at_the_ancestor_file() {
    let loaded = load_memory(
        &[
            (
                "child.strata",
                r#"
schema Child

import "parent" as p

type Adult : p.Person {
    age: Integer[0, 200]
}
"#,
            ),
            (
                "parent.strata",
                r#"
schema Parent

abstract type Person {
    age: Integer[0, 150]
}
"#,
            ),
        ],
        Some("child.strata"),
    );
    assert!(loaded.schema.is_none());
    assert_eq!(count_code(&loaded.diagnostics, "E_NARROWING"), 1);
    let diagnostic = loaded
        .diagnostics
        .iter()
        .find(|d| d.code.as_str() == "E_NARROWING")
        .unwrap();
    // related info points into the parent's source document
    let related_source = diagnostic.related[0].span.source.to_string();
    assert!(related_source.contains("parent.strata"));
    // the parent compiled and stays registered
    assert_eq!(loaded.registry.len(), 1);
}
