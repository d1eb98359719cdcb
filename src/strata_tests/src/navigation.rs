use crate::support::load_single;
use strata_analysis::navigation::{SymbolKind, declarations_in, find_by_name, symbol_at};

const LIBRARY: &str = r#"
schema Library

datatype Email = Pattern("^[^@]+@[^@]+$")

type Author {
    id: UUID primary
    displayName: String[1, 80]
    association Wrote -> Book * {
        royalty: Float[0.0, 1.0]
    }
    invariant HasName: len(displayName) > 0
}

type Book {
    id: UUID primary
}
"#;

#[test]
fn symbol_at_returns_the_innermost_declaration() {
    let loaded = load_single("nav", LIBRARY);
    let schema = loaded.schema.expect("library should compile");
    let source = schema.source().clone();

    let author = schema.type_named("Author").unwrap();
    let display_name = author.property("displayName").unwrap();
    let inside_property = loaded
        .sources
        .position_at(&source, display_name.span().start.byte + 2);
    let symbol = symbol_at(&loaded.registry, &source, &inside_property).unwrap();
    assert_eq!(symbol.kind, SymbolKind::Property);
    assert_eq!(symbol.name, "displayName");
    assert_eq!(symbol.container, "Author");

    let wrote = &author.associations()[0];
    let at_relation = loaded
        .sources
        .position_at(&source, wrote.span().start.byte + 1);
    let symbol = symbol_at(&loaded.registry, &source, &at_relation).unwrap();
    assert_eq!(symbol.kind, SymbolKind::Association);
    assert_eq!(symbol.name, "Wrote");

    // inside the edge block, the edge property wins over the relation
    let royalty = &wrote.properties()[0];
    let at_edge = loaded
        .sources
        .position_at(&source, royalty.span().start.byte + 1);
    let symbol = symbol_at(&loaded.registry, &source, &at_edge).unwrap();
    assert_eq!(symbol.kind, SymbolKind::Property);
    assert_eq!(symbol.name, "royalty");

    // a position outside every declaration
    let at_start = loaded.sources.position_at(&source, 0);
    assert!(symbol_at(&loaded.registry, &source, &at_start).is_none());
}

#[test]
fn outlines_list_declarations_in_source_order() {
    let loaded = load_single("nav", LIBRARY);
    let schema = loaded.schema.expect("library should compile");
    let symbols = declarations_in(&schema);
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Email",
            "Author",
            "id",
            "displayName",
            "Wrote",
            "HasName",
            "Book",
            "id"
        ]
    );
    assert_eq!(symbols[0].kind, SymbolKind::DataType);
    assert_eq!(symbols[1].kind, SymbolKind::Type);
}

#[test]
fn find_by_name_is_case_insensitive() {
    let loaded = load_single("nav", LIBRARY);
    assert!(loaded.schema.is_some());

    let types = find_by_name(&loaded.registry, "book");
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].kind, SymbolKind::Type);
    assert_eq!(types[0].name, "Book");

    let properties = find_by_name(&loaded.registry, "DISPLAYNAME");
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].container, "Author");

    let relations = find_by_name(&loaded.registry, "wrote");
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].kind, SymbolKind::Association);

    assert!(find_by_name(&loaded.registry, "nothing").is_empty());
}
