//! Position-based and name-based lookups over the sealed IR, for editor
//! tooling: go-to-definition, outlines and hover resolution.

use crate::model::Schema;
use crate::registry::SchemaRegistry;
use serde::Serialize;
use strata_syntax::source::{Position, SourceId, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    Schema,
    Type,
    DataType,
    Property,
    Association,
    Composition,
    Invariant,
}

/// One named declaration, flattened for tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolInfo {
    pub kind: SymbolKind,
    pub name: String,
    /// Owning type for members, empty for top-level declarations.
    pub container: String,
    pub schema: String,
    pub span: Span,
}

impl SymbolInfo {
    fn top_level(kind: SymbolKind, name: &str, schema: &str, span: &Span) -> Self {
        SymbolInfo {
            kind,
            name: name.to_string(),
            container: String::new(),
            schema: schema.to_string(),
            span: span.clone(),
        }
    }

    fn member(kind: SymbolKind, name: &str, container: &str, schema: &str, span: &Span) -> Self {
        SymbolInfo {
            kind,
            name: name.to_string(),
            container: container.to_string(),
            schema: schema.to_string(),
            span: span.clone(),
        }
    }
}

/// The innermost declaration containing the position, if any.
pub fn symbol_at(
    registry: &SchemaRegistry,
    source: &SourceId,
    position: &Position,
) -> Option<SymbolInfo> {
    let schema = registry.by_source_id(source)?;
    for data_type in schema.data_types() {
        if data_type.span().contains(position) {
            return Some(SymbolInfo::top_level(
                SymbolKind::DataType,
                data_type.name(),
                schema.name(),
                data_type.span(),
            ));
        }
    }
    for ty in schema.types() {
        if !ty.span().contains(position) {
            continue;
        }
        for property in ty.properties() {
            if property.span().contains(position) {
                return Some(SymbolInfo::member(
                    SymbolKind::Property,
                    property.name(),
                    ty.name(),
                    schema.name(),
                    property.span(),
                ));
            }
        }
        for relation in ty.associations() {
            if relation.span().contains(position) {
                // an edge property is more specific than its relation
                for property in relation.properties() {
                    if property.span().contains(position) {
                        return Some(SymbolInfo::member(
                            SymbolKind::Property,
                            property.name(),
                            ty.name(),
                            schema.name(),
                            property.span(),
                        ));
                    }
                }
                return Some(SymbolInfo::member(
                    SymbolKind::Association,
                    relation.name(),
                    ty.name(),
                    schema.name(),
                    relation.span(),
                ));
            }
        }
        for relation in ty.compositions() {
            if relation.span().contains(position) {
                return Some(SymbolInfo::member(
                    SymbolKind::Composition,
                    relation.name(),
                    ty.name(),
                    schema.name(),
                    relation.span(),
                ));
            }
        }
        for invariant in ty.invariants() {
            if invariant.span().contains(position) {
                return Some(SymbolInfo::member(
                    SymbolKind::Invariant,
                    invariant.name(),
                    ty.name(),
                    schema.name(),
                    invariant.span(),
                ));
            }
        }
        return Some(SymbolInfo::top_level(
            SymbolKind::Type,
            ty.name(),
            schema.name(),
            ty.span(),
        ));
    }
    None
}

/// Flat outline of a schema's declarations, in source order.
pub fn declarations_in(schema: &Schema) -> Vec<SymbolInfo> {
    let mut symbols = Vec::new();
    for data_type in schema.data_types() {
        symbols.push(SymbolInfo::top_level(
            SymbolKind::DataType,
            data_type.name(),
            schema.name(),
            data_type.span(),
        ));
    }
    for ty in schema.types() {
        symbols.push(SymbolInfo::top_level(
            SymbolKind::Type,
            ty.name(),
            schema.name(),
            ty.span(),
        ));
        for property in ty.properties() {
            symbols.push(SymbolInfo::member(
                SymbolKind::Property,
                property.name(),
                ty.name(),
                schema.name(),
                property.span(),
            ));
        }
        for relation in ty.associations() {
            symbols.push(SymbolInfo::member(
                SymbolKind::Association,
                relation.name(),
                ty.name(),
                schema.name(),
                relation.span(),
            ));
        }
        for relation in ty.compositions() {
            symbols.push(SymbolInfo::member(
                SymbolKind::Composition,
                relation.name(),
                ty.name(),
                schema.name(),
                relation.span(),
            ));
        }
        for invariant in ty.invariants() {
            symbols.push(SymbolInfo::member(
                SymbolKind::Invariant,
                invariant.name(),
                ty.name(),
                schema.name(),
                invariant.span(),
            ));
        }
    }
    symbols.sort_by_key(|symbol| symbol.span.start.byte);
    symbols
}

/// Case-insensitive name lookup across every registered schema. Member
/// matches go through the canonical-name maps cached at seal time.
pub fn find_by_name(registry: &SchemaRegistry, name: &str) -> Vec<SymbolInfo> {
    let needle = name.to_lowercase();
    let mut matches = Vec::new();
    for schema in registry.all() {
        for data_type in schema.data_types() {
            if data_type.name().to_lowercase() == needle {
                matches.push(SymbolInfo::top_level(
                    SymbolKind::DataType,
                    data_type.name(),
                    schema.name(),
                    data_type.name_span(),
                ));
            }
        }
        for ty in schema.types() {
            if ty.name().to_lowercase() == needle {
                matches.push(SymbolInfo::top_level(
                    SymbolKind::Type,
                    ty.name(),
                    schema.name(),
                    ty.name_span(),
                ));
            }
            let Some(declared) = ty.canonical_name(&needle) else {
                continue;
            };
            if let Some(property) = ty.property(declared) {
                matches.push(SymbolInfo::member(
                    SymbolKind::Property,
                    property.name(),
                    ty.name(),
                    schema.name(),
                    property.span(),
                ));
                continue;
            }
            for relation in ty.all_associations() {
                if relation.name() == declared {
                    matches.push(SymbolInfo::member(
                        SymbolKind::Association,
                        relation.name(),
                        ty.name(),
                        schema.name(),
                        relation.span(),
                    ));
                }
            }
            for relation in ty.all_compositions() {
                if relation.name() == declared {
                    matches.push(SymbolInfo::member(
                        SymbolKind::Composition,
                        relation.name(),
                        ty.name(),
                        schema.name(),
                        relation.span(),
                    ));
                }
            }
        }
    }
    matches
}
