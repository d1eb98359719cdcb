//! Declaration-level parsers: schema header, imports, datatypes, types and
//! their members.

use crate::constraints::annotated_constraint;
use crate::expressions::expression;
use crate::tokens::{doc_block, identifier, kw, span_from, string_literal, sym, ws};
use crate::{Input, PResult};
use nom::branch::alt;
use nom::combinator::{eof, map, opt};
use nom::multi::{many_till, separated_list1};
use nom::sequence::{pair, preceded};
use strata_syntax::ast::{
    DataTypeDecl, ImportDecl, InvariantDecl, PropertyDecl, RelationDecl, RelationKind,
    SchemaDecl, TypeDecl, TypeRef,
};

/// Parses one complete schema file.
pub fn schema_file(input: Input<'_>) -> PResult<'_, SchemaDecl> {
    let start = input.clone();
    let (input, doc) = doc_block(input)?;
    let (input, _) = kw("schema")(input)?;
    let (input, (name, name_span)) = identifier(input)?;
    let (input, (items, _)) = many_till(schema_item, preceded(ws, eof))(input)?;

    let mut imports = Vec::new();
    let mut data_types = Vec::new();
    let mut types = Vec::new();
    for item in items {
        match item {
            SchemaItem::Import(decl) => imports.push(decl),
            SchemaItem::Data(decl) => data_types.push(decl),
            SchemaItem::Type(decl) => types.push(decl),
        }
    }

    let span = crate::tokens::span_between(&start, &input);
    Ok((
        input,
        SchemaDecl {
            name,
            span,
            name_span,
            doc,
            imports,
            data_types,
            types,
        },
    ))
}

enum SchemaItem {
    Import(ImportDecl),
    Data(DataTypeDecl),
    Type(TypeDecl),
}

fn schema_item(input: Input<'_>) -> PResult<'_, SchemaItem> {
    alt((
        map(import_decl, SchemaItem::Import),
        map(data_type_decl, SchemaItem::Data),
        map(type_decl, SchemaItem::Type),
    ))(input)
}

fn import_decl(input: Input<'_>) -> PResult<'_, ImportDecl> {
    // docs on imports are tolerated and dropped
    let (input, _) = doc_block(input)?;
    let (input, import_kw) = kw("import")(input)?;
    let (input, (path, path_span)) = string_literal(input)?;
    let (input, alias_part) = opt(preceded(kw("as"), identifier))(input)?;
    let (alias, alias_span) = match alias_part {
        Some((name, span)) => (Some(name), Some(span)),
        None => (None, None),
    };
    let span = span_from(&import_kw, &input);
    Ok((
        input,
        ImportDecl {
            path,
            alias,
            span,
            path_span,
            alias_span,
        },
    ))
}

fn data_type_decl(input: Input<'_>) -> PResult<'_, DataTypeDecl> {
    let (input, doc) = doc_block(input)?;
    let (input, datatype_kw) = kw("datatype")(input)?;
    let (input, (name, name_span)) = identifier(input)?;
    let (input, _) = sym("=")(input)?;
    let (input, (constraint, data_type_ref)) = annotated_constraint(input)?;
    let span = span_from(&datatype_kw, &input);
    Ok((
        input,
        DataTypeDecl {
            name,
            constraint,
            data_type_ref,
            span,
            name_span,
            doc,
        },
    ))
}

fn type_decl(input: Input<'_>) -> PResult<'_, TypeDecl> {
    let (input, doc) = doc_block(input)?;
    let (input, abstract_kw) = opt(kw("abstract"))(input)?;
    let (input, part_kw) = opt(kw("part"))(input)?;
    let (input, type_kw) = kw("type")(input)?;
    let head_span = abstract_kw
        .clone()
        .or_else(|| part_kw.clone())
        .unwrap_or_else(|| type_kw.clone());
    let (input, (name, name_span)) = identifier(input)?;
    let (input, inherits) = opt(preceded(
        sym(":"),
        separated_list1(sym(","), type_ref),
    ))(input)?;
    let (input, _) = sym("{")(input)?;
    let (input, (members, close_span)) = many_till(type_member, sym("}"))(input)?;

    let mut properties = Vec::new();
    let mut associations = Vec::new();
    let mut compositions = Vec::new();
    let mut invariants = Vec::new();
    for member in members {
        match member {
            TypeMember::Property(decl) => properties.push(decl),
            TypeMember::Relation(decl) => match decl.kind {
                RelationKind::Association => associations.push(decl),
                RelationKind::Composition => compositions.push(decl),
            },
            TypeMember::Invariant(decl) => invariants.push(decl),
        }
    }

    Ok((
        input,
        TypeDecl {
            name,
            is_abstract: abstract_kw.is_some(),
            is_part: part_kw.is_some(),
            span: head_span.to(&close_span),
            name_span,
            doc,
            inherits: inherits.unwrap_or_default(),
            properties,
            associations,
            compositions,
            invariants,
        },
    ))
}

enum TypeMember {
    Property(PropertyDecl),
    Relation(RelationDecl),
    Invariant(InvariantDecl),
}

fn type_member(input: Input<'_>) -> PResult<'_, TypeMember> {
    alt((
        map(relation_decl, TypeMember::Relation),
        map(invariant_decl, TypeMember::Invariant),
        map(property_decl, TypeMember::Property),
    ))(input)
}

pub fn type_ref(input: Input<'_>) -> PResult<'_, TypeRef> {
    let (input, (first, first_span)) = identifier(input)?;
    let (input, qualified) = opt(preceded(sym("."), identifier))(input)?;
    Ok(match qualified {
        Some((name, name_span)) => (
            input,
            TypeRef {
                qualifier: Some(first),
                name,
                span: first_span.to(&name_span),
            },
        ),
        None => (
            input,
            TypeRef {
                qualifier: None,
                name: first,
                span: first_span,
            },
        ),
    })
}

pub fn property_decl(input: Input<'_>) -> PResult<'_, PropertyDecl> {
    let (input, doc) = doc_block(input)?;
    let (input, optional_kw) = opt(kw("optional"))(input)?;
    let (input, (name, name_span)) = identifier(input)?;
    let (input, _) = sym(":")(input)?;
    let (input, (constraint, data_type_ref)) = annotated_constraint(input)?;
    let (input, primary_kw) = opt(kw("primary"))(input)?;
    let head_span = optional_kw.clone().unwrap_or_else(|| name_span.clone());
    let span = span_from(&head_span, &input);
    Ok((
        input,
        PropertyDecl {
            name,
            constraint,
            data_type_ref,
            optional: optional_kw.is_some(),
            primary: primary_kw.is_some(),
            span,
            name_span,
            doc,
        },
    ))
}

fn relation_decl(input: Input<'_>) -> PResult<'_, RelationDecl> {
    let (input, doc) = doc_block(input)?;
    let (input, (kind, head_span)) = alt((
        map(kw("association"), |span| (RelationKind::Association, span)),
        map(kw("composition"), |span| (RelationKind::Composition, span)),
    ))(input)?;
    let (input, (name, name_span)) = identifier(input)?;
    let (input, _) = sym("->")(input)?;
    let (input, target) = type_ref(input)?;
    let (input, (forward_optional, forward_many)) = cardinality_flags(input)?;
    let (input, backref_part) = opt(preceded(
        kw("backref"),
        pair(identifier, cardinality_flags),
    ))(input)?;
    let (backref, reverse_optional, reverse_many) = match backref_part {
        Some(((backref_name, _), (optional, many))) => (Some(backref_name), optional, many),
        None => (None, false, false),
    };
    // only associations may carry edge properties
    let (input, properties) = if kind == RelationKind::Association {
        let (input, block) = opt(edge_block)(input)?;
        (input, block.unwrap_or_default())
    } else {
        (input, Vec::new())
    };
    let span = span_from(&head_span, &input);
    Ok((
        input,
        RelationDecl {
            kind,
            name,
            target,
            forward_optional,
            forward_many,
            backref,
            reverse_optional,
            reverse_many,
            properties,
            span,
            name_span,
            doc,
        },
    ))
}

fn cardinality_flags(input: Input<'_>) -> PResult<'_, (bool, bool)> {
    let mut optional = false;
    let mut many = false;
    let mut rest = input;
    loop {
        if let Ok((next, _)) = sym("?")(rest.clone()) {
            optional = true;
            rest = next;
            continue;
        }
        if let Ok((next, _)) = sym("*")(rest.clone()) {
            many = true;
            rest = next;
            continue;
        }
        return Ok((rest, (optional, many)));
    }
}

fn edge_block(input: Input<'_>) -> PResult<'_, Vec<PropertyDecl>> {
    let (input, _) = sym("{")(input)?;
    let (input, (properties, _)) = many_till(property_decl, sym("}"))(input)?;
    Ok((input, properties))
}

fn invariant_decl(input: Input<'_>) -> PResult<'_, InvariantDecl> {
    let (input, doc) = doc_block(input)?;
    let (input, invariant_kw) = kw("invariant")(input)?;
    let (input, (name, name_span)) = identifier(input)?;
    let (input, _) = sym(":")(input)?;
    let (input, body) = expression(input)?;
    let span = span_from(&invariant_kw, &input);
    Ok((
        input,
        InvariantDecl {
            name,
            expression: body,
            span,
            name_span,
            doc,
        },
    ))
}
