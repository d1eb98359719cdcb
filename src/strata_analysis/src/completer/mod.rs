//! The completer: turns a parse model plus resolved imports into IR
//! entities ready for sealing.
//!
//! Stages run in a fixed order: local-name checks, the datatype pass, type
//! skeletons, alias resolution, reference resolution, inheritance
//! linearization with narrowing checks, and (driven by the loader after
//! sealing) subtype back-wiring and the cross-schema cycle check.

mod linearize;

pub(crate) use linearize::linearize_types;

use crate::diagnostics::code::DiagnosticCode;
use crate::diagnostics::collection::DiagnosticCollection;
use crate::diagnostics::diagnostic::Diagnostic;
use crate::model::{
    DataType, Invariant, Property, PropertyScope, Relation, RelationKind, ResolvedTypeRef,
    Schema, Type, TypeId,
};
use crate::registry::SchemaRegistry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use strata_syntax::ast::{PropertyDecl, RelationDecl, SchemaDecl, TypeDecl, TypeRef};
use strata_syntax::constraint::Constraint;
use strata_syntax::source::{SourceId, Span};

/// One successfully loaded import, keyed by alias in the frame.
pub(crate) struct ResolvedImport {
    pub source: SourceId,
    pub schema: Arc<Schema>,
    pub span: Span,
}

/// Per-invocation import resolution table: alias to imported schema.
pub(crate) type ImportFrame = HashMap<String, ResolvedImport>;

/// Completion output, still unsealed; the loader seals and assembles the
/// Schema once the error gate passes.
pub(crate) struct Completed {
    pub types: Vec<Type>,
    pub data_types: Vec<DataType>,
}

pub(crate) fn complete(
    decl: &SchemaDecl,
    source: &SourceId,
    frame: &ImportFrame,
    registry: &SchemaRegistry,
    diagnostics: &mut DiagnosticCollection,
) -> Completed {
    Completer {
        source,
        frame,
        registry,
        diagnostics,
        reported_alias_cycles: Vec::new(),
    }
    .run(decl)
}

struct Completer<'a> {
    source: &'a SourceId,
    frame: &'a ImportFrame,
    registry: &'a SchemaRegistry,
    diagnostics: &'a mut DiagnosticCollection,
    reported_alias_cycles: Vec<BTreeSet<String>>,
}

impl Completer<'_> {
    fn run(mut self, decl: &SchemaDecl) -> Completed {
        let kept = self.check_local_names(decl);

        // datatype pass: alias constraints stay unresolved for now
        let mut data_types: Vec<DataType> = decl
            .data_types
            .iter()
            .filter(|dt| kept.contains(dt.name.as_str()))
            .map(|dt| {
                DataType::new(
                    &dt.name,
                    &decl.name,
                    self.source.clone(),
                    dt.span.clone(),
                    dt.name_span.clone(),
                    dt.doc.clone(),
                    dt.constraint.clone(),
                )
            })
            .collect();

        // type skeleton pass
        let mut types: Vec<Type> = Vec::new();
        for ty in &decl.types {
            if kept.contains(ty.name.as_str()) {
                let skeleton = self.build_type_skeleton(decl, ty);
                types.push(skeleton);
            }
        }

        // alias resolution through the original constraint table, so chains
        // and cycles are chased per use site
        let alias_table: HashMap<String, Constraint> = decl
            .data_types
            .iter()
            .filter(|dt| kept.contains(dt.name.as_str()))
            .map(|dt| (dt.name.clone(), dt.constraint.clone()))
            .collect();
        {
            let mut resolver = ConstraintResolver {
                frame: self.frame,
                diagnostics: &mut *self.diagnostics,
                reported_alias_cycles: &mut self.reported_alias_cycles,
                table: &alias_table,
            };
            for data_type in &mut data_types {
                let site = data_type.span().clone();
                resolver.resolve_fresh(data_type.constraint_mut(), &site);
            }
            for ty in &mut types {
                let sites: Vec<Span> =
                    ty.properties().iter().map(|p| p.span().clone()).collect();
                for (property, site) in ty.properties_mut().iter_mut().zip(sites) {
                    resolver.resolve_fresh(property.constraint_mut(), &site);
                }
                for relation in ty.associations_mut() {
                    let sites: Vec<Span> = relation
                        .properties()
                        .iter()
                        .map(|p| p.span().clone())
                        .collect();
                    for (property, site) in relation.properties_mut().iter_mut().zip(sites) {
                        resolver.resolve_fresh(property.constraint_mut(), &site);
                    }
                }
            }
        }

        // reference resolution: extends clauses and relation targets
        let local_types: HashSet<String> =
            types.iter().map(|ty| ty.name().to_string()).collect();
        for ty in &mut types {
            let inherits: Vec<TypeRef> = ty.inherits().to_vec();
            let mut supers = Vec::with_capacity(inherits.len());
            for reference in &inherits {
                if let Some(id) = resolve_type_ref(
                    self.source,
                    self.frame,
                    self.diagnostics,
                    reference,
                    &local_types,
                ) {
                    supers.push(ResolvedTypeRef::new(reference.clone(), id));
                }
            }
            ty.set_direct_supers(supers);

            for pass in 0..2 {
                let relations = if pass == 0 {
                    ty.associations_mut()
                } else {
                    ty.compositions_mut()
                };
                for relation in relations {
                    let target = relation.target().clone();
                    if let Some(id) = resolve_type_ref(
                        self.source,
                        self.frame,
                        self.diagnostics,
                        &target,
                        &local_types,
                    ) {
                        relation.set_target_id(id);
                    }
                }
            }
        }

        // inheritance linearization + narrowing checks
        linearize_types(self.source, self.registry, self.diagnostics, &mut types);

        Completed { types, data_types }
    }

    /// Unique local names across types and datatypes; later duplicates are
    /// dropped (keep-first) after reporting.
    fn check_local_names(&mut self, decl: &SchemaDecl) -> HashSet<String> {
        let mut first_seen: HashMap<&str, (&'static str, &Span)> = HashMap::new();
        let mut kept: HashSet<String> = HashSet::new();
        let declared = decl
            .data_types
            .iter()
            .map(|dt| (dt.name.as_str(), "datatype", &dt.name_span))
            .chain(
                decl.types
                    .iter()
                    .map(|ty| (ty.name.as_str(), "type", &ty.name_span)),
            );
        for (name, kind, span) in declared {
            match first_seen.get(name) {
                Some((first_kind, first_span)) => {
                    self.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::DuplicateType,
                            span.clone(),
                            format!(
                                "{kind} {name:?} collides with a {first_kind} of the same name"
                            ),
                        )
                        .with_related((*first_span).clone(), "first declared here")
                        .with_detail("name", name),
                    );
                }
                None => {
                    first_seen.insert(name, (kind, span));
                    kept.insert(name.to_string());
                }
            }
        }
        kept
    }

    fn build_type_skeleton(&mut self, schema: &SchemaDecl, decl: &TypeDecl) -> Type {
        let scope_ref = TypeRef {
            qualifier: None,
            name: decl.name.clone(),
            span: decl.name_span.clone(),
        };

        let mut member_spans: HashMap<String, Span> = HashMap::new();
        let mut properties = Vec::new();
        for property in &decl.properties {
            if self.member_collides(&mut member_spans, &property.name, &property.name_span) {
                continue;
            }
            properties.push(build_property(
                property,
                PropertyScope::Type(scope_ref.clone()),
            ));
        }

        let mut associations = Vec::new();
        let mut compositions = Vec::new();
        for relation in decl.associations.iter().chain(&decl.compositions) {
            if self.member_collides(&mut member_spans, &relation.name, &relation.name_span) {
                continue;
            }
            let built = self.build_relation(&decl.name, relation);
            match built.kind() {
                RelationKind::Association => associations.push(built),
                RelationKind::Composition => compositions.push(built),
            }
        }

        let mut invariant_spans: HashMap<String, Span> = HashMap::new();
        let mut invariants = Vec::new();
        for invariant in &decl.invariants {
            if self.member_collides(&mut invariant_spans, &invariant.name, &invariant.name_span)
            {
                continue;
            }
            invariants.push(Invariant::new(
                &invariant.name,
                invariant.expression.clone(),
                invariant.span.clone(),
                invariant.doc.clone(),
            ));
        }

        Type::new(
            &decl.name,
            self.source.clone(),
            &schema.name,
            decl.span.clone(),
            decl.name_span.clone(),
            decl.doc.clone(),
            decl.is_abstract,
            decl.is_part,
            properties,
            associations,
            compositions,
            invariants,
            decl.inherits.clone(),
        )
    }

    fn member_collides(
        &mut self,
        seen: &mut HashMap<String, Span>,
        name: &str,
        span: &Span,
    ) -> bool {
        if let Some(first) = seen.get(name) {
            self.diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::DuplicateType,
                    span.clone(),
                    format!("member {name:?} is declared more than once"),
                )
                .with_related(first.clone(), "first declared here")
                .with_detail("name", name),
            );
            return true;
        }
        seen.insert(name.to_string(), span.clone());
        false
    }

    fn build_relation(&mut self, owner: &str, decl: &RelationDecl) -> Relation {
        let mut edge_spans: HashMap<String, Span> = HashMap::new();
        let mut edge_properties = Vec::new();
        for property in &decl.properties {
            if self.member_collides(&mut edge_spans, &property.name, &property.name_span) {
                continue;
            }
            edge_properties.push(build_property(
                property,
                PropertyScope::Relation(decl.name.clone()),
            ));
        }
        Relation::new(
            decl.kind,
            &decl.name,
            decl.target.clone(),
            decl.forward_optional,
            decl.forward_many,
            decl.backref.clone(),
            decl.reverse_optional,
            decl.reverse_many,
            owner,
            edge_properties,
            decl.span.clone(),
            decl.doc.clone(),
        )
    }
}

fn build_property(decl: &PropertyDecl, scope: PropertyScope) -> Property {
    Property::new(
        &decl.name,
        decl.span.clone(),
        decl.doc.clone(),
        decl.constraint.clone(),
        decl.data_type_ref.clone(),
        decl.optional,
        decl.primary,
        scope,
    )
}

/// Resolves a syntactic type reference to an identity: unqualified names
/// are local, qualified names go through the import frame.
pub(crate) fn resolve_type_ref(
    source: &SourceId,
    frame: &ImportFrame,
    diagnostics: &mut DiagnosticCollection,
    reference: &TypeRef,
    local_types: &HashSet<String>,
) -> Option<TypeId> {
    match &reference.qualifier {
        None => {
            if local_types.contains(&reference.name) {
                Some(TypeId::new(source.clone(), reference.name.clone()))
            } else {
                diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::UnknownType,
                        reference.span.clone(),
                        format!("unknown type {:?}", reference.name),
                    )
                    .with_detail("name", &reference.name),
                );
                None
            }
        }
        Some(qualifier) => {
            let Some(import) = frame.get(qualifier) else {
                diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::UnknownType,
                        reference.span.clone(),
                        format!("unknown import alias {qualifier:?} in reference {reference}"),
                    )
                    .with_detail("alias", qualifier),
                );
                return None;
            };
            match import.schema.type_named(&reference.name) {
                Some(ty) => Some(ty.id()),
                None => {
                    diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::UnknownType,
                            reference.span.clone(),
                            format!(
                                "schema {:?} has no type {:?}",
                                import.schema.name(),
                                reference.name
                            ),
                        )
                        .with_detail("alias", qualifier)
                        .with_detail("name", &reference.name),
                    );
                    None
                }
            }
        }
    }
}

/// Alias-chain resolution with a shared visited set for cycle safety.
struct ConstraintResolver<'a> {
    frame: &'a ImportFrame,
    diagnostics: &'a mut DiagnosticCollection,
    reported_alias_cycles: &'a mut Vec<BTreeSet<String>>,
    table: &'a HashMap<String, Constraint>,
}

impl ConstraintResolver<'_> {
    fn resolve_fresh(&mut self, constraint: &mut Constraint, site: &Span) {
        let mut visiting = Vec::new();
        self.resolve(constraint, site, &mut visiting);
    }

    fn resolve(&mut self, constraint: &mut Constraint, site: &Span, visiting: &mut Vec<String>) {
        match constraint {
            Constraint::Alias {
                data_type_name,
                resolved,
            } if resolved.is_none() => {
                let name = data_type_name.clone();
                if let Some(target) = self.chase(&name, site, visiting) {
                    *resolved = Some(Box::new(target));
                }
            }
            Constraint::List { element, .. } => self.resolve(element, site, visiting),
            _ => {}
        }
    }

    fn chase(&mut self, name: &str, site: &Span, visiting: &mut Vec<String>) -> Option<Constraint> {
        if visiting.iter().any(|seen| seen == name) {
            self.report_cycle(name, site, visiting);
            return None;
        }
        visiting.push(name.to_string());
        let result = self.chase_target(name, site, visiting);
        visiting.pop();
        result
    }

    fn chase_target(
        &mut self,
        name: &str,
        site: &Span,
        visiting: &mut Vec<String>,
    ) -> Option<Constraint> {
        let target = match name.split_once('.') {
            Some((qualifier, data_type)) => {
                let Some(import) = self.frame.get(qualifier) else {
                    self.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::UnknownDataType,
                            site.clone(),
                            format!(
                                "unknown import alias {qualifier:?} in datatype reference {name:?}"
                            ),
                        )
                        .with_detail("alias", qualifier),
                    );
                    return None;
                };
                match import.schema.data_type_named(data_type) {
                    // cross-schema datatypes come from sealed schemas and
                    // are already resolved
                    Some(dt) => dt.constraint().clone(),
                    None => {
                        self.diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::UnknownDataType,
                                site.clone(),
                                format!(
                                    "schema {:?} has no datatype {:?}",
                                    import.schema.name(),
                                    data_type
                                ),
                            )
                            .with_detail("alias", qualifier)
                            .with_detail("name", data_type),
                        );
                        return None;
                    }
                }
            }
            None => match self.table.get(name) {
                Some(constraint) => constraint.clone(),
                None => {
                    self.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::UnknownDataType,
                            site.clone(),
                            format!("unknown datatype {name:?}"),
                        )
                        .with_detail("name", name),
                    );
                    return None;
                }
            },
        };
        match target {
            Constraint::Alias {
                data_type_name,
                resolved: Some(inner),
            } => Some(Constraint::Alias {
                data_type_name,
                resolved: Some(inner),
            }),
            Constraint::Alias {
                data_type_name,
                resolved: None,
            } => {
                let next = data_type_name.clone();
                self.chase(&next, site, visiting).map(|terminal| Constraint::Alias {
                    data_type_name,
                    resolved: Some(Box::new(terminal)),
                })
            }
            mut other => {
                // a local datatype may nest aliases inside lists
                self.resolve(&mut other, site, visiting);
                Some(other)
            }
        }
    }

    fn report_cycle(&mut self, name: &str, site: &Span, visiting: &[String]) {
        let start = visiting.iter().position(|seen| seen == name).unwrap_or(0);
        let members: BTreeSet<String> = visiting[start..].iter().cloned().collect();
        if self.reported_alias_cycles.contains(&members) {
            return;
        }
        let chain = visiting[start..].join(" -> ");
        self.diagnostics.add(
            Diagnostic::error(
                DiagnosticCode::UnknownDataType,
                site.clone(),
                format!("circular datatype alias chain: {chain} -> {name}"),
            )
            .with_detail("dataType", name),
        );
        self.reported_alias_cycles.push(members);
    }
}

/// Appends each type to the subtype list of every resolved supertype, local
/// or registered. Runs after sealing: the subtype list is the one sanctioned
/// post-seal mutation.
pub(crate) fn wire_sub_types(types: &[Arc<Type>], registry: &SchemaRegistry) {
    let local: HashMap<TypeId, &Arc<Type>> = types.iter().map(|ty| (ty.id(), ty)).collect();
    for ty in types {
        let child = ResolvedTypeRef::new(
            TypeRef {
                qualifier: None,
                name: ty.name().to_string(),
                span: ty.name_span().clone(),
            },
            ty.id(),
        );
        for super_ref in ty.super_types() {
            if let Some(parent) = local.get(&super_ref.id) {
                parent.add_sub_type(child.clone());
            } else if let Some(parent) = registry.type_by_id(&super_ref.id) {
                parent.add_sub_type(child.clone());
            }
        }
    }
}

/// Global supertype-graph cycle check across every registered schema.
/// Returns true when a cycle was found (and reported).
pub fn detect_cross_schema_cycles(
    registry: &SchemaRegistry,
    diagnostics: &mut DiagnosticCollection,
) -> bool {
    use petgraph::graph::{DiGraph, NodeIndex};

    let mut graph: DiGraph<TypeId, ()> = DiGraph::new();
    let mut nodes: HashMap<TypeId, NodeIndex> = HashMap::new();
    let schemas = registry.all();
    for schema in &schemas {
        for ty in schema.types() {
            let id = ty.id();
            let node = graph.add_node(id.clone());
            nodes.insert(id, node);
        }
    }
    for schema in &schemas {
        for ty in schema.types() {
            let from = nodes[&ty.id()];
            for super_ref in ty.direct_supers() {
                if let Some(&to) = nodes.get(&super_ref.id) {
                    graph.add_edge(from, to, ());
                }
            }
        }
    }

    let mut found = false;
    for component in petgraph::algo::tarjan_scc(&graph) {
        let is_cycle = component.len() > 1
            || component
                .iter()
                .any(|&node| graph.find_edge(node, node).is_some());
        if !is_cycle {
            continue;
        }
        found = true;
        let mut members: Vec<TypeId> =
            component.iter().map(|&node| graph[node].clone()).collect();
        members.sort();
        let chain = members
            .iter()
            .map(|id| id.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let span = registry
            .type_by_id(&members[0])
            .map(|ty| ty.name_span().clone())
            .unwrap_or_default();
        diagnostics.add(
            Diagnostic::error(
                DiagnosticCode::InheritanceCycle,
                span,
                format!("inheritance cycle across schemas involving: {chain}"),
            )
            .with_detail("types", chain.clone()),
        );
    }
    found
}
