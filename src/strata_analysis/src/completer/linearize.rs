//! Inheritance linearization.
//!
//! The ancestor order of a type is computed by a left-first walk: at each
//! node the direct parents are appended in declaration order, then each
//! newly seen parent is walked in turn. Deduplication is keep-first, so a
//! diamond contributes each ancestor once. Member collection follows the
//! same order, deduplicating by structural equality and checking that an
//! overriding declaration narrows the one it shadows.

use crate::diagnostics::code::DiagnosticCode;
use crate::diagnostics::collection::DiagnosticCollection;
use crate::diagnostics::diagnostic::Diagnostic;
use crate::model::{Property, Relation, RelationKind, ResolvedTypeRef, Type, TypeId};
use crate::registry::SchemaRegistry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use strata_syntax::source::SourceId;

pub(crate) fn linearize_types(
    source: &SourceId,
    registry: &SchemaRegistry,
    diagnostics: &mut DiagnosticCollection,
    types: &mut [Type],
) {
    let index: HashMap<String, usize> = types
        .iter()
        .enumerate()
        .map(|(i, ty)| (ty.name().to_string(), i))
        .collect();
    let mut reported_cycles: Vec<BTreeSet<TypeId>> = Vec::new();

    let mut results = Vec::with_capacity(types.len());
    for i in 0..types.len() {
        let result = linearize_one(
            source,
            registry,
            diagnostics,
            types,
            &index,
            i,
            &mut reported_cycles,
        );
        results.push(result);
    }
    for (ty, result) in types.iter_mut().zip(results) {
        ty.set_linearized(
            result.supers,
            result.all_properties,
            result.all_associations,
            result.all_compositions,
        );
    }
}

struct Linearized {
    supers: Vec<ResolvedTypeRef>,
    all_properties: Vec<Property>,
    all_associations: Vec<Relation>,
    all_compositions: Vec<Relation>,
}

/// A type seen either locally (still unsealed, same schema) or through the
/// registry (sealed, from an imported schema).
enum TypeView<'v> {
    Local(&'v Type),
    Foreign(Arc<Type>),
}

impl TypeView<'_> {
    fn direct_supers(&self) -> Vec<ResolvedTypeRef> {
        match self {
            TypeView::Local(ty) => ty.direct_supers().to_vec(),
            TypeView::Foreign(ty) => ty.direct_supers().to_vec(),
        }
    }

    fn properties(&self) -> Vec<Property> {
        match self {
            TypeView::Local(ty) => ty.properties().to_vec(),
            TypeView::Foreign(ty) => ty.properties().to_vec(),
        }
    }

    fn relations(&self) -> Vec<(RelationKind, Relation)> {
        let (associations, compositions) = match self {
            TypeView::Local(ty) => (ty.associations(), ty.compositions()),
            TypeView::Foreign(ty) => (ty.associations(), ty.compositions()),
        };
        associations
            .iter()
            .map(|r| (RelationKind::Association, r.clone()))
            .chain(
                compositions
                    .iter()
                    .map(|r| (RelationKind::Composition, r.clone())),
            )
            .collect()
    }
}

fn view_of<'v>(
    source: &SourceId,
    registry: &SchemaRegistry,
    types: &'v [Type],
    index: &HashMap<String, usize>,
    id: &TypeId,
) -> Option<TypeView<'v>> {
    if id.source == *source {
        index.get(&id.name).map(|&i| TypeView::Local(&types[i]))
    } else {
        registry.type_by_id(id).map(TypeView::Foreign)
    }
}

#[allow(clippy::too_many_arguments)]
fn linearize_one(
    source: &SourceId,
    registry: &SchemaRegistry,
    diagnostics: &mut DiagnosticCollection,
    types: &[Type],
    index: &HashMap<String, usize>,
    root_index: usize,
    reported_cycles: &mut Vec<BTreeSet<TypeId>>,
) -> Linearized {
    let root = &types[root_index];
    let root_id = root.id();

    let mut order: Vec<ResolvedTypeRef> = Vec::new();
    let mut seen: HashSet<TypeId> = HashSet::new();
    seen.insert(root_id.clone());
    let mut path: Vec<TypeId> = vec![root_id.clone()];
    collect_supers(
        source,
        registry,
        diagnostics,
        types,
        index,
        root,
        &root_id,
        &root.direct_supers().to_vec(),
        &mut order,
        &mut seen,
        &mut path,
        reported_cycles,
    );

    // own members first, then inherited ones in linearized order
    let mut all_properties: Vec<Property> = root.properties().to_vec();
    let mut property_slots: HashMap<String, usize> = all_properties
        .iter()
        .enumerate()
        .map(|(slot, p)| (p.name().to_string(), slot))
        .collect();
    let mut all_associations: Vec<Relation> = root.associations().to_vec();
    let mut all_compositions: Vec<Relation> = root.compositions().to_vec();
    let mut relation_slots: HashMap<String, (RelationKind, usize)> = HashMap::new();
    for (slot, relation) in all_associations.iter().enumerate() {
        relation_slots.insert(
            relation.name().to_string(),
            (RelationKind::Association, slot),
        );
    }
    for (slot, relation) in all_compositions.iter().enumerate() {
        relation_slots.insert(
            relation.name().to_string(),
            (RelationKind::Composition, slot),
        );
    }

    for ancestor in &order {
        let Some(view) = view_of(source, registry, types, index, &ancestor.id) else {
            continue;
        };

        for inherited in view.properties() {
            match property_slots.get(inherited.name()) {
                None => {
                    if relation_slots.contains_key(inherited.name()) {
                        diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::DuplicateType,
                                root.name_span().clone(),
                                format!(
                                    "property {:?} inherited from {} collides with a relation of the same name",
                                    inherited.name(),
                                    ancestor.id.name
                                ),
                            )
                            .with_related(inherited.span().clone(), "inherited declaration is here")
                            .with_detail("name", inherited.name()),
                        );
                        continue;
                    }
                    property_slots.insert(inherited.name().to_string(), all_properties.len());
                    all_properties.push(inherited);
                }
                Some(&slot) => {
                    let existing = &all_properties[slot];
                    if existing.structurally_equal(&inherited) {
                        // same declaration reached through another path
                        continue;
                    }
                    if !existing.can_narrow_from(&inherited) {
                        diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::Narrowing,
                                existing.span().clone(),
                                format!(
                                    "property {:?} does not narrow the declaration inherited from {}",
                                    inherited.name(),
                                    ancestor.id.name
                                ),
                            )
                            .with_related(
                                inherited.span().clone(),
                                format!("inherited from {} here", ancestor.id.name),
                            )
                            .with_detail("property", inherited.name())
                            .with_detail("inheritedFrom", &ancestor.id.name),
                        );
                    }
                }
            }
        }

        for (kind, inherited) in view.relations() {
            match relation_slots.get(inherited.name()) {
                None => {
                    if property_slots.contains_key(inherited.name()) {
                        diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::DuplicateType,
                                root.name_span().clone(),
                                format!(
                                    "relation {:?} inherited from {} collides with a property of the same name",
                                    inherited.name(),
                                    ancestor.id.name
                                ),
                            )
                            .with_related(inherited.span().clone(), "inherited declaration is here")
                            .with_detail("name", inherited.name()),
                        );
                        continue;
                    }
                    let name = inherited.name().to_string();
                    match kind {
                        RelationKind::Association => {
                            relation_slots.insert(name, (kind, all_associations.len()));
                            all_associations.push(inherited);
                        }
                        RelationKind::Composition => {
                            relation_slots.insert(name, (kind, all_compositions.len()));
                            all_compositions.push(inherited);
                        }
                    }
                }
                Some(&(existing_kind, slot)) => {
                    if existing_kind != kind {
                        diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::DuplicateType,
                                root.name_span().clone(),
                                format!(
                                    "relation {:?} is declared as both an association and a composition in the hierarchy",
                                    inherited.name()
                                ),
                            )
                            .with_related(inherited.span().clone(), "conflicting declaration is here")
                            .with_detail("name", inherited.name()),
                        );
                        continue;
                    }
                    let existing = match existing_kind {
                        RelationKind::Association => &all_associations[slot],
                        RelationKind::Composition => &all_compositions[slot],
                    };
                    if !existing.structurally_equal(&inherited) {
                        // relations cannot be narrowed, only repeated verbatim
                        diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::Narrowing,
                                existing.span().clone(),
                                format!(
                                    "relation {:?} must match the declaration inherited from {}",
                                    inherited.name(),
                                    ancestor.id.name
                                ),
                            )
                            .with_related(
                                inherited.span().clone(),
                                format!("inherited from {} here", ancestor.id.name),
                            )
                            .with_detail("relation", inherited.name())
                            .with_detail("inheritedFrom", &ancestor.id.name),
                        );
                    }
                }
            }
        }
    }

    Linearized {
        supers: order,
        all_properties,
        all_associations,
        all_compositions,
    }
}

#[allow(clippy::too_many_arguments)]
fn collect_supers(
    source: &SourceId,
    registry: &SchemaRegistry,
    diagnostics: &mut DiagnosticCollection,
    types: &[Type],
    index: &HashMap<String, usize>,
    root: &Type,
    root_id: &TypeId,
    supers: &[ResolvedTypeRef],
    order: &mut Vec<ResolvedTypeRef>,
    seen: &mut HashSet<TypeId>,
    path: &mut Vec<TypeId>,
    reported_cycles: &mut Vec<BTreeSet<TypeId>>,
) {
    let mut newly: Vec<ResolvedTypeRef> = Vec::new();
    for super_ref in supers {
        if super_ref.id == *root_id {
            report_cycle(diagnostics, root, path, reported_cycles);
            continue;
        }
        if seen.insert(super_ref.id.clone()) {
            order.push(super_ref.clone());
            newly.push(super_ref.clone());
        }
    }
    for super_ref in newly {
        let Some(view) = view_of(source, registry, types, index, &super_ref.id) else {
            continue;
        };
        let next_supers = view.direct_supers();
        path.push(super_ref.id.clone());
        collect_supers(
            source,
            registry,
            diagnostics,
            types,
            index,
            root,
            root_id,
            &next_supers,
            order,
            seen,
            path,
            reported_cycles,
        );
        path.pop();
    }
}

fn report_cycle(
    diagnostics: &mut DiagnosticCollection,
    root: &Type,
    path: &[TypeId],
    reported_cycles: &mut Vec<BTreeSet<TypeId>>,
) {
    let members: BTreeSet<TypeId> = path.iter().cloned().collect();
    if reported_cycles.contains(&members) {
        return;
    }
    let chain = path
        .iter()
        .map(|id| id.name.clone())
        .collect::<Vec<_>>()
        .join(" -> ");
    diagnostics.add(
        Diagnostic::error(
            DiagnosticCode::InheritanceCycle,
            root.name_span().clone(),
            format!("inheritance cycle: {chain} -> {}", root.name()),
        )
        .with_detail("type", root.name()),
    );
    reported_cycles.push(members);
}
