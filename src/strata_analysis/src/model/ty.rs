use crate::model::ids::{ResolvedTypeRef, TypeId};
use crate::model::invariant::Invariant;
use crate::model::property::Property;
use crate::model::relation::Relation;
use std::collections::HashMap;
use std::sync::RwLock;
use strata_syntax::ast::TypeRef;
use strata_syntax::source::{SourceId, Span};

/// A named record type.
///
/// "Own" members are the ones declared in the body; "all" members add the
/// inherited ones in linearized order. `sub_types` is behind a lock because
/// subtype back-wiring legally appends to a parent that was sealed when an
/// earlier schema finished loading; every other field is frozen at seal
/// time.
#[derive(Debug)]
pub struct Type {
    name: String,
    source: SourceId,
    schema_name: String,
    span: Span,
    name_span: Span,
    doc: Option<String>,
    is_abstract: bool,
    is_part: bool,
    properties: Vec<Property>,
    associations: Vec<Relation>,
    compositions: Vec<Relation>,
    invariants: Vec<Invariant>,
    inherits: Vec<TypeRef>,
    direct_supers: Vec<ResolvedTypeRef>,
    super_types: Vec<ResolvedTypeRef>,
    sub_types: RwLock<Vec<ResolvedTypeRef>>,
    all_properties: Vec<Property>,
    all_associations: Vec<Relation>,
    all_compositions: Vec<Relation>,
    primary_keys: Vec<Property>,
    canonical_names: HashMap<String, String>,
    property_index: HashMap<String, usize>,
    sealed: bool,
}

impl Type {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: impl Into<String>,
        source: SourceId,
        schema_name: impl Into<String>,
        span: Span,
        name_span: Span,
        doc: Option<String>,
        is_abstract: bool,
        is_part: bool,
        properties: Vec<Property>,
        associations: Vec<Relation>,
        compositions: Vec<Relation>,
        invariants: Vec<Invariant>,
        inherits: Vec<TypeRef>,
    ) -> Self {
        Type {
            name: name.into(),
            source,
            schema_name: schema_name.into(),
            span,
            name_span,
            doc,
            is_abstract,
            is_part,
            properties,
            associations,
            compositions,
            invariants,
            inherits,
            direct_supers: Vec::new(),
            super_types: Vec::new(),
            sub_types: RwLock::new(Vec::new()),
            all_properties: Vec::new(),
            all_associations: Vec::new(),
            all_compositions: Vec::new(),
            primary_keys: Vec::new(),
            canonical_names: HashMap::new(),
            property_index: HashMap::new(),
            sealed: false,
        }
    }

    pub fn id(&self) -> TypeId {
        TypeId::new(self.source.clone(), self.name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn name_span(&self) -> &Span {
        &self.name_span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_part(&self) -> bool {
        self.is_part
    }

    /// Properties declared in this type's body.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn associations(&self) -> &[Relation] {
        &self.associations
    }

    pub fn compositions(&self) -> &[Relation] {
        &self.compositions
    }

    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Syntactic extends clause, in declaration order.
    pub fn inherits(&self) -> &[TypeRef] {
        &self.inherits
    }

    /// Resolved direct parents, in declaration order.
    pub fn direct_supers(&self) -> &[ResolvedTypeRef] {
        &self.direct_supers
    }

    /// All ancestors in linearized order (left-first, keep-first).
    pub fn super_types(&self) -> &[ResolvedTypeRef] {
        &self.super_types
    }

    /// Known subtypes, as recorded by back-wiring. Defensive copy: the list
    /// keeps growing as later schemas load.
    pub fn sub_types(&self) -> Vec<ResolvedTypeRef> {
        self.sub_types
            .read()
            .expect("subtype list poisoned")
            .clone()
    }

    /// Own plus inherited properties in linearized order.
    pub fn all_properties(&self) -> &[Property] {
        &self.all_properties
    }

    pub fn all_associations(&self) -> &[Relation] {
        &self.all_associations
    }

    pub fn all_compositions(&self) -> &[Relation] {
        &self.all_compositions
    }

    /// Primary-key properties, in `all_properties` order.
    pub fn primary_keys(&self) -> &[Property] {
        &self.primary_keys
    }

    /// O(1) lookup over own plus inherited properties.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.property_index
            .get(name)
            .map(|&index| &self.all_properties[index])
    }

    /// Case-insensitive property lookup for editor tooling; the lowercase
    /// map is cached at seal time.
    pub fn property_ignore_case(&self, name: &str) -> Option<&Property> {
        let declared = self.canonical_names.get(&name.to_lowercase())?;
        self.property(declared)
    }

    /// Declared member name for any case variant, as cached at seal time.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.canonical_names
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn properties_mut(&mut self) -> &mut [Property] {
        self.assert_unsealed();
        &mut self.properties
    }

    pub(crate) fn associations_mut(&mut self) -> &mut [Relation] {
        self.assert_unsealed();
        &mut self.associations
    }

    pub(crate) fn compositions_mut(&mut self) -> &mut [Relation] {
        self.assert_unsealed();
        &mut self.compositions
    }

    pub(crate) fn set_direct_supers(&mut self, supers: Vec<ResolvedTypeRef>) {
        self.assert_unsealed();
        self.direct_supers = supers;
    }

    pub(crate) fn set_linearized(
        &mut self,
        super_types: Vec<ResolvedTypeRef>,
        all_properties: Vec<Property>,
        all_associations: Vec<Relation>,
        all_compositions: Vec<Relation>,
    ) {
        self.assert_unsealed();
        self.super_types = super_types;
        self.all_properties = all_properties;
        self.all_associations = all_associations;
        self.all_compositions = all_compositions;
    }

    /// Records `sub_type` on this type. Permitted after sealing: a subtype
    /// in a later-loaded schema announces itself to an already-registered
    /// parent.
    pub(crate) fn add_sub_type(&self, sub_type: ResolvedTypeRef) {
        let mut sub_types = self.sub_types.write().expect("subtype list poisoned");
        if !sub_types.iter().any(|existing| existing.id == sub_type.id) {
            sub_types.push(sub_type);
        }
    }

    /// One-way transition: seals members bottom-up, collects primary keys
    /// and caches the name indices.
    pub(crate) fn seal(&mut self) {
        self.assert_unsealed();
        for property in &mut self.properties {
            property.seal();
        }
        for relation in &mut self.associations {
            relation.seal();
        }
        for relation in &mut self.compositions {
            relation.seal();
        }
        for invariant in &mut self.invariants {
            invariant.seal();
        }
        for property in &mut self.all_properties {
            property.seal();
        }
        for relation in &mut self.all_associations {
            relation.seal();
        }
        for relation in &mut self.all_compositions {
            relation.seal();
        }

        self.primary_keys = self
            .all_properties
            .iter()
            .filter(|property| property.is_primary_key())
            .cloned()
            .collect();

        self.property_index = self
            .all_properties
            .iter()
            .enumerate()
            .map(|(index, property)| (property.name().to_string(), index))
            .collect();

        self.canonical_names.clear();
        for property in &self.all_properties {
            self.canonical_names
                .entry(property.name().to_lowercase())
                .or_insert_with(|| property.name().to_string());
        }
        for relation in self.all_associations.iter().chain(&self.all_compositions) {
            self.canonical_names
                .entry(relation.name().to_lowercase())
                .or_insert_with(|| relation.name().to_string());
        }

        self.sealed = true;
    }

    fn assert_unsealed(&self) {
        assert!(!self.sealed, "attempted mutation of sealed type {}", self.name);
    }
}
