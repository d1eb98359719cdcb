use strata_syntax::ast::TypeRef;
use strata_syntax::constraint::Constraint;
use strata_syntax::source::Span;

/// Where a property was declared: on a type's body, or as an edge property
/// of a named relation.
#[derive(Debug, Clone)]
pub enum PropertyScope {
    Type(TypeRef),
    Relation(String),
}

/// A named, typed slot on a Type or relation edge.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    span: Span,
    doc: Option<String>,
    constraint: Constraint,
    data_type_ref: Option<TypeRef>,
    optional: bool,
    primary: bool,
    scope: PropertyScope,
    sealed: bool,
}

impl Property {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: impl Into<String>,
        span: Span,
        doc: Option<String>,
        constraint: Constraint,
        data_type_ref: Option<TypeRef>,
        optional: bool,
        primary: bool,
        scope: PropertyScope,
    ) -> Self {
        Property {
            name: name.into(),
            span,
            doc,
            constraint,
            data_type_ref,
            // primary keys are implicitly required
            optional: optional && !primary,
            primary,
            scope,
            sealed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn data_type_ref(&self) -> Option<&TypeRef> {
        self.data_type_ref.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary
    }

    pub fn scope(&self) -> &PropertyScope {
        &self.scope
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn constraint_mut(&mut self) -> &mut Constraint {
        self.assert_unsealed();
        &mut self.constraint
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    fn assert_unsealed(&self) {
        assert!(
            !self.sealed,
            "attempted mutation of sealed property {}",
            self.name
        );
    }

    /// Structural equality; span, doc and declaring scope are ignored so
    /// that equal properties inherited through distinct ancestors
    /// deduplicate.
    pub fn structurally_equal(&self, other: &Property) -> bool {
        self.name == other.name
            && self.optional == other.optional
            && self.primary == other.primary
            && self.constraint.equals(&other.constraint)
    }

    /// Whether `self` is a legal override of `parent`: same name, narrowed
    /// (or equal) constraint, and no widening of optionality or loss of the
    /// primary-key marker.
    pub fn can_narrow_from(&self, parent: &Property) -> bool {
        self.name == parent.name
            && parent.constraint.narrows_to(&self.constraint)
            && (parent.optional || !self.optional)
            && (!parent.primary || self.primary)
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(other)
    }
}
