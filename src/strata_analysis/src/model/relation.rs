use crate::model::ids::TypeId;
use crate::model::property::Property;
use strata_syntax::ast::{RelationKind, TypeRef};
use strata_syntax::source::Span;

/// A named cross-type reference owned by a Type: an association (possibly
/// with edge properties) or a composition (never with edge properties).
#[derive(Debug, Clone)]
pub struct Relation {
    kind: RelationKind,
    name: String,
    field_name: String,
    target: TypeRef,
    target_id: Option<TypeId>,
    forward_optional: bool,
    forward_many: bool,
    backref: Option<String>,
    reverse_optional: bool,
    reverse_many: bool,
    owner: String,
    properties: Vec<Property>,
    span: Span,
    doc: Option<String>,
    sealed: bool,
}

impl Relation {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        kind: RelationKind,
        name: impl Into<String>,
        target: TypeRef,
        forward_optional: bool,
        forward_many: bool,
        backref: Option<String>,
        reverse_optional: bool,
        reverse_many: bool,
        owner: impl Into<String>,
        properties: Vec<Property>,
        span: Span,
        doc: Option<String>,
    ) -> Self {
        assert!(
            kind == RelationKind::Association || properties.is_empty(),
            "compositions cannot carry edge properties"
        );
        let name = name.into();
        let field_name = lower_snake(&name);
        Relation {
            kind,
            name,
            field_name,
            target,
            target_id: None,
            forward_optional,
            forward_many,
            backref,
            reverse_optional,
            reverse_many,
            owner: owner.into(),
            properties,
            span,
            doc,
            sealed: false,
        }
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance-level field name derived from the relation name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn target(&self) -> &TypeRef {
        &self.target
    }

    pub fn target_id(&self) -> Option<&TypeId> {
        self.target_id.as_ref()
    }

    pub fn is_forward_optional(&self) -> bool {
        self.forward_optional
    }

    pub fn is_forward_many(&self) -> bool {
        self.forward_many
    }

    pub fn backref(&self) -> Option<&str> {
        self.backref.as_deref()
    }

    pub fn is_reverse_optional(&self) -> bool {
        self.reverse_optional
    }

    pub fn is_reverse_many(&self) -> bool {
        self.reverse_many
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn set_target_id(&mut self, id: TypeId) {
        self.assert_unsealed();
        self.target_id = Some(id);
    }

    pub(crate) fn properties_mut(&mut self) -> &mut [Property] {
        self.assert_unsealed();
        &mut self.properties
    }

    pub(crate) fn seal(&mut self) {
        for property in &mut self.properties {
            property.seal();
        }
        self.sealed = true;
    }

    fn assert_unsealed(&self) {
        assert!(
            !self.sealed,
            "attempted mutation of sealed relation {}",
            self.name
        );
    }

    /// Structural equality: compares by target identity when both sides are
    /// resolved, by syntactic target otherwise; cardinalities, backref and
    /// edge properties must match.
    pub fn structurally_equal(&self, other: &Relation) -> bool {
        let targets_match = match (&self.target_id, &other.target_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.target.qualified_name() == other.target.qualified_name(),
        };
        self.kind == other.kind
            && self.name == other.name
            && targets_match
            && self.forward_optional == other.forward_optional
            && self.forward_many == other.forward_many
            && self.backref == other.backref
            && self.reverse_optional == other.reverse_optional
            && self.reverse_many == other.reverse_many
            && self.properties == other.properties
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(other)
    }
}

/// `lower_snake("WrittenBy")` is `written_by`; acronym runs break before
/// their last letter (`HTTPServer` becomes `http_server`).
pub fn lower_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            let next_lower = i + 1 < chars.len() && chars[i + 1].is_lowercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
