use serde::Serialize;
use std::fmt;
use strata_syntax::ast::TypeRef;
use strata_syntax::source::SourceId;

/// Canonical identity of a Type across all schemas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId {
    pub source: SourceId,
    pub name: String,
}

impl TypeId {
    pub fn new(source: SourceId, name: impl Into<String>) -> Self {
        TypeId {
            source,
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.source)
    }
}

/// A syntactic type reference paired with the identity it resolved to;
/// used where both display text and identity matter (supertype lists,
/// subtype back-links).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTypeRef {
    pub reference: TypeRef,
    pub id: TypeId,
}

impl ResolvedTypeRef {
    pub fn new(reference: TypeRef, id: TypeId) -> Self {
        ResolvedTypeRef { reference, id }
    }
}
