use crate::constraint::Constraint;
use crate::expr::Expr;
use crate::source::Span;
use serde::Serialize;
use std::fmt;

/// Syntactic reference to a type or datatype, optionally qualified by an
/// import alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub qualifier: Option<String>,
    pub name: String,
    pub span: Span,
}

impl TypeRef {
    pub fn qualified_name(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("{qualifier}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{qualifier}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub is_abstract: bool,
    pub is_part: bool,
    pub span: Span,
    pub name_span: Span,
    pub doc: Option<String>,
    pub inherits: Vec<TypeRef>,
    pub properties: Vec<PropertyDecl>,
    pub associations: Vec<RelationDecl>,
    pub compositions: Vec<RelationDecl>,
    pub invariants: Vec<InvariantDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDecl {
    pub name: String,
    pub constraint: Constraint,
    /// Set when the property's type names a datatype rather than an inline
    /// constraint.
    pub data_type_ref: Option<TypeRef>,
    pub optional: bool,
    pub primary: bool,
    pub span: Span,
    pub name_span: Span,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelationKind {
    Association,
    Composition,
}

impl RelationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RelationKind::Association => "association",
            RelationKind::Composition => "composition",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationDecl {
    pub kind: RelationKind,
    pub name: String,
    pub target: TypeRef,
    pub forward_optional: bool,
    pub forward_many: bool,
    pub backref: Option<String>,
    pub reverse_optional: bool,
    pub reverse_many: bool,
    /// Edge properties; only associations may carry them.
    pub properties: Vec<PropertyDecl>,
    pub span: Span,
    pub name_span: Span,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvariantDecl {
    pub name: String,
    pub expression: Expr,
    pub span: Span,
    pub name_span: Span,
    pub doc: Option<String>,
}
