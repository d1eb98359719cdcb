use crate::ast::TypeRef;
use crate::constraint::Constraint;
use crate::source::Span;
use serde::Serialize;

/// A named constraint alias declaration (`datatype Age = Integer[0, 150]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTypeDecl {
    pub name: String,
    pub constraint: Constraint,
    /// Set when the right-hand side names another datatype.
    pub data_type_ref: Option<TypeRef>,
    pub span: Span,
    pub name_span: Span,
    pub doc: Option<String>,
}
