// Parse model produced by the parser and consumed by the completer.

mod data_type;
mod schema;
mod type_decl;

pub use data_type::DataTypeDecl;
pub use schema::{ImportDecl, SchemaDecl};
pub use type_decl::{
    InvariantDecl, PropertyDecl, RelationDecl, RelationKind, TypeDecl, TypeRef,
};
