// Schema IR: sealed-for-immutability entities with O(1) name lookup.
//
// Ownership is strictly tree-shaped: a Schema owns its Types, DataTypes,
// Imports and Invariants; Types own their Properties and Relations. Links
// that could cycle (imports, super/sub types) are keyed lookups by SourceId
// or TypeId through the SchemaRegistry, never owning references.

mod data_type;
mod ids;
mod import;
mod invariant;
mod property;
mod relation;
mod schema;
mod ty;

pub use data_type::DataType;
pub use ids::{ResolvedTypeRef, TypeId};
pub use import::Import;
pub use invariant::Invariant;
pub use property::{Property, PropertyScope};
pub use relation::{Relation, lower_snake};
pub use schema::Schema;
pub use ty::Type;

pub use strata_syntax::ast::RelationKind;
