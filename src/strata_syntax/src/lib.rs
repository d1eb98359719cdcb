// Syntax layer for the Strata schema language: source identity and
// positions, the source registry, the constraint lattice, and the parse
// model the parser produces and the analysis layer consumes.

pub mod ast;
pub mod constraint;
pub mod expr;
pub mod source;

// Minimal re-exports only where ergonomic
pub use constraint::{Constraint, ConstraintError};
pub use source::{Position, SourceError, SourceId, SourceRegistry, Span};
