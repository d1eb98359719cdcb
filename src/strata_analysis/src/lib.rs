// Analysis layer: schema IR, registries, loader and completer.

pub mod completer;
pub mod diagnostics;
pub mod errors;
pub mod loader;
pub mod model;
pub mod navigation;
pub mod registry;

// Minimal re-exports only where ergonomic
pub use diagnostics::code::DiagnosticCode;
pub use diagnostics::collection::DiagnosticCollection;
pub use diagnostics::diagnostic::{Diagnostic, RelatedInfo};
pub use diagnostics::severity::Severity;
pub use errors::LoadError;
pub use loader::{CancelToken, LoadOutcome, Loader, LoaderOptions};
pub use registry::SchemaRegistry;
pub use strata_syntax as syntax;
