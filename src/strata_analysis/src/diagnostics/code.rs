use crate::diagnostics::severity::Severity;
use serde::{Serialize, Serializer};

/// Diagnostic codes emitted by the loader and completer.
///
/// `Parse` carries syntax errors surfaced from the parser onto the shared
/// channel; everything else is produced by the core itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    Internal,
    Parse,
    ImportCycle,
    ImportResolve,
    ImportNotAllowed,
    DuplicateImport,
    DuplicateType,
    InvalidAlias,
    ImportAliasCollision,
    PathEscape,
    UpstreamFail,
    UnknownType,
    UnknownDataType,
    Narrowing,
    InheritanceCycle,
}

impl DiagnosticCode {
    pub fn severity(&self) -> Severity {
        // every code in the set is an error today; warnings would slot in here
        Severity::Error
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::Internal => "E_INTERNAL",
            DiagnosticCode::Parse => "E_PARSE",
            DiagnosticCode::ImportCycle => "E_IMPORT_CYCLE",
            DiagnosticCode::ImportResolve => "E_IMPORT_RESOLVE",
            DiagnosticCode::ImportNotAllowed => "E_IMPORT_NOT_ALLOWED",
            DiagnosticCode::DuplicateImport => "E_DUPLICATE_IMPORT",
            DiagnosticCode::DuplicateType => "E_DUPLICATE_TYPE",
            DiagnosticCode::InvalidAlias => "E_INVALID_ALIAS",
            DiagnosticCode::ImportAliasCollision => "E_IMPORT_ALIAS_COLLISION",
            DiagnosticCode::PathEscape => "E_PATH_ESCAPE",
            DiagnosticCode::UpstreamFail => "E_UPSTREAM_FAIL",
            DiagnosticCode::UnknownType => "E_UNKNOWN_TYPE",
            DiagnosticCode::UnknownDataType => "E_UNKNOWN_DATATYPE",
            DiagnosticCode::Narrowing => "E_NARROWING",
            DiagnosticCode::InheritanceCycle => "E_INHERITANCE_CYCLE",
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            DiagnosticCode::Internal => "internal error",
            DiagnosticCode::Parse => "syntax error",
            DiagnosticCode::ImportCycle => "import cycle detected",
            DiagnosticCode::ImportResolve => "import could not be resolved",
            DiagnosticCode::ImportNotAllowed => "imports are not allowed for this source",
            DiagnosticCode::DuplicateImport => "duplicate import",
            DiagnosticCode::DuplicateType => "duplicate declaration",
            DiagnosticCode::InvalidAlias => "invalid import alias",
            DiagnosticCode::ImportAliasCollision => {
                "import alias collides with a local declaration"
            }
            DiagnosticCode::PathEscape => "import path escapes the module root",
            DiagnosticCode::UpstreamFail => "imported schema failed to load",
            DiagnosticCode::UnknownType => "unknown type",
            DiagnosticCode::UnknownDataType => "unknown datatype",
            DiagnosticCode::Narrowing => "illegal narrowing of an inherited member",
            DiagnosticCode::InheritanceCycle => "inheritance cycle detected",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
