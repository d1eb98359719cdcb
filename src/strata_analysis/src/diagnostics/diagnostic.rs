use crate::diagnostics::code::DiagnosticCode;
use crate::diagnostics::severity::Severity;
use serde::Serialize;
use std::collections::BTreeMap;
use strata_syntax::source::Span;

/// A secondary location attached to a diagnostic ("first defined here").
#[derive(Debug, Clone, Serialize)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}

/// One diagnostic: severity, code, primary span, message, related
/// locations, and a free-form detail map for tooling.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub span: Span,
    pub related: Vec<RelatedInfo>,
    pub details: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity,
            code,
            message: message.into(),
            span,
            related: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    pub fn error(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, code, span, message)
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}
