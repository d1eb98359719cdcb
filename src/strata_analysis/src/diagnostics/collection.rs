use crate::diagnostics::diagnostic::Diagnostic;
use crate::diagnostics::severity::Severity;
use serde::Serialize;

pub const DEFAULT_LIMIT: usize = 256;

/// Collection of diagnostics with a configurable capacity.
///
/// Past the limit, diagnostics are dropped, but error presence is still
/// tracked so a truncated report cannot masquerade as a clean one.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
    dropped: usize,
    #[serde(skip)]
    limit: usize,
    #[serde(skip)]
    error_count: usize,
}

impl Default for DiagnosticCollection {
    fn default() -> Self {
        DiagnosticCollection::with_limit(DEFAULT_LIMIT)
    }
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        DiagnosticCollection::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        DiagnosticCollection {
            diagnostics: Vec::new(),
            dropped: 0,
            limit,
            error_count: 0,
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        if self.diagnostics.len() < self.limit {
            self.diagnostics.push(diagnostic);
        } else {
            self.dropped += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Warning))
    }

    /// True when any error was recorded, counting ones dropped past the
    /// limit.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        for diagnostic in other.diagnostics {
            self.add(diagnostic);
        }
        self.dropped += other.dropped;
    }

    /// Stable ordering: source string, then line, column, then code.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.span
                .source
                .cmp(&b.span.source)
                .then_with(|| a.span.start.line.cmp(&b.span.start.line))
                .then_with(|| a.span.start.column.cmp(&b.span.start.column))
                .then_with(|| a.code.as_str().cmp(b.code.as_str()))
        });
    }
}
