//! Plain-text diagnostic rendering with source excerpts and carets.

use crate::diagnostics::diagnostic::Diagnostic;
use std::fmt::Write as _;
use strata_syntax::source::{SourceId, SourceRegistry, Span};

/// Renders a diagnostic as
/// `severity[CODE]: message`, the `--> source:line:col` anchor, an excerpt
/// of the offending line with a caret, and one `note:` line per related
/// location.
pub fn render(diagnostic: &Diagnostic, sources: &SourceRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}[{}]: {}",
        diagnostic.severity.as_str(),
        diagnostic.code,
        diagnostic.message
    );
    render_anchor(&mut out, &diagnostic.span, sources, " --> ");
    for related in &diagnostic.related {
        let _ = writeln!(out, " note: {}", related.message);
        render_anchor(&mut out, &related.span, sources, "  --> ");
    }
    out
}

fn render_anchor(out: &mut String, span: &Span, sources: &SourceRegistry, arrow: &str) {
    if span.is_zero() {
        return;
    }
    let _ = writeln!(
        out,
        "{arrow}{}:{}:{}",
        span.source, span.start.line, span.start.column
    );
    if let Some((text, column)) = line_excerpt(span, sources) {
        let _ = writeln!(out, "  {text}");
        let _ = writeln!(out, "  {}^", " ".repeat(column.saturating_sub(1)));
    }
}

fn line_excerpt(span: &Span, sources: &SourceRegistry) -> Option<(String, usize)> {
    if span.start.is_unknown() {
        return None;
    }
    let content = sources.content_of(&span.source)?;
    let start = line_start(sources, &span.source, span.start.line)?;
    let end = line_start(sources, &span.source, span.start.line + 1).unwrap_or(content.len());
    let line = String::from_utf8_lossy(&content[start..end])
        .trim_end_matches(['\r', '\n'])
        .to_string();
    Some((line, span.start.column as usize))
}

fn line_start(sources: &SourceRegistry, id: &SourceId, line: u32) -> Option<usize> {
    sources.line_start_byte(id, line).ok()
}
