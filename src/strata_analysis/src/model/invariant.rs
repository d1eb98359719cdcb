use strata_syntax::expr::Expr;
use strata_syntax::source::Span;

/// A named invariant expression on a Type. The expression is opaque to the
/// front end; instance validators interpret it.
#[derive(Debug, Clone)]
pub struct Invariant {
    name: String,
    expression: Expr,
    span: Span,
    doc: Option<String>,
    sealed: bool,
}

impl Invariant {
    pub(crate) fn new(
        name: impl Into<String>,
        expression: Expr,
        span: Span,
        doc: Option<String>,
    ) -> Self {
        Invariant {
            name: name.into(),
            expression,
            span,
            doc,
            sealed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}
