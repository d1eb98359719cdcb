use strata_syntax::constraint::Constraint;
use strata_syntax::source::{SourceId, Span};

/// A named constraint alias owned by a Schema.
#[derive(Debug, Clone)]
pub struct DataType {
    name: String,
    schema_name: String,
    source: SourceId,
    span: Span,
    name_span: Span,
    doc: Option<String>,
    constraint: Constraint,
    sealed: bool,
}

impl DataType {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: impl Into<String>,
        schema_name: impl Into<String>,
        source: SourceId,
        span: Span,
        name_span: Span,
        doc: Option<String>,
        constraint: Constraint,
    ) -> Self {
        DataType {
            name: name.into(),
            schema_name: schema_name.into(),
            source,
            span,
            name_span,
            doc,
            constraint,
            sealed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn name_span(&self) -> &Span {
        &self.name_span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn is_resolved(&self) -> bool {
        self.constraint.is_resolved()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn constraint_mut(&mut self) -> &mut Constraint {
        assert!(
            !self.sealed,
            "attempted mutation of sealed datatype {}",
            self.name
        );
        &mut self.constraint
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}
