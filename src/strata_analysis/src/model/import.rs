use crate::model::schema::Schema;
use std::sync::{Arc, Weak};
use strata_syntax::source::{SourceId, Span};

/// One import declaration after loading. The link to the imported schema is
/// a weak reference resolved through the registry's strong one, so imports
/// can never create ownership cycles.
#[derive(Debug, Clone)]
pub struct Import {
    path: String,
    alias: String,
    span: Span,
    resolved_source: SourceId,
    schema: Weak<Schema>,
    sealed: bool,
}

impl Import {
    pub(crate) fn new(path: impl Into<String>, alias: impl Into<String>, span: Span) -> Self {
        Import {
            path: path.into(),
            alias: alias.into(),
            span,
            resolved_source: SourceId::default(),
            schema: Weak::new(),
            sealed: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Canonical identity of the imported document; zero when the import
    /// never resolved.
    pub fn resolved_source(&self) -> &SourceId {
        &self.resolved_source
    }

    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.schema.upgrade()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn wire(&mut self, source: SourceId, schema: &Arc<Schema>) {
        assert!(
            !self.sealed,
            "attempted wire-up of sealed import {}",
            self.alias
        );
        self.resolved_source = source;
        self.schema = Arc::downgrade(schema);
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}
