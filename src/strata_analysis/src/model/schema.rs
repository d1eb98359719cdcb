use crate::model::data_type::DataType;
use crate::model::import::Import;
use crate::model::ty::Type;
use std::collections::HashMap;
use std::sync::Arc;
use strata_syntax::source::{SourceId, SourceRegistry, Span};

/// A compiled schema: the unit of loading, registration and import.
#[derive(Debug)]
pub struct Schema {
    name: String,
    source: SourceId,
    span: Span,
    doc: Option<String>,
    types: Vec<Arc<Type>>,
    data_types: Vec<DataType>,
    imports: Vec<Import>,
    type_index: HashMap<String, usize>,
    data_type_index: HashMap<String, usize>,
    import_index: HashMap<String, usize>,
    sources: Option<Arc<SourceRegistry>>,
    sealed: bool,
}

impl Schema {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: impl Into<String>,
        source: SourceId,
        span: Span,
        doc: Option<String>,
        types: Vec<Arc<Type>>,
        data_types: Vec<DataType>,
        imports: Vec<Import>,
        sources: Option<Arc<SourceRegistry>>,
    ) -> Self {
        let type_index = types
            .iter()
            .enumerate()
            .map(|(index, ty)| (ty.name().to_string(), index))
            .collect();
        let data_type_index = data_types
            .iter()
            .enumerate()
            .map(|(index, dt)| (dt.name().to_string(), index))
            .collect();
        let import_index = imports
            .iter()
            .enumerate()
            .map(|(index, import)| (import.alias().to_string(), index))
            .collect();
        Schema {
            name: name.into(),
            source,
            span,
            doc,
            types,
            data_types,
            imports,
            type_index,
            data_type_index,
            import_index,
            sources,
            sealed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Types in declaration order.
    pub fn types(&self) -> &[Arc<Type>] {
        &self.types
    }

    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    /// Imports in declaration order.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn type_named(&self, name: &str) -> Option<&Arc<Type>> {
        self.type_index.get(name).map(|&index| &self.types[index])
    }

    pub fn data_type_named(&self, name: &str) -> Option<&DataType> {
        self.data_type_index
            .get(name)
            .map(|&index| &self.data_types[index])
    }

    pub fn import_by_alias(&self, alias: &str) -> Option<&Import> {
        self.import_index
            .get(alias)
            .map(|&index| &self.imports[index])
    }

    /// The source registry the schema was compiled against, for mapping IR
    /// spans back to bytes.
    pub fn sources(&self) -> Option<&Arc<SourceRegistry>> {
        self.sources.as_ref()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn seal(&mut self) {
        assert!(
            !self.sealed,
            "attempted to re-seal schema {}",
            self.name
        );
        for data_type in &mut self.data_types {
            data_type.seal();
        }
        for import in &mut self.imports {
            if !import.is_sealed() {
                import.seal();
            }
        }
        self.sealed = true;
    }
}
