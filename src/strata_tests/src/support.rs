use std::collections::BTreeMap;
use std::sync::Arc;
use strata_analysis::model::Schema;
use strata_analysis::{DiagnosticCollection, Loader, LoaderOptions, SchemaRegistry};
use strata_syntax::source::SourceRegistry;

pub struct Loaded {
    pub schema: Option<Arc<Schema>>,
    pub diagnostics: DiagnosticCollection,
    pub registry: Arc<SchemaRegistry>,
    pub sources: Arc<SourceRegistry>,
}

pub fn fresh_loader() -> Loader {
    Loader::new(
        Arc::new(SourceRegistry::new()),
        Arc::new(SchemaRegistry::new()),
        LoaderOptions::default(),
    )
}

pub fn load_memory(files: &[(&str, &str)], entry: Option<&str>) -> Loaded {
    let sources = Arc::new(SourceRegistry::new());
    let registry = Arc::new(SchemaRegistry::new());
    let mut loader = Loader::new(
        Arc::clone(&sources),
        Arc::clone(&registry),
        LoaderOptions::default(),
    );
    let outcome = loader
        .load_sources(to_map(files), entry)
        .expect("in-memory load should not fail fatally");
    Loaded {
        schema: outcome.schema,
        diagnostics: outcome.diagnostics,
        registry,
        sources,
    }
}

pub fn load_single(name: &str, text: &str) -> Loaded {
    let sources = Arc::new(SourceRegistry::new());
    let registry = Arc::new(SchemaRegistry::new());
    let mut loader = Loader::new(
        Arc::clone(&sources),
        Arc::clone(&registry),
        LoaderOptions::default(),
    );
    let outcome = loader
        .load_str(name, text)
        .expect("string load should not fail fatally");
    Loaded {
        schema: outcome.schema,
        diagnostics: outcome.diagnostics,
        registry,
        sources,
    }
}

pub fn to_map(files: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
    files
        .iter()
        .map(|(path, text)| (path.to_string(), text.as_bytes().to_vec()))
        .collect()
}

pub fn count_code(diagnostics: &DiagnosticCollection, code: &str) -> usize {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.code.as_str() == code)
        .count()
}

pub fn codes(diagnostics: &DiagnosticCollection) -> Vec<&'static str> {
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code.as_str())
        .collect()
}
