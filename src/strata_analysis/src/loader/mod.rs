//! The loader: orchestrates parsing, import resolution, completion,
//! sealing and registration for one compilation unit (an entry schema plus
//! its transitive imports).
//!
//! The loader is single-threaded per invocation; recursion over imports
//! uses the call stack for DFS, and each recursive call installs its own
//! import-resolution frame. Cancellation is checked before parsing each
//! source and between imports; a cancelled load returns
//! [`LoadError::Cancelled`] out-of-band and registers nothing for the
//! in-flight source.

mod cancel;
mod sandbox;

pub use cancel::CancelToken;
pub use sandbox::ModuleSandbox;

use crate::completer::{self, ImportFrame, ResolvedImport};
use crate::diagnostics::code::DiagnosticCode;
use crate::diagnostics::collection::{DEFAULT_LIMIT, DiagnosticCollection};
use crate::diagnostics::diagnostic::Diagnostic;
use crate::errors::LoadError;
use crate::model::{Import, Schema, Type};
use crate::registry::{RegistryError, SchemaRegistry};
use log::{debug, info};
use sandbox::{lexically_escapes, normalize_import_path};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_parser::{Parser, is_reserved};
use strata_syntax::ast::{ImportDecl, SchemaDecl};
use strata_syntax::source::{SourceId, SourceRegistry, Span, clean_components};

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Directory all imports must live under. Defaults to the entry file's
    /// directory for filesystem loads.
    pub module_root: Option<PathBuf>,
    /// Capacity of the diagnostic collector.
    pub diagnostic_limit: usize,
    pub cancel: CancelToken,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            module_root: None,
            diagnostic_limit: DEFAULT_LIMIT,
            cancel: CancelToken::new(),
        }
    }
}

/// Result of one load: the sealed entry schema when the unit compiled
/// without errors, plus everything the collector gathered either way.
#[derive(Debug)]
pub struct LoadOutcome {
    pub schema: Option<Arc<Schema>>,
    pub diagnostics: DiagnosticCollection,
}

enum SourceStore {
    Filesystem(ModuleSandbox),
    Memory { files: BTreeMap<String, Vec<u8>> },
}

pub struct Loader {
    sources: Arc<SourceRegistry>,
    registry: Arc<SchemaRegistry>,
    options: LoaderOptions,
    store: Option<SourceStore>,
    imports_allowed: bool,
    loaded: HashMap<SourceId, Arc<Schema>>,
    loading: HashSet<SourceId>,
    diagnostics: DiagnosticCollection,
}

impl Loader {
    pub fn new(
        sources: Arc<SourceRegistry>,
        registry: Arc<SchemaRegistry>,
        options: LoaderOptions,
    ) -> Self {
        let diagnostics = DiagnosticCollection::with_limit(options.diagnostic_limit);
        Loader {
            sources,
            registry,
            options,
            store: None,
            imports_allowed: true,
            loaded: HashMap::new(),
            loading: HashSet::new(),
            diagnostics,
        }
    }

    /// Fresh registries, default options.
    pub fn with_defaults() -> Self {
        Loader::new(
            Arc::new(SourceRegistry::new()),
            Arc::new(SchemaRegistry::new()),
            LoaderOptions::default(),
        )
    }

    pub fn sources(&self) -> &Arc<SourceRegistry> {
        &self.sources
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Diagnostics collected so far; useful after a fatal error, which
    /// returns no outcome.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Loads a schema file and its transitive imports from disk.
    pub fn load_path(&mut self, path: &Path) -> Result<LoadOutcome, LoadError> {
        self.begin();
        self.imports_allowed = true;

        let entry = std::fs::canonicalize(path).map_err(|source| LoadError::EntryRead {
            path: path.to_path_buf(),
            source,
        })?;
        let module_root = match &self.options.module_root {
            Some(root) => root.clone(),
            None => entry
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let sandbox = ModuleSandbox::open(&module_root)?;
        let entry_rel = entry
            .strip_prefix(sandbox.root())
            .map_err(|_| LoadError::EntryOutsideRoot {
                path: entry.clone(),
                root: sandbox.root().to_path_buf(),
            })?
            .to_path_buf();
        let bytes = sandbox
            .read(&entry_rel)
            .map_err(|source| LoadError::EntryRead {
                path: entry.clone(),
                source,
            })?;
        self.store = Some(SourceStore::Filesystem(sandbox));

        debug!("loading entry {} (module root {})", entry.display(), module_root.display());
        let schema = self.load_source(
            SourceId::File(entry),
            bytes,
            Some(entry_rel),
            Span::default(),
        )?;
        Ok(self.finish(schema))
    }

    /// Loads a single schema from an in-memory string under a synthetic
    /// source id. Imports are not allowed in this mode.
    pub fn load_str(&mut self, name: &str, text: &str) -> Result<LoadOutcome, LoadError> {
        self.begin();
        self.imports_allowed = false;
        self.store = None;

        let id = SourceId::synthetic(format!("string://{name}"));
        let schema = self.load_source(id, text.as_bytes().to_vec(), None, Span::default())?;
        Ok(self.finish(schema))
    }

    /// Loads from an in-memory map of root-relative paths to bytes. The
    /// entry defaults to the lexicographically smallest key.
    pub fn load_sources(
        &mut self,
        files: BTreeMap<String, Vec<u8>>,
        entry: Option<&str>,
    ) -> Result<LoadOutcome, LoadError> {
        self.begin();
        self.imports_allowed = true;

        if files.is_empty() {
            return Err(LoadError::EmptySourceSet);
        }
        let mut normalized: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for (key, bytes) in files {
            normalized.insert(rel_key(&normalize_import_path(&key)), bytes);
        }
        let entry_key = match entry {
            Some(given) => {
                let key = rel_key(&normalize_import_path(given));
                if !normalized.contains_key(&key) {
                    return Err(LoadError::UnknownEntry(given.to_string()));
                }
                key
            }
            None => normalized
                .keys()
                .next()
                .cloned()
                .expect("non-empty source set"),
        };
        let bytes = normalized[&entry_key].clone();
        self.store = Some(SourceStore::Memory { files: normalized });

        let id = SourceId::synthetic(format!("mem://{entry_key}"));
        let rel = PathBuf::from(&entry_key);
        let schema = self.load_source(id, bytes, Some(rel), Span::default())?;
        Ok(self.finish(schema))
    }

    fn begin(&mut self) {
        self.diagnostics = DiagnosticCollection::with_limit(self.options.diagnostic_limit);
        self.loading.clear();
    }

    fn finish(&mut self, mut schema: Option<Arc<Schema>>) -> LoadOutcome {
        // final global check over the whole registry
        if schema.is_some()
            && self.registry.len() > 1
            && completer::detect_cross_schema_cycles(&self.registry, &mut self.diagnostics)
        {
            schema = None;
        }
        if self.diagnostics.has_errors() {
            schema = None;
        }
        let mut diagnostics = std::mem::replace(
            &mut self.diagnostics,
            DiagnosticCollection::with_limit(self.options.diagnostic_limit),
        );
        diagnostics.sort();
        LoadOutcome {
            schema,
            diagnostics,
        }
    }

    /// Recursive load of one source. `rel` is the path of this document
    /// relative to the module root (absent for string sources); `at` is the
    /// span of the import declaration that led here.
    fn load_source(
        &mut self,
        id: SourceId,
        bytes: Vec<u8>,
        rel: Option<PathBuf>,
        at: Span,
    ) -> Result<Option<Arc<Schema>>, LoadError> {
        if let Some(schema) = self.loaded.get(&id) {
            return Ok(Some(schema.clone()));
        }
        if let Some(schema) = self.registry.by_source_id(&id) {
            self.loaded.insert(id, schema.clone());
            return Ok(Some(schema));
        }
        if self.loading.contains(&id) {
            self.diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::ImportCycle,
                    at,
                    format!("import cycle detected while loading {id}"),
                )
                .with_detail("sourceId", id.to_string()),
            );
            return Ok(None);
        }

        self.loading.insert(id.clone());
        let result = self.load_source_inner(&id, bytes, rel, &at);
        // the marker never outlives the call, even on fatal errors
        self.loading.remove(&id);
        result
    }

    fn load_source_inner(
        &mut self,
        id: &SourceId,
        bytes: Vec<u8>,
        rel: Option<PathBuf>,
        at: &Span,
    ) -> Result<Option<Arc<Schema>>, LoadError> {
        // suspension point: before parsing
        if self.options.cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        if let Err(error) = self.sources.register(id.clone(), &bytes) {
            self.diagnostics.add(Diagnostic::error(
                DiagnosticCode::Internal,
                at.clone(),
                error.to_string(),
            ));
            return Ok(None);
        }

        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(error) => {
                let position = self.sources.position_at(id, error.valid_up_to());
                self.diagnostics.add(Diagnostic::error(
                    DiagnosticCode::Parse,
                    Span::new(id.clone(), position, position),
                    "source is not valid UTF-8",
                ));
                return Ok(None);
            }
        };

        let decl = match Parser::new().parse(id, text) {
            Ok(decl) => decl,
            Err(failure) => {
                let position = self.sources.position_at(id, failure.offset);
                self.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::Parse,
                        Span::new(id.clone(), position, position),
                        failure.message(),
                    )
                    .with_detail("expected", &failure.expected),
                );
                return Ok(None);
            }
        };

        let frame = self.resolve_imports(&decl, rel.as_deref())?;
        let completed = completer::complete(
            &decl,
            id,
            &frame,
            &self.registry,
            &mut self.diagnostics,
        );
        Ok(self.finalize_schema(id, &decl, completed, frame))
    }

    /// Validates import declarations and loads each one in declaration
    /// order, producing this invocation's frame.
    fn resolve_imports(
        &mut self,
        decl: &SchemaDecl,
        rel: Option<&Path>,
    ) -> Result<ImportFrame, LoadError> {
        let mut frame = ImportFrame::new();
        if decl.imports.is_empty() {
            return Ok(frame);
        }
        if !self.imports_allowed {
            // one diagnostic at the first import is enough
            let first = &decl.imports[0];
            self.diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::ImportNotAllowed,
                    first.span.clone(),
                    "imports are not allowed when loading from a string source",
                )
                .with_detail("importPath", &first.path),
            );
            return Ok(frame);
        }

        let local_names: HashMap<&str, &Span> = decl
            .data_types
            .iter()
            .map(|dt| (dt.name.as_str(), &dt.name_span))
            .chain(decl.types.iter().map(|ty| (ty.name.as_str(), &ty.name_span)))
            .collect();

        let mut seen_paths: HashMap<&str, &Span> = HashMap::new();
        let mut seen_aliases: HashMap<String, Span> = HashMap::new();
        let mut valid: Vec<&ImportDecl> = Vec::new();
        for import in &decl.imports {
            let mut ok = true;
            match seen_paths.get(import.path.as_str()) {
                Some(first) => {
                    self.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::DuplicateImport,
                            import.path_span.clone(),
                            format!("duplicate import of {:?}", import.path),
                        )
                        .with_related((*first).clone(), "first imported here")
                        .with_detail("importPath", &import.path),
                    );
                    ok = false;
                }
                None => {
                    seen_paths.insert(&import.path, &import.path_span);
                }
            }

            let alias = import.effective_alias();
            if is_reserved(&alias) {
                self.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::InvalidAlias,
                        import.alias_anchor().clone(),
                        format!("reserved word {alias:?} cannot be used as an import alias"),
                    )
                    .with_detail("alias", &alias),
                );
                ok = false;
            }
            match seen_aliases.get(&alias) {
                Some(first) => {
                    self.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::DuplicateImport,
                            import.alias_anchor().clone(),
                            format!("import alias {alias:?} is already in use"),
                        )
                        .with_related(first.clone(), "first defined here")
                        .with_detail("alias", &alias),
                    );
                    ok = false;
                }
                None => {
                    seen_aliases.insert(alias.clone(), import.alias_anchor().clone());
                }
            }
            if let Some(local) = local_names.get(alias.as_str()) {
                self.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::ImportAliasCollision,
                        import.alias_anchor().clone(),
                        format!(
                            "import alias {alias:?} collides with a local declaration"
                        ),
                    )
                    .with_related((*local).clone(), "declared here")
                    .with_detail("alias", &alias),
                );
                ok = false;
            }
            if ok {
                valid.push(import);
            }
        }

        for import in valid {
            // suspension point: between imports
            if self.options.cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            let alias = import.effective_alias();
            let Some((child_id, child_rel, bytes)) =
                self.read_import(rel, &import.path, &import.path_span)?
            else {
                continue;
            };
            match self.load_source(child_id.clone(), bytes, Some(child_rel), import.span.clone())? {
                Some(schema) => {
                    frame.insert(
                        alias,
                        ResolvedImport {
                            source: child_id,
                            schema,
                            span: import.span.clone(),
                        },
                    );
                }
                None => {
                    self.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::UpstreamFail,
                            import.span.clone(),
                            format!("imported schema {:?} failed to load", import.path),
                        )
                        .with_detail("importPath", &import.path)
                        .with_detail("alias", &alias),
                    );
                }
            }
        }

        // two aliases may name distinct paths that canonicalize to the same
        // file; that is an error
        let mut aliases: Vec<&String> = frame.keys().collect();
        aliases.sort();
        let mut seen_sources: HashMap<SourceId, (String, Span)> = HashMap::new();
        for alias in aliases {
            let resolved = &frame[alias];
            match seen_sources.get(&resolved.source) {
                Some((first_alias, first_span)) => {
                    self.diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::DuplicateImport,
                            resolved.span.clone(),
                            format!(
                                "imports {first_alias:?} and {alias:?} resolve to the same file {}",
                                resolved.source
                            ),
                        )
                        .with_related(first_span.clone(), "first resolved here")
                        .with_detail("alias", alias)
                        .with_detail("sourceId", resolved.source.to_string()),
                    );
                }
                None => {
                    seen_sources.insert(
                        resolved.source.clone(),
                        (alias.clone(), resolved.span.clone()),
                    );
                }
            }
        }

        Ok(frame)
    }

    /// Resolves and reads one import through the configured store. Emits
    /// the appropriate diagnostic and returns `None` when the import cannot
    /// be read.
    #[allow(clippy::type_complexity)]
    fn read_import(
        &mut self,
        importing_rel: Option<&Path>,
        raw: &str,
        span: &Span,
    ) -> Result<Option<(SourceId, PathBuf, Vec<u8>)>, LoadError> {
        let base = resolve_relative(importing_rel, raw);
        let candidates = [base.clone(), with_schema_extension(&base)];

        match &self.store {
            Some(SourceStore::Filesystem(sandbox)) => {
                for candidate in &candidates {
                    if lexically_escapes(candidate) {
                        self.diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::PathEscape,
                                span.clone(),
                                format!("import {raw:?} escapes the module root"),
                            )
                            .with_detail("importPath", raw),
                        );
                        return Ok(None);
                    }
                    match sandbox.read(candidate) {
                        Ok(bytes) => {
                            let absolute = sandbox.root().join(candidate);
                            return Ok(Some((
                                SourceId::file(&absolute),
                                candidate.clone(),
                                bytes,
                            )));
                        }
                        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                        Err(error) if error.kind() == io::ErrorKind::PermissionDenied => {
                            // the sandbox handle rejected the resolved path
                            self.diagnostics.add(
                                Diagnostic::error(
                                    DiagnosticCode::PathEscape,
                                    span.clone(),
                                    format!("import {raw:?} escapes the module root"),
                                )
                                .with_detail("importPath", raw)
                                .with_detail("ioError", error.to_string()),
                            );
                            return Ok(None);
                        }
                        Err(error) => {
                            self.diagnostics.add(
                                Diagnostic::error(
                                    DiagnosticCode::ImportResolve,
                                    span.clone(),
                                    format!("cannot read import {raw:?}: {error}"),
                                )
                                .with_detail("importPath", raw),
                            );
                            return Ok(None);
                        }
                    }
                }
                self.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::ImportResolve,
                        span.clone(),
                        format!("cannot resolve import {raw:?} under the module root"),
                    )
                    .with_detail("importPath", raw),
                );
                Ok(None)
            }
            Some(SourceStore::Memory { files }) => {
                for candidate in &candidates {
                    if lexically_escapes(candidate) {
                        self.diagnostics.add(
                            Diagnostic::error(
                                DiagnosticCode::PathEscape,
                                span.clone(),
                                format!("import {raw:?} escapes the module root"),
                            )
                            .with_detail("importPath", raw),
                        );
                        return Ok(None);
                    }
                    let key = rel_key(candidate);
                    if let Some(bytes) = files.get(&key) {
                        return Ok(Some((
                            SourceId::synthetic(format!("mem://{key}")),
                            candidate.clone(),
                            bytes.clone(),
                        )));
                    }
                }
                self.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::ImportResolve,
                        span.clone(),
                        format!("cannot resolve import {raw:?} in the provided sources"),
                    )
                    .with_detail("importPath", raw),
                );
                Ok(None)
            }
            None => {
                self.diagnostics.add(Diagnostic::error(
                    DiagnosticCode::Internal,
                    span.clone(),
                    "no source store configured for import resolution",
                ));
                Ok(None)
            }
        }
    }

    /// Error gate, sealing, import wire-up, registration and caching.
    fn finalize_schema(
        &mut self,
        id: &SourceId,
        decl: &SchemaDecl,
        completed: completer::Completed,
        frame: ImportFrame,
    ) -> Option<Arc<Schema>> {
        if self.diagnostics.has_errors() {
            return None;
        }

        let mut types = completed.types;
        for ty in &mut types {
            ty.seal();
        }
        let types: Vec<Arc<Type>> = types.into_iter().map(Arc::new).collect();

        let mut imports = Vec::with_capacity(decl.imports.len());
        for import_decl in &decl.imports {
            let alias = import_decl.effective_alias();
            let mut import = Import::new(&import_decl.path, &alias, import_decl.span.clone());
            if let Some(resolved) = frame.get(&alias) {
                import.wire(resolved.source.clone(), &resolved.schema);
            }
            import.seal();
            imports.push(import);
        }

        let mut schema = Schema::new(
            &decl.name,
            id.clone(),
            decl.span.clone(),
            decl.doc.clone(),
            types,
            completed.data_types,
            imports,
            Some(self.sources.clone()),
        );
        schema.seal();
        let schema = Arc::new(schema);

        if let Err(error) = self.registry.register(schema.clone()) {
            let (code, message) = match error {
                RegistryError::DuplicateName(name) => (
                    DiagnosticCode::DuplicateType,
                    format!("schema name {name:?} is already registered by another source"),
                ),
                other => (DiagnosticCode::Internal, other.to_string()),
            };
            self.diagnostics.add(Diagnostic::error(
                code,
                decl.name_span.clone(),
                message,
            ));
            return None;
        }
        completer::wire_sub_types(schema.types(), &self.registry);
        self.loaded.insert(id.clone(), schema.clone());
        info!("loaded schema {} from {id}", schema.name());
        Some(schema)
    }
}

/// Relative imports (`./`, `../`) resolve against the importing file's
/// directory; bare paths resolve against the module root.
fn resolve_relative(importing_rel: Option<&Path>, raw: &str) -> PathBuf {
    let cleaned = raw.replace('\\', "/");
    if cleaned.starts_with("./") || cleaned.starts_with("../") {
        let dir = importing_rel
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(""));
        clean_components(&dir.join(&cleaned))
    } else {
        normalize_import_path(&cleaned)
    }
}

fn with_schema_extension(path: &Path) -> PathBuf {
    let mut with_ext = path.as_os_str().to_os_string();
    with_ext.push(".strata");
    PathBuf::from(with_ext)
}

fn rel_key(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
