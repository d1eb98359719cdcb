//! Append-only, thread-safe index of compiled schemas.

use crate::model::{Schema, Type, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use strata_syntax::source::SourceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("schema has a zero source id")]
    ZeroSource,
    #[error("schema has an empty name")]
    EmptyName,
    #[error("a schema for source {0} is already registered")]
    DuplicateSource(SourceId),
    #[error("a schema named {0:?} is already registered")]
    DuplicateName(String),
}

#[derive(Debug, Default, Clone)]
struct Indexes {
    by_source: HashMap<SourceId, Arc<Schema>>,
    by_name: HashMap<String, Arc<Schema>>,
    by_type: HashMap<TypeId, Arc<Type>>,
}

/// Registered schemas, indexed by canonical source, by name, and by the
/// TypeId of every contained type. There is no removal: hot reload builds a
/// fresh registry or snapshots this one.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    inner: RwLock<Indexes>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    pub fn register(&self, schema: Arc<Schema>) -> Result<(), RegistryError> {
        if schema.source().is_zero() {
            return Err(RegistryError::ZeroSource);
        }
        if schema.name().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let mut inner = self.inner.write().expect("schema registry poisoned");
        if inner.by_source.contains_key(schema.source()) {
            return Err(RegistryError::DuplicateSource(schema.source().clone()));
        }
        if inner.by_name.contains_key(schema.name()) {
            return Err(RegistryError::DuplicateName(schema.name().to_string()));
        }
        for ty in schema.types() {
            inner.by_type.insert(ty.id(), Arc::clone(ty));
        }
        inner
            .by_name
            .insert(schema.name().to_string(), Arc::clone(&schema));
        inner
            .by_source
            .insert(schema.source().clone(), schema);
        Ok(())
    }

    pub fn by_source_id(&self, source: &SourceId) -> Option<Arc<Schema>> {
        self.inner
            .read()
            .expect("schema registry poisoned")
            .by_source
            .get(source)
            .cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<Schema>> {
        self.inner
            .read()
            .expect("schema registry poisoned")
            .by_name
            .get(name)
            .cloned()
    }

    pub fn type_by_id(&self, id: &TypeId) -> Option<Arc<Type>> {
        self.inner
            .read()
            .expect("schema registry poisoned")
            .by_type
            .get(id)
            .cloned()
    }

    /// The schema that owns the given type.
    pub fn schema_of(&self, id: &TypeId) -> Option<Arc<Schema>> {
        self.by_source_id(&id.source)
    }

    pub fn contains(&self, source: &SourceId) -> bool {
        self.inner
            .read()
            .expect("schema registry poisoned")
            .by_source
            .contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("schema registry poisoned")
            .by_source
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Independent index maps over the same sealed schemas; cheap because
    /// sealed schemas are immutable and shared by `Arc`.
    pub fn clone_snapshot(&self) -> SchemaRegistry {
        let inner = self.inner.read().expect("schema registry poisoned");
        SchemaRegistry {
            inner: RwLock::new(inner.clone()),
        }
    }

    /// All schemas sorted by source string form.
    pub fn all(&self) -> Vec<Arc<Schema>> {
        let inner = self.inner.read().expect("schema registry poisoned");
        let mut schemas: Vec<Arc<Schema>> = inner.by_source.values().cloned().collect();
        schemas.sort_by(|a, b| a.source().cmp(b.source()));
        schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_syntax::source::Span;

    fn schema(name: &str, source: &str) -> Arc<Schema> {
        let mut schema = Schema::new(
            name,
            SourceId::synthetic(source),
            Span::default(),
            None,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            None,
        );
        schema.seal();
        Arc::new(schema)
    }

    #[test]
    fn rejects_zero_source_and_empty_name() {
        let registry = SchemaRegistry::new();
        let mut zero = Schema::new(
            "Zero",
            SourceId::default(),
            Span::default(),
            None,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            None,
        );
        zero.seal();
        assert!(matches!(
            registry.register(Arc::new(zero)),
            Err(RegistryError::ZeroSource)
        ));
        assert!(matches!(
            registry.register(schema("", "string://empty")),
            Err(RegistryError::EmptyName)
        ));
    }

    #[test]
    fn rejects_duplicate_source_and_name() {
        let registry = SchemaRegistry::new();
        registry.register(schema("A", "string://a")).unwrap();
        assert!(matches!(
            registry.register(schema("B", "string://a")),
            Err(RegistryError::DuplicateSource(_))
        ));
        assert!(matches!(
            registry.register(schema("A", "string://other")),
            Err(RegistryError::DuplicateName(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn all_is_sorted_by_source_string() {
        let registry = SchemaRegistry::new();
        registry.register(schema("B", "string://b")).unwrap();
        registry.register(schema("A", "string://a")).unwrap();
        let names: Vec<String> = registry
            .all()
            .iter()
            .map(|schema| schema.name().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn snapshot_shares_schema_references() {
        let registry = SchemaRegistry::new();
        registry.register(schema("A", "string://a")).unwrap();
        let snapshot = registry.clone_snapshot();
        let original = registry.by_name("A").unwrap();
        let shared = snapshot.by_name("A").unwrap();
        assert!(Arc::ptr_eq(&original, &shared));
        // the snapshot is independent going forward
        registry.register(schema("B", "string://b")).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(snapshot.len(), 1);
    }
}
