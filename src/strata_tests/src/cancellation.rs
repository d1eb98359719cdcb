use std::sync::Arc;
use strata_analysis::{CancelToken, LoadError, Loader, LoaderOptions, SchemaRegistry};
use strata_syntax::source::SourceRegistry;

#[test]
fn cancellation_is_fatal_and_registers_nothing() {
    let token = CancelToken::new();
    token.cancel();
    let sources = Arc::new(SourceRegistry::new());
    let registry = Arc::new(SchemaRegistry::new());
    let mut loader = Loader::new(
        Arc::clone(&sources),
        Arc::clone(&registry),
        LoaderOptions {
            cancel: token,
            ..LoaderOptions::default()
        },
    );
    let error = loader
        .load_str("cancelled", "schema Cancelled\n")
        .unwrap_err();
    assert!(matches!(error, LoadError::Cancelled));
    assert_eq!(registry.len(), 0);

    // the loading marker was cleaned up: a loader with a live token can
    // finish the same source against the same registries
    let mut retry = Loader::new(sources, registry, LoaderOptions::default());
    let outcome = retry.load_str("cancelled", "schema Cancelled\n").unwrap();
    assert!(outcome.schema.is_some());
}

#[test]
fn uncancelled_tokens_do_not_interfere() {
    let token = CancelToken::new();
    let mut loader = Loader::new(
        Arc::new(SourceRegistry::new()),
        Arc::new(SchemaRegistry::new()),
        LoaderOptions {
            cancel: token.clone(),
            ..LoaderOptions::default()
        },
    );
    let outcome = loader.load_str("fine", "schema Fine\n").unwrap();
    assert!(outcome.schema.is_some());
    assert!(!token.is_cancelled());
}
