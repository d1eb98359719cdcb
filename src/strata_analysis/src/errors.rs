use std::path::PathBuf;
use thiserror::Error;

/// Fatal loader failures, returned out-of-band from the diagnostic
/// channel: configuration problems, I/O that prevents reading the entry
/// file, and cancellation. None of these produce a schema; diagnostics
/// collected before the failure stay available on the loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid module root {path}: {source}")]
    InvalidModuleRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("entry {path} is not under the module root {root}")]
    EntryOutsideRoot { path: PathBuf, root: PathBuf },
    #[error("cannot read entry {path}: {source}")]
    EntryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("load cancelled")]
    Cancelled,
    #[error("no sources provided")]
    EmptySourceSet,
    #[error("entry {0:?} not found in the provided sources")]
    UnknownEntry(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
