//! Rooted filesystem access for import resolution.
//!
//! All import reads go through a capability handle opened once on the
//! module root. Escaping the root is rejected by the OS when the handle
//! resolves the path, which closes the TOCTOU window that string-prefix
//! checks leave open.

use crate::errors::LoadError;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use std::io;
use std::path::{Component, Path, PathBuf};
use strata_syntax::source::clean_components;

#[derive(Debug)]
pub struct ModuleSandbox {
    root: PathBuf,
    dir: Dir,
}

impl ModuleSandbox {
    /// Opens the sandbox on a canonicalized module root.
    pub fn open(root: &Path) -> Result<Self, LoadError> {
        let canonical = std::fs::canonicalize(root).map_err(|source| {
            LoadError::InvalidModuleRoot {
                path: root.to_path_buf(),
                source,
            }
        })?;
        let dir = Dir::open_ambient_dir(&canonical, ambient_authority()).map_err(|source| {
            LoadError::InvalidModuleRoot {
                path: canonical.clone(),
                source,
            }
        })?;
        Ok(ModuleSandbox {
            root: canonical,
            dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads a root-relative path through the capability handle.
    pub fn read(&self, relative: &Path) -> io::Result<Vec<u8>> {
        self.dir.read(relative)
    }
}

/// Normalizes an import path: forward-slash separators are kept as path
/// components, `./` segments collapse, and `..` folds into the prefix where
/// possible. A result still starting with `..` can only mean an escape
/// attempt; the sandbox handle is what actually rejects it.
pub fn normalize_import_path(path: &str) -> PathBuf {
    let replaced = path.replace('\\', "/");
    clean_components(Path::new(&replaced))
}

/// Whether a normalized relative path lexically points outside the root.
/// Used only to pick the diagnostic code; enforcement is the OS's job.
pub fn lexically_escapes(path: &Path) -> bool {
    matches!(path.components().next(), Some(Component::ParentDir)) || path.is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_inner_dots() {
        assert_eq!(
            normalize_import_path("./a/b/../c"),
            PathBuf::from("a/c")
        );
        assert_eq!(normalize_import_path("a//b"), PathBuf::from("a/b"));
    }

    #[test]
    fn escapes_are_visible_lexically() {
        assert!(lexically_escapes(&normalize_import_path("../outside")));
        assert!(lexically_escapes(&normalize_import_path("a/../../outside")));
        assert!(!lexically_escapes(&normalize_import_path("a/../b")));
    }
}
