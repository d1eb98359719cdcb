// Source identity and location value types.

pub mod registry;

pub use registry::{SourceRegistry, SourceText};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Canonical identity of a source document.
///
/// Either a canonicalized absolute filesystem path, or an opaque string for
/// synthetic sources (`string://name`, `mem://path`). The zero value is the
/// empty synthetic id and is distinguishable via `is_zero`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    File(PathBuf),
    Synthetic(String),
}

impl SourceId {
    /// A file identity. The path is canonicalized (symlink-following); when
    /// canonicalization fails (e.g. the file does not exist yet in an editor
    /// context), falls back to the lexically cleaned absolute path.
    pub fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::canonicalize(path) {
            Ok(canonical) => SourceId::File(canonical),
            Err(_) => SourceId::File(clean_absolute(path)),
        }
    }

    pub fn synthetic(name: impl Into<String>) -> Self {
        SourceId::Synthetic(name.into())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, SourceId::Synthetic(name) if name.is_empty())
    }

    /// Stable string form used for ordering and display.
    pub fn as_display_string(&self) -> String {
        match self {
            SourceId::File(path) => path.display().to_string(),
            SourceId::Synthetic(name) => name.clone(),
        }
    }
}

impl Default for SourceId {
    fn default() -> Self {
        SourceId::Synthetic(String::new())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::File(path) => write!(f, "{}", path.display()),
            SourceId::Synthetic(name) => f.write_str(name),
        }
    }
}

// Ordering is by string form, so registry iteration is deterministic and
// independent of the variant.
impl Ord for SourceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_display_string().cmp(&other.as_display_string())
    }
}

impl PartialOrd for SourceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexically clean a path and make it absolute against the current
/// directory, without touching the filesystem.
pub fn clean_absolute(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    clean_components(&absolute)
}

/// Collapse `.` and `..` components lexically. Leading `..` components that
/// would escape the path root are preserved so callers can still see them.
pub fn clean_components(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    cleaned.components().next_back(),
                    Some(Component::Normal(_))
                );
                if popped {
                    cleaned.pop();
                } else {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// A 1-based line/column pair plus the byte offset it was derived from.
///
/// Column counts Unicode code points from the line start. The zero value
/// signals "unknown position"; a byte offset equal to the content length is
/// a valid end-of-file position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub byte: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, byte: usize) -> Self {
        Position { line, column, byte }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A contiguous region of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub source: SourceId,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(source: SourceId, start: Position, end: Position) -> Self {
        Span { source, start, end }
    }

    pub fn is_zero(&self) -> bool {
        self.source.is_zero() && self.start.is_unknown() && self.end.is_unknown()
    }

    /// Whether the position falls inside the span. Start is inclusive; the
    /// end is exclusive except for empty spans, which contain their start.
    pub fn contains(&self, position: &Position) -> bool {
        if position.is_unknown() || self.start.is_unknown() {
            return false;
        }
        if self.start.byte == self.end.byte {
            return position.byte == self.start.byte;
        }
        self.start.byte <= position.byte && position.byte < self.end.byte
    }

    /// A span covering both `self` and `other` (same source assumed).
    pub fn to(&self, other: &Span) -> Span {
        Span {
            source: self.source.clone(),
            start: self.start,
            end: other.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.start)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source {0} is already registered with different content")]
    KeyCollision(SourceId),
    #[error("unknown source {0}")]
    UnknownSource(SourceId),
    #[error("line {line} out of range for {id} ({max} line(s))")]
    LineOutOfRange { id: SourceId, line: u32, max: usize },
    #[error("rune index {index} out of range for {id} ({len} rune(s))")]
    RuneOutOfRange { id: SourceId, index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_orders_by_string_form() {
        let a = SourceId::synthetic("a");
        let b = SourceId::File(PathBuf::from("/b"));
        let c = SourceId::synthetic("z");
        let mut ids = vec![c.clone(), a.clone(), b.clone()];
        ids.sort();
        assert_eq!(ids, vec![b, a, c]);
    }

    #[test]
    fn zero_value_is_distinguishable() {
        assert!(SourceId::default().is_zero());
        assert!(!SourceId::synthetic("string://x").is_zero());
        assert!(Position::default().is_unknown());
    }

    #[test]
    fn clean_components_collapses_dots() {
        assert_eq!(
            clean_components(Path::new("a/./b/../c")),
            PathBuf::from("a/c")
        );
        assert_eq!(
            clean_components(Path::new("../x/y")),
            PathBuf::from("../x/y")
        );
    }

    #[test]
    fn span_contains_is_start_inclusive_end_exclusive() {
        let id = SourceId::synthetic("string://s");
        let span = Span::new(
            id,
            Position::new(1, 1, 0),
            Position::new(1, 5, 4),
        );
        assert!(span.contains(&Position::new(1, 1, 0)));
        assert!(span.contains(&Position::new(1, 4, 3)));
        assert!(!span.contains(&Position::new(1, 5, 4)));
        assert!(!span.contains(&Position::default()));
    }
}
