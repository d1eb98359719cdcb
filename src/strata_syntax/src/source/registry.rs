use crate::source::{Position, SourceError, SourceId, Span};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

/// Immutable content of one registered source plus its precomputed indices.
///
/// `line_offsets[i]` is the byte offset where line `i + 1` begins (line 1
/// starts at offset 0). CR, LF and CRLF each produce one line break; CRLF
/// counts as one. `rune_offsets[i]` is the byte offset of the i-th Unicode
/// code point; each invalid UTF-8 byte counts as one rune.
#[derive(Debug)]
pub struct SourceText {
    bytes: Vec<u8>,
    line_offsets: Vec<usize>,
    rune_offsets: Vec<usize>,
}

impl SourceText {
    pub fn new(bytes: Vec<u8>) -> Self {
        let line_offsets = compute_line_offsets(&bytes);
        let rune_offsets = compute_rune_offsets(&bytes);
        SourceText {
            bytes,
            line_offsets,
            rune_offsets,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }

    pub fn rune_count(&self) -> usize {
        self.rune_offsets.len()
    }

    /// Index of the rune containing `byte`, with floor semantics when the
    /// offset falls in the middle of a multi-byte rune. `byte == len` maps
    /// to one past the last rune.
    fn rune_index_at(&self, byte: usize) -> usize {
        if byte >= self.bytes.len() {
            return self.rune_offsets.len();
        }
        self.rune_offsets.partition_point(|&offset| offset <= byte) - 1
    }

    fn position_at(&self, byte: usize) -> Option<Position> {
        if byte > self.bytes.len() {
            return None;
        }
        let line_index = self.line_offsets.partition_point(|&offset| offset <= byte) - 1;
        let line_start = self.line_offsets[line_index];
        let column = self.rune_index_at(byte) - self.rune_index_at(line_start) + 1;
        Some(Position::new(line_index as u32 + 1, column as u32, byte))
    }
}

fn compute_line_offsets(bytes: &[u8]) -> Vec<usize> {
    let mut offsets = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                offsets.push(i + 1);
                i += 1;
            }
            b'\r' => {
                // CRLF is one break
                if bytes.get(i + 1) == Some(&b'\n') {
                    offsets.push(i + 2);
                    i += 2;
                } else {
                    offsets.push(i + 1);
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    offsets
}

fn compute_rune_offsets(bytes: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        offsets.push(i);
        let lead = bytes[i];
        let width = match lead {
            0x00..=0x7F => 1,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            // stray continuation or invalid lead byte
            _ => 1,
        };
        if width == 1 {
            i += 1;
            continue;
        }
        let end = i + width;
        let valid = end <= bytes.len()
            && bytes[i + 1..end].iter().all(|b| (0x80..0xC0).contains(b));
        // an invalid sequence degrades to one rune per byte
        i += if valid { width } else { 1 };
    }
    offsets
}

/// Content-addressed store of source documents with line/rune indices.
///
/// Many concurrent readers, rare writers. Index precomputation and all
/// cloning happen outside the lock; the write lock is held only for the map
/// insertion itself.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: RwLock<HashMap<SourceId, Arc<SourceText>>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry::default()
    }

    /// Register content for `id`. Registering identical bytes twice is
    /// idempotent; different bytes under an existing id is a key collision.
    pub fn register(&self, id: SourceId, bytes: &[u8]) -> Result<(), SourceError> {
        let text = Arc::new(SourceText::new(bytes.to_vec()));
        let mut entries = self.entries.write().expect("source registry poisoned");
        match entries.entry(id) {
            Entry::Occupied(existing) => {
                if existing.get().bytes == text.bytes {
                    Ok(())
                } else {
                    Err(SourceError::KeyCollision(existing.key().clone()))
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(text);
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.entries
            .read()
            .expect("source registry poisoned")
            .contains_key(id)
    }

    /// Content bytes for `id`, as a defensive copy.
    pub fn content_of(&self, id: &SourceId) -> Option<Vec<u8>> {
        self.text_of(id).map(|text| text.bytes.clone())
    }

    /// Content bytes for the span's source document.
    pub fn content(&self, span: &Span) -> Option<Vec<u8>> {
        self.content_of(&span.source)
    }

    pub fn text_of(&self, id: &SourceId) -> Option<Arc<SourceText>> {
        self.entries
            .read()
            .expect("source registry poisoned")
            .get(id)
            .cloned()
    }

    /// Position for a byte offset. Returns the zero Position when the id is
    /// unknown or the offset is outside `[0, len]`. An offset equal to the
    /// content length is the end-of-file position: one column past the last
    /// rune of the last line, or the start of a fresh line when the content
    /// ends with a line break.
    pub fn position_at(&self, id: &SourceId, byte: usize) -> Position {
        let Some(text) = self.text_of(id) else {
            return Position::default();
        };
        text.position_at(byte).unwrap_or_default()
    }

    /// Byte offset where the 1-based `line` begins.
    pub fn line_start_byte(&self, id: &SourceId, line: u32) -> Result<usize, SourceError> {
        let text = self
            .text_of(id)
            .ok_or_else(|| SourceError::UnknownSource(id.clone()))?;
        let index = line as usize;
        if line == 0 || index > text.line_offsets.len() {
            return Err(SourceError::LineOutOfRange {
                id: id.clone(),
                line,
                max: text.line_offsets.len(),
            });
        }
        Ok(text.line_offsets[index - 1])
    }

    /// Byte offset of the 0-based rune index. An index equal to the rune
    /// count maps to the content length (end of file).
    pub fn rune_to_byte_offset(&self, id: &SourceId, index: usize) -> Result<usize, SourceError> {
        let text = self
            .text_of(id)
            .ok_or_else(|| SourceError::UnknownSource(id.clone()))?;
        if index == text.rune_offsets.len() {
            return Ok(text.bytes.len());
        }
        text.rune_offsets
            .get(index)
            .copied()
            .ok_or(SourceError::RuneOutOfRange {
                id: id.clone(),
                index,
                len: text.rune_offsets.len(),
            })
    }

    /// All registered ids, sorted by string form for deterministic iteration.
    pub fn keys(&self) -> Vec<SourceId> {
        let mut keys: Vec<SourceId> = self
            .entries
            .read()
            .expect("source registry poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("source registry poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries
            .write()
            .expect("source registry poisoned")
            .clear();
    }
}
