// Value-constraint lattice: a closed set of variants with structural
// equality and a partial-order narrowing relation used for inheritance
// checks. Alias chains unwrap through a bounded, cycle-safe walk.

mod narrow;

pub use narrow::narrows_to;

use regex::Regex;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::collections::BTreeSet;
use thiserror::Error;

/// Maximum number of regexes a Pattern constraint keeps; extras are dropped
/// silently at construction.
pub const MAX_PATTERNS: usize = 2;

#[derive(Debug, Clone)]
pub enum Constraint {
    String {
        min_len: Option<u64>,
        max_len: Option<u64>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Timestamp {
        format: Option<String>,
    },
    Date,
    Uuid,
    /// Ordered list of distinct values; equality is set equality.
    Enum {
        values: Vec<String>,
    },
    /// Conjunction of compiled regexes; equality is multiset equality of the
    /// pattern source strings.
    Pattern {
        patterns: Vec<Regex>,
    },
    Vector {
        dimension: u64,
    },
    List {
        element: Box<Constraint>,
        min_len: Option<u64>,
        max_len: Option<u64>,
    },
    /// Reference to a named DataType. `resolved` is filled in by the
    /// completer and may point to another Alias (chains are preserved).
    Alias {
        data_type_name: String,
        resolved: Option<Box<Constraint>>,
    },
}

#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("{kind} bounds are inverted ({min} > {max})")]
    InvertedBounds {
        kind: &'static str,
        min: String,
        max: String,
    },
    #[error("enum value {0:?} appears more than once")]
    DuplicateEnumValue(String),
    #[error("a pattern constraint needs at least one pattern")]
    EmptyPattern,
}

impl Constraint {
    pub fn string(min_len: Option<u64>, max_len: Option<u64>) -> Result<Self, ConstraintError> {
        check_bounds("string", &min_len, &max_len)?;
        Ok(Constraint::String { min_len, max_len })
    }

    pub fn integer(min: Option<i64>, max: Option<i64>) -> Result<Self, ConstraintError> {
        check_bounds("integer", &min, &max)?;
        Ok(Constraint::Integer { min, max })
    }

    pub fn float(min: Option<f64>, max: Option<f64>) -> Result<Self, ConstraintError> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(ConstraintError::InvertedBounds {
                    kind: "float",
                    min: lo.to_string(),
                    max: hi.to_string(),
                });
            }
        }
        Ok(Constraint::Float { min, max })
    }

    pub fn timestamp(format: Option<String>) -> Self {
        Constraint::Timestamp { format }
    }

    pub fn enumeration(values: Vec<String>) -> Result<Self, ConstraintError> {
        let mut seen = BTreeSet::new();
        for value in &values {
            if !seen.insert(value.as_str()) {
                return Err(ConstraintError::DuplicateEnumValue(value.clone()));
            }
        }
        Ok(Constraint::Enum { values })
    }

    /// Builds a Pattern constraint; at most [`MAX_PATTERNS`] regexes are
    /// kept, the rest are dropped silently.
    pub fn pattern(mut patterns: Vec<Regex>) -> Result<Self, ConstraintError> {
        if patterns.is_empty() {
            return Err(ConstraintError::EmptyPattern);
        }
        patterns.truncate(MAX_PATTERNS);
        Ok(Constraint::Pattern { patterns })
    }

    pub fn vector(dimension: u64) -> Self {
        Constraint::Vector { dimension }
    }

    pub fn list(
        element: Constraint,
        min_len: Option<u64>,
        max_len: Option<u64>,
    ) -> Result<Self, ConstraintError> {
        check_bounds("list", &min_len, &max_len)?;
        Ok(Constraint::List {
            element: Box::new(element),
            min_len,
            max_len,
        })
    }

    pub fn alias(data_type_name: impl Into<String>) -> Self {
        Constraint::Alias {
            data_type_name: data_type_name.into(),
            resolved: None,
        }
    }

    /// Variant name for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constraint::String { .. } => "String",
            Constraint::Integer { .. } => "Integer",
            Constraint::Float { .. } => "Float",
            Constraint::Boolean => "Boolean",
            Constraint::Timestamp { .. } => "Timestamp",
            Constraint::Date => "Date",
            Constraint::Uuid => "UUID",
            Constraint::Enum { .. } => "Enum",
            Constraint::Pattern { .. } => "Pattern",
            Constraint::Vector { .. } => "Vector",
            Constraint::List { .. } => "List",
            Constraint::Alias { .. } => "Alias",
        }
    }

    /// Unwraps an alias chain to its non-Alias terminal. The walk is bounded
    /// by the set of visited datatype names; a repeated name (a cycle) or a
    /// missing `resolved` link yields `None`.
    pub fn terminal(&self) -> Option<&Constraint> {
        let mut visited: Vec<&str> = Vec::new();
        let mut current = self;
        loop {
            match current {
                Constraint::Alias {
                    data_type_name,
                    resolved,
                } => {
                    if visited.iter().any(|seen| seen == data_type_name) {
                        return None;
                    }
                    visited.push(data_type_name);
                    match resolved {
                        Some(inner) => current = inner,
                        None => return None,
                    }
                }
                other => return Some(other),
            }
        }
    }

    /// Whether the constraint (including nested list elements) resolves to
    /// concrete terminals.
    pub fn is_resolved(&self) -> bool {
        match self.terminal() {
            None => false,
            Some(Constraint::List { element, .. }) => element.is_resolved(),
            Some(_) => true,
        }
    }

    /// Structural equality. Non-Alias variants compare field-wise (Enum as a
    /// set, Pattern as a multiset of source strings). Aliases compare their
    /// resolved terminals; when either side is unresolved, two aliases fall
    /// back to comparing datatype names.
    pub fn equals(&self, other: &Constraint) -> bool {
        match (self.terminal(), other.terminal()) {
            (Some(lhs), Some(rhs)) => terminal_equals(lhs, rhs),
            _ => match (self, other) {
                (
                    Constraint::Alias {
                        data_type_name: lhs,
                        ..
                    },
                    Constraint::Alias {
                        data_type_name: rhs,
                        ..
                    },
                ) => lhs == rhs,
                _ => false,
            },
        }
    }

    /// Whether `child` is a legal narrowing of `self`. See [`narrows_to`].
    pub fn narrows_to(&self, child: &Constraint) -> bool {
        narrow::narrows_to(self, child)
    }

    pub fn pattern_sources(&self) -> Vec<&str> {
        match self {
            Constraint::Pattern { patterns } => {
                patterns.iter().map(|regex| regex.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn check_bounds<T: PartialOrd + ToString>(
    kind: &'static str,
    min: &Option<T>,
    max: &Option<T>,
) -> Result<(), ConstraintError> {
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(ConstraintError::InvertedBounds {
                kind,
                min: lo.to_string(),
                max: hi.to_string(),
            });
        }
    }
    Ok(())
}

fn terminal_equals(lhs: &Constraint, rhs: &Constraint) -> bool {
    match (lhs, rhs) {
        (
            Constraint::String {
                min_len: a_min,
                max_len: a_max,
            },
            Constraint::String {
                min_len: b_min,
                max_len: b_max,
            },
        ) => a_min == b_min && a_max == b_max,
        (
            Constraint::Integer {
                min: a_min,
                max: a_max,
            },
            Constraint::Integer {
                min: b_min,
                max: b_max,
            },
        ) => a_min == b_min && a_max == b_max,
        (
            Constraint::Float {
                min: a_min,
                max: a_max,
            },
            Constraint::Float {
                min: b_min,
                max: b_max,
            },
        ) => a_min == b_min && a_max == b_max,
        (Constraint::Boolean, Constraint::Boolean) => true,
        (Constraint::Date, Constraint::Date) => true,
        (Constraint::Uuid, Constraint::Uuid) => true,
        (Constraint::Timestamp { format: a }, Constraint::Timestamp { format: b }) => a == b,
        (Constraint::Enum { values: a }, Constraint::Enum { values: b }) => {
            let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
            let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
            a == b
        }
        (Constraint::Pattern { .. }, Constraint::Pattern { .. }) => {
            pattern_multiset(lhs) == pattern_multiset(rhs)
        }
        (Constraint::Vector { dimension: a }, Constraint::Vector { dimension: b }) => a == b,
        (
            Constraint::List {
                element: a_elem,
                min_len: a_min,
                max_len: a_max,
            },
            Constraint::List {
                element: b_elem,
                min_len: b_min,
                max_len: b_max,
            },
        ) => a_min == b_min && a_max == b_max && a_elem.equals(b_elem),
        _ => false,
    }
}

pub(crate) fn pattern_multiset(constraint: &Constraint) -> Vec<&str> {
    let mut sources = constraint.pattern_sources();
    sources.sort_unstable();
    sources
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

// Hand-written so compiled regexes serialize as their source strings.
impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Constraint::String { min_len, max_len } => {
                let mut state = serializer.serialize_struct("Constraint", 3)?;
                state.serialize_field("kind", "String")?;
                state.serialize_field("min_len", min_len)?;
                state.serialize_field("max_len", max_len)?;
                state.end()
            }
            Constraint::Integer { min, max } => {
                let mut state = serializer.serialize_struct("Constraint", 3)?;
                state.serialize_field("kind", "Integer")?;
                state.serialize_field("min", min)?;
                state.serialize_field("max", max)?;
                state.end()
            }
            Constraint::Float { min, max } => {
                let mut state = serializer.serialize_struct("Constraint", 3)?;
                state.serialize_field("kind", "Float")?;
                state.serialize_field("min", min)?;
                state.serialize_field("max", max)?;
                state.end()
            }
            Constraint::Boolean | Constraint::Date | Constraint::Uuid => {
                let mut state = serializer.serialize_struct("Constraint", 1)?;
                state.serialize_field("kind", self.kind_name())?;
                state.end()
            }
            Constraint::Timestamp { format } => {
                let mut state = serializer.serialize_struct("Constraint", 2)?;
                state.serialize_field("kind", "Timestamp")?;
                state.serialize_field("format", format)?;
                state.end()
            }
            Constraint::Enum { values } => {
                let mut state = serializer.serialize_struct("Constraint", 2)?;
                state.serialize_field("kind", "Enum")?;
                state.serialize_field("values", values)?;
                state.end()
            }
            Constraint::Pattern { .. } => {
                let mut state = serializer.serialize_struct("Constraint", 2)?;
                state.serialize_field("kind", "Pattern")?;
                state.serialize_field("patterns", &self.pattern_sources())?;
                state.end()
            }
            Constraint::Vector { dimension } => {
                let mut state = serializer.serialize_struct("Constraint", 2)?;
                state.serialize_field("kind", "Vector")?;
                state.serialize_field("dimension", dimension)?;
                state.end()
            }
            Constraint::List {
                element,
                min_len,
                max_len,
            } => {
                let mut state = serializer.serialize_struct("Constraint", 4)?;
                state.serialize_field("kind", "List")?;
                state.serialize_field("element", element.as_ref())?;
                state.serialize_field("min_len", min_len)?;
                state.serialize_field("max_len", max_len)?;
                state.end()
            }
            Constraint::Alias {
                data_type_name,
                resolved,
            } => {
                let mut state = serializer.serialize_struct("Constraint", 3)?;
                state.serialize_field("kind", "Alias")?;
                state.serialize_field("data_type", data_type_name)?;
                state.serialize_field("resolved", &resolved.as_deref())?;
                state.end()
            }
        }
    }
}
