//! The narrowing relation on constraints.
//!
//! `narrows_to(parent, child)` holds when every value admitted by `child`
//! is admitted by `parent`. It is reflexive and transitive, and
//! antisymmetric up to structural equality. Both sides unwrap alias chains
//! first; an unresolved or cyclic chain never narrows anything.

use crate::constraint::{Constraint, pattern_multiset};
use std::collections::BTreeSet;

pub fn narrows_to(parent: &Constraint, child: &Constraint) -> bool {
    let (Some(parent), Some(child)) = (parent.terminal(), child.terminal()) else {
        return false;
    };
    match (parent, child) {
        (
            Constraint::String {
                min_len: p_min,
                max_len: p_max,
            },
            Constraint::String {
                min_len: c_min,
                max_len: c_max,
            },
        ) => lower_bound_narrows(p_min, c_min) && upper_bound_narrows(p_max, c_max),
        (
            Constraint::Integer {
                min: p_min,
                max: p_max,
            },
            Constraint::Integer {
                min: c_min,
                max: c_max,
            },
        ) => lower_bound_narrows(p_min, c_min) && upper_bound_narrows(p_max, c_max),
        (
            Constraint::Float {
                min: p_min,
                max: p_max,
            },
            Constraint::Float {
                min: c_min,
                max: c_max,
            },
        ) => lower_bound_narrows(p_min, c_min) && upper_bound_narrows(p_max, c_max),
        (Constraint::Boolean, Constraint::Boolean) => true,
        (Constraint::Date, Constraint::Date) => true,
        (Constraint::Uuid, Constraint::Uuid) => true,
        // stricter than the numeric rules: format languages have no useful
        // subset relation, so only an identical format narrows
        (Constraint::Timestamp { format: p }, Constraint::Timestamp { format: c }) => p == c,
        (Constraint::Enum { values: p }, Constraint::Enum { values: c }) => {
            let parent_values: BTreeSet<&str> = p.iter().map(String::as_str).collect();
            c.iter().all(|value| parent_values.contains(value.as_str()))
        }
        (Constraint::Pattern { .. }, Constraint::Pattern { .. }) => {
            pattern_multiset(parent) == pattern_multiset(child)
        }
        (Constraint::Vector { dimension: p }, Constraint::Vector { dimension: c }) => p == c,
        (
            Constraint::List {
                element: p_elem,
                min_len: p_min,
                max_len: p_max,
            },
            Constraint::List {
                element: c_elem,
                min_len: c_min,
                max_len: c_max,
            },
        ) => {
            p_elem.narrows_to(c_elem)
                && lower_bound_narrows(p_min, c_min)
                && upper_bound_narrows(p_max, c_max)
        }
        _ => false,
    }
}

// Adding a bound is a narrowing; dropping one is a widening.
fn lower_bound_narrows<T: PartialOrd>(parent: &Option<T>, child: &Option<T>) -> bool {
    match (parent, child) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(p), Some(c)) => c >= p,
    }
}

fn upper_bound_narrows<T: PartialOrd>(parent: &Option<T>, child: &Option<T>) -> bool {
    match (parent, child) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(p), Some(c)) => c <= p,
    }
}
