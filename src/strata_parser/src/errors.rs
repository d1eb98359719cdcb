//! Summarization of `ErrorTree` parse failures into a single offset plus
//! expectation, and a caret-rendered excerpt for CLI output.

use crate::Input;
use nom_supreme::error::{BaseErrorKind, ErrorTree};

/// A failed parse, reduced to the deepest error location and what the
/// parser expected there. The analysis layer maps the offset back through
/// the source registry to produce a positioned diagnostic.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub offset: usize,
    pub expected: String,
}

impl ParseFailure {
    pub(crate) fn from_tree(tree: &ErrorTree<Input<'_>>) -> Self {
        let (offset, expected) = deepest_expectation(tree);
        ParseFailure { offset, expected }
    }

    pub fn message(&self) -> String {
        format!("syntax error: expected {}", self.expected)
    }

    /// Concise pretty rendering with line text and caret.
    pub fn render(&self, source: &str) -> String {
        let (line, column) = line_col(source, self.offset);
        let text = source.lines().nth(line.saturating_sub(1)).unwrap_or("");
        format!(
            "at {}:{}: expected {}\n{}\n{}^",
            line,
            column,
            self.expected,
            text,
            " ".repeat(column.saturating_sub(1))
        )
    }
}

/// Walks the error tree to the alternative that got furthest into the
/// input; ties resolve to the first such branch.
fn deepest_expectation(tree: &ErrorTree<Input<'_>>) -> (usize, String) {
    match tree {
        ErrorTree::Base { location, kind } => (location.location_offset(), describe(kind)),
        ErrorTree::Stack { base, .. } => deepest_expectation(base),
        ErrorTree::Alt(alternatives) => {
            let mut best: Option<(usize, String)> = None;
            for alternative in alternatives {
                let candidate = deepest_expectation(alternative);
                let further = best
                    .as_ref()
                    .map(|(offset, _)| candidate.0 > *offset)
                    .unwrap_or(true);
                if further {
                    best = Some(candidate);
                }
            }
            best.unwrap_or((0, "input".to_string()))
        }
    }
}

fn describe(
    kind: &BaseErrorKind<&'static str, Box<dyn std::error::Error + Send + Sync + 'static>>,
) -> String {
    match kind {
        BaseErrorKind::Expected(expectation) => expectation.to_string(),
        BaseErrorKind::Kind(kind) => format!("{kind:?}"),
        BaseErrorKind::External(error) => error.to_string(),
    }
}

fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1usize;
    let mut column = 1usize;
    for (index, ch) in source.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
