//! strata_parser crate
//!
//! Entry point: [`Parser::parse`], which takes a pre-registered source id
//! and its text and produces the parse model (`strata_syntax::ast`). Syntax
//! errors come back as a [`ParseFailure`] summarizing the deepest
//! expectation in the `ErrorTree`.

pub mod constraints;
pub mod declarations;
pub mod errors;
pub mod expressions;
pub mod facade;
pub mod keywords;
pub mod tokens;

use nom::IResult;
use nom_locate::LocatedSpan;
use nom_supreme::error::ErrorTree;
use strata_syntax::source::SourceId;

/// Parser input: a located span carrying the identity of the source being
/// parsed, so every AST span can name its document.
pub type Input<'a> = LocatedSpan<&'a str, &'a SourceId>;

pub type PResult<'a, O> = IResult<Input<'a>, O, ErrorTree<Input<'a>>>;

pub use errors::ParseFailure;
pub use facade::Parser;
pub use keywords::{is_keyword, is_reserved};
