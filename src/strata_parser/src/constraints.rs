//! Constraint expression parsers. Builtin constraint heads are tried
//! first; anything else that looks like a name becomes an unresolved Alias
//! for the completer to chase.

use crate::declarations::type_ref;
use crate::tokens::{kw, string_literal, sym, uint, ws};
use crate::{Input, PResult};
use nom::branch::alt;
use nom::character::complete::{char as nom_char, digit1};
use nom::combinator::{map, map_res, opt, recognize};
use nom::error::{ErrorKind, FromExternalError};
use nom::multi::separated_list1;
use nom::sequence::pair;
use nom_supreme::error::ErrorTree;
use regex::Regex;
use strata_syntax::ast::TypeRef;
use strata_syntax::constraint::{Constraint, ConstraintError};

pub fn constraint_expr(input: Input<'_>) -> PResult<'_, Constraint> {
    alt((
        builtin_constraint,
        map(type_ref, |reference| {
            Constraint::alias(reference.qualified_name())
        }),
    ))(input)
}

/// Like [`constraint_expr`] but keeps the syntactic reference when the
/// constraint names a datatype, for `Property.data_type_ref`.
pub fn annotated_constraint(input: Input<'_>) -> PResult<'_, (Constraint, Option<TypeRef>)> {
    alt((
        map(builtin_constraint, |constraint| (constraint, None)),
        map(type_ref, |reference| {
            (
                Constraint::alias(reference.qualified_name()),
                Some(reference),
            )
        }),
    ))(input)
}

pub fn builtin_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    alt((
        string_constraint,
        integer_constraint,
        float_constraint,
        map(kw("Boolean"), |_| Constraint::Boolean),
        timestamp_constraint,
        map(kw("Date"), |_| Constraint::Date),
        map(kw("UUID"), |_| Constraint::Uuid),
        enum_constraint,
        pattern_constraint,
        vector_constraint,
        list_constraint,
    ))(input)
}

// Semantic construction failures (inverted bounds, bad regexes) abort the
// parse instead of backtracking into the alias branch.
fn finish_constraint<'a>(
    input: Input<'a>,
    built: Result<Constraint, ConstraintError>,
) -> PResult<'a, Constraint> {
    match built {
        Ok(constraint) => Ok((input, constraint)),
        Err(error) => Err(nom::Err::Failure(ErrorTree::from_external_error(
            input,
            ErrorKind::Verify,
            error,
        ))),
    }
}

fn string_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("String")(input)?;
    let (input, bounds) = opt(length_bounds)(input)?;
    let (min_len, max_len) = bounds.unwrap_or((None, None));
    finish_constraint(input, Constraint::string(min_len, max_len))
}

fn integer_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("Integer")(input)?;
    let (input, bounds) = opt(int_bounds)(input)?;
    let (min, max) = bounds.unwrap_or((None, None));
    finish_constraint(input, Constraint::integer(min, max))
}

fn float_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("Float")(input)?;
    let (input, bounds) = opt(float_bounds)(input)?;
    let (min, max) = bounds.unwrap_or((None, None));
    finish_constraint(input, Constraint::float(min, max))
}

fn timestamp_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("Timestamp")(input)?;
    let (input, format) = opt(|i| {
        let (i, _) = sym("(")(i)?;
        let (i, (text, _)) = string_literal(i)?;
        let (i, _) = sym(")")(i)?;
        Ok((i, text))
    })(input)?;
    Ok((input, Constraint::timestamp(format)))
}

fn enum_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("Enum")(input)?;
    let (input, _) = sym("(")(input)?;
    let (input, values) = separated_list1(sym(","), string_literal)(input)?;
    let (input, _) = sym(")")(input)?;
    let values = values.into_iter().map(|(text, _)| text).collect();
    finish_constraint(input, Constraint::enumeration(values))
}

fn pattern_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("Pattern")(input)?;
    let (input, _) = sym("(")(input)?;
    let (input, sources) = separated_list1(sym(","), string_literal)(input)?;
    let (input, _) = sym(")")(input)?;
    let mut patterns = Vec::with_capacity(sources.len());
    for (source, _) in sources {
        match Regex::new(&source) {
            Ok(regex) => patterns.push(regex),
            Err(error) => {
                return Err(nom::Err::Failure(ErrorTree::from_external_error(
                    input,
                    ErrorKind::Verify,
                    error,
                )));
            }
        }
    }
    finish_constraint(input, Constraint::pattern(patterns))
}

fn vector_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("Vector")(input)?;
    let (input, _) = sym("(")(input)?;
    let (input, dimension) = uint(input)?;
    let (input, _) = sym(")")(input)?;
    Ok((input, Constraint::vector(dimension)))
}

fn list_constraint(input: Input<'_>) -> PResult<'_, Constraint> {
    let (input, _) = kw("List")(input)?;
    let (input, _) = sym("<")(input)?;
    let (input, element) = constraint_expr(input)?;
    let (input, _) = sym(">")(input)?;
    let (input, bounds) = opt(length_bounds)(input)?;
    let (min_len, max_len) = bounds.unwrap_or((None, None));
    finish_constraint(input, Constraint::list(element, min_len, max_len))
}

fn length_bounds(input: Input<'_>) -> PResult<'_, (Option<u64>, Option<u64>)> {
    let (input, _) = sym("[")(input)?;
    let (input, min) = opt(uint)(input)?;
    let (input, _) = sym(",")(input)?;
    let (input, max) = opt(uint)(input)?;
    let (input, _) = sym("]")(input)?;
    Ok((input, (min, max)))
}

fn int_bounds(input: Input<'_>) -> PResult<'_, (Option<i64>, Option<i64>)> {
    let (input, _) = sym("[")(input)?;
    let (input, min) = opt(crate::tokens::int)(input)?;
    let (input, _) = sym(",")(input)?;
    let (input, max) = opt(crate::tokens::int)(input)?;
    let (input, _) = sym("]")(input)?;
    Ok((input, (min, max)))
}

fn float_bounds(input: Input<'_>) -> PResult<'_, (Option<f64>, Option<f64>)> {
    let (input, _) = sym("[")(input)?;
    let (input, min) = opt(signed_float)(input)?;
    let (input, _) = sym(",")(input)?;
    let (input, max) = opt(signed_float)(input)?;
    let (input, _) = sym("]")(input)?;
    Ok((input, (min, max)))
}

fn signed_float(input: Input<'_>) -> PResult<'_, f64> {
    let (input, _) = ws(input)?;
    map_res(
        recognize(pair(
            opt(nom_char('-')),
            pair(digit1, opt(pair(nom_char('.'), digit1))),
        )),
        |digits: Input| digits.fragment().parse::<f64>(),
    )(input)
}
