//! Low-level lexical parsers: trivia, identifiers, literals, keywords.
//!
//! Every token parser consumes leading trivia only, so the remaining input
//! after a token marks the token's exact end and span construction stays
//! trivial.

use crate::keywords::is_reserved;
use crate::{Input, PResult};
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::{
    alpha1, alphanumeric1, anychar, char as nom_char, digit1, multispace1,
};
use nom::combinator::{map, map_res, not, opt, recognize, value};
use nom::error::{ErrorKind, ParseError};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom_supreme::error::ErrorTree;
use strata_syntax::source::{Position, Span};

pub fn position_of(input: &Input<'_>) -> Position {
    Position::new(
        input.location_line(),
        input.get_utf8_column() as u32,
        input.location_offset(),
    )
}

/// Span from the start of `start` to the start of `end` (the usual
/// "remaining input after the token" pair).
pub fn span_between(start: &Input<'_>, end: &Input<'_>) -> Span {
    Span::new(start.extra.clone(), position_of(start), position_of(end))
}

/// Span from an already-built span's start to the current input position.
pub fn span_from(start: &Span, input: &Input<'_>) -> Span {
    Span::new(start.source.clone(), start.start, position_of(input))
}

/// Skips whitespace and non-doc line comments. Doc comments (`///`) are
/// significant and left alone.
pub fn ws(input: Input<'_>) -> PResult<'_, ()> {
    value((), many0(alt((value((), multispace1), line_comment))))(input)
}

fn line_comment(input: Input<'_>) -> PResult<'_, ()> {
    value((), tuple((tag("//"), not(tag("/")), opt(is_not("\r\n")))))(input)
}

/// A run of `///` lines joined with newlines; `None` when absent.
pub fn doc_block(input: Input<'_>) -> PResult<'_, Option<String>> {
    let (input, lines) = many0(doc_line)(input)?;
    let doc = if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    };
    Ok((input, doc))
}

fn doc_line(input: Input<'_>) -> PResult<'_, String> {
    let (input, _) = ws(input)?;
    let (input, _) = tag("///")(input)?;
    let (input, text) = opt(is_not("\r\n"))(input)?;
    let line = text
        .map(|t: Input| t.fragment().trim().to_string())
        .unwrap_or_default();
    Ok((input, line))
}

/// A keyword token: the exact word not followed by an identifier character.
pub fn kw<'a>(word: &'static str) -> impl FnMut(Input<'a>) -> PResult<'a, Span> {
    move |input: Input<'a>| {
        let (input, _) = ws(input)?;
        let start = input.clone();
        let (rest, _) = terminated(tag(word), not(ident_char))(input)?;
        Ok((rest, span_between(&start, &rest)))
    }
}

/// A punctuation token.
pub fn sym<'a>(token: &'static str) -> impl FnMut(Input<'a>) -> PResult<'a, Span> {
    move |input: Input<'a>| {
        let (input, _) = ws(input)?;
        let start = input.clone();
        let (rest, _) = tag(token)(input)?;
        Ok((rest, span_between(&start, &rest)))
    }
}

fn ident_char(input: Input<'_>) -> PResult<'_, Input<'_>> {
    alt((alphanumeric1, tag("_")))(input)
}

/// An identifier: letter or underscore, then letters, digits or
/// underscores. Reserved words are rejected.
pub fn identifier(input: Input<'_>) -> PResult<'_, (String, Span)> {
    let (input, _) = ws(input)?;
    let start = input.clone();
    let (rest, frag) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(ident_char),
    ))(input)?;
    let text = *frag.fragment();
    if is_reserved(text) {
        return Err(nom::Err::Error(ErrorTree::from_error_kind(
            start,
            ErrorKind::Tag,
        )));
    }
    Ok((rest, (text.to_string(), span_between(&start, &rest))))
}

/// A double-quoted string literal with `\\`, `\"`, `\n`, `\t` escapes.
pub fn string_literal(input: Input<'_>) -> PResult<'_, (String, Span)> {
    let (input, _) = ws(input)?;
    let start = input.clone();
    let (rest, text) = delimited(nom_char('"'), string_body, nom_char('"'))(input)?;
    Ok((rest, (text, span_between(&start, &rest))))
}

fn string_body(input: Input<'_>) -> PResult<'_, String> {
    map(
        many0(alt((
            map(is_not("\\\""), |chunk: Input| {
                (*chunk.fragment()).to_string()
            }),
            map(preceded(nom_char('\\'), anychar), |escaped| match escaped {
                'n' => "\n".to_string(),
                't' => "\t".to_string(),
                other => other.to_string(),
            }),
        ))),
        |parts| parts.concat(),
    )(input)
}

pub fn uint(input: Input<'_>) -> PResult<'_, u64> {
    let (input, _) = ws(input)?;
    map_res(digit1, |digits: Input| digits.fragment().parse::<u64>())(input)
}

pub fn int(input: Input<'_>) -> PResult<'_, i64> {
    let (input, _) = ws(input)?;
    map_res(
        recognize(pair(opt(nom_char('-')), digit1)),
        |digits: Input| digits.fragment().parse::<i64>(),
    )(input)
}

pub fn float(input: Input<'_>) -> PResult<'_, f64> {
    let (input, _) = ws(input)?;
    map_res(
        recognize(tuple((
            opt(nom_char('-')),
            digit1,
            opt(pair(nom_char('.'), digit1)),
        ))),
        |digits: Input| digits.fragment().parse::<f64>(),
    )(input)
}
