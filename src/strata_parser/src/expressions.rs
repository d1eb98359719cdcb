//! Invariant expression parser: precedence-climbing over `or`, `and`,
//! `not`, comparisons, and arithmetic.

use crate::tokens::{identifier, kw, string_literal, sym, ws};
use crate::{Input, PResult};
use nom::branch::alt;
use nom::character::complete::{char as nom_char, digit1};
use nom::combinator::{map, opt, recognize, value};
use nom::error::{ErrorKind, FromExternalError};
use nom::multi::{many0, separated_list0};
use nom::sequence::{pair, preceded};
use nom_supreme::error::ErrorTree;
use strata_syntax::expr::{BinaryOp, Expr, UnaryOp};

pub fn expression(input: Input<'_>) -> PResult<'_, Expr> {
    or_expr(input)
}

fn or_expr(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(kw("or"), and_expr))(input)?;
    Ok((input, fold_same_op(first, BinaryOp::Or, rest)))
}

fn and_expr(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, first) = unary_expr(input)?;
    let (input, rest) = many0(preceded(kw("and"), unary_expr))(input)?;
    Ok((input, fold_same_op(first, BinaryOp::And, rest)))
}

fn unary_expr(input: Input<'_>) -> PResult<'_, Expr> {
    alt((
        map(preceded(kw("not"), unary_expr), |operand| Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }),
        comparison,
    ))(input)
}

fn comparison(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, lhs) = additive(input)?;
    let (input, tail) = opt(pair(comparison_op, additive))(input)?;
    Ok(match tail {
        Some((op, rhs)) => (
            input,
            Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        ),
        None => (input, lhs),
    })
}

fn comparison_op(input: Input<'_>) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Eq, sym("==")),
        value(BinaryOp::Ne, sym("!=")),
        value(BinaryOp::Le, sym("<=")),
        value(BinaryOp::Ge, sym(">=")),
        value(BinaryOp::Lt, sym("<")),
        value(BinaryOp::Gt, sym(">")),
    ))(input)
}

fn additive(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, first) = multiplicative(input)?;
    let (input, tail) = many0(pair(
        alt((
            value(BinaryOp::Add, sym("+")),
            value(BinaryOp::Sub, sym("-")),
        )),
        multiplicative,
    ))(input)?;
    Ok((input, fold_ops(first, tail)))
}

fn multiplicative(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, first) = primary_expr(input)?;
    let (input, tail) = many0(pair(
        alt((
            value(BinaryOp::Mul, sym("*")),
            value(BinaryOp::Div, sym("/")),
        )),
        primary_expr,
    ))(input)?;
    Ok((input, fold_ops(first, tail)))
}

fn primary_expr(input: Input<'_>) -> PResult<'_, Expr> {
    alt((
        parenthesized,
        negation,
        boolean_literal,
        number_literal,
        map(string_literal, |(text, _)| Expr::Str(text)),
        call_or_path,
    ))(input)
}

fn parenthesized(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, _) = sym("(")(input)?;
    let (input, inner) = expression(input)?;
    let (input, _) = sym(")")(input)?;
    Ok((input, inner))
}

fn negation(input: Input<'_>) -> PResult<'_, Expr> {
    map(preceded(sym("-"), primary_expr), |operand| Expr::Unary {
        op: UnaryOp::Neg,
        operand: Box::new(operand),
    })(input)
}

fn boolean_literal(input: Input<'_>) -> PResult<'_, Expr> {
    alt((
        value(Expr::Bool(true), kw("true")),
        value(Expr::Bool(false), kw("false")),
    ))(input)
}

fn number_literal(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, _) = ws(input)?;
    let (rest, frag) = recognize(pair(digit1, opt(pair(nom_char('.'), digit1))))(input)?;
    let text = *frag.fragment();
    let parsed = if text.contains('.') {
        text.parse::<f64>().map(Expr::Float).map_err(|e| e.to_string())
    } else {
        text.parse::<i64>().map(Expr::Int).map_err(|e| e.to_string())
    };
    match parsed {
        Ok(expr) => Ok((rest, expr)),
        Err(message) => Err(nom::Err::Failure(ErrorTree::from_external_error(
            input,
            ErrorKind::Digit,
            std::io::Error::new(std::io::ErrorKind::InvalidData, message),
        ))),
    }
}

fn call_or_path(input: Input<'_>) -> PResult<'_, Expr> {
    let (input, (first, _)) = identifier(input)?;
    if let Ok((after_paren, _)) = sym("(")(input.clone()) {
        let (input, args) = separated_list0(sym(","), expression)(after_paren)?;
        let (input, _) = sym(")")(input)?;
        return Ok((input, Expr::Call { name: first, args }));
    }
    let (input, tail) = many0(preceded(sym("."), identifier))(input)?;
    let mut segments = vec![first];
    segments.extend(tail.into_iter().map(|(name, _)| name));
    Ok((input, Expr::Path(segments)))
}

fn fold_same_op(first: Expr, op: BinaryOp, rest: Vec<Expr>) -> Expr {
    rest.into_iter().fold(first, |lhs, rhs| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn fold_ops(first: Expr, tail: Vec<(BinaryOp, Expr)>) -> Expr {
    tail.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}
