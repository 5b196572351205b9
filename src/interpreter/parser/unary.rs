use std::iter::Peekable;

use crate::{
    ast::{Builtin, Expr, Slot, UnaryOperator},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, Resolve, parse_expression, parse_when},
            utils::{expect, parse_comma_separated, parse_identifier},
        },
    },
    operator::OperatorId,
};

/// Parses a unary expression.
///
/// Supports prefix operators:
/// - `-`   (numeric negation)
/// - `not` (logical not)
///
/// A `-` directly followed by an integer literal produces a negative literal
/// rather than a negation node, so that rendered procedures parse back to the
/// same tree.
///
/// Grammar:
/// ```text
///     unary := ("-" | "not") unary
///            | primary
/// ```
pub(crate) fn parse_unary<'a, I>(tokens: &mut Peekable<I>, resolve: &Resolve<'_>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if let Some((Token::Minus, _)) = tokens.peek() {
        tokens.next();
        if let Some((Token::Integer(n), _)) = tokens.peek() {
            tokens.next();
            return Ok(Expr::Integer(-n));
        }
        let expr = parse_unary(tokens, resolve)?;
        Ok(Expr::UnaryOp { op:   UnaryOperator::Negate,
                           expr: Box::new(expr), })
    } else if let Some((Token::Not, _)) = tokens.peek() {
        tokens.next();
        let expr = parse_unary(tokens, resolve)?;
        Ok(Expr::UnaryOp { op:   UnaryOperator::Not,
                           expr: Box::new(expr), })
    } else {
        parse_primary(tokens, resolve)
    }
}

/// Parses a primary (atomic) expression.
///
/// Primary expressions form the base of the expression grammar and include:
/// - integer literals and `nan`
/// - variables
/// - operator calls (`op_N(..)`, `cost_N(..)`)
/// - builtin calls (`abs`, `min`, `max`)
/// - iteration (`repeat`, `repeat_sum`)
/// - parenthesized expressions
/// - `when` expressions
///
/// Grammar (simplified):
/// ```text
///     primary := integer | "nan"
///              | identifier
///              | call
///              | "(" expression ")"
///              | when_expression
/// ```
pub(crate) fn parse_primary<'a, I>(tokens: &mut Peekable<I>,
                                   resolve: &Resolve<'_>)
                                   -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (token, offset) = tokens.next()
                                .ok_or(ParseError::UnexpectedEndOfInput { offset: 0 })?;

    match token {
        Token::Integer(n) => Ok(Expr::Integer(*n)),
        Token::NaN => Ok(Expr::NaN),
        Token::OpRef(id) => parse_operator_call(tokens, *id, Slot::Compute, *offset, resolve),
        Token::CostRef(id) => parse_operator_call(tokens, *id, Slot::Cost, *offset, resolve),
        Token::When => parse_when(tokens, *offset, resolve),
        Token::LParen => {
            let expr = parse_expression(tokens, resolve)?;
            expect(tokens, &Token::RParen)?;
            Ok(expr)
        },
        Token::Identifier(name) => parse_identifier_or_call(tokens, name, *offset, resolve),
        tok => Err(ParseError::UnexpectedToken { token:  format!("{tok:?}"),
                                                 offset: *offset, }),
    }
}

/// Parses the argument list of an operator reference and resolves the id.
fn parse_operator_call<'a, I>(tokens: &mut Peekable<I>,
                              id: u32,
                              slot: Slot,
                              offset: usize,
                              resolve: &Resolve<'_>)
                              -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let operator = resolve(OperatorId(id)).ok_or(ParseError::UnknownOperator { id, offset })?;
    let arguments = parse_arguments(tokens, resolve)?;
    Ok(Expr::call(operator, slot, arguments))
}

/// Parses an identifier, which is a variable unless followed by `(`.
///
/// Calls are restricted to builtins and the two iteration forms.
fn parse_identifier_or_call<'a, I>(tokens: &mut Peekable<I>,
                                   name: &str,
                                   offset: usize,
                                   resolve: &Resolve<'_>)
                                   -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if !matches!(tokens.peek(), Some((Token::LParen, _))) {
        return Ok(Expr::Variable(name.to_string()));
    }

    match name {
        "repeat" => parse_repeat(tokens, false, resolve),
        "repeat_sum" => parse_repeat(tokens, true, resolve),
        _ => {
            let function = Builtin::from_name(name).ok_or_else(|| {
                                                       ParseError::UnexpectedToken { token: format!("Unknown function '{name}'"),
                                                                                     offset }
                                                   })?;
            let arguments = parse_arguments(tokens, resolve)?;
            Ok(Expr::Builtin { function,
                               arguments })
        },
    }
}

/// Parses `repeat(n, init, acc => step)` or
/// `repeat_sum(n, init, acc => step, acc => term)` after the function name.
///
/// Both lambdas of `repeat_sum` must bind the same accumulator name.
fn parse_repeat<'a, I>(tokens: &mut Peekable<I>,
                       summed: bool,
                       resolve: &Resolve<'_>)
                       -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    expect(tokens, &Token::LParen)?;
    let count = parse_expression(tokens, resolve)?;
    expect(tokens, &Token::Comma)?;
    let init = parse_expression(tokens, resolve)?;
    expect(tokens, &Token::Comma)?;
    let (accumulator, step) = parse_lambda(tokens, resolve)?;

    let term = if summed {
        expect(tokens, &Token::Comma)?;
        let offset = tokens.peek().map_or(0, |(_, o)| *o);
        let (binder, term) = parse_lambda(tokens, resolve)?;
        if binder != accumulator {
            return Err(ParseError::UnexpectedToken { token: format!("Expected accumulator '{accumulator}', found '{binder}'"),
                                                     offset });
        }
        Some(Box::new(term))
    } else {
        None
    };
    expect(tokens, &Token::RParen)?;

    Ok(Expr::Repeat { count: Box::new(count),
                      init: Box::new(init),
                      accumulator,
                      step: Box::new(step),
                      term })
}

/// Parses `name => expression`.
fn parse_lambda<'a, I>(tokens: &mut Peekable<I>, resolve: &Resolve<'_>) -> ParseResult<(String, Expr)>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let binder = parse_identifier(tokens)?;
    expect(tokens, &Token::FatArrow)?;
    let body = parse_expression(tokens, resolve)?;
    Ok((binder, body))
}

/// Parses a parenthesized, comma-separated argument list.
fn parse_arguments<'a, I>(tokens: &mut Peekable<I>, resolve: &Resolve<'_>) -> ParseResult<Vec<Expr>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    expect(tokens, &Token::LParen)?;
    parse_comma_separated(tokens, |t| parse_expression(t, resolve), &Token::RParen)
}

#[cfg(test)]
mod tests {
    use crate::{
        ast::{BinaryOperator, Expr},
        error::ParseError,
        interpreter::parser::core::parse_procedure,
    };

    #[test]
    fn negative_literals_fold_into_integers() {
        let procedure = parse_procedure("(a) => a * -3", &|_| None).unwrap();
        assert_eq!(procedure.body,
                   Expr::binary(Expr::var("a"), BinaryOperator::Mul, Expr::Integer(-3)));
    }

    #[test]
    fn unresolved_references_are_rejected() {
        let err = parse_procedure("(a) => op_9(a)", &|_| None).unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator { id: 9, .. }));
    }

    #[test]
    fn repeat_sum_requires_one_accumulator_name() {
        let src = "(a, b) => repeat_sum(b, a, x => x + 1, y => y)";
        assert!(parse_procedure(src, &|_| None).is_err());
    }

    #[test]
    fn unknown_functions_are_rejected() {
        assert!(parse_procedure("(a) => sqrt(a)", &|_| None).is_err());
    }
}
