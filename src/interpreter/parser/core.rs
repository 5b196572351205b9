use std::iter::Peekable;

use crate::{
    ast::{Expr, Procedure},
    error::ParseError,
    interpreter::{
        lexer::{Token, tokenize},
        parser::{
            binary::parse_logical_or,
            utils::{expect, parse_comma_separated, parse_identifier},
        },
    },
    operator::{OperatorId, OperatorKey},
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Maps an external operator id found in procedure text to the stable key of
/// the registered operator.
pub type Resolve<'r> = dyn Fn(OperatorId) -> Option<OperatorKey> + 'r;

/// Parses complete procedure source text.
///
/// Grammar: `procedure := "(" params ")" "=>" expression`
///
/// # Parameters
/// - `source`: The procedure text, e.g. `(a, b) => op_1(a, b) * 2`.
/// - `resolve`: Resolves `op_N` / `cost_N` references to registered
///   operators.
///
/// # Returns
/// The parsed [`Procedure`].
///
/// # Errors
/// Any lexing or parsing error, `UnknownOperator` for unresolvable
/// references, and `UnexpectedTrailingTokens` if input remains after the body.
///
/// # Example
/// ```
/// use opulse::{
///     ast::{BinaryOperator, Expr},
///     interpreter::parser::core::parse_procedure,
/// };
///
/// let procedure = parse_procedure("(a, b) => a + b", &|_| None).unwrap();
/// assert_eq!(procedure.params, vec!["a", "b"]);
/// assert_eq!(procedure.body, Expr::binary(Expr::var("a"), BinaryOperator::Add, Expr::var("b")));
/// ```
pub fn parse_procedure(source: &str, resolve: &Resolve<'_>) -> ParseResult<Procedure> {
    let tokens = tokenize(source)?;
    let mut iter = tokens.iter().peekable();

    expect(&mut iter, &Token::LParen)?;
    let params = parse_comma_separated(&mut iter, parse_identifier, &Token::RParen)?;
    expect(&mut iter, &Token::FatArrow)?;
    let body = parse_expression(&mut iter, resolve)?;

    if let Some((tok, offset)) = iter.next() {
        return Err(ParseError::UnexpectedTrailingTokens { token:  format!("{tok:?}"),
                                                          offset: *offset, });
    }

    Ok(Procedure { params, body })
}

/// Parses a full expression.
///
/// This is the entry point for expression parsing.
/// It begins at the lowest-precedence level, logical OR, and recursively
/// descends through the precedence hierarchy.
///
/// Grammar: `expression := logical_or`
///
/// # Parameters
/// - `tokens`: Token iterator providing `(Token, offset)` pairs.
/// - `resolve`: Operator reference resolver.
///
/// # Returns
/// The parsed expression node.
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>, resolve: &Resolve<'_>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_logical_or(tokens, resolve)
}

/// Parses a `when` expression.
///
/// Syntax:
/// ```text
///     when { <condition> => <expr>, <condition> => <expr>, else => <expr> }
/// ```
/// The `else` arm is mandatory and must come last.
///
/// # Parameters
/// - `tokens`: Token stream positioned after the `when` keyword.
/// - `offset`: Offset of the `when` token.
///
/// # Returns
/// An `Expr::When` node.
///
/// # Errors
/// - `UnexpectedToken` if `{`, `=>` or a separator is missing.
/// - `UnexpectedEndOfInput` if the input stops inside the braces.
/// - Propagates any errors from sub-expression parsing.
pub fn parse_when<'a, I>(tokens: &mut Peekable<I>,
                         offset: usize,
                         resolve: &Resolve<'_>)
                         -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    expect(tokens, &Token::LBrace)?;

    let mut arms = Vec::new();
    loop {
        if let Some((Token::Else, _)) = tokens.peek() {
            tokens.next();
            expect(tokens, &Token::FatArrow)?;
            let otherwise = parse_expression(tokens, resolve)?;
            expect(tokens, &Token::RBrace)?;

            return Ok(Expr::When { arms,
                                   otherwise: Box::new(otherwise) });
        }

        let condition = parse_expression(tokens, resolve)?;
        expect(tokens, &Token::FatArrow)?;
        let value = parse_expression(tokens, resolve)?;
        arms.push((condition, value));

        match tokens.next() {
            Some((Token::Comma, _)) => {},
            Some((tok, offset)) => {
                return Err(ParseError::UnexpectedToken { token:  format!("Expected ',' between when arms, found {tok:?}"),
                                                         offset: *offset, });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { offset }),
        }
    }
}
