use std::iter::Peekable;

use crate::{
    ast::{BinaryOperator, Expr},
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, Resolve},
            unary::parse_unary,
        },
    },
};

/// Parses logical OR expressions.
///
/// The rule is: `logical_or := logical_and ("or" logical_and)*`
pub fn parse_logical_or<'a, I>(tokens: &mut Peekable<I>, resolve: &Resolve<'_>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_logical_and(tokens, resolve)?;
    while let Some((Token::Or, _)) = tokens.peek() {
        tokens.next();
        let right = parse_logical_and(tokens, resolve)?;
        left = Expr::binary(left, BinaryOperator::Or, right);
    }
    Ok(left)
}

/// Parses logical AND expressions.
///
/// The rule is: `logical_and := relational ("and" relational)*`
pub fn parse_logical_and<'a, I>(tokens: &mut Peekable<I>,
                                resolve: &Resolve<'_>)
                                -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_relational(tokens, resolve)?;
    while let Some((Token::And, _)) = tokens.peek() {
        tokens.next();
        let right = parse_relational(tokens, resolve)?;
        left = Expr::binary(left, BinaryOperator::And, right);
    }
    Ok(left)
}

/// Parses relational and equality operators.
///
/// Comparisons do not chain: `a < b < c` is rejected by the caller as a
/// trailing token.
///
/// The rule is: `relational := additive (comparison additive)?`
pub fn parse_relational<'a, I>(tokens: &mut Peekable<I>, resolve: &Resolve<'_>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let left = parse_additive(tokens, resolve)?;

    if let Some((token, _)) = tokens.peek()
       && let Some(op) = token_to_binary_operator(token)
       && op.is_comparison()
    {
        tokens.next();
        let right = parse_additive(tokens, resolve)?;
        return Ok(Expr::binary(left, op, right));
    }

    Ok(left)
}

/// Parses addition and subtraction expressions.
///
/// Handles left-associative binary operators: `+` and `-`.
///
/// The rule is: `additive := multiplicative (("+" | "-") multiplicative)*`
pub fn parse_additive<'a, I>(tokens: &mut Peekable<I>, resolve: &Resolve<'_>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_multiplicative(tokens, resolve)?;
    loop {
        if let Some((token, _)) = tokens.peek()
           && let Some(op) = token_to_binary_operator(token)
           && matches!(op, BinaryOperator::Add | BinaryOperator::Sub)
        {
            tokens.next();
            let right = parse_multiplicative(tokens, resolve)?;
            left = Expr::binary(left, op, right);
            continue;
        }
        break;
    }
    Ok(left)
}

/// Parses multiplication-level expressions.
///
/// Handles left-associative operators: `*`, `/` and `%`.
///
/// The rule is: `multiplicative := unary (("*" | "/" | "%") unary)*`
pub fn parse_multiplicative<'a, I>(tokens: &mut Peekable<I>,
                                   resolve: &Resolve<'_>)
                                   -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut left = parse_unary(tokens, resolve)?;
    loop {
        if let Some((token, _)) = tokens.peek()
           && let Some(op) = token_to_binary_operator(token)
           && matches!(op, BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod)
        {
            tokens.next();
            let right = parse_unary(tokens, resolve)?;
            left = Expr::binary(left, op, right);
            continue;
        }
        break;
    }
    Ok(left)
}

/// Maps a token to its corresponding binary operator.
///
/// # Returns
/// `Some(BinaryOperator)` if the token corresponds to a binary operator,
/// otherwise `None`.
///
/// # Example
/// ```
/// use opulse::{
///     ast::BinaryOperator,
///     interpreter::{lexer::Token, parser::binary::token_to_binary_operator},
/// };
///
/// assert_eq!(token_to_binary_operator(&Token::Percent), Some(BinaryOperator::Mod));
/// assert_eq!(token_to_binary_operator(&Token::Comma), None);
/// ```
#[must_use]
pub const fn token_to_binary_operator(token: &Token) -> Option<BinaryOperator> {
    Some(match token {
        Token::Plus => BinaryOperator::Add,
        Token::Minus => BinaryOperator::Sub,
        Token::Star => BinaryOperator::Mul,
        Token::Slash => BinaryOperator::Div,
        Token::Percent => BinaryOperator::Mod,
        Token::EqualEqual => BinaryOperator::Equal,
        Token::BangEqual => BinaryOperator::NotEqual,
        Token::Less => BinaryOperator::Less,
        Token::Greater => BinaryOperator::Greater,
        Token::LessEqual => BinaryOperator::LessEqual,
        Token::GreaterEqual => BinaryOperator::GreaterEqual,
        Token::And => BinaryOperator::And,
        Token::Or => BinaryOperator::Or,
        _ => return None,
    })
}
