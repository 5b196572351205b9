use std::iter::Peekable;

use crate::{
    error::ParseError,
    interpreter::{lexer::Token, parser::core::ParseResult},
};

/// Parses a comma-separated list of items until a closing token.
///
/// This utility is shared by parameter lists and call argument lists. It
/// repeatedly calls `parse_item` to parse one element, expecting either:
///
/// - a comma, to continue the list, or
/// - the specified closing token, to end it.
///
/// An immediately encountered closing token produces an empty list.
///
/// Grammar (simplified): `list := item ("," item)*`
///
/// # Errors
/// Returns a `ParseError` if:
/// - an item fails to parse,
/// - an unexpected token is encountered,
/// - the stream ends before the closing token.
pub(in crate::interpreter::parser) fn parse_comma_separated<'a, I, T>(
    tokens: &mut Peekable<I>,
    parse_item: impl Fn(&mut Peekable<I>) -> ParseResult<T>,
    closing: &Token)
    -> Result<Vec<T>, ParseError>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut items = Vec::new();
    if let Some((tok, _)) = tokens.peek()
       && tok == closing
    {
        tokens.next();

        return Ok(items);
    }
    loop {
        items.push(parse_item(tokens)?);
        match tokens.peek() {
            Some((Token::Comma, _)) => {
                tokens.next();
            },
            Some((tok, _)) if tok == closing => {
                tokens.next();
                break;
            },
            Some((tok, offset)) => {
                return Err(ParseError::UnexpectedToken { token:  format!("Expected ',' or {closing:?}, found {tok:?}"),
                                                         offset: *offset, });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
        }
    }
    Ok(items)
}

/// Parses a plain identifier and returns its name.
///
/// # Errors
/// Returns a `ParseError` if the next token is not an identifier or the
/// input ends.
pub(in crate::interpreter::parser) fn parse_identifier<'a, I>(tokens: &mut Peekable<I>)
                                                              -> ParseResult<String>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((Token::Identifier(s), _)) => Ok(s.clone()),
        Some((tok, offset)) => {
            Err(ParseError::UnexpectedToken { token:  format!("Expected identifier, found {tok:?}"),
                                              offset: *offset, })
        },
        None => Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
    }
}

/// Consumes the next token, which must equal `expected`.
///
/// # Errors
/// `ExpectedClosingParen` when a `)` is missing, `UnexpectedToken` for any
/// other mismatch and `UnexpectedEndOfInput` at the end of the stream.
pub(in crate::interpreter::parser) fn expect<'a, I>(tokens: &mut Peekable<I>,
                                                    expected: &Token)
                                                    -> ParseResult<()>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((tok, _)) if tok == expected => Ok(()),
        Some((_, offset)) if *expected == Token::RParen => {
            Err(ParseError::ExpectedClosingParen { offset: *offset })
        },
        Some((tok, offset)) => {
            Err(ParseError::UnexpectedToken { token:  format!("Expected {expected:?}, found {tok:?}"),
                                              offset: *offset, })
        },
        None => Err(ParseError::UnexpectedEndOfInput { offset: 0 }),
    }
}
