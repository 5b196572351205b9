use logos::Logos;

use crate::error::ParseError;

/// Represents a lexical token of the definition language, such as
/// `a⊕b = { a+b, if b > 0 ; a, else }`.
#[derive(Logos, Debug, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    /// Unsigned integer literal.
    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Integer(i64),
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `and`
    #[token("and")]
    And,
    /// `or`
    #[token("or")]
    Or,
    /// `not`
    #[token("not")]
    Not,
    /// Operand names.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// A maximal run of operator symbol characters; may hold several
    /// operators back to back.
    #[regex(r"[^\sA-Za-z0-9_(){},;=<>!$]+", |lex| lex.slice().to_string())]
    Symbol(String),
    /// `=`
    #[token("=")]
    Define,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semicolon,
}

/// Converts definition text into `(token, byte offset)` pairs.
///
/// # Errors
/// `LiteralTooLarge` for integers beyond `i64`, `UnexpectedToken` for
/// anything else the lexer rejects.
///
/// # Example
/// ```
/// use opulse::definition::lexer::{Token, tokenize};
///
/// let tokens = tokenize("a⊕b").unwrap();
/// assert_eq!(tokens[1], (Token::Symbol("⊕".into()), 1));
/// ```
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        let offset = lexer.span().start;
        match token {
            Ok(tok) => tokens.push((tok, offset)),
            Err(()) if lexer.slice().bytes().all(|b| b.is_ascii_digit()) => {
                return Err(ParseError::LiteralTooLarge { offset });
            },
            Err(()) => {
                return Err(ParseError::UnexpectedToken { token: lexer.slice().to_string(),
                                                         offset });
            },
        }
    }

    Ok(tokens)
}

/// Returns whether `c` can be part of an operator symbol.
///
/// Matches the character class of [`Token::Symbol`].
#[must_use]
pub fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_ascii_alphanumeric() && !"_(){},;=<>!$".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_runs_stop_at_operands_and_brackets() {
        let tokens: Vec<Token> = tokenize("(a-1)⊕⊗b").unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(tokens,
                   vec![Token::LParen,
                        Token::Identifier("a".into()),
                        Token::Symbol("-".into()),
                        Token::Integer(1),
                        Token::RParen,
                        Token::Symbol("⊕⊗".into()),
                        Token::Identifier("b".into())]);
    }

    #[test]
    fn comparisons_are_not_symbols() {
        let tokens: Vec<Token> = tokenize("b >= 0 and a != 2").unwrap().into_iter().map(|(t, _)| t).collect();
        assert_eq!(tokens[1], Token::GreaterEqual);
        assert_eq!(tokens[3], Token::And);
        assert_eq!(tokens[5], Token::BangEqual);
    }

    #[test]
    fn oversized_literals_are_reported() {
        assert_eq!(tokenize("99999999999999999999").unwrap_err(),
                   ParseError::LiteralTooLarge { offset: 0 });
    }
}
