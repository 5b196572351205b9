use logos::Logos;

use crate::error::ParseError;

/// Represents a lexical token of the procedure language.
/// A token is a minimal but meaningful unit of text produced by the lexer.
/// This enum defines all recognized tokens in procedure source text.
#[derive(Logos, Debug, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    /// Integer literal tokens, such as `42`.
    #[regex(r"[0-9]+", parse_integer)]
    Integer(i64),
    /// A reference to an operator's compute procedure, such as `op_12`.
    #[regex(r"op_[0-9]+", |lex| parse_reference(lex, "op_"))]
    OpRef(u32),
    /// A reference to an operator's cost procedure, such as `cost_12`.
    #[regex(r"cost_[0-9]+", |lex| parse_reference(lex, "cost_"))]
    CostRef(u32),
    /// `nan`
    #[token("nan")]
    NaN,
    /// `when`
    #[token("when")]
    When,
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
    /// Identifier tokens; parameters, accumulators and builtin names.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),
    /// `=>`
    #[token("=>")]
    FatArrow,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
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
}

/// Splits procedure source into tokens paired with their byte offsets.
///
/// # Errors
/// Returns `UnexpectedToken` for the first slice the lexer cannot match, and
/// `LiteralTooLarge` for integer literals outside the `i64` range.
///
/// # Example
/// ```
/// use opulse::interpreter::lexer::{Token, tokenize};
///
/// let tokens = tokenize("(a) => op_3(a)").unwrap();
/// assert_eq!(tokens[4], (Token::OpRef(3), 7));
/// ```
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        let offset = lexer.span().start;
        if let Ok(tok) = token {
            tokens.push((tok, offset));
        } else {
            let slice = lexer.slice();
            if slice.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::LiteralTooLarge { offset });
            }
            return Err(ParseError::UnexpectedToken { token: slice.to_string(),
                                                     offset });
        }
    }

    Ok(tokens)
}

/// Parses an integer literal from the current token slice.
///
/// # Returns
/// - `Some(i64)`: The parsed integer value if successful.
/// - `None`: If the literal does not fit in an `i64`.
fn parse_integer(lex: &logos::Lexer<Token>) -> Option<i64> {
    lex.slice().parse().ok()
}

/// Parses the numeric id following `prefix` in an operator reference.
fn parse_reference(lex: &logos::Lexer<Token>, prefix: &str) -> Option<u32> {
    lex.slice().strip_prefix(prefix)?.parse().ok()
}
