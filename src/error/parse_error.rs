#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur during lexing or parsing.
///
/// Every variant carries the byte offset of the offending input so that
/// messages can point into the source text.
pub enum ParseError {
    /// Found an unexpected token while parsing.
    UnexpectedToken {
        /// The token encountered.
        token:  String,
        /// Byte offset where the error occurred.
        offset: usize,
    },
    /// Reached the end of input unexpectedly.
    UnexpectedEndOfInput {
        /// Byte offset where the error occurred.
        offset: usize,
    },
    /// A closing parenthesis `)` was expected but not found.
    ExpectedClosingParen {
        /// Byte offset where the error occurred.
        offset: usize,
    },
    /// Found extra tokens after parsing should have completed.
    UnexpectedTrailingTokens {
        /// The extra/unexpected token.
        token:  String,
        /// Byte offset where the error occurred.
        offset: usize,
    },
    /// A procedure referenced an operator id that is not registered.
    UnknownOperator {
        /// The referenced id.
        id:     u32,
        /// Byte offset where the error occurred.
        offset: usize,
    },
    /// A symbol run could not be matched against any registered operator.
    UnknownSymbol {
        /// The unmatched symbol text.
        symbol: String,
        /// Byte offset where the error occurred.
        offset: usize,
    },
    /// A branching definition did not end with an `else` branch.
    MissingElseBranch {
        /// Byte offset where the error occurred.
        offset: usize,
    },
    /// A literal value was too large to be represented safely.
    LiteralTooLarge {
        /// Byte offset where the error occurred.
        offset: usize,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedToken { token, offset } => {
                write!(f, "Error at offset {offset}: Unexpected token: {token}.")
            },

            Self::UnexpectedEndOfInput { offset } => {
                write!(f, "Error at offset {offset}: Unexpected end of input.")
            },

            Self::ExpectedClosingParen { offset } => write!(f,
                                                            "Error at offset {offset}: Expected closing parenthesis ')' but none found."),

            Self::UnexpectedTrailingTokens { token, offset } => write!(f,
                                                                       "Error at offset {offset}: Extra tokens after expression: {token}"),

            Self::UnknownOperator { id, offset } => {
                write!(f, "Error at offset {offset}: Operator {id} is not registered.")
            },

            Self::UnknownSymbol { symbol, offset } => {
                write!(f, "Error at offset {offset}: No operator matches symbol '{symbol}'.")
            },

            Self::MissingElseBranch { offset } => {
                write!(f, "Error at offset {offset}: Branching definition must end with an else branch.")
            },

            Self::LiteralTooLarge { offset } => {
                write!(f, "Error at offset {offset}: Literal is too large.")
            },
        }
    }
}

impl std::error::Error for ParseError {}
