/// Tokens of the definition language.
///
/// Operator symbols are lexed as maximal runs of symbol characters; the
/// parser splits them against the registry.
pub mod lexer;

/// The parsed form of a definition.
pub mod ast;

/// The definition parser.
///
/// Resolves symbols against a registry and builds terms with the registry's
/// precedence and associativity.
pub mod parser;

/// Lowering of definitions into compute and cost procedures.
pub mod transformer;

/// Random condition text for branching definitions.
pub mod condition;
