/// Core parsing entry points.
///
/// Defines `ParseResult`, the procedure and expression entry points and the
/// `when` construct.
pub mod core;

/// Binary operator parsing.
///
/// Implements precedence climbing for logical, relational and arithmetic
/// operators.
pub mod binary;

/// Unary and primary expression parsing.
///
/// Handles negation, `not`, literals, variables, operator references,
/// builtin calls, iteration and parenthesized groups.
pub mod unary;

/// Parsing utilities.
///
/// Comma-separated lists, identifiers and expected-token checks shared by
/// the other parser modules.
pub mod utils;
