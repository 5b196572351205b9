/// Core evaluation logic.
///
/// Contains the `Machine` that executes compiled procedures, its budget and
/// the instruction dispatch.
pub mod core;

/// Unary operator evaluation.
///
/// Handles negation and logical not.
pub mod unary;

/// Binary operator evaluation.
///
/// Implements evaluation for arithmetic, comparisons and logical operators.
pub mod binary;

/// Bounded iteration.
///
/// Evaluates `repeat` and `repeat_sum`.
pub mod repeat;

/// Builtin function evaluation.
///
/// Provides `abs`, `min` and `max`.
pub mod function;
