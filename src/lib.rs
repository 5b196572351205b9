//! # opulse
//!
//! opulse invents arithmetic operators and writes expression datasets over
//! them. Starting from six seed operators, it synthesizes new unary and
//! binary operators from random definitions, validates them by execution,
//! keeps their dependencies and order consistent, and renders random
//! expressions over the resulting operator family together with their value,
//! cost and structural metrics.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

/// Procedure trees.
///
/// Compute and cost procedures are small expression trees over integers,
/// parameters, operator calls, builtins and bounded iteration. Calls refer to
/// operators by stable key, so procedures survive id renumbering.
///
/// # Responsibilities
/// - Defines `Procedure`, `Expr`, `Slot` and the builtin functions.
/// - Collects the operators a procedure calls.
/// - Renders procedures back to their persisted text form.
pub mod ast;
/// Batch configuration read from YAML.
pub mod config;
/// The definition language.
///
/// Definitions are the human-readable form of an operator:
/// `a⊕b = { a*b, if a > b ; a, else }`. This module lexes and parses them
/// against the registry's symbols, lowers them into compute and cost
/// procedures and generates random conditions for branching definitions.
pub mod definition;
/// Provides unified error types for every phase.
///
/// This module defines all errors that can be raised while parsing procedure
/// or definition text, compiling and running procedures, manipulating the
/// registry, synthesizing operators and reading or writing files.
///
/// # Responsibilities
/// - Defines one error enum per failure domain.
/// - Classifies synthesis failures as recoverable or not.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Random expression trees, their rendering and their evaluation.
pub mod expression;
/// Orchestrates the execution of operator procedures.
///
/// This module ties together lexing, parsing, compilation and evaluation of
/// procedure text, the persisted form of every operator's compute and cost
/// procedures.
///
/// # Responsibilities
/// - Coordinates the lexer, parser, compiler and evaluator.
/// - Bounds every evaluation with fuel and a call-depth limit.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// Operator records, the registry that owns them and their persistence.
pub mod operator;
/// Operator synthesis.
///
/// Proposes candidate operators, runs them through parsing, compilation and
/// validation, and accepts or discards them.
pub mod synthesis;
/// General utilities for safe numeric conversion and numeral bases.
///
/// # Responsibilities
/// - Checked integer arithmetic with floor semantics.
/// - Rendering integers in arbitrary bases.
pub mod util;
