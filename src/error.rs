/// Parsing errors.
///
/// Defines all error types that can occur while lexing and parsing procedure
/// source text or operator definition text. A parse error on a synthesized
/// definition is the syntax-error outcome of synthesis.
pub mod parse_error;
/// Runtime errors.
///
/// Contains all error types that can be raised while executing a compiled
/// procedure: budget exhaustion, arity mismatches and results of an unexpected
/// shape.
pub mod runtime_error;
/// Compilation errors.
///
/// Raised when a procedure cannot be lowered into its executable form, for
/// example because it refers to an unknown variable or to an operator that no
/// longer exists.
pub mod compile_error;
/// Registry errors.
///
/// Invariant violations on the operator registry: unknown ids or bases,
/// duplicate ids and compile failures.
pub mod registry_error;
/// Synthesis errors.
///
/// Every reason a candidate operator can be rejected, plus the conditions that
/// stop a generator from producing a candidate at all.
pub mod synthesis_error;
/// Load errors.
///
/// Failures while reading or writing configuration, record store and dataset
/// files.
pub mod load_error;

pub use compile_error::CompileError;
pub use load_error::LoadError;
pub use parse_error::ParseError;
pub use registry_error::RegistryError;
pub use runtime_error::RuntimeError;
pub use synthesis_error::SynthesisError;
