/// Fresh operator symbols.
pub mod symbols;

/// Candidate operators: base, plain, branch and recursive definitions.
///
/// The generator proposes [`OperatorData`](crate::operator::OperatorData)
/// with definition text; turning the text into procedures is the pipeline's
/// job.
pub mod generator;

/// Loop recursion over an existing operator and the callee bookkeeping that
/// bounds it.
pub mod recursion;

/// The candidate lifecycle: propose, register as temporary, parse, lower,
/// compile, validate, then accept or reject.
pub mod pipeline;
