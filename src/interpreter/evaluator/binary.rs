/// Binary operator dispatch.
pub mod core;
/// Checked integer arithmetic.
pub mod scalar;
/// Comparison operators.
pub mod comparison;
/// Logical connectives.
pub mod logic;
