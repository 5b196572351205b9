/// Builtin dispatch and `abs`.
pub mod core;
/// `min` and `max`.
pub mod min_max;
