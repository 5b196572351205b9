use crate::ast::Slot;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors that can occur while executing a procedure.
///
/// NaN is not an error: arithmetic on undefined values yields
/// [`Value::NaN`](crate::interpreter::value::core::Value::NaN). These variants
/// describe executions that cannot produce any value at all.
pub enum RuntimeError {
    /// A procedure was invoked with the wrong number of arguments.
    ArgumentCountMismatch {
        /// The number of parameters the procedure declares.
        expected: usize,
        /// The number of arguments received.
        found:    usize,
    },
    /// A boolean value was expected, but not found.
    ExpectedBoolean,
    /// A numeric value was expected, but not found.
    ExpectedNumber,
    /// The procedure finished with a value that is neither an integer nor NaN.
    UnexpectedShape {
        /// Description of the value produced.
        details: String,
    },
    /// The evaluation consumed its whole fuel budget.
    FuelExhausted {
        /// The budget that was exhausted.
        budget: u64,
    },
    /// Nested operator calls went deeper than allowed.
    CallDepthExceeded {
        /// The depth limit that was hit.
        limit: usize,
    },
    /// A called operator has no procedure in the requested slot, or it could
    /// not be compiled.
    UnresolvedOperator {
        /// The slot that was requested.
        slot:    Slot,
        /// Details about why the operator could not be used.
        details: String,
    },
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArgumentCountMismatch { expected, found } => {
                write!(f, "Expected {expected} arguments but found {found}.")
            },
            Self::ExpectedBoolean => write!(f, "Expected a boolean value."),
            Self::ExpectedNumber => write!(f, "Expected a numeric value."),
            Self::UnexpectedShape { details } => {
                write!(f, "Procedure returned an unexpected value: {details}.")
            },
            Self::FuelExhausted { budget } => {
                write!(f, "Evaluation exceeded its budget of {budget} steps.")
            },
            Self::CallDepthExceeded { limit } => {
                write!(f, "Operator calls nested deeper than {limit} levels.")
            },
            Self::UnresolvedOperator { slot, details } => {
                write!(f, "Cannot run {slot} procedure: {details}")
            },
        }
    }
}

impl std::error::Error for RuntimeError {}
