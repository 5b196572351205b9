use crate::operator::OperatorKey;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all reasons a procedure cannot be lowered into executable form.
pub enum CompileError {
    /// The operator has no procedure in the requested slot.
    MissingProcedure,
    /// The procedure declares a different number of parameters than the
    /// operator's arity.
    ParameterCountMismatch {
        /// The operator's arity.
        expected: usize,
        /// The number of declared parameters.
        found:    usize,
    },
    /// A variable is neither a parameter nor a bound accumulator.
    UnknownVariable {
        /// The name of the variable.
        name: String,
    },
    /// A call refers to an operator that is not registered.
    UnknownOperator {
        /// The stable key of the missing operator.
        key: OperatorKey,
    },
    /// A call passes the wrong number of arguments to an operator or builtin.
    CallArityMismatch {
        /// Name of the callee as written in procedure text.
        callee:   String,
        /// The callee's arity.
        expected: usize,
        /// The number of arguments passed.
        found:    usize,
    },
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingProcedure => write!(f, "no procedure to compile"),
            Self::ParameterCountMismatch { expected, found } => {
                write!(f, "procedure declares {found} parameters, operator takes {expected}")
            },
            Self::UnknownVariable { name } => write!(f, "unknown variable '{name}'"),
            Self::UnknownOperator { key } => write!(f, "reference to missing operator {key}"),
            Self::CallArityMismatch { callee,
                                      expected,
                                      found, } => {
                write!(f, "{callee} takes {expected} arguments but {found} were given")
            },
        }
    }
}

impl std::error::Error for CompileError {}
