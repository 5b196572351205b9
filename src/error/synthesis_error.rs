use crate::{
    error::{LoadError, ParseError, RegistryError, RuntimeError},
    operator::OperatorId,
};

#[derive(Debug)]
/// Represents every outcome that ends a candidate operator's synthesis without
/// acceptance.
pub enum SynthesisError {
    /// The definition text did not parse.
    Syntax(ParseError),
    /// A registry operation failed. Compile failures land here.
    Registry(RegistryError),
    /// A procedure failed or returned a non-numeric value during validation.
    Execution {
        /// The arguments that triggered the failure.
        arguments: Vec<i64>,
        /// The underlying cause.
        source:    RuntimeError,
    },
    /// The chosen callee has no free recursion slot for the requested routing.
    RecursionSaturated {
        /// The callee operator.
        callee: OperatorId,
    },
    /// No operator is available as a recursion callee.
    NoRecursiveCallee,
    /// An accepted operator could not be written to the store.
    Store(LoadError),
    /// A regeneration loop hit its attempt cap.
    RetryExhausted {
        /// What was being generated.
        what:     &'static str,
        /// The number of attempts made.
        attempts: usize,
    },
}

impl SynthesisError {
    /// Returns whether the error means "discard this candidate and try
    /// again" rather than a bug in the caller's sequencing.
    ///
    /// `NotFound` and `AlreadyExists` registry errors and store failures are
    /// not recoverable; everything random synthesis can run into is.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self,
                  Self::Store(_)
                  | Self::Registry(RegistryError::NotFound { .. }
                                   | RegistryError::AlreadyExists { .. }
                                   | RegistryError::UnknownBase { .. }))
    }
}

impl std::fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(e) => write!(f, "Syntax error in definition: {e}"),
            Self::Registry(e) => write!(f, "{e}"),
            Self::Execution { arguments, source } => {
                write!(f, "Execution failed for arguments {arguments:?}: {source}")
            },
            Self::RecursionSaturated { callee } => {
                write!(f, "Operator {callee} has no free recursion slot for this routing.")
            },
            Self::NoRecursiveCallee => write!(f, "No operator is available for recursion."),
            Self::Store(e) => write!(f, "{e}"),
            Self::RetryExhausted { what, attempts } => {
                write!(f, "Gave up generating {what} after {attempts} attempts.")
            },
        }
    }
}

impl std::error::Error for SynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Execution { source, .. } => Some(source),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for SynthesisError {
    fn from(e: ParseError) -> Self {
        Self::Syntax(e)
    }
}

impl From<RegistryError> for SynthesisError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<LoadError> for SynthesisError {
    fn from(e: LoadError) -> Self {
        Self::Store(e)
    }
}
