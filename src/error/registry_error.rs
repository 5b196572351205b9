use crate::{ast::Slot, error::CompileError, operator::OperatorId};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents invariant violations and compile failures on the operator
/// registry.
pub enum RegistryError {
    /// No operator has the requested id.
    NotFound {
        /// The requested id.
        id: OperatorId,
    },
    /// No operator is tagged with the requested numeral base.
    UnknownBase {
        /// The requested base.
        base: u32,
    },
    /// An operator with this id is already registered.
    AlreadyExists {
        /// The duplicated id.
        id: OperatorId,
    },
    /// A procedure could not be compiled.
    Compile {
        /// The operator owning the procedure.
        id:     OperatorId,
        /// Which of its procedures failed.
        slot:   Slot,
        /// The underlying cause.
        source: CompileError,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "Operator {id} not found."),
            Self::UnknownBase { base } => write!(f, "No operator is registered for base {base}."),
            Self::AlreadyExists { id } => write!(f, "Operator {id} already exists."),
            Self::Compile { id, slot, source } => {
                write!(f, "Failed to compile {slot} procedure of operator {id}: {source}.")
            },
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compile { source, .. } => Some(source),
            _ => None,
        }
    }
}
