/// Operator identity and per-operator state.
///
/// Defines the stable arena key, the external id, the shape enums and the
/// `OperatorRecord` the registry owns.
pub mod record;

/// The operator registry.
///
/// Owns every record, maps external ids to stable keys, indexes symbols and
/// numeral bases, caches compiled procedures and maintains dependencies and
/// order.
pub mod registry;

/// Line-delimited JSON persistence of the registry and of the
/// operator-to-expression index.
pub mod store;

/// The six arithmetic operators every registry starts from.
pub mod seed;

/// Precedence and associativity assignment.
pub mod priority;

pub use record::{
    Arity, Associativity, DefinitionKind, Fixedness, OperatorData, OperatorId, OperatorKey,
    OperatorRecord, RecursionUsage,
};
pub use registry::{OperatorPools, OperatorRegistry};
