/// Expression trees.
///
/// Number, variable, unary and binary nodes. Every node remembers where it
/// hangs below its parent, which the renderer needs for associativity.
pub mod node;

/// Random expression trees.
///
/// Draws node categories from configured weights, picks operators from the
/// registry's pools and emits either fully bracketed definition text or
/// complete dataset records.
pub mod generator;

/// Rendering, metrics and evaluation of expression trees.
///
/// A single walk renders the tree with the minimal brackets its operators'
/// precedence and associativity allow, and collects the structural metrics
/// of the dataset record. The cost and value fold is computed on demand and
/// cached.
pub mod evaluator;
