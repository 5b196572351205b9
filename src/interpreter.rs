/// The compiler module lowers parsed procedures into executable form.
///
/// Lowering resolves every variable to a frame slot and checks every call
/// against its callee before anything runs, so evaluation never has to look
/// names up.
///
/// # Responsibilities
/// - Converts `Procedure` trees into `Instr` trees.
/// - Reports unknown variables, missing callees and arity mismatches.
pub mod compiler;
/// The evaluator module executes compiled procedures.
///
/// The evaluator walks instruction trees, performs checked integer
/// arithmetic, resolves operator calls through the registry and enforces the
/// fuel and call-depth budget.
///
/// # Responsibilities
/// - Evaluates instructions, propagating NaN instead of failing.
/// - Bounds recursion and iteration.
/// - Reports runtime errors such as budget exhaustion or a boolean result.
pub mod evaluator;
/// The lexer module tokenizes procedure text.
///
/// Procedure text is the persisted form of compute and cost procedures. The
/// lexer turns it into integers, identifiers, operator references, keywords
/// and punctuation.
pub mod lexer;
/// The parser module builds procedure trees from tokens.
///
/// # Responsibilities
/// - Converts tokens into `Procedure` and `Expr` nodes.
/// - Resolves `op_N` / `cost_N` references to stable operator keys.
/// - Reports syntax errors with their byte offset.
pub mod parser;
/// The value module defines the runtime data types for evaluation.
///
/// Procedures compute with integers and the NaN sentinel; conditions
/// evaluate to booleans.
pub mod value;
