use crate::{
    ast::{Builtin, Expr, Procedure, Slot},
    operator::{Arity, Fixedness, OperatorKey},
};

/// Name of the loop accumulator in generated procedures.
const ACCUMULATOR: &str = "acc";

/// What feeds one parameter slot of the callee on every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// The running result.
    Accumulator,
    /// The caller's left (or only) operand.
    Left,
    /// The caller's right operand.
    Right,
}

/// How the accumulator and operands are routed into a callee's parameters.
///
/// A unary callee always takes the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routing {
    Unary,
    Binary(Feed, Feed),
}

/// Routings into a binary callee from a binary caller, in bit order.
pub const BINARY_CALLER_ROUTINGS: [(Feed, Feed); 5] = [(Feed::Accumulator, Feed::Accumulator),
                                                       (Feed::Accumulator, Feed::Left),
                                                       (Feed::Accumulator, Feed::Right),
                                                       (Feed::Left, Feed::Accumulator),
                                                       (Feed::Right, Feed::Accumulator)];

/// Routings into a binary callee from a unary caller, in bit order.
pub const UNARY_CALLER_ROUTINGS: [(Feed, Feed); 3] = [(Feed::Accumulator, Feed::Accumulator),
                                                      (Feed::Accumulator, Feed::Left),
                                                      (Feed::Left, Feed::Accumulator)];

/// Routings available to a caller of arity `caller` over a callee of arity
/// `callee`.
#[must_use]
pub fn routings(caller: Arity, callee: Arity) -> Vec<Routing> {
    match (caller, callee) {
        (_, Arity::Unary) => vec![Routing::Unary],
        (Arity::Binary, Arity::Binary) => BINARY_CALLER_ROUTINGS.iter()
                                                                .map(|(p, q)| Routing::Binary(*p, *q))
                                                                .collect(),
        (Arity::Unary, Arity::Binary) => UNARY_CALLER_ROUTINGS.iter()
                                                              .map(|(p, q)| Routing::Binary(*p, *q))
                                                              .collect(),
    }
}

/// The callee's usage bit for a caller shape and routing.
///
/// | caller | callee | bits |
/// |---|---|---|
/// | binary | binary | 0..=4, in [`BINARY_CALLER_ROUTINGS`] order |
/// | unary | binary | 5..=7, in [`UNARY_CALLER_ROUTINGS`] order |
/// | binary | unary | 0 |
/// | unary | unary | 1 |
///
/// # Returns
/// `None` for a routing the caller shape cannot use.
///
/// # Example
/// ```
/// use opulse::{
///     operator::Arity,
///     synthesis::recursion::{Feed, Routing, recursion_bit},
/// };
///
/// let routing = Routing::Binary(Feed::Left, Feed::Accumulator);
/// assert_eq!(recursion_bit(Arity::Binary, routing), Some(3));
/// assert_eq!(recursion_bit(Arity::Unary, routing), Some(7));
/// assert_eq!(recursion_bit(Arity::Unary, Routing::Binary(Feed::Right, Feed::Left)), None);
/// ```
#[must_use]
pub fn recursion_bit(caller: Arity, routing: Routing) -> Option<u8> {
    let position = |table: &[(Feed, Feed)], p, q| {
        table.iter()
             .position(|r| *r == (p, q))
             .and_then(|i| u8::try_from(i).ok())
    };
    match (caller, routing) {
        (Arity::Binary, Routing::Unary) => Some(0),
        (Arity::Unary, Routing::Unary) => Some(1),
        (Arity::Binary, Routing::Binary(p, q)) => position(&BINARY_CALLER_ROUTINGS, p, q),
        (Arity::Unary, Routing::Binary(p, q)) => position(&UNARY_CALLER_ROUTINGS, p, q).map(|i| i + 5),
    }
}

/// Builds the procedures of a loop-recursive operator.
///
/// The compute procedure starts from the left operand and applies the callee
/// `|n|` times, where `n` is the right operand of a binary caller or the
/// operand of a unary one. The cost procedure sums the callee's cost over
/// the same iterations.
///
/// # Returns
/// `(compute, cost)`.
///
/// # Example
/// ```
/// use opulse::{
///     operator::{Arity, OperatorId, OperatorRegistry, seed::set_initial_operators},
///     synthesis::recursion::{Feed, Routing, loop_procedures},
/// };
///
/// let mut registry = OperatorRegistry::new();
/// set_initial_operators(&mut registry).unwrap();
/// let plus = registry.key_of(OperatorId(1)).unwrap();
///
/// let (compute, cost) = loop_procedures(Arity::Binary, plus, Routing::Binary(Feed::Accumulator, Feed::Left));
/// let id_of = |key| registry.id_of(key);
/// assert_eq!(compute.to_source(&id_of).unwrap(), "(a, b) => repeat(abs(b), a, acc => op_1(acc, a))");
/// assert_eq!(cost.to_source(&id_of).unwrap(),
///            "(a, b) => repeat_sum(abs(b), a, acc => op_1(acc, a), acc => cost_1(acc, a))");
/// ```
#[must_use]
pub fn loop_procedures(caller: Arity, callee: OperatorKey, routing: Routing) -> (Procedure, Procedure) {
    let params: &[&str] = match caller {
        Arity::Unary => &["a"],
        Arity::Binary => &["a", "b"],
    };
    let counter = params[params.len() - 1];
    let feed = |f: Feed| {
        Expr::var(match f {
                      Feed::Accumulator => ACCUMULATOR,
                      Feed::Left => "a",
                      Feed::Right => "b",
                  })
    };
    let arguments = match routing {
        Routing::Unary => vec![Expr::var(ACCUMULATOR)],
        Routing::Binary(p, q) => vec![feed(p), feed(q)],
    };
    let count = Expr::Builtin { function:  Builtin::Abs,
                                arguments: vec![Expr::var(counter)], };

    let compute = Expr::Repeat { count:       Box::new(count.clone()),
                                 init:        Box::new(Expr::var("a")),
                                 accumulator: ACCUMULATOR.to_string(),
                                 step:        Box::new(Expr::call(callee, Slot::Compute, arguments.clone())),
                                 term:        None, };
    let cost = Expr::Repeat { count:       Box::new(count),
                              init:        Box::new(Expr::var("a")),
                              accumulator: ACCUMULATOR.to_string(),
                              step:        Box::new(Expr::call(callee, Slot::Compute, arguments.clone())),
                              term:        Some(Box::new(Expr::call(callee, Slot::Cost, arguments))), };

    (Procedure::new(params, compute), Procedure::new(params, cost))
}

/// The shape of a loop-recursive operator and the callee it wraps, as needed
/// to write its definition text.
#[derive(Debug, Clone, Copy)]
pub struct LoopShape<'s> {
    pub symbol:           &'s str,
    pub arity:            Arity,
    pub fixedness:        Option<Fixedness>,
    pub callee_symbol:    &'s str,
    pub callee_fixedness: Option<Fixedness>,
    pub routing:          Routing,
}

/// Writes the definition text equivalent to [`loop_procedures`]:
/// `lhs = {a, if n == 0; step(n-1), if n > 0; step(n+1), else}`, where the
/// running result is spelled as the operator applied one step closer to
/// zero.
///
/// # Example
/// ```
/// use opulse::{
///     operator::Arity,
///     synthesis::recursion::{Feed, LoopShape, Routing, loop_definition},
/// };
///
/// let shape = LoopShape { symbol:           "⊕",
///                         arity:            Arity::Binary,
///                         fixedness:        None,
///                         callee_symbol:    "+",
///                         callee_fixedness: None,
///                         routing:          Routing::Binary(Feed::Accumulator, Feed::Left), };
/// assert_eq!(loop_definition(&shape),
///            "a⊕b = {a, if b == 0; ((a⊕(b-1)))+(a), if b > 0; ((a⊕(b+1)))+(a), else}");
/// ```
#[must_use]
pub fn loop_definition(shape: &LoopShape<'_>) -> String {
    let (lhs, counter) = match (shape.arity, shape.fixedness) {
        (Arity::Binary, _) => (format!("a{}b", shape.symbol), "b"),
        (Arity::Unary, Some(Fixedness::Postfix)) => (format!("a{}", shape.symbol), "a"),
        (Arity::Unary, _) => (format!("{}a", shape.symbol), "a"),
    };
    let previous = |step: &str| match (shape.arity, shape.fixedness) {
        (Arity::Binary, _) => format!("(a{}(b{step}))", shape.symbol),
        (Arity::Unary, Some(Fixedness::Postfix)) => format!("((a{step}){})", shape.symbol),
        (Arity::Unary, _) => format!("({}(a{step}))", shape.symbol),
    };
    let rhs = |step: &str| {
        let spell = |f: Feed| match f {
            Feed::Accumulator => previous(step),
            Feed::Left => "a".to_string(),
            Feed::Right => "b".to_string(),
        };
        match shape.routing {
            Routing::Binary(p, q) => format!("({}){}({})", spell(p), shape.callee_symbol, spell(q)),
            Routing::Unary if shape.callee_fixedness == Some(Fixedness::Postfix) => {
                format!("({}){}", previous(step), shape.callee_symbol)
            },
            Routing::Unary => format!("{}({})", shape.callee_symbol, previous(step)),
        }
    };

    format!("{lhs} = {{a, if {counter} == 0; {}, if {counter} > 0; {}, else}}",
            rhs("-1"),
            rhs("+1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interpreter::value::core::Value,
        operator::{OperatorData, OperatorId, OperatorRegistry, seed::set_initial_operators},
    };

    #[test]
    fn every_routing_has_a_distinct_bit() {
        let mut seen = std::collections::HashSet::new();
        for caller in [Arity::Binary, Arity::Unary] {
            for routing in routings(caller, Arity::Binary) {
                assert!(seen.insert(recursion_bit(caller, routing).unwrap()));
            }
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(recursion_bit(Arity::Binary, Routing::Unary), Some(0));
        assert_eq!(recursion_bit(Arity::Unary, Routing::Unary), Some(1));
    }

    #[test]
    fn loops_apply_the_callee_abs_n_times() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        let times = registry.key_of(OperatorId(4)).unwrap();
        let (compute, cost) = loop_procedures(Arity::Binary, times, Routing::Binary(Feed::Accumulator, Feed::Left));
        let id = registry.add(OperatorData { compute: Some(compute),
                                             cost: Some(cost),
                                             ..OperatorData::binary("⊛") })
                         .unwrap()
                         .id();
        let key = registry.key_of(id).unwrap();

        let apply = |slot, a, b| registry.apply(key, slot, &[Value::Integer(a), Value::Integer(b)]).unwrap();
        // 2 * 2 * 2 * 2
        assert_eq!(apply(Slot::Compute, 2, 3), Value::Integer(16));
        assert_eq!(apply(Slot::Compute, 2, -3), Value::Integer(16));
        assert_eq!(apply(Slot::Compute, 5, 0), Value::Integer(5));
        // min(2, 2) + min(4, 2) + min(8, 2)
        assert_eq!(apply(Slot::Cost, 2, 3), Value::Integer(6));
    }

    #[test]
    fn unary_loops_count_with_their_operand() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        let negate = registry.key_of(OperatorId(3)).unwrap();
        let (compute, cost) = loop_procedures(Arity::Unary, negate, Routing::Unary);
        let id = registry.add(OperatorData { compute: Some(compute),
                                             cost: Some(cost),
                                             ..OperatorData::unary("⊖", Fixedness::Prefix) })
                         .unwrap()
                         .id();
        let key = registry.key_of(id).unwrap();

        assert_eq!(registry.apply(key, Slot::Compute, &[Value::Integer(3)]).unwrap(), Value::Integer(-3));
        assert_eq!(registry.apply(key, Slot::Cost, &[Value::Integer(-4)]).unwrap(), Value::Integer(4));
    }

    #[test]
    fn definition_text_matches_the_caller_shape() {
        let shape = LoopShape { symbol:           "⊖",
                                arity:            Arity::Unary,
                                fixedness:        Some(Fixedness::Postfix),
                                callee_symbol:    "-",
                                callee_fixedness: Some(Fixedness::Prefix),
                                routing:          Routing::Unary, };
        assert_eq!(loop_definition(&shape),
                   "a⊖ = {a, if a == 0; -(((a-1)⊖)), if a > 0; -(((a+1)⊖)), else}");
    }
}
