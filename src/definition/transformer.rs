use crate::{
    ast::{Expr, Procedure, Slot, UnaryOperator},
    definition::ast::{Condition, Definition, Term},
};

/// Lowers a parsed definition into its compute and cost procedures.
///
/// The compute body is the single term, or a `when` over the guarded branches
/// with the `else` term as fallback. The cost of a term is the sum, over
/// every operator application in it, of that operator's cost procedure
/// evaluated on the values of the application's operands; branches are
/// selected by the same guards.
///
/// # Returns
/// `(compute, cost)`.
///
/// # Example
/// ```
/// use opulse::{
///     definition::{parser::parse_definition, transformer::transform},
///     operator::{OperatorData, OperatorRegistry, seed::set_initial_operators},
/// };
///
/// let mut registry = OperatorRegistry::new();
/// set_initial_operators(&mut registry).unwrap();
/// registry.add(OperatorData::binary("⊕")).unwrap();
///
/// let definition = parse_definition("a⊕b = { a*b+1 }", &registry).unwrap();
/// let (compute, cost) = transform(&definition);
/// let id_of = |key| registry.id_of(key);
///
/// assert_eq!(compute.to_source(&id_of).unwrap(), "(a, b) => op_1(op_4(a, b), 1)");
/// assert_eq!(cost.to_source(&id_of).unwrap(),
///            "(a, b) => cost_1(op_4(a, b), 1) + cost_4(a, b)");
/// ```
#[must_use]
pub fn transform(definition: &Definition) -> (Procedure, Procedure) {
    let compute = select(definition, value_of);
    let cost = select(definition, cost_of);

    (Procedure { params: definition.params.clone(),
                 body:   compute, },
     Procedure { params: definition.params.clone(),
                 body:   cost, })
}

fn select(definition: &Definition, lower: fn(&Term) -> Expr) -> Expr {
    let otherwise = lower(&definition.otherwise);
    if definition.branches.is_empty() {
        return otherwise;
    }

    Expr::When { arms:      definition.branches
                                      .iter()
                                      .map(|(guard, term)| (condition(guard), lower(term)))
                                      .collect(),
                 otherwise: Box::new(otherwise), }
}

fn value_of(term: &Term) -> Expr {
    match term {
        Term::Number(n) => Expr::Integer(*n),
        Term::Variable(name) => Expr::Variable(name.clone()),
        Term::Unary { operator, operand } => Expr::call(*operator, Slot::Compute, vec![value_of(operand)]),
        Term::Binary { operator,
                       left,
                       right, } => Expr::call(*operator, Slot::Compute, vec![value_of(left), value_of(right)]),
    }
}

fn cost_of(term: &Term) -> Expr {
    let mut terms = Vec::new();
    collect_costs(term, &mut terms);
    Expr::sum(terms)
}

fn collect_costs(term: &Term, out: &mut Vec<Expr>) {
    match term {
        Term::Number(_) | Term::Variable(_) => {},
        Term::Unary { operator, operand } => {
            out.push(Expr::call(*operator, Slot::Cost, vec![value_of(operand)]));
            collect_costs(operand, out);
        },
        Term::Binary { operator,
                       left,
                       right, } => {
            out.push(Expr::call(*operator, Slot::Cost, vec![value_of(left), value_of(right)]));
            collect_costs(left, out);
            collect_costs(right, out);
        },
    }
}

fn condition(guard: &Condition) -> Expr {
    match guard {
        Condition::Compare { left, op, right } => Expr::binary(value_of(left), *op, value_of(right)),
        Condition::Not(inner) => Expr::UnaryOp { op:   UnaryOperator::Not,
                                                 expr: Box::new(condition(inner)), },
        Condition::And(l, r) => Expr::binary(condition(l), crate::ast::BinaryOperator::And, condition(r)),
        Condition::Or(l, r) => Expr::binary(condition(l), crate::ast::BinaryOperator::Or, condition(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        definition::parser::parse_definition,
        interpreter::value::core::Value,
        operator::{OperatorData, OperatorId, OperatorRegistry, seed::set_initial_operators},
    };

    fn define(registry: &mut OperatorRegistry, text: &str) -> OperatorId {
        let definition = parse_definition(text, registry).unwrap();
        let (compute, cost) = transform(&definition);
        let id = registry.id_of(definition.operator).unwrap();
        registry.set_procedures(id, Some(compute), Some(cost)).unwrap();
        id
    }

    fn run(registry: &OperatorRegistry, id: OperatorId, slot: Slot, a: i64, b: i64) -> Value {
        let key = registry.key_of(id).unwrap();
        registry.apply(key, slot, &[a.into(), b.into()]).unwrap()
    }

    #[test]
    fn plain_definitions_sum_the_cost_of_every_application() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry.add(OperatorData::binary("⊕")).unwrap();
        let id = define(&mut registry, "a⊕b = { a*b+1 }");

        assert_eq!(run(&registry, id, Slot::Compute, 3, 4), Value::Integer(13));
        assert_eq!(run(&registry, id, Slot::Cost, 3, 4), Value::Integer(4));
    }

    #[test]
    fn recursive_definitions_call_themselves() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry.add(OperatorData::binary("⊕")).unwrap();
        let id = define(&mut registry,
                        "a⊕b = { a, if b == 0 ; (a⊕(b-1))+a, if b > 0 ; (a⊕(b+1))-a, else }");

        assert_eq!(run(&registry, id, Slot::Compute, 3, 4), Value::Integer(15));
        assert_eq!(run(&registry, id, Slot::Compute, 3, -2), Value::Integer(-3));
        assert_eq!(run(&registry, id, Slot::Compute, 3, 0), Value::Integer(3));
    }

    #[test]
    fn branch_costs_follow_the_taken_branch() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry.add(OperatorData::binary("⊕")).unwrap();
        let id = define(&mut registry, "a⊕b = { a*b, if a > b ; a/b, else }");

        assert_eq!(run(&registry, id, Slot::Compute, 9, 2), Value::Integer(18));
        assert_eq!(run(&registry, id, Slot::Cost, 9, 2), Value::Integer(2));
        assert_eq!(run(&registry, id, Slot::Compute, -1, 0), Value::NaN);
        assert_eq!(run(&registry, id, Slot::Cost, -1, 0), Value::NaN);
    }
}
