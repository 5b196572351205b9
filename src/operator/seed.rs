use tracing::info;

use crate::{
    error::{RegistryError, SynthesisError},
    interpreter::parser::core::parse_procedure,
    operator::{
        record::{Associativity, DefinitionKind, Fixedness, OperatorData, OperatorId},
        registry::OperatorRegistry,
    },
};

struct Seed {
    symbol:     &'static str,
    prefix:     bool,
    precedence: u32,
    assoc:      Associativity,
    compute:    &'static str,
    cost:       &'static str,
    depends_on: &'static [u32],
}

const SEEDS: [Seed; 6] = [Seed { symbol:     "+",
                                 prefix:     false,
                                 precedence: 1,
                                 assoc:      Associativity::Left,
                                 compute:    "(a, b) => a + b",
                                 cost:       "(a, b) => 1",
                                 depends_on: &[], },
                          Seed { symbol:     "-",
                                 prefix:     false,
                                 precedence: 1,
                                 assoc:      Associativity::Left,
                                 compute:    "(a, b) => a - b",
                                 cost:       "(a, b) => 1",
                                 depends_on: &[], },
                          Seed { symbol:     "-",
                                 prefix:     true,
                                 precedence: 3,
                                 assoc:      Associativity::Right,
                                 compute:    "(a) => -a",
                                 cost:       "(a) => 1",
                                 depends_on: &[], },
                          Seed { symbol:     "*",
                                 prefix:     false,
                                 precedence: 2,
                                 assoc:      Associativity::Left,
                                 compute:    "(a, b) => a * b",
                                 cost:       "(a, b) => min(abs(a), abs(b))",
                                 depends_on: &[1], },
                          Seed { symbol:     "/",
                                 prefix:     false,
                                 precedence: 2,
                                 assoc:      Associativity::Left,
                                 compute:    "(a, b) => a / b",
                                 cost:       "(a, b) => abs(a) / abs(b)",
                                 depends_on: &[2], },
                          Seed { symbol:     "%",
                                 prefix:     false,
                                 precedence: 2,
                                 assoc:      Associativity::Left,
                                 compute:    "(a, b) => a % b",
                                 cost:       "(a, b) => abs(a) / abs(b)",
                                 depends_on: &[2], }];

/// Registers the six arithmetic operators every operator family grows from:
/// `+`, `-`, unary `-`, `*`, `/` and `%`, with ids 1 to 6.
///
/// Division and modulo floor and yield NaN for a zero divisor. The cost of
/// `*` is the smaller operand magnitude, the cost of `/` and `%` the quotient
/// of the magnitudes.
///
/// # Errors
/// `Registry` if any of the ids 1 to 6 is taken, `Syntax` never for the
/// built-in texts.
pub fn set_initial_operators(registry: &mut OperatorRegistry) -> Result<(), SynthesisError> {
    for (id, seed) in (1..).zip(&SEEDS) {
        let base = if seed.prefix {
            OperatorData::unary(seed.symbol, Fixedness::Prefix)
        } else {
            OperatorData::binary(seed.symbol)
        };
        let resolve = |id| registry.key_of(id);
        let data = OperatorData { id: Some(OperatorId(id)),
                                  kind: DefinitionKind::Base,
                                  precedence: Some(seed.precedence),
                                  associativity: Some(seed.assoc),
                                  compute: Some(parse_procedure(seed.compute, &resolve)?),
                                  cost: Some(parse_procedure(seed.cost, &resolve)?),
                                  ..base };
        registry.add(data)?;
    }

    for (id, seed) in (1..).zip(&SEEDS) {
        let dependencies: Vec<OperatorId> = seed.depends_on.iter().map(|d| OperatorId(*d)).collect();
        registry.set_dependencies(OperatorId(id), &dependencies)?;
    }
    for id in 1..=6 {
        registry.calculate_order(OperatorId(id))
                .ok_or(RegistryError::NotFound { id: OperatorId(id) })?;
    }

    info!(operators = registry.len(), "initial operators registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::Slot, interpreter::value::core::Value};

    #[test]
    fn seeds_follow_the_order_formula() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();

        assert_eq!(registry.len(), 6);
        assert!(registry.iter().all(|r| r.order() == Some(1)));
        assert_eq!(registry.dependency_ids(OperatorId(4)).unwrap(), vec![OperatorId(1)]);
        assert_eq!(registry.function_id("-", true), Some(OperatorId(3)));
        assert_eq!(registry.function_id("-", false), Some(OperatorId(2)));
    }

    #[test]
    fn division_floors_and_guards_zero() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        let div = registry.key_of(OperatorId(5)).unwrap();
        let rem = registry.key_of(OperatorId(6)).unwrap();

        assert_eq!(registry.apply(div, Slot::Compute, &[(-7).into(), 2.into()]).unwrap(),
                   Value::Integer(-4));
        assert_eq!(registry.apply(rem, Slot::Compute, &[(-7).into(), 2.into()]).unwrap(),
                   Value::Integer(1));
        assert_eq!(registry.apply(rem, Slot::Cost, &[7.into(), 0.into()]).unwrap(), Value::NaN);
    }

    #[test]
    fn seeding_twice_fails_loudly() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        let err = set_initial_operators(&mut registry).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
