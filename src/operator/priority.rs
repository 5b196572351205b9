use rand::Rng;
use tracing::{debug, info};

use crate::{
    error::RegistryError,
    operator::{
        record::{Arity, Associativity, Fixedness, OperatorId},
        registry::OperatorRegistry,
    },
};

/// Gives every operator without a precedence level one, plus an
/// associativity.
///
/// Existing levels are kept. A binary operator is placed one level above the
/// highest of its binary dependencies (at least 1, at most `max_priority`)
/// and is randomly left- or right-associative. Unary operators share a single
/// level above every binary one; prefix operators associate right, postfix
/// left.
///
/// # Returns
/// The number of operators that received a level.
///
/// # Errors
/// `NotFound` only if the registry changes underneath; never in practice.
pub fn assign_priorities<R: Rng + ?Sized>(registry: &mut OperatorRegistry,
                                          rng: &mut R,
                                          max_priority: u32)
                                          -> Result<usize, RegistryError> {
    let mut pending: Vec<(u32, OperatorId)> =
        registry.iter()
                .filter(|r| r.arity() == Arity::Binary && r.precedence().is_none())
                .map(|r| (r.order().unwrap_or(1), r.id()))
                .collect();
    pending.sort_unstable();

    let mut assigned = 0;
    for (_, id) in pending {
        let highest = registry.get(id)?
                              .dependencies()
                              .iter()
                              .filter_map(|key| registry.record(*key))
                              .filter(|dep| dep.arity() == Arity::Binary)
                              .filter_map(|dep| dep.precedence())
                              .max()
                              .unwrap_or(0);
        let level = (highest + 1).clamp(1, max_priority.max(1));
        let associativity = if rng.gen_bool(0.5) {
            Associativity::Left
        } else {
            Associativity::Right
        };
        registry.set_precedence(id, level, associativity)?;
        debug!(%id, level, ?associativity, "binary precedence assigned");
        assigned += 1;
    }

    let unary_level = registry.iter()
                              .filter(|r| r.arity() == Arity::Binary)
                              .filter_map(|r| r.precedence())
                              .max()
                              .unwrap_or(0)
                      + 1;
    let unary: Vec<(OperatorId, Option<Fixedness>)> =
        registry.iter()
                .filter(|r| r.arity() == Arity::Unary && r.precedence().is_none())
                .map(|r| (r.id(), r.fixedness()))
                .collect();
    for (id, fixedness) in unary {
        let associativity = match fixedness {
            Some(Fixedness::Postfix) => Associativity::Left,
            _ => Associativity::Right,
        };
        registry.set_precedence(id, unary_level, associativity)?;
        assigned += 1;
    }

    info!(assigned, unary_level, "precedence levels assigned");
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::operator::{OperatorData, seed::set_initial_operators};

    #[test]
    fn new_operators_sit_above_their_dependencies() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        let over_times = registry.add(OperatorData::binary("⊕")).unwrap().id();
        registry.set_dependencies(over_times, &[OperatorId(4), OperatorId(1)]).unwrap();
        let plain = registry.add(OperatorData::binary("⊗")).unwrap().id();
        let postfix = registry.add(OperatorData::unary("!", Fixedness::Postfix)).unwrap().id();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(assign_priorities(&mut registry, &mut rng, 10).unwrap(), 3);

        assert_eq!(registry.get(over_times).unwrap().precedence(), Some(3));
        assert_eq!(registry.get(plain).unwrap().precedence(), Some(1));
        let postfix = registry.get(postfix).unwrap();
        assert_eq!(postfix.precedence(), Some(4));
        assert_eq!(postfix.associativity(), Some(Associativity::Left));
        assert_eq!(registry.get(OperatorId(3)).unwrap().precedence(), Some(3));
    }

    #[test]
    fn levels_are_capped() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        let id = registry.add(OperatorData::binary("⊕")).unwrap().id();
        registry.set_dependencies(id, &[OperatorId(4)]).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assign_priorities(&mut registry, &mut rng, 2).unwrap();
        assert_eq!(registry.get(id).unwrap().precedence(), Some(2));
    }
}
