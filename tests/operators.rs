use std::{collections::BTreeMap, fs, path::Path};

use opulse::{
    ast::Slot,
    config::Config,
    expression::{
        evaluator::{ExpressionEvaluator, RenderMode},
        generator::{AtomPolicy, ExpressionGenerator},
        node::Node,
    },
    interpreter::value::core::Value,
    operator::{
        Arity, DefinitionKind, OperatorData, OperatorId, OperatorRegistry, seed::set_initial_operators,
        store::write_jsonl,
    },
    synthesis::{
        pipeline::Synthesizer,
        recursion::{Routing, recursion_bit, routings},
    },
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use walkdir::WalkDir;

fn load_fixture(path: &Path) -> OperatorRegistry {
    let source = fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
    let mut registry = OperatorRegistry::new();
    let loaded = registry.load(&source);
    let lines = source.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(loaded, lines, "{path:?} lost records on load");
    registry
}

fn family() -> OperatorRegistry {
    load_fixture(Path::new("tests/fixtures/family.jsonl"))
}

fn assert_applies(registry: &OperatorRegistry, id: u32, arguments: &[i64], compute: Value, cost: Value) {
    let key = registry.key_of(OperatorId(id))
                      .unwrap_or_else(|| panic!("op_{id} is not registered"));
    let values: Vec<Value> = arguments.iter().map(|a| Value::Integer(*a)).collect();
    assert_eq!(registry.apply(key, Slot::Compute, &values).unwrap(), compute, "op_{id}{arguments:?}");
    assert_eq!(registry.apply(key, Slot::Cost, &values).unwrap(), cost, "cost_{id}{arguments:?}");
}

/// Every reference in every record resolves, and ids are `1..=N`.
fn assert_consistent(registry: &OperatorRegistry) {
    let ids: Vec<OperatorId> = registry.iter().map(|r| r.id()).collect();
    let dense: Vec<OperatorId> = (1..).map(OperatorId).take(ids.len()).collect();
    assert_eq!(ids, dense);

    for record in registry.iter() {
        for dependency in registry.dependency_ids(record.id()).unwrap() {
            assert!(registry.get(dependency).is_ok());
        }
        for slot in [Slot::Compute, Slot::Cost] {
            if let Some(procedure) = record.procedure(slot) {
                assert!(procedure.to_source(&|key| registry.id_of(key)).is_ok(),
                        "{} has a dangling call",
                        record.id());
            }
        }
    }
}

#[test]
fn fixtures_load_and_round_trip() {
    let mut count = 0;

    for entry in WalkDir::new("tests/fixtures").into_iter()
                                               .filter_map(Result::ok)
                                               .filter(|e| e.path().extension().is_some_and(|ext| ext == "jsonl"))
    {
        count += 1;
        let registry = load_fixture(entry.path());
        assert_consistent(&registry);

        let saved = registry.to_jsonl().unwrap();
        let mut reloaded = OperatorRegistry::new();
        reloaded.load(&saved);
        assert_eq!(reloaded.to_jsonl().unwrap(), saved, "{:?} does not round-trip", entry.path());
    }

    assert!(count > 0, "No fixtures found in tests/fixtures");
}

#[test]
fn seed_operators_have_order_one() {
    let mut registry = OperatorRegistry::new();
    set_initial_operators(&mut registry).unwrap();

    let plus = registry.function_id("+", false).unwrap();
    let times = registry.function_id("*", false).unwrap();
    assert_eq!(registry.get(plus).unwrap().order(), Some(1));
    assert_eq!(registry.get(times).unwrap().order(), Some(1));
    assert_eq!(registry.get_next_id(), OperatorId(7));
}

#[test]
fn loaded_operators_compute_and_cost() {
    let registry = family();

    assert_applies(&registry, 7, &[3, 4], Value::Integer(13), Value::Integer(4));
    assert_applies(&registry, 8, &[2, 3], Value::Integer(23), Value::Integer(9));
    assert_applies(&registry, 8, &[2, 0], Value::Integer(2), Value::Integer(0));
    assert_applies(&registry, 9, &[5], Value::Integer(-5), Value::Integer(1));
    assert_applies(&registry, 5, &[7, 0], Value::NaN, Value::NaN);
}

#[test]
fn example_expressions_render_and_fold() {
    let registry = family();
    let evaluator = ExpressionEvaluator::new(&registry);
    let key = |id| registry.key_of(OperatorId(id)).unwrap();

    let tree = Node::binary(key(4),
                            Node::binary(key(1), Node::number(2, 10), Node::number(3, 10)),
                            Node::number(5, 10));
    assert_eq!(evaluator.render(&tree, RenderMode::Plain, false).text, "(2+3)*5");
    let evaluation = evaluator.evaluate(0, tree);
    assert_eq!(evaluation.result(), Value::Integer(25));
    assert_eq!(evaluation.folded().cost, Value::Integer(6));

    let tree = Node::binary(key(5), Node::number(7, 10), Node::number(0, 10));
    assert_eq!(evaluator.evaluate(1, tree).result(), Value::NaN);

    let tree = Node::binary(key(1), Node::number(5, 2), Node::number(12, 10));
    assert_eq!(evaluator.render(&tree, RenderMode::BaseSymbol, false).text, "♭101+$12$");
}

#[test]
fn cascade_delete_renumbers_without_dangling_references() {
    let mut registry = family();

    let removed = registry.delete_cascade(OperatorId(1)).unwrap();
    assert_eq!(removed, vec![OperatorId(1), OperatorId(4), OperatorId(7), OperatorId(8)]);
    assert_eq!(registry.len(), 6);
    assert_consistent(&registry);

    let postfix = registry.function_id("⊣", true).unwrap();
    assert_eq!(postfix, OperatorId(5));
    assert_eq!(registry.dependency_ids(postfix).unwrap(), vec![OperatorId(2)]);
    assert_applies(&registry, 5, &[4], Value::Integer(-4), Value::Integer(1));

    let mut reloaded = OperatorRegistry::new();
    assert_eq!(reloaded.load(&registry.to_jsonl().unwrap()), 6);
}

#[test]
fn unknown_ids_fail_distinctly() {
    let mut registry = family();
    assert!(registry.remove(OperatorId(42)).is_err());
    assert!(registry.delete_cascade(OperatorId(42)).is_err());
    assert!(registry.add(OperatorData { id: Some(OperatorId(3)),
                                        ..OperatorData::binary("⊗") })
                    .is_err());
    assert_eq!(registry.calculate_order(OperatorId(42)), None);
}

#[test]
fn recursion_patterns_saturate() {
    let mut registry = family();
    let negate = OperatorId(3);
    let plus = OperatorId(1);

    let unary_bits = [recursion_bit(Arity::Binary, Routing::Unary), recursion_bit(Arity::Unary, Routing::Unary)];
    for bit in unary_bits.into_iter().flatten() {
        assert!(registry.claim_recursion(negate, bit).unwrap());
    }
    assert!(!registry.get(negate).unwrap().recursion().enabled);
    assert!(!registry.claim_recursion(negate, 0).unwrap());

    let mut binary_bits: Vec<u8> = [Arity::Binary, Arity::Unary].into_iter()
                                                                .flat_map(|caller| {
                                                                    routings(caller, Arity::Binary).into_iter()
                                                                                                   .filter_map(move |r| recursion_bit(caller, r))
                                                                })
                                                                .collect();
    binary_bits.sort_unstable();
    assert_eq!(binary_bits, (0..8).collect::<Vec<u8>>());
    for bit in &binary_bits {
        assert!(registry.claim_recursion(plus, *bit).unwrap());
    }
    assert!(!registry.get(plus).unwrap().recursion().enabled);

    let callees: Vec<OperatorId> = registry.recursion_callees()
                                           .into_iter()
                                           .filter_map(|key| registry.id_of(key))
                                           .collect();
    assert!(!callees.contains(&plus) && !callees.contains(&negate));
}

#[test]
fn synthesized_family_feeds_a_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let mut registry = OperatorRegistry::with_limits(config.evaluation);
    set_initial_operators(&mut registry).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    let report = Synthesizer::new(&config).generate_random_operators(&mut registry, &mut rng, 6)
                                          .unwrap();
    assert_eq!(registry.len(), 6 + report.generated + 15);
    assert_consistent(&registry);
    for record in registry.iter().filter(|r| !r.is_base()) {
        assert!(!record.is_temporary());
        assert!(record.precedence().is_some());
    }

    let evaluator = ExpressionEvaluator::new(&registry);
    let mut generator = ExpressionGenerator::new(&config.expression, config.synthesis.max_base);
    generator.refresh_pools(&registry);
    let records: Vec<_> = (0..25).map(|_| generator.create_expression(&evaluator, &mut rng, AtomPolicy::Number))
                                 .collect();

    let path = dir.path().join("expressions.jsonl");
    assert_eq!(write_jsonl(&path, &records).unwrap(), 25);
    let text = fs::read_to_string(&path).unwrap();
    for (expected, line) in text.lines().enumerate() {
        let record: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(record["id"], serde_json::json!(expected));
        assert!(record["expression"].is_string());
        assert!(record["tree"].is_object());
    }
}

fn expected_orders(shape: &[(Vec<usize>, bool)]) -> Vec<u32> {
    let mut orders: Vec<u32> = Vec::with_capacity(shape.len());
    for (dependencies, recursive) in shape {
        let order = dependencies.iter()
                                .map(|d| orders[*d])
                                .max()
                                .map_or(1, |highest| highest + u32::from(*recursive));
        orders.push(order);
    }
    orders
}

proptest! {
    #[test]
    fn order_follows_dependencies(raw in prop::collection::vec((prop::collection::vec(any::<prop::sample::Index>(), 0..4),
                                                                 any::<bool>()),
                                                                1..12)) {
        let shape: Vec<(Vec<usize>, bool)> =
            raw.iter()
               .enumerate()
               .map(|(i, (picks, recursive))| {
                   let dependencies = if i == 0 { Vec::new() } else { picks.iter().map(|p| p.index(i)).collect() };
                   (dependencies, *recursive)
               })
               .collect();

        let mut registry = OperatorRegistry::new();
        let mut ids = Vec::new();
        for (i, (dependencies, recursive)) in shape.iter().enumerate() {
            let kind = if *recursive { DefinitionKind::Recursive } else { DefinitionKind::Plain };
            let id = registry.add(OperatorData { kind, ..OperatorData::binary(&format!("⊕{i}")) }).unwrap().id();
            let dependencies: Vec<OperatorId> = dependencies.iter().map(|d| ids[*d]).collect();
            registry.set_dependencies(id, &dependencies).unwrap();
            ids.push(id);
        }

        let mut computed = BTreeMap::new();
        for id in ids.iter().rev() {
            computed.insert(*id, registry.calculate_order(*id).unwrap());
        }
        let computed: Vec<u32> = ids.iter().map(|id| computed[id]).collect();
        prop_assert_eq!(computed, expected_orders(&shape));
    }
}
