use rand::{
    Rng,
    distributions::{Distribution, WeightedIndex},
    seq::SliceRandom,
};
use tracing::{trace, warn};

use crate::{
    config::ExpressionConfig,
    expression::{
        evaluator::{ExpressionEvaluator, ExpressionProperties, RenderMode},
        node::Node,
    },
    operator::{OperatorPools, OperatorRegistry, store::OperatorExpressionIndex},
};

/// Which atoms a tree may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomPolicy {
    /// Variables only.
    Variable,
    /// Number literals only.
    Number,
    /// Either, drawn by the configured atom weights.
    VariableAndNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Binary,
    Prefix,
    Postfix,
    Atom,
}

const CATEGORIES: [Category; 4] = [Category::Binary, Category::Prefix, Category::Postfix, Category::Atom];

/// Builds random expression trees over the registry's operators.
///
/// The generator works on a snapshot of the registry's operator pools; call
/// [`refresh_pools`](Self::refresh_pools) after the registry changes.
#[derive(Debug, Clone)]
pub struct ExpressionGenerator {
    variables:       Vec<String>,
    range:           (i64, i64),
    max_depth:       usize,
    max_base:        u32,
    weights:         [f64; 4],
    categories:      Option<WeightedIndex<f64>>,
    variable_chance: f64,
    pools:           OperatorPools,
    next_id:         u64,
    index:           OperatorExpressionIndex,
}

impl ExpressionGenerator {
    /// Creates a generator from configuration.
    ///
    /// Unusable category weights (all zero or negative) fall back to atoms
    /// only.
    #[must_use]
    pub fn new(config: &ExpressionConfig, max_base: u32) -> Self {
        let weights = [config.type_weights.binary,
                       config.type_weights.unary_prefix,
                       config.type_weights.unary_postfix,
                       config.type_weights.atoms];
        let categories = WeightedIndex::new(weights).ok();
        if categories.is_none() {
            warn!(?weights, "unusable expression type weights, generating atoms only");
        }

        let atoms = config.atom_type_weights;
        let total = atoms.variable + atoms.number;
        let variable_chance = if total > 0.0 {
            (atoms.variable / total).clamp(0.0, 1.0)
        } else {
            0.5
        };

        Self { variables: config.variables.clone(),
               range: config.numeric_range.bounds(),
               max_depth: config.max_depth,
               max_base: max_base.max(2),
               weights,
               categories,
               variable_chance,
               pools: OperatorPools::default(),
               next_id: 0,
               index: OperatorExpressionIndex::default() }
    }

    /// Replaces the variables atoms are drawn from.
    pub fn set_variables(&mut self, variables: &[String]) {
        self.variables = variables.to_vec();
    }

    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub const fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Re-reads the operator pools from `registry`.
    pub fn refresh_pools(&mut self, registry: &OperatorRegistry) {
        self.pools = registry.operators_by_fixedness_and_arity();
        trace!(prefix = self.pools.prefix.len(),
               postfix = self.pools.postfix.len(),
               binary = self.pools.binary.len(),
               "expression pools refreshed");
    }

    /// The operator-to-expression index of every expression created so far.
    #[must_use]
    pub const fn index(&self) -> &OperatorExpressionIndex {
        &self.index
    }

    /// Generates a tree.
    ///
    /// At `current_depth >= max_depth` the result is an atom. Below it a node
    /// category is drawn from the weights; a category whose operator pool is
    /// empty is drawn again.
    pub fn generate<R: Rng + ?Sized>(&self,
                                     rng: &mut R,
                                     current_depth: usize,
                                     max_depth: usize,
                                     policy: AtomPolicy)
                                     -> Node {
        if current_depth >= max_depth {
            return self.atom(rng, policy);
        }

        match self.draw_category(rng) {
            Category::Binary => {
                let Some(operator) = self.pools.binary.choose(rng).copied() else {
                    return self.atom(rng, policy);
                };
                let left = self.generate(rng, current_depth + 1, max_depth, policy);
                let right = self.generate(rng, current_depth + 1, max_depth, policy);
                Node::binary(operator, left, right)
            },
            category @ (Category::Prefix | Category::Postfix) => {
                let pool = if category == Category::Prefix {
                    &self.pools.prefix
                } else {
                    &self.pools.postfix
                };
                let Some(operator) = pool.choose(rng).copied() else {
                    return self.atom(rng, policy);
                };
                Node::unary(operator, self.generate(rng, current_depth + 1, max_depth, policy))
            },
            Category::Atom => self.atom(rng, policy),
        }
    }

    /// Draws a category whose pool is not empty. When no weighted category
    /// has operators, the draw is an atom.
    fn draw_category<R: Rng + ?Sized>(&self, rng: &mut R) -> Category {
        let Some(distribution) = &self.categories else {
            return Category::Atom;
        };
        let available = |category: Category| match category {
            Category::Binary => !self.pools.binary.is_empty(),
            Category::Prefix => !self.pools.prefix.is_empty(),
            Category::Postfix => !self.pools.postfix.is_empty(),
            Category::Atom => true,
        };
        let any = CATEGORIES.iter()
                            .zip(self.weights)
                            .any(|(c, w)| w > 0.0 && available(*c));
        if !any {
            return Category::Atom;
        }

        loop {
            let category = CATEGORIES[distribution.sample(rng)];
            if available(category) {
                return category;
            }
        }
    }

    fn atom<R: Rng + ?Sized>(&self, rng: &mut R, policy: AtomPolicy) -> Node {
        let variable = match policy {
            AtomPolicy::Variable => true,
            AtomPolicy::Number => false,
            AtomPolicy::VariableAndNumber => rng.gen_bool(self.variable_chance),
        };
        match self.variables.choose(rng) {
            Some(name) if variable => Node::variable(name),
            _ => Node::number(rng.gen_range(self.range.0..=self.range.1),
                              rng.gen_range(2..=self.max_base)),
        }
    }

    /// Generates fully bracketed text with plain literals, to be embedded
    /// in a definition.
    ///
    /// Pools are refreshed from `registry` first.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     config::ExpressionConfig,
    ///     expression::generator::{AtomPolicy, ExpressionGenerator},
    ///     operator::{OperatorRegistry, seed::set_initial_operators},
    /// };
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut registry = OperatorRegistry::new();
    /// set_initial_operators(&mut registry).unwrap();
    ///
    /// let mut generator = ExpressionGenerator::new(&ExpressionConfig::default(), 16);
    /// generator.set_variables(&["a".to_string()]);
    /// let text = generator.create_expression_text(&registry, &mut ChaCha8Rng::seed_from_u64(1), AtomPolicy::Variable);
    /// assert!(!text.contains(|c: char| c.is_ascii_digit()));
    /// ```
    pub fn create_expression_text<R: Rng + ?Sized>(&mut self,
                                                   registry: &OperatorRegistry,
                                                   rng: &mut R,
                                                   policy: AtomPolicy)
                                                   -> String {
        let tree = self.create_tree(registry, rng, policy);
        ExpressionEvaluator::new(registry).render(&tree, RenderMode::Plain, true)
                                          .text
    }

    /// Refreshes the pools from `registry` and generates a tree of the
    /// configured depth.
    pub fn create_tree<R: Rng + ?Sized>(&mut self,
                                        registry: &OperatorRegistry,
                                        rng: &mut R,
                                        policy: AtomPolicy)
                                        -> Node {
        self.refresh_pools(registry);
        self.generate(rng, 0, self.max_depth, policy)
    }

    /// Generates a tree, evaluates it and records it in the index under the
    /// next expression id.
    pub fn create_expression<R: Rng + ?Sized>(&mut self,
                                              evaluator: &ExpressionEvaluator<'_>,
                                              rng: &mut R,
                                              policy: AtomPolicy)
                                              -> ExpressionProperties {
        let tree = self.generate(rng, 0, self.max_depth, policy);
        let id = self.next_id;
        self.next_id += 1;

        let properties = evaluator.evaluate(id, tree).properties();
        for operator in &properties.used_operators {
            self.index.record(*operator, id);
        }
        trace!(id, expression = %properties.expression, "expression created");
        properties
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        config::TypeWeights,
        expression::node::NodeKind,
        operator::{OperatorId, seed::set_initial_operators},
    };

    fn depth(node: &Node) -> usize {
        match &node.kind {
            NodeKind::Number { .. } | NodeKind::Variable(_) => 0,
            NodeKind::Unary { operand, .. } => 1 + depth(operand),
            NodeKind::Binary { left, right, .. } => 1 + depth(left).max(depth(right)),
        }
    }

    fn seeded() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry
    }

    #[test]
    fn depth_limit_forces_atoms() {
        let registry = seeded();
        let mut generator = ExpressionGenerator::new(&ExpressionConfig::default(), 10);
        generator.refresh_pools(&registry);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        for _ in 0..100 {
            let tree = generator.generate(&mut rng, 0, 3, AtomPolicy::Number);
            assert!(depth(&tree) <= 3);
            assert!(!tree.has_variable());
        }
        let atom = generator.generate(&mut rng, 4, 4, AtomPolicy::Variable);
        assert!(matches!(atom.kind, NodeKind::Variable(_)));
    }

    #[test]
    fn empty_pools_are_redrawn() {
        let registry = seeded();
        let config = ExpressionConfig { type_weights: TypeWeights { binary:        0.0,
                                                                    unary_prefix:  0.0,
                                                                    unary_postfix: 1.0,
                                                                    atoms:         0.0, },
                                        ..ExpressionConfig::default() };
        let mut generator = ExpressionGenerator::new(&config, 10);
        generator.refresh_pools(&registry);

        // no postfix operator is registered, so only atoms remain
        let tree = generator.generate(&mut ChaCha8Rng::seed_from_u64(2), 0, 3, AtomPolicy::Number);
        assert!(matches!(tree.kind, NodeKind::Number { .. }));
    }

    #[test]
    fn numbers_carry_bases_in_range() {
        let generator = ExpressionGenerator::new(&ExpressionConfig::default(), 5);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..50 {
            let NodeKind::Number { value, base } = generator.generate(&mut rng, 0, 0, AtomPolicy::Number).kind
            else {
                panic!("expected a number");
            };
            assert!((2..=5).contains(&base));
            assert!((0..=20).contains(&value));
        }
    }

    #[test]
    fn created_expressions_are_indexed() {
        let registry = seeded();
        let evaluator = ExpressionEvaluator::new(&registry);
        let mut generator = ExpressionGenerator::new(&ExpressionConfig::default(), 10);
        generator.refresh_pools(&registry);
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        let mut used = Vec::new();
        for expected_id in 0..20 {
            let properties = generator.create_expression(&evaluator, &mut rng, AtomPolicy::Number);
            assert_eq!(properties.id, expected_id);
            used.extend(properties.used_operators.iter().map(|op| (*op, expected_id)));
        }
        for (operator, id) in used {
            assert!(generator.index().expressions(operator).contains(&id));
        }
        assert!(generator.index().expressions(OperatorId(99)).is_empty());
    }
}
