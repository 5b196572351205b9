use rand::{Rng, seq::SliceRandom};
use tracing::{debug, info, trace};

use crate::{
    config::Config,
    definition::condition::ConditionGenerator,
    error::SynthesisError,
    expression::{
        evaluator::{ExpressionEvaluator, RenderMode},
        generator::{AtomPolicy, ExpressionGenerator},
    },
    operator::{Arity, DefinitionKind, Fixedness, OperatorData, OperatorId, OperatorRegistry},
    synthesis::{
        recursion::{LoopShape, loop_definition, loop_procedures, recursion_bit, routings},
        symbols::SymbolGenerator,
    },
};

/// The shape of a proposed operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// `lhs = { e }`
    Plain,
    /// `lhs = { e1, if c1 ; ... ; e, else }`
    Branch,
    /// Inductive cases on one operand, stepping towards zero.
    Recursive,
    /// A bounded loop over an existing operator.
    LoopRecursive,
}

impl CandidateKind {
    pub const ALL: [Self; 4] = [Self::Plain, Self::Branch, Self::Recursive, Self::LoopRecursive];
}

/// Proposes new operators.
///
/// Proposals are [`OperatorData`] marked temporary. Text-defined candidates
/// carry only their definition; loop-recursive candidates carry ready
/// procedures as well.
#[derive(Debug, Clone)]
pub struct OperatorGenerator {
    symbols:                SymbolGenerator,
    conditions:             ConditionGenerator,
    expressions:            ExpressionGenerator,
    left:                   String,
    right:                  String,
    max_base:               u32,
    max_if_branches:        usize,
    max_recursive_attempts: usize,
}

impl OperatorGenerator {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let symbols = SymbolGenerator::new(&config.symbols.basic_operator_symbols,
                                           config.symbols.operator_symbol_min_len,
                                           config.symbols.operator_symbol_max_len);
        let left = config.symbols.left_operand.clone();
        let right = config.symbols.right_operand.clone();
        let conditions = ConditionGenerator::new(&[left.as_str(), right.as_str()],
                                                 config.synthesis.max_condition_terms,
                                                 config.expression.numeric_range.bounds());
        let mut expressions = ExpressionGenerator::new(&config.expression, config.synthesis.max_base);
        expressions.set_max_depth(config.synthesis.definition_max_depth);

        Self { symbols,
               conditions,
               expressions,
               left,
               right,
               max_base: config.synthesis.max_base,
               max_if_branches: config.synthesis.max_if_branches.max(1),
               max_recursive_attempts: config.synthesis.max_recursive_attempts.max(1) }
    }

    /// Mints one unary prefix operator for every numeral base in
    /// `2..=max_base` that has none yet.
    ///
    /// # Returns
    /// The ids of the new operators.
    ///
    /// # Errors
    /// `RetryExhausted` if no fresh symbol can be found, `Registry` if an
    /// insertion fails.
    ///
    /// # Example
    /// ```
    /// use opulse::{config::Config, operator::OperatorRegistry, synthesis::generator::OperatorGenerator};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut config = Config::default();
    /// config.synthesis.max_base = 4;
    /// let generator = OperatorGenerator::new(&config);
    ///
    /// let mut registry = OperatorRegistry::new();
    /// let mut rng = ChaCha8Rng::seed_from_u64(3);
    /// assert_eq!(generator.generate_base_operators(&mut registry, &mut rng).unwrap().len(), 3);
    /// assert!(generator.generate_base_operators(&mut registry, &mut rng).unwrap().is_empty());
    /// assert!(registry.by_base(3).unwrap().is_base());
    /// ```
    pub fn generate_base_operators<R: Rng + ?Sized>(&self,
                                                    registry: &mut OperatorRegistry,
                                                    rng: &mut R)
                                                    -> Result<Vec<OperatorId>, SynthesisError> {
        let mut created = Vec::new();
        for base in 2..=self.max_base {
            if registry.by_base(base).is_ok() {
                continue;
            }
            let symbol = self.symbols.fresh(registry, rng)?;
            let data = OperatorData { kind: DefinitionKind::Base,
                                      base: Some(base),
                                      ..OperatorData::unary(&symbol, Fixedness::Prefix) };
            created.push(registry.add(data)?.id());
        }
        info!(created = created.len(), max_base = self.max_base, "base operators generated");
        Ok(created)
    }

    /// Draws a proposal of the given kind.
    ///
    /// A loop-recursive proposal claims its callee's recursion pattern
    /// immediately; the claim stands even if the candidate is later
    /// rejected.
    ///
    /// # Errors
    /// - `RetryExhausted` if no symbol is free or a recursive case never
    ///   recurses.
    /// - `NoRecursiveCallee` if no operator can be wrapped by a loop.
    /// - `RecursionSaturated` if the drawn routing is already used on the
    ///   callee.
    pub fn propose<R: Rng + ?Sized>(&mut self,
                                    registry: &mut OperatorRegistry,
                                    rng: &mut R,
                                    kind: CandidateKind)
                                    -> Result<OperatorData, SynthesisError> {
        let symbol = self.symbols.fresh(registry, rng)?;
        let (arity, fixedness) = random_shape(rng);
        let params = match arity {
            Arity::Unary => vec![self.left.clone()],
            Arity::Binary => vec![self.left.clone(), self.right.clone()],
        };
        let names: Vec<&str> = params.iter().map(String::as_str).collect();
        self.conditions.set_variables(&names);
        self.expressions.set_variables(&params);

        let base = match fixedness {
            Some(fixedness) => OperatorData::unary(&symbol, fixedness),
            None => OperatorData::binary(&symbol),
        };
        let lhs = self.lhs(&symbol, arity, fixedness);

        let data = match kind {
            CandidateKind::Plain => {
                OperatorData { definition: Some(self.plain_definition(registry, rng, &lhs)),
                               kind: DefinitionKind::Plain,
                               ..base }
            },
            CandidateKind::Branch => {
                OperatorData { definition: Some(self.branch_definition(registry, rng, &lhs)),
                               kind: DefinitionKind::Branch,
                               ..base }
            },
            CandidateKind::Recursive => {
                let definition = self.recursive_definition(registry, rng, &lhs, &symbol, arity, fixedness)?;
                OperatorData { definition: Some(definition),
                               kind: DefinitionKind::Recursive,
                               ..base }
            },
            CandidateKind::LoopRecursive => self.loop_candidate(registry, rng, base)?,
        };
        debug!(symbol = %data.symbol, ?kind, definition = ?data.definition, "candidate proposed");
        Ok(OperatorData { temporary: true,
                          ..data })
    }

    fn lhs(&self, symbol: &str, arity: Arity, fixedness: Option<Fixedness>) -> String {
        match (arity, fixedness) {
            (Arity::Binary, _) => format!("{}{symbol}{}", self.left, self.right),
            (Arity::Unary, Some(Fixedness::Postfix)) => format!("{}{symbol}", self.left),
            (Arity::Unary, _) => format!("{symbol}{}", self.left),
        }
    }

    fn plain_definition<R: Rng + ?Sized>(&mut self, registry: &OperatorRegistry, rng: &mut R, lhs: &str) -> String {
        let body = self.expressions
                       .create_expression_text(registry, rng, AtomPolicy::VariableAndNumber);
        format!("{lhs} = {{ {body} }}")
    }

    fn branch_definition<R: Rng + ?Sized>(&mut self, registry: &OperatorRegistry, rng: &mut R, lhs: &str) -> String {
        let count = rng.gen_range(1..=self.max_if_branches);
        let mut branches = Vec::with_capacity(count + 1);
        for _ in 0..count {
            let body = self.expressions
                           .create_expression_text(registry, rng, AtomPolicy::VariableAndNumber);
            branches.push(format!("{body}, if {}", self.conditions.generate(rng)));
        }
        let otherwise = self.expressions
                            .create_expression_text(registry, rng, AtomPolicy::VariableAndNumber);
        branches.push(format!("{otherwise}, else"));
        format!("{lhs} = {{ {} }}", branches.join(" ; "))
    }

    /// `lhs = { base, if n == 0 ; step(n-1), if n > 0 ; step(n+1), else }`
    /// where `n` is the right operand of a binary operator or the only
    /// operand of a unary one, and each step mentions the operator applied
    /// one step closer to zero.
    fn recursive_definition<R: Rng + ?Sized>(&mut self,
                                             registry: &OperatorRegistry,
                                             rng: &mut R,
                                             lhs: &str,
                                             symbol: &str,
                                             arity: Arity,
                                             fixedness: Option<Fixedness>)
                                             -> Result<String, SynthesisError> {
        let counter = match arity {
            Arity::Binary => self.right.clone(),
            Arity::Unary => self.left.clone(),
        };
        let call = |step: &str| match (arity, fixedness) {
            (Arity::Binary, _) => format!("({}{symbol}({counter}{step}))", self.left),
            (Arity::Unary, Some(Fixedness::Postfix)) => format!("(({counter}{step}){symbol})"),
            (Arity::Unary, _) => format!("({symbol}({counter}{step}))"),
        };
        let (down, up) = (call("-1"), call("+1"));

        let base_case = match arity {
            Arity::Binary => {
                self.expressions.set_variables(std::slice::from_ref(&self.left));
                self.expressions
                    .create_expression_text(registry, rng, AtomPolicy::VariableAndNumber)
            },
            Arity::Unary => self.expressions.create_expression_text(registry, rng, AtomPolicy::Number),
        };

        let decreasing = self.inductive_case(registry, rng, arity, &down)?;
        let increasing = self.inductive_case(registry, rng, arity, &up)?;

        Ok(format!("{lhs} = {{ {base_case}, if {counter} == 0 ; {decreasing}, if {counter} > 0 ; {increasing}, else }}"))
    }

    /// Draws expressions over the operands and `call`, read as an atom,
    /// until one contains `call`.
    fn inductive_case<R: Rng + ?Sized>(&mut self,
                                       registry: &OperatorRegistry,
                                       rng: &mut R,
                                       arity: Arity,
                                       call: &str)
                                       -> Result<String, SynthesisError> {
        let mut variables = match arity {
            Arity::Binary => vec![self.left.clone(), self.right.clone()],
            Arity::Unary => vec![self.left.clone()],
        };
        variables.push(call.to_string());
        self.expressions.set_variables(&variables);

        let renderer = ExpressionEvaluator::new(registry);
        for attempt in 0..self.max_recursive_attempts {
            let tree = self.expressions
                           .create_tree(registry, rng, AtomPolicy::VariableAndNumber);
            if tree.mentions(call) {
                let text = renderer.render(&tree, RenderMode::Plain, true).text;
                trace!(attempt, %text, "inductive case found");
                return Ok(text);
            }
        }
        Err(SynthesisError::RetryExhausted { what:     "recursive case",
                                             attempts: self.max_recursive_attempts, })
    }

    fn loop_candidate<R: Rng + ?Sized>(&self,
                                       registry: &mut OperatorRegistry,
                                       rng: &mut R,
                                       base: OperatorData)
                                       -> Result<OperatorData, SynthesisError> {
        let callee_key = *registry.recursion_callees()
                                  .choose(rng)
                                  .ok_or(SynthesisError::NoRecursiveCallee)?;
        let callee = registry.record(callee_key)
                             .ok_or(SynthesisError::NoRecursiveCallee)?;
        let (callee_id, callee_arity) = (callee.id(), callee.arity());
        let callee_symbol = callee.symbol().to_string();
        let callee_fixedness = callee.fixedness();

        let routing = *routings(base.arity, callee_arity).choose(rng)
                                                         .ok_or(SynthesisError::NoRecursiveCallee)?;
        let bit = recursion_bit(base.arity, routing).ok_or(SynthesisError::RecursionSaturated { callee: callee_id })?;
        if !registry.claim_recursion(callee_id, bit)? {
            return Err(SynthesisError::RecursionSaturated { callee: callee_id });
        }

        let (compute, cost) = loop_procedures(base.arity, callee_key, routing);
        let definition = loop_definition(&LoopShape { symbol: &base.symbol,
                                                      arity: base.arity,
                                                      fixedness: base.fixedness,
                                                      callee_symbol: &callee_symbol,
                                                      callee_fixedness,
                                                      routing });
        debug!(callee = %callee_id, bit, ?routing, "loop recursion claimed");
        Ok(OperatorData { definition: Some(definition),
                          kind: DefinitionKind::Recursive,
                          compute: Some(compute),
                          cost: Some(cost),
                          ..base })
    }
}

/// Draws binary or unary with equal odds, and a placement for unary ones.
pub fn random_shape<R: Rng + ?Sized>(rng: &mut R) -> (Arity, Option<Fixedness>) {
    if rng.gen_bool(0.5) {
        (Arity::Binary, None)
    } else if rng.gen_bool(0.5) {
        (Arity::Unary, Some(Fixedness::Prefix))
    } else {
        (Arity::Unary, Some(Fixedness::Postfix))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        definition::parser::parse_definition, interpreter::parser::core::parse_procedure,
        operator::seed::set_initial_operators,
    };

    fn seeded() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry
    }

    fn parses(registry: &mut OperatorRegistry, data: OperatorData) {
        let definition = data.definition.clone().unwrap();
        let id = registry.add(data).unwrap().id();
        parse_definition(&definition, registry).unwrap_or_else(|e| panic!("{definition}: {e}"));
        registry.remove(id).unwrap();
    }

    #[test]
    fn text_candidates_parse() {
        let mut registry = seeded();
        let mut generator = OperatorGenerator::new(&Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for kind in [CandidateKind::Plain, CandidateKind::Branch, CandidateKind::Recursive] {
            for _ in 0..30 {
                let data = generator.propose(&mut registry, &mut rng, kind).unwrap();
                assert!(data.temporary);
                assert!(data.compute.is_none());
                parses(&mut registry, data);
            }
        }
    }

    #[test]
    fn recursive_cases_mention_the_operator() {
        let mut registry = seeded();
        let mut generator = OperatorGenerator::new(&Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        for _ in 0..20 {
            let data = generator.propose(&mut registry, &mut rng, CandidateKind::Recursive).unwrap();
            let definition = data.definition.unwrap();
            let (_, body) = definition.split_once('=').unwrap();
            assert!(body.matches(data.symbol.as_str()).count() >= 2, "{definition}");
            assert_eq!(data.kind, DefinitionKind::Recursive);
        }
    }

    #[test]
    fn loop_candidates_need_a_callee() {
        let mut registry = OperatorRegistry::new();
        let mut generator = OperatorGenerator::new(&Config::default());
        let err = generator.propose(&mut registry, &mut ChaCha8Rng::seed_from_u64(1), CandidateKind::LoopRecursive)
                           .unwrap_err();
        assert!(matches!(err, SynthesisError::NoRecursiveCallee));
        assert!(err.is_recoverable());
    }

    #[test]
    fn loop_candidates_claim_their_callee() {
        let mut registry = OperatorRegistry::new();
        let negate = parse_procedure("(a) => -a", &|_| None).unwrap();
        registry.add(OperatorData { compute: Some(negate),
                                    ..OperatorData::unary("~", Fixedness::Prefix) })
                .unwrap();
        let mut generator = OperatorGenerator::new(&Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let mut accepted = 0;
        for _ in 0..50 {
            match generator.propose(&mut registry, &mut rng, CandidateKind::LoopRecursive) {
                Ok(data) => {
                    assert!(data.compute.is_some() && data.cost.is_some());
                    accepted += 1;
                },
                Err(SynthesisError::RecursionSaturated { callee }) => assert_eq!(callee, OperatorId(1)),
                Err(SynthesisError::NoRecursiveCallee) => {},
                Err(e) => panic!("{e}"),
            }
        }
        // one pattern per caller arity
        assert_eq!(accepted, 2);
        assert!(!registry.get(OperatorId(1)).unwrap().recursion().enabled);
    }
}
