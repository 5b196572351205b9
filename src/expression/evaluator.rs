use std::{
    cell::OnceCell,
    collections::{BTreeMap, BTreeSet},
};

use serde::Serialize;
use tracing::debug;

use crate::{
    ast::Slot,
    expression::node::{Node, NodeKind, Position},
    interpreter::value::core::Value,
    operator::{
        Associativity, Fixedness, OperatorId, OperatorKey, OperatorRecord, OperatorRegistry,
    },
    util::{
        base::{DEFAULT_DIGITS, convert},
        num::{i64_to_f64, usize_to_f64},
    },
};

/// How number literals are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Bare decimal digits, negatives bracketed: text the definition parser
    /// reads back.
    Plain,
    /// Decimal digits between `$` tags.
    Tagged,
    /// The literal's base operator symbol followed by its digits in that
    /// base.
    BaseSymbol,
}

/// Structural metrics collected while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Distinct precedence levels of the applied operators.
    pub precedences:     BTreeSet<u32>,
    /// Number of operator applications.
    pub operation_count: usize,
    /// Highest order among the applied operators.
    pub highest_order:   u32,
    /// Applications per operator.
    pub used_operators:  BTreeMap<OperatorId, usize>,
    /// Applied operators in pre-order of first application.
    pub first_used:      Vec<OperatorId>,
}

/// A rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text:    String,
    pub metrics: Metrics,
}

/// The result of folding a tree: accumulated cost and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Folded {
    pub cost:  Value,
    pub value: Value,
}

impl Folded {
    /// Both components NaN.
    pub const NAN: Self = Self { cost:  Value::NaN,
                                 value: Value::NaN, };

    const fn is_nan(self) -> bool {
        self.cost.is_nan() || self.value.is_nan()
    }
}

/// One line of the expression dataset.
#[derive(Debug, Clone, Serialize)]
pub struct ExpressionProperties {
    pub id:                               u64,
    pub expression_no_base_symbol:        String,
    pub expression:                       String,
    pub highest_n_order:                  u32,
    pub priority_hierarchical_complexity: usize,
    pub normalized_expansion_degree:      serde_json::Value,
    pub operation_count:                  usize,
    pub complexity_ratio:                 f64,
    pub max_digit_count:                  usize,
    pub tree:                             serde_json::Value,
    pub used_operators:                   Vec<OperatorId>,
    pub result:                           serde_json::Value,
}

/// Renders, measures and folds expression trees against a registry.
#[derive(Debug, Clone)]
pub struct ExpressionEvaluator<'r> {
    registry:   &'r OperatorRegistry,
    digits:     String,
    nan_symbol: String,
}

impl<'r> ExpressionEvaluator<'r> {
    /// Creates an evaluator with the default digit alphabet and `NaN` as the
    /// dataset's NaN symbol.
    #[must_use]
    pub fn new(registry: &'r OperatorRegistry) -> Self {
        Self { registry,
               digits: DEFAULT_DIGITS.to_string(),
               nan_symbol: "NaN".to_string() }
    }

    /// Sets the digit alphabet used for base conversion.
    #[must_use]
    pub fn with_digits(mut self, digits: &str) -> Self {
        self.digits = digits.to_string();
        self
    }

    /// Sets the text written for NaN results.
    #[must_use]
    pub fn with_nan_symbol(mut self, nan_symbol: &str) -> Self {
        self.nan_symbol = nan_symbol.to_string();
        self
    }

    /// Renders `node` and collects its metrics in one walk.
    ///
    /// Binary applications get the minimal brackets the operators'
    /// precedence and associativity allow, or always when `all_brackets` is
    /// set. Unary applications are always bracketed.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     expression::{
    ///         evaluator::{ExpressionEvaluator, RenderMode},
    ///         node::Node,
    ///     },
    ///     operator::{OperatorId, OperatorRegistry, seed::set_initial_operators},
    /// };
    ///
    /// let mut registry = OperatorRegistry::new();
    /// set_initial_operators(&mut registry).unwrap();
    /// let plus = registry.key_of(OperatorId(1)).unwrap();
    /// let times = registry.key_of(OperatorId(4)).unwrap();
    ///
    /// let tree = Node::binary(times,
    ///                         Node::binary(plus, Node::number(2, 10), Node::number(3, 10)),
    ///                         Node::number(5, 10));
    /// let rendered = ExpressionEvaluator::new(&registry).render(&tree, RenderMode::Plain, false);
    /// assert_eq!(rendered.text, "(2+3)*5");
    /// assert_eq!(rendered.metrics.operation_count, 2);
    /// ```
    #[must_use]
    pub fn render(&self, node: &Node, mode: RenderMode, all_brackets: bool) -> Rendered {
        let mut renderer = Renderer { evaluator: self,
                                      mode,
                                      all_brackets,
                                      metrics: Metrics::default() };
        let text = renderer.render(node, None);
        Rendered { text,
                   metrics: renderer.metrics }
    }

    /// Folds `node` into its accumulated cost and value.
    ///
    /// Literals cost nothing. Variables fold to NaN. An application folds its
    /// operands first; a NaN anywhere below it, or from its own procedures,
    /// makes the whole fold NaN. A procedure that fails at runtime counts as
    /// NaN too.
    #[must_use]
    pub fn fold(&self, node: &Node) -> Folded {
        match &node.kind {
            NodeKind::Number { value, .. } => Folded { cost:  Value::Integer(0),
                                                       value: Value::Integer(*value), },
            NodeKind::Variable(_) => Folded::NAN,
            NodeKind::Unary { operator, operand } => {
                let inner = self.fold(operand);
                if inner.is_nan() {
                    return Folded::NAN;
                }
                self.apply(*operator, &[inner.value], &[inner.cost])
            },
            NodeKind::Binary { operator, left, right } => {
                let left = self.fold(left);
                if left.is_nan() {
                    return Folded::NAN;
                }
                let right = self.fold(right);
                if right.is_nan() {
                    return Folded::NAN;
                }
                self.apply(*operator, &[left.value, right.value], &[left.cost, right.cost])
            },
        }
    }

    fn apply(&self, operator: OperatorKey, arguments: &[Value], costs: &[Value]) -> Folded {
        let run = |slot| match self.registry.apply(operator, slot, arguments) {
            Ok(value) => value,
            Err(e) => {
                debug!(%operator, %slot, error = %e, "procedure failed while folding");
                Value::NaN
            },
        };

        let value = run(Slot::Compute);
        let own = run(Slot::Cost);
        let cost = Value::from(costs.iter().fold(own.as_integer(), |acc, c| {
                                                 acc.zip(c.as_integer()).and_then(|(a, c)| a.checked_add(c))
                                             }));

        let folded = Folded { cost, value };
        if folded.is_nan() { Folded::NAN } else { folded }
    }

    /// Renders and measures a tree for the dataset.
    #[must_use]
    pub fn evaluate(&self, id: u64, tree: Node) -> Evaluation<'_> {
        let rendered = self.render(&tree, RenderMode::BaseSymbol, false);
        let plain = self.render(&tree, RenderMode::Tagged, false);
        Evaluation { evaluator: self,
                     id,
                     tree,
                     text: rendered.text,
                     tagged_text: plain.text,
                     metrics: rendered.metrics,
                     folded: OnceCell::new() }
    }
}

struct Renderer<'e, 'r> {
    evaluator:    &'e ExpressionEvaluator<'r>,
    mode:         RenderMode,
    all_brackets: bool,
    metrics:      Metrics,
}

impl Renderer<'_, '_> {
    fn render(&mut self, node: &Node, parent: Option<&OperatorRecord>) -> String {
        match &node.kind {
            NodeKind::Number { value, base } => self.literal(*value, *base),
            NodeKind::Variable(name) => name.clone(),
            NodeKind::Unary { operator, operand } => {
                let record = self.evaluator.registry.record(*operator);
                self.count(*operator, record);
                let inner = self.render(operand, record);
                let symbol = record.map_or_else(|| operator.to_string(), |r| r.symbol().to_string());
                if record.and_then(OperatorRecord::fixedness) == Some(Fixedness::Postfix) {
                    format!("({inner}{symbol})")
                } else {
                    format!("({symbol}{inner})")
                }
            },
            NodeKind::Binary { operator, left, right } => {
                let record = self.evaluator.registry.record(*operator);
                self.count(*operator, record);
                let left = self.render(left, record);
                let right = self.render(right, record);
                let symbol = record.map_or_else(|| operator.to_string(), |r| r.symbol().to_string());
                if self.all_brackets || needs_brackets(record, parent, node.position) {
                    format!("({left}{symbol}{right})")
                } else {
                    format!("{left}{symbol}{right}")
                }
            },
        }
    }

    fn count(&mut self, operator: OperatorKey, record: Option<&OperatorRecord>) {
        self.metrics.operation_count += 1;
        let Some(record) = record else {
            debug!(%operator, "rendering an operator missing from the registry");
            return;
        };
        if let Some(level) = record.precedence() {
            self.metrics.precedences.insert(level);
        }
        self.metrics.highest_order = self.metrics.highest_order.max(record.order().unwrap_or(0));
        let uses = self.metrics.used_operators.entry(record.id()).or_insert(0);
        if *uses == 0 {
            self.metrics.first_used.push(record.id());
        }
        *uses += 1;
    }

    fn literal(&self, value: i64, base: u32) -> String {
        match self.mode {
            RenderMode::Plain if value < 0 => format!("({value})"),
            RenderMode::Plain => value.to_string(),
            RenderMode::Tagged => format!("${value}$"),
            RenderMode::BaseSymbol => {
                let symbol = self.evaluator.registry.by_base(base).map(|r| r.symbol().to_string());
                match (symbol, convert(value, base, &self.evaluator.digits)) {
                    (Ok(symbol), Some(digits)) => format!("{symbol}{digits}"),
                    _ => {
                        debug!(value, base, "no base operator for literal, writing it tagged");
                        format!("${value}$")
                    },
                }
            },
        }
    }
}

/// Decides whether a binary application below `parent` needs brackets.
///
/// The root never does. A lower level than the parent always does, a higher
/// one never. On equal levels the child is bracketed when it sits on the side
/// opposite to the parent's associativity. An unknown level or associativity
/// brackets.
fn needs_brackets(own: Option<&OperatorRecord>,
                  parent: Option<&OperatorRecord>,
                  position: Position)
                  -> bool {
    let Some(parent) = parent else {
        return false;
    };
    let (Some(own), Some(outer)) = (own.and_then(OperatorRecord::precedence), parent.precedence())
    else {
        return true;
    };
    match own.cmp(&outer) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => match parent.associativity() {
            Some(Associativity::Left) => position == Position::Right,
            Some(Associativity::Right) => position == Position::Left,
            None => true,
        },
    }
}

/// A rendered tree with its metrics and lazily folded result.
#[derive(Debug)]
pub struct Evaluation<'e> {
    evaluator:   &'e ExpressionEvaluator<'e>,
    id:          u64,
    tree:        Node,
    text:        String,
    tagged_text: String,
    metrics:     Metrics,
    folded:      OnceCell<Folded>,
}

impl Evaluation<'_> {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn tree(&self) -> &Node {
        &self.tree
    }

    /// The text with base-symbol literals.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text with tagged decimal literals.
    #[must_use]
    pub fn tagged_text(&self) -> &str {
        &self.tagged_text
    }

    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The cost and value of the tree, folded on first use.
    pub fn folded(&self) -> Folded {
        *self.folded.get_or_init(|| self.evaluator.fold(&self.tree))
    }

    #[must_use]
    pub const fn highest_order(&self) -> u32 {
        self.metrics.highest_order
    }

    /// Number of distinct precedence levels in the tree.
    #[must_use]
    pub fn priority_hierarchical_complexity(&self) -> usize {
        self.metrics.precedences.len()
    }

    /// The accumulated cost.
    pub fn normalized_expansion_degree(&self) -> Value {
        self.folded().cost
    }

    pub fn result(&self) -> Value {
        self.folded().value
    }

    #[must_use]
    pub const fn operation_count(&self) -> usize {
        self.metrics.operation_count
    }

    /// Cost per application; 0 without applications or with a NaN cost.
    pub fn complexity_ratio(&self) -> f64 {
        match (self.normalized_expansion_degree().as_integer(), self.operation_count()) {
            (Some(cost), count) if count > 0 => i64_to_f64(cost) / usize_to_f64(count),
            _ => 0.0,
        }
    }

    /// Length of the longest numeral in the base-symbol text.
    ///
    /// A numeral is a maximal run of characters from the digit alphabet.
    #[must_use]
    pub fn max_digit_count(&self) -> usize {
        let digits = &self.evaluator.digits;
        self.text
            .split(|c: char| !digits.contains(c))
            .map(|run| run.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Builds the dataset record.
    pub fn properties(&self) -> ExpressionProperties {
        let nan = &self.evaluator.nan_symbol;
        ExpressionProperties { id: self.id,
                               expression_no_base_symbol: self.tagged_text.clone(),
                               expression: self.text.clone(),
                               highest_n_order: self.highest_order(),
                               priority_hierarchical_complexity: self.priority_hierarchical_complexity(),
                               normalized_expansion_degree: self.normalized_expansion_degree().to_json(nan),
                               operation_count: self.operation_count(),
                               complexity_ratio: self.complexity_ratio(),
                               max_digit_count: self.max_digit_count(),
                               tree: self.tree.to_json(self.evaluator.registry),
                               used_operators: self.metrics.first_used.clone(),
                               result: self.result().to_json(nan) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        definition::{parser::parse_definition, transformer::transform},
        operator::{DefinitionKind, OperatorData, seed::set_initial_operators},
    };

    fn registry() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry
    }

    fn key(registry: &OperatorRegistry, id: u32) -> OperatorKey {
        registry.key_of(OperatorId(id)).unwrap()
    }

    #[test]
    fn brackets_follow_precedence_and_associativity() {
        let registry = registry();
        let evaluator = ExpressionEvaluator::new(&registry);
        let (plus, minus, times) = (key(&registry, 1), key(&registry, 2), key(&registry, 4));
        let n = |v| Node::number(v, 10);

        let right_nested = Node::binary(minus, n(1), Node::binary(minus, n(2), n(3)));
        assert_eq!(evaluator.render(&right_nested, RenderMode::Plain, false).text, "1-(2-3)");

        let left_nested = Node::binary(minus, Node::binary(plus, n(1), n(2)), n(3));
        assert_eq!(evaluator.render(&left_nested, RenderMode::Plain, false).text, "1+2-3");

        let tighter = Node::binary(plus, n(1), Node::binary(times, n(2), n(-3)));
        assert_eq!(evaluator.render(&tighter, RenderMode::Plain, false).text, "1+2*(-3)");
        assert_eq!(evaluator.render(&tighter, RenderMode::Tagged, true).text, "($1$+($2$*$-3$))");
    }

    #[test]
    fn unary_applications_are_always_bracketed() {
        let mut registry = registry();
        registry.add(OperatorData::unary("⊣", Fixedness::Postfix)).unwrap();
        let evaluator = ExpressionEvaluator::new(&registry);
        let neg = key(&registry, 3);
        let post = key(&registry, 7);

        let tree = Node::unary(post, Node::unary(neg, Node::variable("a")));
        assert_eq!(evaluator.render(&tree, RenderMode::Plain, false).text, "((-a)⊣)");
    }

    #[test]
    fn metrics_count_levels_applications_and_operators() {
        let registry = registry();
        let evaluator = ExpressionEvaluator::new(&registry);
        let (plus, times) = (key(&registry, 1), key(&registry, 4));
        let tree = Node::binary(times,
                                Node::binary(plus, Node::number(2, 10), Node::number(3, 10)),
                                Node::binary(plus, Node::number(1, 10), Node::number(1, 10)));

        let evaluation = evaluator.evaluate(0, tree);
        assert_eq!(evaluation.operation_count(), 3);
        assert_eq!(evaluation.priority_hierarchical_complexity(), 2);
        assert_eq!(evaluation.highest_order(), 1);
        assert_eq!(evaluation.metrics().used_operators.get(&OperatorId(1)), Some(&2));
        assert_eq!(evaluation.properties().used_operators, vec![OperatorId(4), OperatorId(1)]);
        assert_eq!(evaluation.result(), Value::Integer(10));
        // 1 + 1 for the additions, min(5, 2) for the product
        assert_eq!(evaluation.normalized_expansion_degree(), Value::Integer(4));
    }

    #[test]
    fn division_by_zero_folds_to_nan() {
        let registry = registry();
        let evaluator = ExpressionEvaluator::new(&registry);
        let tree = Node::binary(key(&registry, 5), Node::number(7, 10), Node::number(0, 10));
        assert_eq!(evaluator.fold(&tree), Folded::NAN);

        let evaluation = evaluator.evaluate(3, tree);
        assert!(evaluation.complexity_ratio().abs() < f64::EPSILON);
        assert_eq!(evaluation.properties().result, serde_json::json!("NaN"));
    }

    #[test]
    fn variables_poison_the_whole_fold() {
        let registry = registry();
        let evaluator = ExpressionEvaluator::new(&registry);
        let plus = key(&registry, 1);
        let tree = Node::binary(plus,
                                Node::number(1, 10),
                                Node::unary(key(&registry, 3), Node::variable("a")));
        assert_eq!(evaluator.fold(&tree), Folded::NAN);
    }

    #[test]
    fn base_symbols_prefix_converted_digits() {
        let mut registry = registry();
        let mut data = OperatorData::unary("♭", Fixedness::Prefix);
        data.base = Some(2);
        data.kind = DefinitionKind::Base;
        registry.add(data).unwrap();
        let evaluator = ExpressionEvaluator::new(&registry);

        let evaluation = evaluator.evaluate(0, Node::binary(key(&registry, 1), Node::number(5, 2), Node::number(12, 2)));
        assert_eq!(evaluation.text(), "♭101+♭1100");
        assert_eq!(evaluation.tagged_text(), "$5$+$12$");
        assert_eq!(evaluation.max_digit_count(), 4);
    }

    #[test]
    fn fully_bracketed_text_parses_back_to_the_same_value() {
        let mut registry = registry();
        registry.add(OperatorData::binary("⊕")).unwrap();
        let (minus, times) = (key(&registry, 2), key(&registry, 4));
        let n = |v| Node::number(v, 10);
        let tree = Node::binary(minus,
                                Node::binary(minus, n(9), n(-4)),
                                Node::binary(times, n(2), Node::unary(key(&registry, 3), n(3))));

        let expected = ExpressionEvaluator::new(&registry).fold(&tree).value;
        let text = ExpressionEvaluator::new(&registry).render(&tree, RenderMode::Plain, true).text;

        let definition = parse_definition(&format!("a⊕b = {{ {text} }}"), &registry).unwrap();
        let (compute, _) = transform(&definition);
        let id = OperatorId(7);
        registry.set_procedures(id, Some(compute), None).unwrap();
        let value = registry.apply(key(&registry, 7), Slot::Compute, &[Value::Integer(0), Value::Integer(0)])
                            .unwrap();
        assert_eq!(value, expected);
    }
}
