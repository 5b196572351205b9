use rand::{Rng, seq::SliceRandom};

const COMPARISONS: [&str; 6] = ["==", "!=", "<", ">", "<=", ">="];

/// Produces random guard conditions for branching definitions.
///
/// A condition is one or more comparisons joined by `and`/`or`, each
/// optionally negated with `not`. The left side of a comparison is always a
/// variable; the right side is another variable or an integer literal.
/// Negative literals are bracketed so the text reads the same in every
/// context the definition parser accepts.
#[derive(Debug, Clone)]
pub struct ConditionGenerator {
    variables: Vec<String>,
    max_terms: usize,
    range:     (i64, i64),
}

impl ConditionGenerator {
    /// Creates a generator.
    ///
    /// # Parameters
    /// - `variables`: Names a comparison may mention.
    /// - `max_terms`: Upper bound on the number of comparisons, at least 1.
    /// - `range`: Inclusive bounds of the literals on the right-hand side.
    #[must_use]
    pub fn new(variables: &[&str], max_terms: usize, range: (i64, i64)) -> Self {
        let (low, high) = range;
        Self { variables: variables.iter().map(ToString::to_string).collect(),
               max_terms: max_terms.max(1),
               range:     (low.min(high), low.max(high)) }
    }

    /// Replaces the variables a comparison may mention.
    pub fn set_variables(&mut self, variables: &[&str]) {
        self.variables = variables.iter().map(ToString::to_string).collect();
    }

    /// Returns the variables a comparison may mention.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Generates one condition.
    ///
    /// # Example
    /// ```
    /// use opulse::definition::condition::ConditionGenerator;
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let generator = ConditionGenerator::new(&["a", "b"], 1, (-5, 5));
    /// let condition = generator.generate(&mut ChaCha8Rng::seed_from_u64(3));
    /// assert!(condition.starts_with('a') || condition.starts_with('b') || condition.starts_with("not"));
    /// ```
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let terms = rng.gen_range(1..=self.max_terms);
        let mut out = self.comparison(rng);
        for _ in 1..terms {
            out.push_str(if rng.gen_bool(0.5) { " and " } else { " or " });
            out.push_str(&self.comparison(rng));
        }
        out
    }

    fn comparison<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let left = self.variable(rng);
        let op = COMPARISONS.choose(rng).copied().unwrap_or("==");
        let right = if self.variables.len() > 1 && rng.gen_bool(0.5) {
            self.variable(rng)
        } else {
            literal(rng.gen_range(self.range.0..=self.range.1))
        };
        let negated = if rng.gen_ratio(1, 5) { "not " } else { "" };
        format!("{negated}{left} {op} {right}")
    }

    fn variable<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.variables.choose(rng).cloned().unwrap_or_else(|| "a".to_string())
    }
}

fn literal(value: i64) -> String {
    if value < 0 {
        format!("({value})")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        definition::parser::parse_definition,
        operator::{OperatorData, OperatorRegistry, seed::set_initial_operators},
    };

    #[test]
    fn generated_conditions_parse() {
        let mut registry = OperatorRegistry::new();
        set_initial_operators(&mut registry).unwrap();
        registry.add(OperatorData::binary("⊗")).unwrap();

        let generator = ConditionGenerator::new(&["a", "b"], 3, (-9, 9));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let condition = generator.generate(&mut rng);
            let text = format!("a⊗b = {{ a, if {condition} ; b, else }}");
            let definition = parse_definition(&text, &registry).unwrap_or_else(|e| panic!("{text}: {e}"));
            assert_eq!(definition.branches.len(), 1);
        }
    }

    #[test]
    fn single_variable_compares_against_literals() {
        let mut generator = ConditionGenerator::new(&["a", "b"], 1, (-3, -1));
        generator.set_variables(&["a"]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let condition = generator.generate(&mut rng);
            assert!(condition.ends_with(')'), "{condition}");
            assert!(!condition.contains('b'));
        }
    }
}
