use std::ops::RangeInclusive;

use rand::{Rng, seq::SliceRandom};
use tracing::{trace, warn};

use crate::{definition::lexer::is_symbol_char, error::SynthesisError, operator::OperatorRegistry};

/// Arrows, mathematical operators and supplemental mathematical operators.
const UNICODE_BLOCKS: [RangeInclusive<u32>; 3] = [0x2200..=0x22FF, 0x2A00..=0x2AFF, 0x2190..=0x21FF];

/// Redraws before giving up on finding an unused symbol.
const MAX_SYMBOL_ATTEMPTS: usize = 1_000;

/// Draws operator symbols no registered operator uses yet.
///
/// A symbol is a concatenation of pieces: the configured basic symbols plus
/// every character of the Unicode operator blocks. Pieces the definition
/// lexer would not read as symbol characters are dropped.
#[derive(Debug, Clone)]
pub struct SymbolGenerator {
    pieces:  Vec<String>,
    lengths: RangeInclusive<usize>,
}

impl SymbolGenerator {
    #[must_use]
    pub fn new(basic: &[String], min_len: usize, max_len: usize) -> Self {
        let mut pieces = Vec::new();
        for piece in basic {
            if !piece.is_empty() && piece.chars().all(is_symbol_char) {
                pieces.push(piece.clone());
            } else {
                warn!(%piece, "ignoring basic symbol that cannot appear in a definition");
            }
        }
        pieces.extend(UNICODE_BLOCKS.iter()
                                    .flat_map(Clone::clone)
                                    .filter_map(char::from_u32)
                                    .filter(|c| is_symbol_char(*c))
                                    .map(String::from));

        let min_len = min_len.max(1);
        Self { pieces,
               lengths: min_len..=max_len.max(min_len) }
    }

    /// Draws a symbol unused in `registry`.
    ///
    /// # Errors
    /// `RetryExhausted` if every draw collides.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     operator::{OperatorData, OperatorRegistry},
    ///     synthesis::symbols::SymbolGenerator,
    /// };
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut registry = OperatorRegistry::new();
    /// registry.add(OperatorData::binary("+")).unwrap();
    ///
    /// let symbols = SymbolGenerator::new(&["+".to_string()], 1, 2);
    /// let symbol = symbols.fresh(&registry, &mut ChaCha8Rng::seed_from_u64(0)).unwrap();
    /// assert_ne!(symbol, "+");
    /// ```
    pub fn fresh<R: Rng + ?Sized>(&self, registry: &OperatorRegistry, rng: &mut R) -> Result<String, SynthesisError> {
        for _ in 0..MAX_SYMBOL_ATTEMPTS {
            let length = rng.gen_range(self.lengths.clone());
            let symbol: String = (0..length).filter_map(|_| self.pieces.choose(rng))
                                            .map(String::as_str)
                                            .collect();
            if !symbol.is_empty() && !registry.has_symbol(&symbol) {
                trace!(%symbol, "fresh symbol");
                return Ok(symbol);
            }
        }
        Err(SynthesisError::RetryExhausted { what:     "operator symbol",
                                             attempts: MAX_SYMBOL_ATTEMPTS, })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::operator::OperatorData;

    #[test]
    fn symbols_avoid_registered_ones_and_respect_lengths() {
        let mut registry = OperatorRegistry::new();
        let symbols = SymbolGenerator::new(&[], 2, 3);
        let mut rng = ChaCha8Rng::seed_from_u64(17);

        for _ in 0..200 {
            let symbol = symbols.fresh(&registry, &mut rng).unwrap();
            assert!((2..=3).contains(&symbol.chars().count()), "{symbol}");
            assert!(symbol.chars().all(is_symbol_char));
            registry.add(OperatorData::binary(&symbol)).unwrap();
        }
        assert_eq!(registry.symbols().count(), 200);
    }

    #[test]
    fn lexer_hostile_pieces_are_dropped() {
        let symbols = SymbolGenerator::new(&["<".to_string(), "a".to_string(), "~".to_string()], 1, 1);
        assert!(symbols.pieces.contains(&"~".to_string()));
        assert!(!symbols.pieces.iter().any(|p| p == "<" || p == "a"));
    }
}
