use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::LoadError, interpreter::evaluator::core::EvaluationLimits, util::base::DEFAULT_DIGITS};

/// Settings for every batch command, read from YAML.
///
/// Every section and field has a default, so an empty file is a valid
/// configuration.
///
/// # Example
/// ```
/// use opulse::config::Config;
///
/// let config: Config = serde_yaml::from_str("synthesis:\n  max_base: 8\n").unwrap();
/// assert_eq!(config.synthesis.max_base, 8);
/// assert_eq!(config.expression.max_depth, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging:    LoggingConfig,
    pub symbols:    SymbolConfig,
    pub expression: ExpressionConfig,
    pub synthesis:  SynthesisConfig,
    pub evaluation: EvaluationLimits,
}

impl Config {
    /// Reads a configuration file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Yaml` if it does not match the
    /// schema.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(),
                                                                                     source })?;
        serde_yaml::from_str(&source).map_err(|source| LoadError::Yaml { path: path.to_path_buf(),
                                                                         source })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Symbols and atoms used in generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    /// Characters operator symbols are drawn from, besides the built-in
    /// arrow and mathematical operator blocks.
    pub basic_operator_symbols:  Vec<String>,
    pub operator_symbol_min_len: usize,
    pub operator_symbol_max_len: usize,
    /// Digit alphabet for numeral bases.
    pub custom_digits:           String,
    /// Text written for NaN results in the expression dataset.
    pub nan_symbol:              String,
    pub left_operand:            String,
    pub right_operand:           String,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self { basic_operator_symbols:  ["+", "-", "*", "/", "%", "^", "&", "|", "~", "@", "#", "?"].map(String::from)
                                                                                                     .to_vec(),
               operator_symbol_min_len: 1,
               operator_symbol_max_len: 3,
               custom_digits:           DEFAULT_DIGITS.to_string(),
               nan_symbol:              "NaN".to_string(),
               left_operand:            "a".to_string(),
               right_operand:           "b".to_string(), }
    }
}

/// Shape of random expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Variables used by dataset expressions with variable atoms.
    pub variables:         Vec<String>,
    pub numeric_range:     NumericRange,
    pub max_depth:         usize,
    pub type_weights:      TypeWeights,
    pub atom_type_weights: AtomTypeWeights,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self { variables:         vec!["x".to_string(), "y".to_string()],
               numeric_range:     NumericRange::default(),
               max_depth:         3,
               type_weights:      TypeWeights::default(),
               atom_type_weights: AtomTypeWeights::default(), }
    }
}

/// Inclusive bounds of random literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericRange {
    pub min_value: i64,
    pub max_value: i64,
}

impl Default for NumericRange {
    fn default() -> Self {
        Self { min_value: 0,
               max_value: 20 }
    }
}

impl NumericRange {
    /// The bounds as an ordered pair.
    #[must_use]
    pub const fn bounds(self) -> (i64, i64) {
        if self.min_value <= self.max_value {
            (self.min_value, self.max_value)
        } else {
            (self.max_value, self.min_value)
        }
    }
}

/// Weights of the node categories drawn below the depth limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeWeights {
    pub binary:        f64,
    pub unary_prefix:  f64,
    pub unary_postfix: f64,
    pub atoms:         f64,
}

impl Default for TypeWeights {
    fn default() -> Self {
        Self { binary:        0.5,
               unary_prefix:  0.15,
               unary_postfix: 0.15,
               atoms:         0.2, }
    }
}

/// Weights of variables against numbers for mixed atoms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomTypeWeights {
    pub variable: f64,
    pub number:   f64,
}

impl Default for AtomTypeWeights {
    fn default() -> Self {
        Self { variable: 0.6,
               number:   0.4, }
    }
}

/// Operator synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Highest numeral base that gets a base operator.
    pub max_base:               u32,
    pub max_if_branches:        usize,
    /// Comparisons per generated condition, at most.
    pub max_condition_terms:    usize,
    /// Cap on regenerating an inductive case until it recurses.
    pub max_recursive_attempts: usize,
    /// A batch of `n` operators gives up after `n * max_attempts_factor`
    /// candidates.
    pub max_attempts_factor:    usize,
    /// Random argument tuples run against every candidate.
    pub validation_samples:     usize,
    pub validation_range:       NumericRange,
    /// Highest precedence level a binary operator can get.
    pub max_priority:           u32,
    /// Expression depth inside definitions.
    pub definition_max_depth:   usize,
    pub definition_mix:         DefinitionMix,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { max_base:               16,
               max_if_branches:        3,
               max_condition_terms:    2,
               max_recursive_attempts: 100,
               max_attempts_factor:    20,
               validation_samples:     10,
               validation_range:       NumericRange { min_value: -20,
                                                      max_value: 20, },
               max_priority:           5,
               definition_max_depth:   2,
               definition_mix:         DefinitionMix::default(), }
    }
}

/// Weights of the candidate shapes in a mixed batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionMix {
    pub plain:          f64,
    pub branch:         f64,
    pub recursive:      f64,
    pub loop_recursive: f64,
}

impl Default for DefinitionMix {
    fn default() -> Self {
        Self { plain:          0.4,
               branch:         0.3,
               recursive:      0.15,
               loop_recursive: 0.15, }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{}}").unwrap();
        assert_eq!(Config::load(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn sections_merge_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "expression:\n  numeric_range:\n    max_value: 99\nevaluation:\n  fuel: 10").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.expression.numeric_range, NumericRange { min_value: 0,
                                                                   max_value: 99 });
        assert_eq!(config.evaluation.fuel, 10);
        assert_eq!(config.symbols.left_operand, "a");
    }

    #[test]
    fn invalid_yaml_is_reported_with_its_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "synthesis: [1, 2").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Yaml { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
