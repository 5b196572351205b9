use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Represents a runtime value in the interpreter.
///
/// Operator procedures produce integers or the NaN sentinel; booleans only
/// appear while evaluating conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// A 64-bit integer value.
    Integer(i64),
    /// A boolean value produced by comparisons and logical operators.
    Bool(bool),
    /// The undefined-result sentinel. Any arithmetic, comparison or call
    /// involving NaN yields NaN.
    NaN,
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Option<i64>> for Value {
    /// `None` becomes NaN; used to turn checked arithmetic into values.
    fn from(v: Option<i64>) -> Self {
        v.map_or(Self::NaN, Self::Integer)
    }
}

impl Value {
    /// Returns `true` for the NaN sentinel.
    #[must_use]
    pub const fn is_nan(&self) -> bool {
        matches!(self, Self::NaN)
    }

    /// Returns the integer, or `None` for NaN and booleans.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts a numeric operand.
    ///
    /// # Returns
    /// - `Ok(Some(n))` for integers.
    /// - `Ok(None)` for NaN.
    /// - `Err(ExpectedNumber)` for booleans.
    ///
    /// # Example
    /// ```
    /// use opulse::interpreter::value::core::Value;
    ///
    /// assert_eq!(Value::Integer(4).numeric().unwrap(), Some(4));
    /// assert_eq!(Value::NaN.numeric().unwrap(), None);
    /// assert!(Value::Bool(true).numeric().is_err());
    /// ```
    pub const fn numeric(&self) -> EvalResult<Option<i64>> {
        match self {
            Self::Integer(n) => Ok(Some(*n)),
            Self::NaN => Ok(None),
            Self::Bool(_) => Err(RuntimeError::ExpectedNumber),
        }
    }

    /// Extracts a condition.
    ///
    /// # Returns
    /// - `Ok(Some(b))` for booleans.
    /// - `Ok(None)` for NaN.
    /// - `Err(ExpectedBoolean)` for integers.
    pub const fn condition(&self) -> EvalResult<Option<bool>> {
        match self {
            Self::Bool(b) => Ok(Some(*b)),
            Self::NaN => Ok(None),
            Self::Integer(_) => Err(RuntimeError::ExpectedBoolean),
        }
    }

    /// Renders the value as JSON, writing NaN as `nan_symbol`.
    #[must_use]
    pub fn to_json(&self, nan_symbol: &str) -> serde_json::Value {
        match self {
            Self::Integer(n) => serde_json::Value::from(*n),
            Self::Bool(b) => serde_json::Value::from(*b),
            Self::NaN => serde_json::Value::from(nan_symbol),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::NaN => write!(f, "NaN"),
        }
    }
}
