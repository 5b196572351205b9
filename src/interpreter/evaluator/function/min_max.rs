use crate::{
    ast::Builtin,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

/// Computes the minimum or maximum of two integer values.
///
/// The operation is selected by `function`, which must be `Builtin::Min` or
/// `Builtin::Max`. A NaN argument yields NaN.
///
/// # Errors
/// `ExpectedNumber` for boolean arguments.
///
/// # Example
/// ```
/// use opulse::{
///     ast::Builtin,
///     interpreter::{evaluator::function::min_max::min_max, value::core::Value},
/// };
///
/// let r = min_max(Builtin::Min, Value::Integer(3), Value::Integer(7)).unwrap();
/// assert_eq!(r, 3.into());
///
/// let r = min_max(Builtin::Max, Value::Integer(3), Value::NaN).unwrap();
/// assert_eq!(r, Value::NaN);
/// ```
pub fn min_max(function: Builtin, left: Value, right: Value) -> EvalResult<Value> {
    let (Some(a), Some(b)) = (left.numeric()?, right.numeric()?) else {
        return Ok(Value::NaN);
    };

    let value = if function == Builtin::Min {
        std::cmp::min(a, b)
    } else {
        std::cmp::max(a, b)
    };

    Ok(Value::Integer(value))
}
