use crate::{
    ast::UnaryOperator,
    interpreter::{
        evaluator::core::{EvalResult, Machine},
        value::core::Value,
    },
};

impl Machine<'_> {
    /// Evaluates a unary operation on an already evaluated operand.
    ///
    /// Negation works on integers and overflows to NaN; `not` works on
    /// booleans. A NaN operand yields NaN for both.
    ///
    /// # Errors
    /// `ExpectedNumber` or `ExpectedBoolean` on an operand of the wrong kind.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     ast::UnaryOperator,
    ///     interpreter::{evaluator::core::Machine, value::core::Value},
    /// };
    ///
    /// let negated = Machine::eval_unary(UnaryOperator::Negate, Value::Integer(5)).unwrap();
    /// assert_eq!(negated, Value::Integer(-5));
    ///
    /// let overflow = Machine::eval_unary(UnaryOperator::Negate, Value::Integer(i64::MIN)).unwrap();
    /// assert_eq!(overflow, Value::NaN);
    /// ```
    pub fn eval_unary(op: UnaryOperator, value: Value) -> EvalResult<Value> {
        match op {
            UnaryOperator::Negate => {
                Ok(value.numeric()?.map_or(Value::NaN, |n| n.checked_neg().into()))
            },
            UnaryOperator::Not => Ok(value.condition()?.map_or(Value::NaN, |b| (!b).into())),
        }
    }
}
