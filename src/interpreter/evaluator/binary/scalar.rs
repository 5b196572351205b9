use crate::{
    ast::BinaryOperator,
    interpreter::{
        evaluator::core::{EvalResult, Machine},
        value::core::Value,
    },
    util::num::{floor_div, floor_mod},
};

impl Machine<'_> {
    /// Evaluates integer arithmetic.
    ///
    /// Overflow and a zero divisor both yield NaN, as does a NaN operand.
    /// `/` and `%` use floor semantics.
    ///
    /// # Errors
    /// `ExpectedNumber` if either operand is a boolean.
    pub fn eval_scalar(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
        let (Some(a), Some(b)) = (left.numeric()?, right.numeric()?) else {
            return Ok(Value::NaN);
        };

        let result = match op {
            BinaryOperator::Add => a.checked_add(b),
            BinaryOperator::Sub => a.checked_sub(b),
            BinaryOperator::Mul => a.checked_mul(b),
            BinaryOperator::Div => floor_div(a, b),
            BinaryOperator::Mod => floor_mod(a, b),
            _ => None,
        };

        Ok(result.into())
    }
}
