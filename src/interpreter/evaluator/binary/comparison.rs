use crate::{
    ast::BinaryOperator,
    interpreter::{
        evaluator::core::{EvalResult, Machine},
        value::core::Value,
    },
};

impl Machine<'_> {
    /// Evaluates a comparison between two integers.
    ///
    /// A NaN operand makes the comparison NaN, which in turn makes any
    /// enclosing `when` yield NaN.
    ///
    /// # Errors
    /// `ExpectedNumber` if either operand is a boolean.
    pub fn eval_comparison(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
        let (Some(a), Some(b)) = (left.numeric()?, right.numeric()?) else {
            return Ok(Value::NaN);
        };

        let result = match op {
            BinaryOperator::Equal => a == b,
            BinaryOperator::NotEqual => a != b,
            BinaryOperator::Less => a < b,
            BinaryOperator::Greater => a > b,
            BinaryOperator::LessEqual => a <= b,
            BinaryOperator::GreaterEqual => a >= b,
            _ => return Ok(Value::NaN),
        };

        Ok(Value::Bool(result))
    }
}
