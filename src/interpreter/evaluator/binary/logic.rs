use crate::{
    ast::BinaryOperator,
    interpreter::{
        evaluator::core::{EvalResult, Machine},
        value::core::Value,
    },
};

impl Machine<'_> {
    /// Evaluates `and` / `or` on two conditions.
    ///
    /// # Errors
    /// `ExpectedBoolean` if either operand is an integer.
    pub fn eval_logic(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
        let (Some(a), Some(b)) = (left.condition()?, right.condition()?) else {
            return Ok(Value::NaN);
        };

        Ok(Value::Bool(match op {
                           BinaryOperator::And => a && b,
                           _ => a || b,
                       }))
    }
}
