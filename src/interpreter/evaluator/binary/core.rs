use crate::{
    ast::BinaryOperator,
    interpreter::{
        evaluator::core::{EvalResult, Machine},
        value::core::Value,
    },
};

impl Machine<'_> {
    /// Evaluates a binary operation between two values.
    ///
    /// Arithmetic operators go to `eval_scalar`, comparisons to
    /// `eval_comparison` and connectives to `eval_logic`.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     ast::BinaryOperator,
    ///     interpreter::{evaluator::core::Machine, value::core::Value},
    /// };
    ///
    /// let sum = Machine::eval_binary(BinaryOperator::Add, 3.into(), 4.into()).unwrap();
    /// assert_eq!(sum, Value::Integer(7));
    ///
    /// let undefined = Machine::eval_binary(BinaryOperator::Div, 3.into(), 0.into()).unwrap();
    /// assert_eq!(undefined, Value::NaN);
    /// ```
    pub fn eval_binary(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
        use BinaryOperator::{
            Add, And, Div, Equal, Greater, GreaterEqual, Less, LessEqual, Mod, Mul, NotEqual, Or,
            Sub,
        };

        match op {
            Add | Sub | Mul | Div | Mod => Self::eval_scalar(op, left, right),
            Equal | NotEqual | Less | Greater | LessEqual | GreaterEqual => {
                Self::eval_comparison(op, left, right)
            },
            And | Or => Self::eval_logic(op, left, right),
        }
    }
}
