use crate::{
    ast::Builtin,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Machine},
            function::min_max::min_max,
        },
        value::core::Value,
    },
    util::num::abs_checked,
};

impl Machine<'_> {
    /// Evaluates a builtin call on already evaluated arguments.
    ///
    /// # Errors
    /// `ArgumentCountMismatch` if the argument count is wrong, and
    /// `ExpectedNumber` for boolean arguments.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     ast::Builtin,
    ///     interpreter::{evaluator::core::Machine, value::core::Value},
    /// };
    ///
    /// let r = Machine::eval_builtin(Builtin::Abs, &[Value::Integer(-4)]).unwrap();
    /// assert_eq!(r, Value::Integer(4));
    /// ```
    pub fn eval_builtin(function: Builtin, arguments: &[Value]) -> EvalResult<Value> {
        if arguments.len() != function.arity() {
            return Err(RuntimeError::ArgumentCountMismatch { expected: function.arity(),
                                                             found:    arguments.len(), });
        }

        match function {
            Builtin::Abs => abs(arguments[0]),
            Builtin::Min | Builtin::Max => min_max(function, arguments[0], arguments[1]),
        }
    }
}

/// Computes the absolute value; `i64::MIN` overflows to NaN.
fn abs(value: Value) -> EvalResult<Value> {
    Ok(value.numeric()?.map_or(Value::NaN, |n| abs_checked(n).into()))
}
