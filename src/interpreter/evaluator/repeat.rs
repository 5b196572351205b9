use crate::{
    interpreter::{
        compiler::Instr,
        evaluator::core::{EvalResult, Machine},
        value::core::Value,
    },
};

impl Machine<'_> {
    /// Evaluates `repeat` and `repeat_sum`.
    ///
    /// The accumulator slot starts at `init` and is replaced by `step` once
    /// per iteration, `|count|` times. Without a `term` the final accumulator
    /// is returned. With a `term`, the sum of `term` evaluated on each
    /// pre-step accumulator is returned instead; zero iterations sum to 0.
    ///
    /// A NaN count yields NaN. A NaN term makes the sum NaN. Each iteration
    /// consumes one unit of fuel.
    ///
    /// # Errors
    /// `FuelExhausted` when the loop outlives the budget, plus any error
    /// raised by the sub-expressions.
    pub fn eval_repeat(&mut self,
                       count: &Instr,
                       init: &Instr,
                       local: usize,
                       step: &Instr,
                       term: Option<&Instr>,
                       frame: &mut [Value])
                       -> EvalResult<Value> {
        let Some(count) = self.eval(count, frame)?.numeric()? else {
            return Ok(Value::NaN);
        };
        let mut accumulator = self.eval(init, frame)?;
        let mut sum = Value::Integer(0);

        for _ in 0..count.unsigned_abs() {
            self.consume()?;
            frame[local] = accumulator;
            if let Some(term) = term {
                let value = self.eval(term, frame)?;
                sum = Self::eval_scalar(crate::ast::BinaryOperator::Add, sum, value)?;
                if sum.is_nan() {
                    return Ok(Value::NaN);
                }
            }
            accumulator = self.eval(step, frame)?;
        }

        Ok(if term.is_some() { sum } else { accumulator })
    }
}
