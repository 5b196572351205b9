use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    ast::Slot,
    error::RuntimeError,
    interpreter::{
        compiler::{CompiledProcedure, Instr},
        value::core::Value,
    },
    operator::{OperatorKey, OperatorRegistry},
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// Default number of steps one top-level evaluation may take.
pub const DEFAULT_FUEL: u64 = 1_000_000;
/// Default maximum nesting of operator calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Bounds on a single top-level evaluation.
///
/// Every operator call and every loop iteration consumes one unit of fuel.
/// Self-referential definitions recurse through the call stack, so the call
/// depth is bounded separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationLimits {
    /// Steps available to one evaluation.
    pub fuel:           u64,
    /// Maximum nesting of operator calls.
    pub max_call_depth: usize,
}

impl Default for EvaluationLimits {
    fn default() -> Self {
        Self { fuel:           DEFAULT_FUEL,
               max_call_depth: DEFAULT_MAX_CALL_DEPTH, }
    }
}

/// Executes compiled procedures.
///
/// A machine borrows the registry to resolve callees and carries the budget
/// of one top-level evaluation. Create a fresh machine per evaluation.
pub struct Machine<'r> {
    registry: &'r OperatorRegistry,
    limits:   EvaluationLimits,
    fuel:     u64,
    depth:    usize,
}

impl<'r> Machine<'r> {
    /// Creates a machine with the registry's evaluation limits.
    #[must_use]
    pub const fn new(registry: &'r OperatorRegistry) -> Self {
        let limits = registry.limits();
        Self { registry,
               limits,
               fuel: limits.fuel,
               depth: 0 }
    }

    /// Calls an operator's procedure.
    ///
    /// Any NaN argument short-circuits to NaN without running the body.
    ///
    /// # Errors
    /// - `ExpectedNumber` if an argument is a boolean.
    /// - `UnresolvedOperator` if the callee has no procedure in `slot` or it
    ///   does not compile.
    /// - Any error raised by the procedure itself.
    pub fn call(&mut self,
                operator: OperatorKey,
                slot: Slot,
                arguments: &[Value])
                -> EvalResult<Value> {
        if arguments.iter().any(|a| matches!(a, Value::Bool(_))) {
            return Err(RuntimeError::ExpectedNumber);
        }
        if arguments.iter().any(Value::is_nan) {
            return Ok(Value::NaN);
        }
        let procedure = self.registry.compiled(operator, slot)?;
        self.run(&procedure, arguments)
    }

    /// Runs a compiled procedure on arguments.
    ///
    /// # Returns
    /// An integer or NaN.
    ///
    /// # Errors
    /// - `ArgumentCountMismatch` if `arguments` does not match the arity.
    /// - `CallDepthExceeded` or `FuelExhausted` when the budget runs out.
    /// - `UnexpectedShape` if the body evaluates to a boolean.
    pub fn run(&mut self, procedure: &CompiledProcedure, arguments: &[Value]) -> EvalResult<Value> {
        if arguments.len() != procedure.arity {
            return Err(RuntimeError::ArgumentCountMismatch { expected: procedure.arity,
                                                             found:    arguments.len(), });
        }
        if self.depth >= self.limits.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded { limit: self.limits.max_call_depth });
        }
        self.consume()?;

        let mut frame = vec![Value::NaN; procedure.frame_size];
        frame[..arguments.len()].copy_from_slice(arguments);

        self.depth += 1;
        let result = self.eval(&procedure.body, &mut frame);
        self.depth -= 1;

        match result? {
            value @ (Value::Integer(_) | Value::NaN) => Ok(value),
            other => Err(RuntimeError::UnexpectedShape { details: format!("{other}") }),
        }
    }

    /// Evaluates an instruction in a frame and returns the resulting value.
    ///
    /// This is the instruction dispatch. Frame slots hold the arguments
    /// followed by loop accumulators.
    pub fn eval(&mut self, instr: &Instr, frame: &mut [Value]) -> EvalResult<Value> {
        match instr {
            Instr::Const(value) => Ok(*value),
            Instr::Local(slot) => Ok(frame[*slot]),
            Instr::Unary { op, expr } => {
                let value = self.eval(expr, frame)?;
                Self::eval_unary(*op, value)
            },
            Instr::Binary { op, left, right } => {
                let left = self.eval(left, frame)?;
                let right = self.eval(right, frame)?;
                Self::eval_binary(*op, left, right)
            },
            Instr::Builtin { function,
                             arguments, } => {
                let arguments = self.eval_arguments(arguments, frame)?;
                Self::eval_builtin(*function, &arguments)
            },
            Instr::Call { operator,
                          slot,
                          arguments, } => {
                let arguments = self.eval_arguments(arguments, frame)?;
                trace!(?operator, %slot, ?arguments, "operator call");
                self.call(*operator, *slot, &arguments)
            },
            Instr::When { arms, otherwise } => {
                for (condition, value) in arms {
                    match self.eval(condition, frame)?.condition()? {
                        None => return Ok(Value::NaN),
                        Some(true) => return self.eval(value, frame),
                        Some(false) => {},
                    }
                }
                self.eval(otherwise, frame)
            },
            Instr::Repeat { count,
                            init,
                            local,
                            step,
                            term, } => {
                self.eval_repeat(count, init, *local, step, term.as_deref(), frame)
            },
        }
    }

    /// Takes one unit of fuel.
    ///
    /// # Errors
    /// `FuelExhausted` when none is left.
    pub(in crate::interpreter::evaluator) fn consume(&mut self) -> EvalResult<()> {
        if self.fuel == 0 {
            return Err(RuntimeError::FuelExhausted { budget: self.limits.fuel });
        }
        self.fuel -= 1;
        Ok(())
    }

    fn eval_arguments(&mut self, arguments: &[Instr], frame: &mut [Value]) -> EvalResult<Vec<Value>> {
        arguments.iter().map(|a| self.eval(a, frame)).collect()
    }
}
