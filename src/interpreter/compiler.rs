use crate::{
    ast::{BinaryOperator, Builtin, Expr, Procedure, Slot, UnaryOperator},
    error::CompileError,
    interpreter::value::core::Value,
    operator::OperatorKey,
};

/// A lowered instruction.
///
/// Instructions mirror [`Expr`] with every name resolved: variables become
/// frame slots, calls are checked against their callee's arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// A constant.
    Const(Value),
    /// Reads a frame slot.
    Local(usize),
    /// A unary operation.
    Unary {
        /// The operator.
        op:   UnaryOperator,
        /// The operand.
        expr: Box<Self>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op:    BinaryOperator,
        /// The left operand.
        left:  Box<Self>,
        /// The right operand.
        right: Box<Self>,
    },
    /// A builtin call.
    Builtin {
        /// The builtin.
        function:  Builtin,
        /// Its arguments.
        arguments: Vec<Self>,
    },
    /// An operator call.
    Call {
        /// The callee.
        operator:  OperatorKey,
        /// The callee's procedure to run.
        slot:      Slot,
        /// Its arguments.
        arguments: Vec<Self>,
    },
    /// A guarded choice.
    When {
        /// `(condition, value)` pairs.
        arms:      Vec<(Self, Self)>,
        /// The fallback.
        otherwise: Box<Self>,
    },
    /// Bounded iteration; the accumulator lives in frame slot `local`.
    Repeat {
        /// Iteration count.
        count: Box<Self>,
        /// Initial accumulator.
        init:  Box<Self>,
        /// Frame slot of the accumulator.
        local: usize,
        /// Accumulator update.
        step:  Box<Self>,
        /// Summed term for `repeat_sum`.
        term:  Option<Box<Self>>,
    },
}

/// A procedure ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProcedure {
    /// Number of arguments; they occupy the first frame slots.
    pub arity:      usize,
    /// Total number of frame slots, arguments included.
    pub frame_size: usize,
    /// The lowered body.
    pub body:       Instr,
}

/// Lowers a procedure into executable form.
///
/// # Parameters
/// - `procedure`: The procedure to lower.
/// - `arity`: The owning operator's arity; must equal the parameter count.
/// - `arity_of`: Returns the arity of a registered operator, `None` if the
///   key is not registered.
///
/// # Errors
/// Any [`CompileError`]: a parameter count mismatch, an unknown variable, an
/// unregistered callee, or a call with the wrong number of arguments.
///
/// # Example
/// ```
/// use opulse::{
///     ast::{Expr, Procedure},
///     interpreter::compiler::compile,
/// };
///
/// let procedure = Procedure::new(&["a"], Expr::var("b"));
/// assert!(compile(&procedure, 1, |_| None).is_err());
/// ```
pub fn compile<F>(procedure: &Procedure,
                  arity: usize,
                  arity_of: F)
                  -> Result<CompiledProcedure, CompileError>
    where F: Fn(OperatorKey) -> Option<usize>
{
    if procedure.params.len() != arity {
        return Err(CompileError::ParameterCountMismatch { expected: arity,
                                                          found:    procedure.params.len(), });
    }

    let mut lowering = Lowering { scope:      procedure.params.clone(),
                                  frame_size: arity,
                                  arity_of:   &arity_of, };
    let body = lowering.lower(&procedure.body)?;

    Ok(CompiledProcedure { arity,
                           frame_size: lowering.frame_size,
                           body })
}

struct Lowering<'f, F> {
    /// Names visible at the current point; index is the frame slot.
    scope:      Vec<String>,
    frame_size: usize,
    arity_of:   &'f F,
}

impl<F> Lowering<'_, F> where F: Fn(OperatorKey) -> Option<usize>
{
    fn lower(&mut self, expr: &Expr) -> Result<Instr, CompileError> {
        Ok(match expr {
            Expr::Integer(n) => Instr::Const(Value::Integer(*n)),
            Expr::NaN => Instr::Const(Value::NaN),
            Expr::Variable(name) => {
                let slot = self.scope
                               .iter()
                               .rposition(|n| n == name)
                               .ok_or_else(|| CompileError::UnknownVariable { name: name.clone() })?;
                Instr::Local(slot)
            },
            Expr::UnaryOp { op, expr } => Instr::Unary { op:   *op,
                                                         expr: Box::new(self.lower(expr)?), },
            Expr::BinaryOp { left, op, right } => Instr::Binary { op:    *op,
                                                                  left:  Box::new(self.lower(left)?),
                                                                  right: Box::new(self.lower(right)?), },
            Expr::Builtin { function,
                            arguments, } => {
                check_call_arity(function.name(), function.arity(), arguments.len())?;
                Instr::Builtin { function:  *function,
                                 arguments: self.lower_all(arguments)?, }
            },
            Expr::Call { operator,
                         slot,
                         arguments, } => {
                let expected =
                    (self.arity_of)(*operator).ok_or(CompileError::UnknownOperator { key: *operator })?;
                check_call_arity(&format!("{}{operator}", slot.prefix()),
                                 expected,
                                 arguments.len())?;
                Instr::Call { operator:  *operator,
                              slot:      *slot,
                              arguments: self.lower_all(arguments)?, }
            },
            Expr::When { arms, otherwise } => {
                let arms = arms.iter()
                               .map(|(c, v)| Ok((self.lower(c)?, self.lower(v)?)))
                               .collect::<Result<Vec<_>, CompileError>>()?;
                Instr::When { arms,
                              otherwise: Box::new(self.lower(otherwise)?) }
            },
            Expr::Repeat { count,
                           init,
                           accumulator,
                           step,
                           term, } => {
                let count = self.lower(count)?;
                let init = self.lower(init)?;

                self.scope.push(accumulator.clone());
                let local = self.scope.len() - 1;
                self.frame_size = self.frame_size.max(self.scope.len());
                let step = self.lower(step);
                let term = term.as_ref().map(|t| self.lower(t)).transpose();
                self.scope.pop();

                Instr::Repeat { count: Box::new(count),
                                init: Box::new(init),
                                local,
                                step: Box::new(step?),
                                term: term?.map(Box::new) }
            },
        })
    }

    fn lower_all(&mut self, exprs: &[Expr]) -> Result<Vec<Instr>, CompileError> {
        exprs.iter().map(|e| self.lower(e)).collect()
    }
}

fn check_call_arity(callee: &str, expected: usize, found: usize) -> Result<(), CompileError> {
    if expected == found {
        Ok(())
    } else {
        Err(CompileError::CallArityMismatch { callee: callee.to_string(),
                                              expected,
                                              found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::parser::core::parse_procedure;

    fn parse(src: &str) -> Procedure {
        parse_procedure(src, &|_| None).unwrap()
    }

    #[test]
    fn accumulators_get_their_own_slot() {
        let compiled = compile(&parse("(a, b) => repeat(b, a, acc => acc + a)"), 2, |_| None).unwrap();
        assert_eq!(compiled.frame_size, 3);
    }

    #[test]
    fn accumulators_are_not_visible_outside_their_loop() {
        let err = compile(&parse("(a, b) => repeat(b, a, acc => acc) + acc"), 2, |_| None).unwrap_err();
        assert_eq!(err, CompileError::UnknownVariable { name: "acc".into() });
    }

    #[test]
    fn builtin_arity_is_checked() {
        let err = compile(&parse("(a) => min(a)"), 1, |_| None).unwrap_err();
        assert!(matches!(err, CompileError::CallArityMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn parameter_count_must_match_arity() {
        let err = compile(&parse("(a) => a"), 2, |_| None).unwrap_err();
        assert_eq!(err, CompileError::ParameterCountMismatch { expected: 2, found: 1 });
    }
}
