use std::{collections::BTreeSet, fmt::Write as _};

use crate::operator::{OperatorId, OperatorKey};

/// Selects one of the two procedures every operator carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// The value-producing procedure.
    Compute,
    /// The cost-producing procedure.
    Cost,
}

impl Slot {
    /// Returns the call prefix used for this slot in procedure text
    /// (`op_` or `cost_`).
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Compute => "op_",
            Self::Cost => "cost_",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compute => write!(f, "compute"),
            Self::Cost => write!(f, "cost"),
        }
    }
}

/// An abstract syntax tree (AST) node of the procedure language.
///
/// Procedures are what operators execute. They are produced by the definition
/// transformer, emitted directly by the loop-recursion generator, or parsed
/// from the text stored in a record store. Operator references hold the stable
/// [`OperatorKey`] of the callee, so a procedure never has to be rewritten
/// when external ids are renumbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An integer literal.
    Integer(i64),
    /// The NaN sentinel literal, written `nan`.
    NaN,
    /// A reference to a parameter or loop accumulator.
    Variable(String),
    /// A unary operation (e.g. `-x`, `not c`).
    UnaryOp {
        /// The unary operator.
        op:   UnaryOperator,
        /// The operand.
        expr: Box<Self>,
    },
    /// A binary operation (e.g. `a + b`, `a < b`).
    BinaryOp {
        /// The left-hand side expression.
        left:  Box<Self>,
        /// The operator.
        op:    BinaryOperator,
        /// The right-hand side expression.
        right: Box<Self>,
    },
    /// A call of a builtin function such as `abs(x)`.
    Builtin {
        /// The builtin being called.
        function:  Builtin,
        /// The argument expressions.
        arguments: Vec<Self>,
    },
    /// A call of another operator's compute or cost procedure (`op_4(a, b)`,
    /// `cost_4(a, b)`).
    Call {
        /// The callee.
        operator:  OperatorKey,
        /// Which procedure of the callee to run.
        slot:      Slot,
        /// The argument expressions.
        arguments: Vec<Self>,
    },
    /// A guarded choice: the first arm whose condition holds is taken,
    /// otherwise the fallback.
    ///
    /// Written `when { c1 => e1, c2 => e2, else => e3 }`.
    When {
        /// `(condition, value)` pairs, tried in order.
        arms:      Vec<(Self, Self)>,
        /// The value when no condition holds.
        otherwise: Box<Self>,
    },
    /// Bounded iteration.
    ///
    /// `repeat(n, init, acc => step)` binds `acc` to `init`, then replaces it
    /// by `step` `|n|` times and yields the final accumulator.
    /// `repeat_sum(n, init, acc => step, acc => term)` performs the same
    /// iteration but yields the sum of `term` over every pre-step accumulator.
    Repeat {
        /// The iteration count; its magnitude is used.
        count:       Box<Self>,
        /// The initial accumulator.
        init:        Box<Self>,
        /// Name bound to the accumulator inside `step` and `term`.
        accumulator: String,
        /// The accumulator update.
        step:        Box<Self>,
        /// The summed term, present for `repeat_sum`.
        term:        Option<Box<Self>>,
    },
}

/// A procedure: named parameters and a body expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    /// Parameter names, one per operand of the operator.
    pub params: Vec<String>,
    /// The body.
    pub body:   Expr,
}

impl Procedure {
    /// Creates a procedure from parameter names and a body.
    #[must_use]
    pub fn new(params: &[&str], body: Expr) -> Self {
        Self { params: params.iter().map(ToString::to_string).collect(),
               body }
    }

    /// Returns the set of operators this procedure calls, in either slot.
    #[must_use]
    pub fn callees(&self) -> BTreeSet<OperatorKey> {
        let mut out = BTreeSet::new();
        self.body.collect_callees(&mut out);
        out
    }

    /// Renders the procedure as text, naming callees by their current
    /// external id.
    ///
    /// # Parameters
    /// - `id_of`: Maps a stable key to the callee's current id.
    ///
    /// # Errors
    /// Returns the key of the first callee `id_of` cannot resolve.
    pub fn to_source<F>(&self, id_of: &F) -> Result<String, OperatorKey>
        where F: Fn(OperatorKey) -> Option<OperatorId>
    {
        let mut out = format!("({}) => ", self.params.join(", "));
        self.body.write_source(&mut out, id_of)?;
        Ok(out)
    }
}

impl Expr {
    /// Shorthand for a boxed binary operation.
    #[must_use]
    pub fn binary(left: Self, op: BinaryOperator, right: Self) -> Self {
        Self::BinaryOp { left: Box::new(left),
                         op,
                         right: Box::new(right) }
    }

    /// Shorthand for a variable reference.
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Variable(name.to_string())
    }

    /// Shorthand for an operator call.
    #[must_use]
    pub const fn call(operator: OperatorKey, slot: Slot, arguments: Vec<Self>) -> Self {
        Self::Call { operator,
                     slot,
                     arguments }
    }

    /// Sums a list of terms with `+`; an empty list sums to `0`.
    #[must_use]
    pub fn sum(terms: Vec<Self>) -> Self {
        terms.into_iter()
             .reduce(|acc, term| Self::binary(acc, BinaryOperator::Add, term))
             .unwrap_or(Self::Integer(0))
    }

    fn collect_callees(&self, out: &mut BTreeSet<OperatorKey>) {
        match self {
            Self::Integer(_) | Self::NaN | Self::Variable(_) => {},
            Self::UnaryOp { expr, .. } => expr.collect_callees(out),
            Self::BinaryOp { left, right, .. } => {
                left.collect_callees(out);
                right.collect_callees(out);
            },
            Self::Builtin { arguments, .. } => {
                arguments.iter().for_each(|a| a.collect_callees(out));
            },
            Self::Call { operator,
                         arguments,
                         .. } => {
                out.insert(*operator);
                arguments.iter().for_each(|a| a.collect_callees(out));
            },
            Self::When { arms, otherwise } => {
                for (condition, value) in arms {
                    condition.collect_callees(out);
                    value.collect_callees(out);
                }
                otherwise.collect_callees(out);
            },
            Self::Repeat { count,
                           init,
                           step,
                           term,
                           .. } => {
                count.collect_callees(out);
                init.collect_callees(out);
                step.collect_callees(out);
                if let Some(term) = term {
                    term.collect_callees(out);
                }
            },
        }
    }

    fn write_source<F>(&self, out: &mut String, id_of: &F) -> Result<(), OperatorKey>
        where F: Fn(OperatorKey) -> Option<OperatorId>
    {
        match self {
            Self::Integer(n) if *n < 0 => {
                let _ = write!(out, "({n})");
            },
            Self::Integer(n) => {
                let _ = write!(out, "{n}");
            },
            Self::NaN => out.push_str("nan"),
            Self::Variable(name) => out.push_str(name),
            Self::UnaryOp { op, expr } => {
                let _ = write!(out, "{op}");
                if *op == UnaryOperator::Not {
                    out.push(' ');
                }
                expr.write_grouped(out, id_of)?;
            },
            Self::BinaryOp { left, op, right } => {
                left.write_grouped(out, id_of)?;
                let _ = write!(out, " {op} ");
                right.write_grouped(out, id_of)?;
            },
            Self::Builtin { function,
                            arguments, } => {
                out.push_str(function.name());
                write_arguments(out, arguments, id_of)?;
            },
            Self::Call { operator,
                         slot,
                         arguments, } => {
                let id = id_of(*operator).ok_or(*operator)?;
                let _ = write!(out, "{}{id}", slot.prefix());
                write_arguments(out, arguments, id_of)?;
            },
            Self::When { arms, otherwise } => {
                out.push_str("when { ");
                for (condition, value) in arms {
                    condition.write_source(out, id_of)?;
                    out.push_str(" => ");
                    value.write_source(out, id_of)?;
                    out.push_str(", ");
                }
                out.push_str("else => ");
                otherwise.write_source(out, id_of)?;
                out.push_str(" }");
            },
            Self::Repeat { count,
                           init,
                           accumulator,
                           step,
                           term, } => {
                out.push_str(if term.is_some() { "repeat_sum(" } else { "repeat(" });
                count.write_source(out, id_of)?;
                out.push_str(", ");
                init.write_source(out, id_of)?;
                let _ = write!(out, ", {accumulator} => ");
                step.write_source(out, id_of)?;
                if let Some(term) = term {
                    let _ = write!(out, ", {accumulator} => ");
                    term.write_source(out, id_of)?;
                }
                out.push(')');
            },
        }
        Ok(())
    }

    fn write_grouped<F>(&self, out: &mut String, id_of: &F) -> Result<(), OperatorKey>
        where F: Fn(OperatorKey) -> Option<OperatorId>
    {
        if matches!(self, Self::BinaryOp { .. } | Self::UnaryOp { .. }) {
            out.push('(');
            self.write_source(out, id_of)?;
            out.push(')');
            Ok(())
        } else {
            self.write_source(out, id_of)
        }
    }
}

fn write_arguments<F>(out: &mut String, arguments: &[Expr], id_of: &F) -> Result<(), OperatorKey>
    where F: Fn(OperatorKey) -> Option<OperatorId>
{
    out.push('(');
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        argument.write_source(out, id_of)?;
    }
    out.push(')');
    Ok(())
}

/// Unary operators of the procedure language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`).
    Negate,
    /// Logical negation (`not c`).
    Not,
}

/// Binary operators of the procedure language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Floor division (`/`).
    Div,
    /// Floor modulo (`%`).
    Mod,
    /// Equality (`==`).
    Equal,
    /// Inequality (`!=`).
    NotEqual,
    /// Less than (`<`).
    Less,
    /// Greater than (`>`).
    Greater,
    /// Less or equal (`<=`).
    LessEqual,
    /// Greater or equal (`>=`).
    GreaterEqual,
    /// Logical and (`and`).
    And,
    /// Logical or (`or`).
    Or,
}

impl BinaryOperator {
    /// Returns `true` for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self,
                 Self::Equal
                 | Self::NotEqual
                 | Self::Less
                 | Self::Greater
                 | Self::LessEqual
                 | Self::GreaterEqual)
    }
}

/// Builtin functions of the procedure language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `abs(x)`
    Abs,
    /// `min(x, y)`
    Min,
    /// `max(x, y)`
    Max,
}

impl Builtin {
    /// Looks a builtin up by its name in procedure text.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(Self::Abs),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Returns the builtin's name in procedure text.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Returns the number of arguments the builtin takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Abs => 1,
            Self::Min | Self::Max => 2,
        }
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            Self::Negate => "-",
            Self::Not => "not",
        };
        write!(f, "{operator}")
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use BinaryOperator::{
            Add, And, Div, Equal, Greater, GreaterEqual, Less, LessEqual, Mod, Mul, NotEqual, Or,
            Sub,
        };
        let operator = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            And => "and",
            Or => "or",
        };
        write!(f, "{operator}")
    }
}
