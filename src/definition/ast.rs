use crate::{ast::BinaryOperator, operator::OperatorKey};

/// A term of a definition's right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// An integer literal; negative when written `-n`.
    Number(i64),
    /// An operand name.
    Variable(String),
    /// A unary operator applied to one term.
    Unary {
        /// The operator.
        operator: OperatorKey,
        /// Its operand.
        operand:  Box<Self>,
    },
    /// A binary operator applied to two terms.
    Binary {
        /// The operator.
        operator: OperatorKey,
        /// Left operand.
        left:     Box<Self>,
        /// Right operand.
        right:    Box<Self>,
    },
}

/// A branch guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `term <cmp> term`; `op` is one of the six comparisons.
    Compare {
        /// Left side.
        left:  Term,
        /// The comparison.
        op:    BinaryOperator,
        /// Right side.
        right: Term,
    },
    /// `not c`
    Not(Box<Self>),
    /// `c and c`
    And(Box<Self>, Box<Self>),
    /// `c or c`
    Or(Box<Self>, Box<Self>),
}

/// A parsed definition.
///
/// A plain definition has no guarded branches and only a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// The operator being defined.
    pub operator:  OperatorKey,
    /// Operand names from the left-hand side, in operand order.
    pub params:    Vec<String>,
    /// `(guard, term)` branches, tried in order.
    pub branches:  Vec<(Condition, Term)>,
    /// The unguarded or `else` term.
    pub otherwise: Term,
}
