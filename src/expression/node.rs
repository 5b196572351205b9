use serde::Serialize;
use serde_json::json;

use crate::operator::{OperatorKey, OperatorRegistry};

/// Where a node hangs below its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// The node has no parent.
    Root,
    /// Left operand of a binary application.
    Left,
    /// Right operand of a binary application.
    Right,
    /// Operand of a unary application.
    Unary,
}

/// The shape of an expression node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An integer literal written in `base`.
    Number {
        /// The literal's value.
        value: i64,
        /// The numeral base used when rendering with base symbols.
        base:  u32,
    },
    /// A free variable.
    Variable(String),
    /// A unary operator application.
    Unary {
        /// The operator.
        operator: OperatorKey,
        /// The operand.
        operand:  Box<Node>,
    },
    /// A binary operator application.
    Binary {
        /// The operator.
        operator: OperatorKey,
        /// The left operand.
        left:     Box<Node>,
        /// The right operand.
        right:    Box<Node>,
    },
}

/// A node of an expression tree.
///
/// The constructors set the position tags of the children they attach, so a
/// tree built through them is always consistently tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The node's shape.
    pub kind:     NodeKind,
    /// Where the node hangs below its parent.
    pub position: Position,
}

impl Node {
    #[must_use]
    pub const fn number(value: i64, base: u32) -> Self {
        Self { kind:     NodeKind::Number { value, base },
               position: Position::Root, }
    }

    #[must_use]
    pub fn variable(name: &str) -> Self {
        Self { kind:     NodeKind::Variable(name.to_string()),
               position: Position::Root, }
    }

    /// Applies a unary operator to `operand`, tagging it [`Position::Unary`].
    #[must_use]
    pub fn unary(operator: OperatorKey, mut operand: Self) -> Self {
        operand.position = Position::Unary;
        Self { kind:     NodeKind::Unary { operator,
                                           operand: Box::new(operand) },
               position: Position::Root, }
    }

    /// Applies a binary operator, tagging the operands [`Position::Left`] and
    /// [`Position::Right`].
    #[must_use]
    pub fn binary(operator: OperatorKey, mut left: Self, mut right: Self) -> Self {
        left.position = Position::Left;
        right.position = Position::Right;
        Self { kind:     NodeKind::Binary { operator,
                                            left: Box::new(left),
                                            right: Box::new(right) },
               position: Position::Root, }
    }

    /// Returns the operator applied at this node, if any.
    #[must_use]
    pub const fn operator(&self) -> Option<OperatorKey> {
        match &self.kind {
            NodeKind::Unary { operator, .. } | NodeKind::Binary { operator, .. } => Some(*operator),
            NodeKind::Number { .. } | NodeKind::Variable(_) => None,
        }
    }

    /// Returns whether a variable occurs anywhere in the tree.
    #[must_use]
    pub fn has_variable(&self) -> bool {
        match &self.kind {
            NodeKind::Number { .. } => false,
            NodeKind::Variable(_) => true,
            NodeKind::Unary { operand, .. } => operand.has_variable(),
            NodeKind::Binary { left, right, .. } => left.has_variable() || right.has_variable(),
        }
    }

    /// Returns whether the variable `name` occurs anywhere in the tree.
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        match &self.kind {
            NodeKind::Number { .. } => false,
            NodeKind::Variable(v) => v == name,
            NodeKind::Unary { operand, .. } => operand.mentions(name),
            NodeKind::Binary { left, right, .. } => left.mentions(name) || right.mentions(name),
        }
    }

    /// Converts the tree to its dataset JSON form.
    ///
    /// Operators are written by symbol; an operator missing from `registry`
    /// is written as its key.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     expression::node::Node,
    ///     operator::{OperatorId, OperatorRegistry, seed::set_initial_operators},
    /// };
    ///
    /// let mut registry = OperatorRegistry::new();
    /// set_initial_operators(&mut registry).unwrap();
    /// let plus = registry.key_of(OperatorId(1)).unwrap();
    ///
    /// let tree = Node::binary(plus, Node::number(2, 10), Node::variable("x"));
    /// let json = tree.to_json(&registry);
    /// assert_eq!(json["operator"], "+");
    /// assert_eq!(json["left_expr"]["type"], "numeric_atoms");
    /// assert_eq!(json["right_expr"]["variable"], "x");
    /// ```
    #[must_use]
    pub fn to_json(&self, registry: &OperatorRegistry) -> serde_json::Value {
        let symbol = |key: &OperatorKey| {
            registry.record(*key)
                    .map_or_else(|| key.to_string(), |r| r.symbol().to_string())
        };
        match &self.kind {
            NodeKind::Number { value, base } => {
                json!({ "type": "numeric_atoms", "value": value, "base": base })
            },
            NodeKind::Variable(name) => json!({ "type": "variable", "variable": name }),
            NodeKind::Unary { operator, operand } => json!({
                "type": "unary",
                "operator": symbol(operator),
                "unary_expr": operand.to_json(registry),
            }),
            NodeKind::Binary { operator, left, right } => json!({
                "type": "binary",
                "operator": symbol(operator),
                "left_expr": left.to_json(registry),
                "right_expr": right.to_json(registry),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_tag_children() {
        let key = OperatorKey::new(0);
        let tree = Node::binary(key, Node::unary(key, Node::number(1, 2)), Node::variable("a"));
        let NodeKind::Binary { left, right, .. } = &tree.kind else {
            panic!("expected a binary node");
        };
        assert_eq!(tree.position, Position::Root);
        assert_eq!(left.position, Position::Left);
        assert_eq!(right.position, Position::Right);
        let NodeKind::Unary { operand, .. } = &left.kind else {
            panic!("expected a unary node");
        };
        assert_eq!(operand.position, Position::Unary);
    }

    #[test]
    fn variables_are_found_at_any_depth() {
        let key = OperatorKey::new(0);
        let tree = Node::binary(key, Node::number(1, 2), Node::unary(key, Node::variable("(a⊕(b-1))")));
        assert!(tree.has_variable());
        assert!(tree.mentions("(a⊕(b-1))"));
        assert!(!tree.mentions("a"));
        assert!(!Node::number(3, 10).has_variable());
    }
}
