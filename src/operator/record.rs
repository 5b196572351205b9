use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ast::Procedure;

/// Stable arena token of an operator.
///
/// Keys are handed out by the registry, never reused and never change, so
/// procedures can reference their callees by key across renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorKey(u32);

impl OperatorKey {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// External, dense operator id.
///
/// Ids are what the record store and the datasets use. They are reassigned
/// contiguously by [`delete_cascade`](super::OperatorRegistry::delete_cascade).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(pub u32);

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    /// One operand.
    Unary,
    /// Two operands.
    Binary,
}

impl Arity {
    /// Returns the operand count.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Unary => 1,
            Self::Binary => 2,
        }
    }

    /// Returns the recursion mask at which an operator of this arity is
    /// saturated as a callee.
    #[must_use]
    pub const fn saturation_mask(self) -> u8 {
        match self {
            Self::Unary => 0b11,
            Self::Binary => 0xFF,
        }
    }
}

/// Placement of a unary operator relative to its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fixedness {
    /// `⊕a`
    Prefix,
    /// `a⊕`
    Postfix,
}

/// How an operator was defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// A numeral-base operator or a seed operator; no definition text.
    Base,
    /// A single expression.
    Plain,
    /// Guarded expressions with a trailing `else`.
    Branch,
    /// Self-referential, either in the definition text or through a loop.
    Recursive,
}

/// Which side groups first among operators of equal precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Associativity {
    /// `a ⊕ b ⊕ c` is `(a ⊕ b) ⊕ c`.
    Left,
    /// `a ⊕ b ⊕ c` is `a ⊕ (b ⊕ c)`.
    Right,
}

/// Tracks which recursive call patterns already target an operator.
///
/// The mask only ever gains bits. Once every bit eligible for the
/// operator's arity is set, `enabled` is cleared for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursionUsage {
    /// Used patterns, one bit each.
    pub mask:    u8,
    /// Whether the operator may still be chosen as a recursion callee.
    pub enabled: bool,
}

impl Default for RecursionUsage {
    fn default() -> Self {
        Self { mask:    0,
               enabled: true, }
    }
}

impl RecursionUsage {
    /// Marks pattern `bit` as used by a callee of arity `callee`.
    ///
    /// # Returns
    /// `false` without changing anything if recursion is disabled or the bit
    /// is already set; otherwise sets it and returns `true`.
    ///
    /// # Example
    /// ```
    /// use opulse::operator::{Arity, RecursionUsage};
    ///
    /// let mut usage = RecursionUsage::default();
    /// assert!(usage.claim(0, Arity::Unary));
    /// assert!(!usage.claim(0, Arity::Unary));
    /// assert!(usage.claim(1, Arity::Unary));
    /// assert!(!usage.enabled);
    /// ```
    pub const fn claim(&mut self, bit: u8, callee: Arity) -> bool {
        let flag = 1u8 << bit;
        if !self.enabled || self.mask & flag != 0 {
            return false;
        }
        self.mask |= flag;
        let full = callee.saturation_mask();
        if self.mask & full == full {
            self.enabled = false;
        }
        true
    }
}

/// Everything needed to register an operator.
///
/// Start from [`OperatorData::unary`] or [`OperatorData::binary`] and
/// override fields with struct update syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorData {
    /// Requested id; the next free id when `None`.
    pub id:            Option<OperatorId>,
    /// Token text.
    pub symbol:        String,
    /// Operand count.
    pub arity:         Arity,
    /// Placement for unary operators.
    pub fixedness:     Option<Fixedness>,
    /// Numeral base rendered by this operator.
    pub base:          Option<u32>,
    /// Definition text.
    pub definition:    Option<String>,
    /// Definition kind.
    pub kind:          DefinitionKind,
    /// Precedence level.
    pub precedence:    Option<u32>,
    /// Associativity.
    pub associativity: Option<Associativity>,
    /// Order, when already known.
    pub order:         Option<u32>,
    /// Value procedure.
    pub compute:       Option<Procedure>,
    /// Cost procedure.
    pub cost:          Option<Procedure>,
    /// Recursion bookkeeping.
    pub recursion:     RecursionUsage,
    /// Not yet validated.
    pub temporary:     bool,
}

impl OperatorData {
    /// A unary operator with nothing but a symbol.
    #[must_use]
    pub fn unary(symbol: &str, fixedness: Fixedness) -> Self {
        Self { arity: Arity::Unary,
               fixedness: Some(fixedness),
               ..Self::binary(symbol) }
    }

    /// A binary operator with nothing but a symbol.
    #[must_use]
    pub fn binary(symbol: &str) -> Self {
        Self { id:            None,
               symbol:        symbol.to_string(),
               arity:         Arity::Binary,
               fixedness:     None,
               base:          None,
               definition:    None,
               kind:          DefinitionKind::Plain,
               precedence:    None,
               associativity: None,
               order:         None,
               compute:       None,
               cost:          None,
               recursion:     RecursionUsage::default(),
               temporary:     false, }
    }
}

/// One registered operator.
///
/// Identity fields are fixed at creation. Everything else is mutated only
/// through [`OperatorRegistry`](super::OperatorRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRecord {
    pub(super) key:           OperatorKey,
    pub(super) id:            OperatorId,
    pub(super) symbol:        String,
    pub(super) arity:         Arity,
    pub(super) fixedness:     Option<Fixedness>,
    pub(super) base:          Option<u32>,
    pub(super) definition:    Option<String>,
    pub(super) kind:          DefinitionKind,
    pub(super) precedence:    Option<u32>,
    pub(super) associativity: Option<Associativity>,
    pub(super) order:         Option<u32>,
    pub(super) compute:       Option<Procedure>,
    pub(super) cost:          Option<Procedure>,
    pub(super) dependencies:  BTreeSet<OperatorKey>,
    pub(super) recursion:     RecursionUsage,
    pub(super) temporary:     bool,
}

impl OperatorRecord {
    pub(super) fn new(key: OperatorKey, id: OperatorId, data: OperatorData) -> Self {
        Self { key,
               id,
               symbol: data.symbol,
               arity: data.arity,
               fixedness: match data.arity {
                   Arity::Unary => Some(data.fixedness.unwrap_or(Fixedness::Prefix)),
                   Arity::Binary => None,
               },
               base: data.base,
               definition: data.definition,
               kind: data.kind,
               precedence: data.precedence,
               associativity: data.associativity,
               order: data.order,
               compute: data.compute,
               cost: data.cost,
               dependencies: BTreeSet::new(),
               recursion: data.recursion,
               temporary: data.temporary }
    }

    #[must_use]
    pub const fn key(&self) -> OperatorKey {
        self.key
    }

    #[must_use]
    pub const fn id(&self) -> OperatorId {
        self.id
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }

    /// `Some` exactly for unary operators.
    #[must_use]
    pub const fn fixedness(&self) -> Option<Fixedness> {
        self.fixedness
    }

    #[must_use]
    pub const fn base(&self) -> Option<u32> {
        self.base
    }

    #[must_use]
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    #[must_use]
    pub const fn kind(&self) -> DefinitionKind {
        self.kind
    }

    #[must_use]
    pub const fn precedence(&self) -> Option<u32> {
        self.precedence
    }

    #[must_use]
    pub const fn associativity(&self) -> Option<Associativity> {
        self.associativity
    }

    #[must_use]
    pub const fn order(&self) -> Option<u32> {
        self.order
    }

    #[must_use]
    pub const fn compute(&self) -> Option<&Procedure> {
        self.compute.as_ref()
    }

    #[must_use]
    pub const fn cost(&self) -> Option<&Procedure> {
        self.cost.as_ref()
    }

    /// Stable keys of the operators this one depends on; never contains its
    /// own key.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeSet<OperatorKey> {
        &self.dependencies
    }

    #[must_use]
    pub const fn recursion(&self) -> RecursionUsage {
        self.recursion
    }

    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Returns `true` for numeral-base operators.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        self.base.is_some()
    }

    /// Returns the procedure stored in `slot`.
    #[must_use]
    pub const fn procedure(&self, slot: crate::ast::Slot) -> Option<&Procedure> {
        match slot {
            crate::ast::Slot::Compute => self.compute.as_ref(),
            crate::ast::Slot::Cost => self.cost.as_ref(),
        }
    }

    /// Every operator referenced by this one: its dependency set plus the
    /// callees of both procedures, without itself.
    pub(super) fn references(&self) -> BTreeSet<OperatorKey> {
        let mut out = self.dependencies.clone();
        for procedure in [&self.compute, &self.cost].into_iter().flatten() {
            out.extend(procedure.callees());
        }
        out.remove(&self.key);
        out
    }
}
