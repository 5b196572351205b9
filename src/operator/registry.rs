use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    rc::Rc,
};

use tracing::{debug, info, warn};

use crate::{
    ast::{Procedure, Slot},
    error::{CompileError, RegistryError, RuntimeError},
    interpreter::{
        compiler::{CompiledProcedure, compile},
        evaluator::core::{EvalResult, EvaluationLimits, Machine},
        value::core::Value,
    },
    operator::record::{
        Arity, Associativity, DefinitionKind, Fixedness, OperatorData, OperatorId, OperatorKey,
        OperatorRecord,
    },
};

/// Operators available to the expression generator, split by shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorPools {
    /// Unary prefix operators.
    pub prefix:  Vec<OperatorKey>,
    /// Unary postfix operators.
    pub postfix: Vec<OperatorKey>,
    /// Binary operators.
    pub binary:  Vec<OperatorKey>,
}

/// Owns every operator record.
///
/// Records live in an arena keyed by [`OperatorKey`]. External
/// [`OperatorId`]s map onto keys through an explicit table, so renumbering
/// only rebuilds that table. All mutation goes through the methods below.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    arena:    HashMap<OperatorKey, OperatorRecord>,
    ids:      BTreeMap<OperatorId, OperatorKey>,
    symbols:  HashMap<String, Vec<OperatorKey>>,
    bases:    BTreeMap<u32, OperatorKey>,
    next_key: u32,
    compiled: RefCell<HashMap<(OperatorKey, Slot), Rc<CompiledProcedure>>>,
    limits:   EvaluationLimits,
}

impl OperatorRegistry {
    /// Creates an empty registry with default evaluation limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose evaluations run under `limits`.
    #[must_use]
    pub fn with_limits(limits: EvaluationLimits) -> Self {
        Self { limits,
               ..Self::default() }
    }

    #[must_use]
    pub const fn limits(&self) -> EvaluationLimits {
        self.limits
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over all records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &OperatorRecord> + '_ {
        self.ids.values().filter_map(|key| self.arena.get(key))
    }

    /// Looks an operator up by id.
    ///
    /// # Errors
    /// `NotFound` if no operator has this id.
    pub fn get(&self, id: OperatorId) -> Result<&OperatorRecord, RegistryError> {
        self.key_of(id)
            .and_then(|key| self.arena.get(&key))
            .ok_or(RegistryError::NotFound { id })
    }

    fn get_mut(&mut self, id: OperatorId) -> Result<&mut OperatorRecord, RegistryError> {
        let key = self.key_of(id).ok_or(RegistryError::NotFound { id })?;
        self.arena.get_mut(&key).ok_or(RegistryError::NotFound { id })
    }

    /// Looks an operator up by its stable key.
    #[must_use]
    pub fn record(&self, key: OperatorKey) -> Option<&OperatorRecord> {
        self.arena.get(&key)
    }

    #[must_use]
    pub fn key_of(&self, id: OperatorId) -> Option<OperatorKey> {
        self.ids.get(&id).copied()
    }

    #[must_use]
    pub fn id_of(&self, key: OperatorKey) -> Option<OperatorId> {
        self.arena.get(&key).map(OperatorRecord::id)
    }

    /// Returns 1 for an empty registry, otherwise the highest id plus one.
    #[must_use]
    pub fn get_next_id(&self) -> OperatorId {
        self.ids
            .keys()
            .next_back()
            .map_or(OperatorId(1), |id| OperatorId(id.0 + 1))
    }

    /// Every distinct symbol in use.
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Every operator written with `symbol`, of any shape.
    pub fn by_symbol<'s>(&'s self, symbol: &str) -> impl Iterator<Item = &'s OperatorRecord> + 's {
        self.symbols
            .get(symbol)
            .into_iter()
            .flatten()
            .filter_map(|key| self.arena.get(key))
    }

    /// Finds the operator with this symbol and shape.
    ///
    /// `fixedness` is ignored for binary operators.
    #[must_use]
    pub fn lookup(&self,
                  symbol: &str,
                  arity: Arity,
                  fixedness: Option<Fixedness>)
                  -> Option<&OperatorRecord> {
        self.by_symbol(symbol).find(|r| {
                                  r.arity == arity
                                  && (arity == Arity::Binary || r.fixedness == fixedness)
                              })
    }

    /// Returns the id of the unary or binary operator written `symbol`.
    #[must_use]
    pub fn function_id(&self, symbol: &str, unary: bool) -> Option<OperatorId> {
        let arity = if unary { Arity::Unary } else { Arity::Binary };
        self.by_symbol(symbol)
            .find(|r| r.arity == arity)
            .map(OperatorRecord::id)
    }

    /// Returns the operator that renders numerals in `base`.
    ///
    /// # Errors
    /// `UnknownBase` if none is registered.
    pub fn by_base(&self, base: u32) -> Result<&OperatorRecord, RegistryError> {
        self.bases
            .get(&base)
            .and_then(|key| self.arena.get(key))
            .ok_or(RegistryError::UnknownBase { base })
    }

    /// Registers an operator.
    ///
    /// Takes the next free id when `data.id` is `None`. Precedence and order
    /// stay unset unless `data` provides them; dependencies start empty.
    ///
    /// # Errors
    /// `AlreadyExists` if the requested id is taken.
    ///
    /// # Example
    /// ```
    /// use opulse::operator::{OperatorData, OperatorId, OperatorRegistry};
    ///
    /// let mut registry = OperatorRegistry::new();
    /// let plus = registry.add(OperatorData::binary("+")).unwrap();
    /// assert_eq!(plus.id(), OperatorId(1));
    /// assert_eq!(registry.get_next_id(), OperatorId(2));
    /// ```
    pub fn add(&mut self, data: OperatorData) -> Result<&OperatorRecord, RegistryError> {
        let id = data.id.unwrap_or_else(|| self.get_next_id());
        if self.ids.contains_key(&id) {
            return Err(RegistryError::AlreadyExists { id });
        }

        let key = OperatorKey::new(self.next_key);
        self.next_key += 1;
        let record = OperatorRecord::new(key, id, data);

        self.symbols
            .entry(record.symbol.clone())
            .or_default()
            .push(key);
        if let Some(base) = record.base {
            if let Some(existing) = self.bases.get(&base) {
                warn!(base, existing = ?self.id_of(*existing), %id, "second operator for numeral base");
            } else {
                self.bases.insert(base, key);
            }
        }
        self.ids.insert(id, key);

        debug!(%id, symbol = %record.symbol, arity = ?record.arity, "operator added");
        Ok(self.arena.entry(key).or_insert(record))
    }

    /// Removes one operator from every index and the compile cache.
    ///
    /// Operators referencing it are left alone; use
    /// [`delete_cascade`](Self::delete_cascade) to remove them too.
    ///
    /// # Errors
    /// `NotFound` if no operator has this id.
    pub fn remove(&mut self, id: OperatorId) -> Result<OperatorRecord, RegistryError> {
        let key = self.ids.remove(&id).ok_or(RegistryError::NotFound { id })?;
        let record = self.arena.remove(&key).ok_or(RegistryError::NotFound { id })?;

        let now_unused = self.symbols.get_mut(&record.symbol).is_some_and(|keys| {
                                                                  keys.retain(|k| *k != key);
                                                                  keys.is_empty()
                                                              });
        if now_unused {
            self.symbols.remove(&record.symbol);
        }
        if let Some(base) = record.base
           && self.bases.get(&base) == Some(&key)
        {
            self.bases.remove(&base);
        }
        self.compiled.borrow_mut().retain(|(k, _), _| *k != key);

        debug!(%id, symbol = %record.symbol, "operator removed");
        Ok(record)
    }

    /// Removes `id` and every operator that transitively depends on it, then
    /// renumbers the survivors to `1..=N` in their previous relative order.
    ///
    /// An operator depends on another if the other is in its dependency set
    /// or called by either of its procedures. Procedures reference stable
    /// keys, so renumbering never touches them.
    ///
    /// # Returns
    /// The removed ids (as they were before renumbering), ascending.
    ///
    /// # Errors
    /// `NotFound` if no operator has this id.
    pub fn delete_cascade(&mut self, id: OperatorId) -> Result<Vec<OperatorId>, RegistryError> {
        let root = self.key_of(id).ok_or(RegistryError::NotFound { id })?;

        let mut dependents: HashMap<OperatorKey, Vec<OperatorKey>> = HashMap::new();
        for record in self.arena.values() {
            for dependency in record.references() {
                dependents.entry(dependency).or_default().push(record.key);
            }
        }

        let mut doomed = BTreeSet::from([root]);
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            for dependent in dependents.get(&key).into_iter().flatten() {
                if doomed.insert(*dependent) {
                    stack.push(*dependent);
                }
            }
        }

        let mut removed: Vec<OperatorId> = doomed.iter().filter_map(|k| self.id_of(*k)).collect();
        removed.sort_unstable();
        for id in &removed {
            self.remove(*id)?;
        }
        self.renumber();

        info!(root = %id, removed = removed.len(), remaining = self.len(), "cascade delete");
        Ok(removed)
    }

    fn renumber(&mut self) {
        let keys: Vec<OperatorKey> = self.ids.values().copied().collect();
        self.ids.clear();
        for (next, key) in (1..).zip(keys) {
            let id = OperatorId(next);
            if let Some(record) = self.arena.get_mut(&key) {
                record.id = id;
            }
            self.ids.insert(id, key);
        }
    }

    /// Recomputes the dependency set from the operators the compute
    /// procedure calls, excluding the operator itself.
    ///
    /// # Returns
    /// The dependency ids, ascending.
    ///
    /// # Errors
    /// `NotFound` if no operator has this id.
    pub fn extract_dependencies(&mut self, id: OperatorId) -> Result<Vec<OperatorId>, RegistryError> {
        let record = self.get_mut(id)?;
        let mut dependencies = record.compute
                                     .as_ref()
                                     .map(Procedure::callees)
                                     .unwrap_or_default();
        dependencies.remove(&record.key);
        record.dependencies = dependencies;
        self.dependency_ids(id)
    }

    /// Replaces the dependency set explicitly; self-references are dropped.
    ///
    /// # Errors
    /// `NotFound` if `id` or any dependency is unknown.
    pub fn set_dependencies(&mut self,
                            id: OperatorId,
                            dependencies: &[OperatorId])
                            -> Result<(), RegistryError> {
        let keys = dependencies.iter()
                               .map(|d| self.key_of(*d).ok_or(RegistryError::NotFound { id: *d }))
                               .collect::<Result<BTreeSet<_>, _>>()?;
        let record = self.get_mut(id)?;
        record.dependencies = keys;
        record.dependencies.remove(&record.key);
        Ok(())
    }

    /// Returns the current ids of an operator's dependencies, ascending.
    ///
    /// # Errors
    /// `NotFound` if no operator has this id.
    pub fn dependency_ids(&self, id: OperatorId) -> Result<Vec<OperatorId>, RegistryError> {
        let record = self.get(id)?;
        let mut ids: Vec<OperatorId> = record.dependencies
                                             .iter()
                                             .filter_map(|key| self.id_of(*key))
                                             .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Computes and stores an operator's order.
    ///
    /// Order is 1 without dependencies, otherwise the highest dependency
    /// order, plus one for recursive definitions. Dependencies whose order is
    /// unset are computed first.
    ///
    /// # Returns
    /// The order, or `None` (logged) if the operator is unknown.
    ///
    /// # Example
    /// ```
    /// use opulse::operator::{OperatorData, OperatorId, OperatorRegistry};
    ///
    /// let mut registry = OperatorRegistry::new();
    /// registry.add(OperatorData::binary("+")).unwrap();
    /// registry.add(OperatorData::binary("*")).unwrap();
    /// registry.set_dependencies(OperatorId(2), &[OperatorId(1)]).unwrap();
    ///
    /// assert_eq!(registry.calculate_order(OperatorId(2)), Some(1));
    /// assert_eq!(registry.calculate_order(OperatorId(9)), None);
    /// ```
    pub fn calculate_order(&mut self, id: OperatorId) -> Option<u32> {
        let Some(key) = self.key_of(id) else {
            warn!(%id, "cannot compute order of unknown operator");
            return None;
        };
        self.order_of(key, &mut HashSet::new())
    }

    fn order_of(&mut self, key: OperatorKey, visiting: &mut HashSet<OperatorKey>) -> Option<u32> {
        let record = self.arena.get(&key)?;
        let dependencies: Vec<OperatorKey> = record.dependencies.iter().copied().collect();
        let recursive = record.kind == DefinitionKind::Recursive;

        visiting.insert(key);
        let mut highest = None;
        for dependency in dependencies {
            if visiting.contains(&dependency) {
                continue;
            }
            let order = match self.arena.get(&dependency).map(|r| r.order) {
                Some(Some(order)) => Some(order),
                Some(None) => self.order_of(dependency, visiting),
                None => None,
            };
            highest = highest.max(order);
        }
        visiting.remove(&key);

        let order = highest.map_or(1, |h| h + u32::from(recursive));
        if let Some(record) = self.arena.get_mut(&key) {
            record.order = Some(order);
        }
        Some(order)
    }

    /// Compiles one of an operator's procedures, or returns the cached
    /// result.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Compile` if the procedure is missing or
    /// does not compile.
    pub fn compile(&self, id: OperatorId, slot: Slot) -> Result<Rc<CompiledProcedure>, RegistryError> {
        let key = self.key_of(id).ok_or(RegistryError::NotFound { id })?;
        self.compile_key(key, slot)
            .map_err(|source| RegistryError::Compile { id, slot, source })
    }

    fn compile_key(&self, key: OperatorKey, slot: Slot) -> Result<Rc<CompiledProcedure>, CompileError> {
        if let Some(hit) = self.compiled.borrow().get(&(key, slot)) {
            return Ok(Rc::clone(hit));
        }

        let record = self.arena.get(&key).ok_or(CompileError::UnknownOperator { key })?;
        let procedure = record.procedure(slot).ok_or(CompileError::MissingProcedure)?;
        let compiled = Rc::new(compile(procedure, record.arity.count(), |k| {
                           self.arena.get(&k).map(|r| r.arity.count())
                       })?);

        self.compiled
            .borrow_mut()
            .insert((key, slot), Rc::clone(&compiled));
        Ok(compiled)
    }

    /// Compiled procedure lookup for the evaluator.
    ///
    /// # Errors
    /// `UnresolvedOperator` when the procedure cannot be compiled.
    pub(crate) fn compiled(&self,
                           key: OperatorKey,
                           slot: Slot)
                           -> Result<Rc<CompiledProcedure>, RuntimeError> {
        self.compile_key(key, slot).map_err(|e| {
                                       let operator = self.id_of(key)
                                                          .map_or_else(|| key.to_string(), |id| id.to_string());
                                       RuntimeError::UnresolvedOperator { slot,
                                                                          details: format!("operator {operator}: {e}") }
                                   })
    }

    /// Runs an operator's compute or cost procedure under a fresh budget.
    ///
    /// # Errors
    /// Any [`RuntimeError`] raised while evaluating.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     ast::Slot,
    ///     interpreter::value::core::Value,
    ///     operator::{OperatorId, OperatorRegistry, seed::set_initial_operators},
    /// };
    ///
    /// let mut registry = OperatorRegistry::new();
    /// set_initial_operators(&mut registry).unwrap();
    /// let divide = registry.key_of(OperatorId(5)).unwrap();
    ///
    /// let q = registry.apply(divide, Slot::Compute, &[7.into(), 2.into()]).unwrap();
    /// assert_eq!(q, Value::Integer(3));
    /// let q = registry.apply(divide, Slot::Compute, &[7.into(), 0.into()]).unwrap();
    /// assert_eq!(q, Value::NaN);
    /// ```
    pub fn apply(&self, key: OperatorKey, slot: Slot, arguments: &[Value]) -> EvalResult<Value> {
        Machine::new(self).call(key, slot, arguments)
    }

    /// Splits the operators usable in expressions into prefix, postfix and
    /// binary pools. Numeral-base and temporary operators are excluded.
    #[must_use]
    pub fn operators_by_fixedness_and_arity(&self) -> OperatorPools {
        let mut pools = OperatorPools::default();
        for record in self.iter().filter(|r| !r.is_base() && !r.temporary) {
            match (record.arity, record.fixedness) {
                (Arity::Binary, _) => pools.binary.push(record.key),
                (Arity::Unary, Some(Fixedness::Postfix)) => pools.postfix.push(record.key),
                (Arity::Unary, _) => pools.prefix.push(record.key),
            }
        }
        pools
    }

    /// Groups operator ids by precedence level. Operators without one are
    /// left out.
    #[must_use]
    pub fn operators_by_precedence(&self) -> BTreeMap<u32, Vec<OperatorId>> {
        let mut levels: BTreeMap<u32, Vec<OperatorId>> = BTreeMap::new();
        for record in self.iter() {
            if let Some(precedence) = record.precedence {
                levels.entry(precedence).or_default().push(record.id);
            }
        }
        levels
    }

    /// Operators that may still be wrapped by a loop-recursive definition.
    #[must_use]
    pub fn recursion_callees(&self) -> Vec<OperatorKey> {
        self.iter()
            .filter(|r| r.recursion.enabled && !r.is_base() && !r.temporary && r.compute.is_some())
            .map(OperatorRecord::key)
            .collect()
    }

    /// Marks a recursion pattern on a callee as used.
    ///
    /// # Returns
    /// `false` if the pattern was already used or the callee is saturated.
    ///
    /// # Errors
    /// `NotFound` if no operator has this id.
    pub fn claim_recursion(&mut self, id: OperatorId, bit: u8) -> Result<bool, RegistryError> {
        let record = self.get_mut(id)?;
        let claimed = record.recursion.claim(bit, record.arity);
        if claimed && !record.recursion.enabled {
            debug!(%id, "recursion slots saturated");
        }
        Ok(claimed)
    }

    pub fn set_temporary(&mut self, id: OperatorId, temporary: bool) -> Result<(), RegistryError> {
        self.get_mut(id)?.temporary = temporary;
        Ok(())
    }

    pub fn set_precedence(&mut self,
                          id: OperatorId,
                          precedence: u32,
                          associativity: Associativity)
                          -> Result<(), RegistryError> {
        let record = self.get_mut(id)?;
        record.precedence = Some(precedence);
        record.associativity = Some(associativity);
        Ok(())
    }

    /// Replaces both procedures and drops their compiled forms.
    pub fn set_procedures(&mut self,
                          id: OperatorId,
                          compute: Option<Procedure>,
                          cost: Option<Procedure>)
                          -> Result<(), RegistryError> {
        let record = self.get_mut(id)?;
        record.compute = compute;
        record.cost = cost;
        let key = record.key;
        self.compiled.borrow_mut().retain(|(k, _), _| *k != key);
        Ok(())
    }

    pub fn set_definition(&mut self, id: OperatorId, definition: Option<String>) -> Result<(), RegistryError> {
        self.get_mut(id)?.definition = definition;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::parser::core::parse_procedure;

    fn binary_with(registry: &mut OperatorRegistry, symbol: &str, body: &str) -> OperatorId {
        let compute = parse_procedure(body, &|id| registry.key_of(id)).unwrap();
        let id = registry.add(OperatorData { compute: Some(compute),
                                             ..OperatorData::binary(symbol) })
                         .unwrap()
                         .id();
        registry.extract_dependencies(id).unwrap();
        id
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = OperatorRegistry::new();
        registry.add(OperatorData::binary("+")).unwrap();
        let err = registry.add(OperatorData { id: Some(OperatorId(1)),
                                              ..OperatorData::binary("#") })
                          .unwrap_err();
        assert_eq!(err, RegistryError::AlreadyExists { id: OperatorId(1) });
    }

    #[test]
    fn removing_unknown_id_fails() {
        let mut registry = OperatorRegistry::new();
        assert_eq!(registry.remove(OperatorId(3)).unwrap_err(),
                   RegistryError::NotFound { id: OperatorId(3) });
    }

    #[test]
    fn remove_clears_symbol_and_base_indices() {
        let mut registry = OperatorRegistry::new();
        let id = registry.add(OperatorData { base: Some(7),
                                             kind: DefinitionKind::Base,
                                             ..OperatorData::unary("⊛", Fixedness::Prefix) })
                         .unwrap()
                         .id();
        assert_eq!(registry.by_base(7).unwrap().id(), id);

        registry.remove(id).unwrap();
        assert!(!registry.has_symbol("⊛"));
        assert_eq!(registry.by_base(7).unwrap_err(), RegistryError::UnknownBase { base: 7 });
    }

    #[test]
    fn dependencies_exclude_self() {
        let mut registry = OperatorRegistry::new();
        let plus = binary_with(&mut registry, "+", "(a, b) => a + b");
        let twice = binary_with(&mut registry, "⊕", "(a, b) => op_1(op_1(a, b), b)");
        assert_eq!(registry.dependency_ids(twice).unwrap(), vec![plus]);

        let key = registry.key_of(twice).unwrap();
        let own = Procedure::new(&["a", "b"],
                                 crate::ast::Expr::call(key,
                                                        Slot::Compute,
                                                        vec![crate::ast::Expr::var("a"),
                                                             crate::ast::Expr::var("b")]));
        registry.set_procedures(twice, Some(own), None).unwrap();
        assert!(registry.extract_dependencies(twice).unwrap().is_empty());
    }

    #[test]
    fn recursive_kind_adds_one_to_order() {
        let mut registry = OperatorRegistry::new();
        binary_with(&mut registry, "+", "(a, b) => a + b");
        let id = registry.add(OperatorData { kind: DefinitionKind::Recursive,
                                             ..OperatorData::binary("⊗") })
                         .unwrap()
                         .id();
        registry.set_dependencies(id, &[OperatorId(1)]).unwrap();
        assert_eq!(registry.calculate_order(id), Some(2));
        assert_eq!(registry.get(OperatorId(1)).unwrap().order(), Some(1));
    }

    #[test]
    fn cascade_delete_renumbers_survivors() {
        let mut registry = OperatorRegistry::new();
        binary_with(&mut registry, "+", "(a, b) => a + b");
        binary_with(&mut registry, "⊕", "(a, b) => op_1(a, b) * 2");
        binary_with(&mut registry, "⊗", "(a, b) => a * b");
        binary_with(&mut registry, "⊘", "(a, b) => op_2(a, op_3(a, b))");
        binary_with(&mut registry, "⊙", "(a, b) => op_3(b, a)");

        let removed = registry.delete_cascade(OperatorId(2)).unwrap();
        assert_eq!(removed, vec![OperatorId(2), OperatorId(4)]);

        let symbols: Vec<_> = registry.iter().map(|r| (r.id().0, r.symbol().to_string())).collect();
        assert_eq!(symbols,
                   vec![(1, "+".to_string()), (2, "⊗".to_string()), (3, "⊙".to_string())]);

        let last = registry.get(OperatorId(3)).unwrap();
        let source = last.compute()
                         .unwrap()
                         .to_source(&|k| registry.id_of(k))
                         .unwrap();
        assert_eq!(source, "(a, b) => op_2(b, a)");
        assert_eq!(registry.dependency_ids(OperatorId(3)).unwrap(), vec![OperatorId(2)]);
    }

    #[test]
    fn compile_failures_are_reported_not_cached() {
        let mut registry = OperatorRegistry::new();
        let id = registry.add(OperatorData { compute: Some(Procedure::new(&["a"], crate::ast::Expr::var("z"))),
                                             ..OperatorData::binary("⊕") })
                         .unwrap()
                         .id();
        let err = registry.compile(id, Slot::Compute).unwrap_err();
        assert!(matches!(err, RegistryError::Compile { .. }));
        assert!(matches!(registry.compile(id, Slot::Cost).unwrap_err(),
                         RegistryError::Compile { source: CompileError::MissingProcedure, .. }));
    }

    #[test]
    fn pools_skip_base_and_temporary_operators() {
        let mut registry = OperatorRegistry::new();
        registry.add(OperatorData::binary("+")).unwrap();
        registry.add(OperatorData { temporary: true,
                                    ..OperatorData::binary("⊕") })
                .unwrap();
        registry.add(OperatorData { base: Some(2),
                                    ..OperatorData::unary("⊢", Fixedness::Prefix) })
                .unwrap();
        registry.add(OperatorData::unary("!", Fixedness::Postfix)).unwrap();

        let pools = registry.operators_by_fixedness_and_arity();
        assert_eq!(pools.binary.len(), 1);
        assert!(pools.prefix.is_empty());
        assert_eq!(pools.postfix.len(), 1);
    }
}
