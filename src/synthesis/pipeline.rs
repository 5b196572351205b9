use std::path::{Path, PathBuf};

use rand::{
    Rng,
    distributions::{Distribution, WeightedIndex},
};
use tracing::{debug, info, warn};

use crate::{
    ast::Slot,
    config::{Config, DefinitionMix},
    definition::{parser::parse_definition, transformer::transform},
    error::SynthesisError,
    interpreter::value::core::Value,
    operator::{OperatorId, OperatorRegistry, priority::assign_priorities, store::append_temporary},
    synthesis::generator::{CandidateKind, OperatorGenerator},
};

/// Outcome of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Candidates accepted.
    pub generated: usize,
    /// Candidates rejected for a recoverable reason.
    pub discarded: usize,
}

/// Drives candidates from proposal to acceptance.
///
/// A candidate is registered as temporary, its definition parsed and lowered
/// (unless it already has procedures), both procedures compiled and run on
/// random arguments. Any failure removes the candidate again.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    generator:           OperatorGenerator,
    validation_samples:  usize,
    validation_range:    (i64, i64),
    max_attempts_factor: usize,
    max_priority:        u32,
    mix:                 DefinitionMix,
    temp_path:           Option<PathBuf>,
}

impl Synthesizer {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let synthesis = &config.synthesis;
        Self { generator:           OperatorGenerator::new(config),
               validation_samples:  synthesis.validation_samples,
               validation_range:    synthesis.validation_range.bounds(),
               max_attempts_factor: synthesis.max_attempts_factor.max(1),
               max_priority:        synthesis.max_priority,
               mix:                 synthesis.definition_mix,
               temp_path:           None, }
    }

    /// Appends every accepted operator to the temp store at `path`.
    #[must_use]
    pub fn with_temp_file(mut self, path: &Path) -> Self {
        self.temp_path = Some(path.to_path_buf());
        self
    }

    #[must_use]
    pub const fn generator(&self) -> &OperatorGenerator {
        &self.generator
    }

    /// Runs one candidate of `kind` through the whole lifecycle.
    ///
    /// # Returns
    /// The id of the accepted operator.
    ///
    /// # Errors
    /// Whatever rejected the candidate; the registry no longer contains it.
    /// A loop-recursive candidate's claim on its callee is kept.
    pub fn synthesize_one<R: Rng + ?Sized>(&mut self,
                                           registry: &mut OperatorRegistry,
                                           rng: &mut R,
                                           kind: CandidateKind)
                                           -> Result<OperatorId, SynthesisError> {
        let data = self.generator.propose(registry, rng, kind)?;
        let id = registry.add(data)?.id();

        match self.admit(registry, rng, id) {
            Ok(()) => Ok(id),
            Err(e) => {
                if let Err(remove) = registry.remove(id) {
                    warn!(%id, error = %remove, "rejected candidate already gone");
                }
                debug!(%id, ?kind, error = %e, "candidate rejected");
                Err(e)
            },
        }
    }

    fn admit<R: Rng + ?Sized>(&self,
                              registry: &mut OperatorRegistry,
                              rng: &mut R,
                              id: OperatorId)
                              -> Result<(), SynthesisError> {
        let record = registry.get(id)?;
        // a missing definition surfaces as a compile failure below
        let text = record.compute()
                         .is_none()
                         .then(|| record.definition().map(str::to_string))
                         .flatten();
        if let Some(text) = text {
            let definition = parse_definition(&text, registry)?;
            let (compute, cost) = transform(&definition);
            registry.set_procedures(id, Some(compute), Some(cost))?;
        }

        registry.compile(id, Slot::Compute)?;
        registry.compile(id, Slot::Cost)?;
        self.validate(registry, rng, id)?;

        registry.set_temporary(id, false)?;
        registry.extract_dependencies(id)?;
        registry.calculate_order(id);
        if let Some(path) = &self.temp_path {
            append_temporary(registry, id, path)?;
        }
        debug!(%id, symbol = %registry.get(id)?.symbol(), "candidate accepted");
        Ok(())
    }

    /// Runs both procedures on `validation_samples` random argument tuples.
    fn validate<R: Rng + ?Sized>(&self,
                                 registry: &OperatorRegistry,
                                 rng: &mut R,
                                 id: OperatorId)
                                 -> Result<(), SynthesisError> {
        let record = registry.get(id)?;
        let (key, arity) = (record.key(), record.arity());
        let (low, high) = self.validation_range;

        for _ in 0..self.validation_samples {
            let arguments: Vec<i64> = (0..arity.count()).map(|_| rng.gen_range(low..=high)).collect();
            let values: Vec<Value> = arguments.iter().map(|a| Value::Integer(*a)).collect();
            for slot in [Slot::Compute, Slot::Cost] {
                registry.apply(key, slot, &values)
                        .map_err(|source| SynthesisError::Execution { arguments: arguments.clone(),
                                                                      source })?;
            }
        }
        Ok(())
    }

    /// Synthesizes up to `num` operators of one kind.
    ///
    /// Stops after `num * max_attempts_factor` candidates even if fewer were
    /// accepted.
    ///
    /// # Errors
    /// The first non-recoverable error; recoverable ones are counted as
    /// discarded.
    pub fn generate_batch<R: Rng + ?Sized>(&mut self,
                                           registry: &mut OperatorRegistry,
                                           rng: &mut R,
                                           kind: CandidateKind,
                                           num: usize)
                                           -> Result<BatchReport, SynthesisError> {
        self.run_batch(registry, rng, num, |_| kind)
    }

    /// Synthesizes up to `num` operators with kinds drawn from the
    /// definition mix, then assigns precedence levels and mints the missing
    /// base operators.
    ///
    /// # Errors
    /// The first non-recoverable error.
    ///
    /// # Example
    /// ```
    /// use opulse::{
    ///     config::Config,
    ///     operator::{OperatorRegistry, seed::set_initial_operators},
    ///     synthesis::pipeline::Synthesizer,
    /// };
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let mut registry = OperatorRegistry::new();
    /// set_initial_operators(&mut registry).unwrap();
    ///
    /// let mut synthesizer = Synthesizer::new(&Config::default());
    /// let report = synthesizer.generate_random_operators(&mut registry, &mut ChaCha8Rng::seed_from_u64(7), 5)
    ///                         .unwrap();
    /// assert!(report.generated <= 5);
    /// assert!(registry.iter().filter(|r| !r.is_base()).all(|r| r.precedence().is_some()));
    /// ```
    pub fn generate_random_operators<R: Rng + ?Sized>(&mut self,
                                                      registry: &mut OperatorRegistry,
                                                      rng: &mut R,
                                                      num: usize)
                                                      -> Result<BatchReport, SynthesisError> {
        let mix = self.mix;
        let weights = [mix.plain, mix.branch, mix.recursive, mix.loop_recursive];
        let kinds = WeightedIndex::new(weights).ok();
        if kinds.is_none() {
            warn!(?weights, "unusable definition mix, generating plain definitions only");
        }

        let report = self.run_batch(registry, rng, num, |rng| {
                             kinds.as_ref()
                                  .map_or(CandidateKind::Plain, |k| CandidateKind::ALL[k.sample(rng)])
                         })?;
        assign_priorities(registry, rng, self.max_priority)?;
        self.generator.generate_base_operators(registry, rng)?;
        Ok(report)
    }

    fn run_batch<R, F>(&mut self,
                       registry: &mut OperatorRegistry,
                       rng: &mut R,
                       num: usize,
                       mut pick: F)
                       -> Result<BatchReport, SynthesisError>
        where R: Rng + ?Sized,
              F: FnMut(&mut R) -> CandidateKind
    {
        let max_attempts = num.saturating_mul(self.max_attempts_factor);
        let mut report = BatchReport::default();
        let mut attempts = 0;

        while report.generated < num && attempts < max_attempts {
            attempts += 1;
            let kind = pick(rng);
            match self.synthesize_one(registry, rng, kind) {
                Ok(id) => {
                    report.generated += 1;
                    info!(%id, ?kind, generated = report.generated, "operator generated");
                },
                Err(e) if e.is_recoverable() => report.discarded += 1,
                Err(e) => return Err(e),
            }
        }

        if report.generated < num {
            warn!(requested = num, generated = report.generated, attempts, "batch stopped at its attempt cap");
        }
        info!(generated = report.generated, discarded = report.discarded, "batch finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{
        interpreter::evaluator::core::EvaluationLimits,
        operator::{DefinitionKind, seed::set_initial_operators},
    };

    fn seeded(limits: EvaluationLimits) -> OperatorRegistry {
        let mut registry = OperatorRegistry::with_limits(limits);
        set_initial_operators(&mut registry).unwrap();
        registry
    }

    #[test]
    fn accepted_operators_are_complete() {
        let mut registry = seeded(EvaluationLimits::default());
        let mut synthesizer = Synthesizer::new(&Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let report = synthesizer.generate_batch(&mut registry, &mut rng, CandidateKind::Plain, 5)
                                .unwrap();
        assert_eq!(registry.len(), 6 + report.generated);
        for record in registry.iter().filter(|r| r.kind() == DefinitionKind::Plain) {
            assert!(!record.is_temporary());
            assert!(record.order().is_some());
            assert!(record.compute().is_some() && record.cost().is_some());
            assert!(!record.dependencies().contains(&record.key()));
        }
    }

    #[test]
    fn failing_candidates_leave_no_trace() {
        let mut registry = seeded(EvaluationLimits { fuel: 0,
                                                     ..EvaluationLimits::default() });
        let mut synthesizer = Synthesizer::new(&Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let report = synthesizer.generate_batch(&mut registry, &mut rng, CandidateKind::Branch, 2)
                                .unwrap();
        assert_eq!(report, BatchReport { generated: 0,
                                         discarded: 2 * Config::default().synthesis.max_attempts_factor });
        assert_eq!(registry.len(), 6);
        assert!(registry.iter().all(|r| !r.is_temporary()));
    }

    #[test]
    fn accepted_operators_reach_the_temp_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operators.jsonl.tmp");
        let mut registry = seeded(EvaluationLimits::default());
        let mut synthesizer = Synthesizer::new(&Config::default()).with_temp_file(&path);
        let mut rng = ChaCha8Rng::seed_from_u64(19);

        let report = synthesizer.generate_batch(&mut registry, &mut rng, CandidateKind::Recursive, 3)
                                .unwrap();
        let written = std::fs::read_to_string(&path).unwrap_or_default();
        assert_eq!(written.lines().count(), report.generated);

        let mut reloaded = seeded(EvaluationLimits::default());
        assert_eq!(reloaded.load(&written), 6 + report.generated);
    }

    #[test]
    fn loop_recursion_orders_above_its_callee() {
        let mut registry = seeded(EvaluationLimits::default());
        let mut synthesizer = Synthesizer::new(&Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(23);

        let report = synthesizer.generate_batch(&mut registry, &mut rng, CandidateKind::LoopRecursive, 4)
                                .unwrap();
        assert!(report.generated > 0);
        for record in registry.iter().filter(|r| r.kind() == DefinitionKind::Recursive) {
            let callees: Vec<_> = record.dependencies().iter().collect();
            assert_eq!(callees.len(), 1);
            let callee = registry.record(*callees[0]).unwrap();
            assert_eq!(record.order(), callee.order().map(|o| o + 1));
        }
    }
}
