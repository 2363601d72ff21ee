//! RandomSource - the capability that evaluates formulas

use crate::bindings::Bindings;
use crate::evaluate::{evaluate, EvaluatedRoll, Maximizer, RngRoller, SequenceRoller};
use crate::formula::Formula;
use crate::FormulaError;
use rand::rngs::ThreadRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Evaluates a formula string with variable bindings
pub trait RandomSource {
    /// Produce one random outcome of `formula`
    fn evaluate(
        &mut self,
        formula: &str,
        bindings: &Bindings,
    ) -> Result<EvaluatedRoll, FormulaError>;

    /// Produce the outcome where every die shows its highest face
    fn maximize(
        &mut self,
        formula: &str,
        bindings: &Bindings,
    ) -> Result<EvaluatedRoll, FormulaError> {
        let parsed = Formula::parse(formula)?;
        evaluate(&parsed, bindings, &mut Maximizer)
    }
}

/// Random source backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    roller: RngRoller<R>,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        RngSource {
            roller: RngRoller::new(rng),
        }
    }
}

impl RngSource<ChaCha8Rng> {
    /// Reproducible source for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn evaluate(
        &mut self,
        formula: &str,
        bindings: &Bindings,
    ) -> Result<EvaluatedRoll, FormulaError> {
        let parsed = Formula::parse(formula)?;
        evaluate(&parsed, bindings, &mut self.roller)
    }
}

/// Source that replays predetermined faces in order
///
/// Each die rolled by any evaluation takes the next queued face.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    roller: SequenceRoller,
    evaluations: usize,
}

impl ScriptedSource {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        ScriptedSource {
            roller: SequenceRoller::new(faces),
            evaluations: 0,
        }
    }

    /// Queue more faces
    pub fn push_faces(&mut self, faces: impl IntoIterator<Item = u32>) {
        self.roller.extend(faces);
    }

    /// Faces not yet consumed
    pub fn remaining(&self) -> usize {
        self.roller.remaining()
    }

    /// Number of random evaluations performed so far
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

impl RandomSource for ScriptedSource {
    fn evaluate(
        &mut self,
        formula: &str,
        bindings: &Bindings,
    ) -> Result<EvaluatedRoll, FormulaError> {
        self.evaluations += 1;
        let parsed = Formula::parse(formula)?;
        evaluate(&parsed, bindings, &mut self.roller)
    }
}
