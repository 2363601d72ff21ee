//! Formula evaluation - turning a parsed formula into an EvaluatedRoll

use crate::bindings::Bindings;
use crate::formula::{DiceTerm, DieModifier, Formula, Operator, Term, MAX_DICE};
use crate::FormulaError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

/// Produces the face shown by a single die
pub trait DieRoller {
    /// Roll one die with `faces` sides, returning a value in `1..=faces`
    fn roll(&mut self, faces: u32) -> u32;
}

/// Random die roller backed by any `rand::Rng`
#[derive(Debug, Clone)]
pub struct RngRoller<R> {
    rng: R,
}

impl<R: Rng> RngRoller<R> {
    pub fn new(rng: R) -> Self {
        RngRoller { rng }
    }
}

impl<R: Rng> DieRoller for RngRoller<R> {
    fn roll(&mut self, faces: u32) -> u32 {
        self.rng.gen_range(1..=faces)
    }
}

/// Every die shows its highest face
#[derive(Debug, Clone, Copy, Default)]
pub struct Maximizer;

impl DieRoller for Maximizer {
    fn roll(&mut self, faces: u32) -> u32 {
        faces
    }
}

/// Replays a fixed sequence of faces, e.g. to reproduce a recorded roll
///
/// Values are clamped to the die being rolled. Once the sequence is exhausted
/// every die shows 1.
#[derive(Debug, Clone, Default)]
pub struct SequenceRoller {
    faces: VecDeque<u32>,
}

impl SequenceRoller {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        SequenceRoller {
            faces: faces.into_iter().collect(),
        }
    }

    /// Queue more faces after the current ones
    pub fn extend(&mut self, faces: impl IntoIterator<Item = u32>) {
        self.faces.extend(faces);
    }

    /// Faces not yet consumed
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DieRoller for SequenceRoller {
    fn roll(&mut self, faces: u32) -> u32 {
        match self.faces.pop_front() {
            Some(value) => value.clamp(1, faces),
            None => {
                warn!(faces, "die sequence exhausted, rolling 1");
                1
            }
        }
    }
}

/// A single die face, `active` is false once it was rerolled away or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    pub value: u32,
    pub active: bool,
}

impl DieResult {
    fn active(value: u32) -> Self {
        DieResult {
            value,
            active: true,
        }
    }
}

/// Every die rolled for one dice term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieOutcome {
    pub faces: u32,
    pub results: Vec<DieResult>,
}

impl DieOutcome {
    /// Values of the dice that count towards the total
    pub fn active_values(&self) -> impl Iterator<Item = u32> + '_ {
        self.results.iter().filter(|r| r.active).map(|r| r.value)
    }

    pub fn total(&self) -> i64 {
        self.active_values().map(i64::from).sum()
    }
}

/// One concrete outcome of a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedRoll {
    /// The formula with every variable substituted
    pub formula: String,
    pub total: i64,
    /// Dice terms in formula order
    pub dice: Vec<DieOutcome>,
}

impl EvaluatedRoll {
    pub fn has_dice(&self) -> bool {
        !self.dice.is_empty()
    }

    /// Number of individual dice rolled, including rerolled and dropped dice
    pub fn die_count(&self) -> usize {
        self.dice.iter().map(|d| d.results.len()).sum()
    }
}

/// Evaluate a formula with the given bindings and die roller
///
/// Arithmetic is exact until the end; the total is floored to an integer.
pub fn evaluate(
    formula: &Formula,
    bindings: &Bindings,
    roller: &mut dyn DieRoller,
) -> Result<EvaluatedRoll, FormulaError> {
    let resolved = formula.substitute(bindings)?;
    let mut dice = Vec::new();
    let value = eval_terms(resolved.terms(), roller, &mut dice)?;
    Ok(EvaluatedRoll {
        formula: resolved.to_string(),
        total: value.floor() as i64,
        dice,
    })
}

fn eval_terms(
    terms: &[Term],
    roller: &mut dyn DieRoller,
    dice: &mut Vec<DieOutcome>,
) -> Result<f64, FormulaError> {
    // Sum of finished products, the product being built and its sign
    let mut sum = 0.0;
    let mut product = 0.0;
    let mut sign = 1.0;
    let mut pending: Option<Operator> = None;

    for term in terms {
        if let Term::Operator(op) = term {
            pending = Some(*op);
            continue;
        }

        let value = eval_operand(term, roller, dice)?;
        match pending.take() {
            None => product = value,
            Some(Operator::Multiply) => product *= value,
            Some(Operator::Divide) => {
                if value == 0.0 {
                    return Err(FormulaError::DivisionByZero);
                }
                product /= value;
            }
            Some(Operator::Add) => {
                sum += sign * product;
                sign = 1.0;
                product = value;
            }
            Some(Operator::Subtract) => {
                sum += sign * product;
                sign = -1.0;
                product = value;
            }
        }
    }

    Ok(sum + sign * product)
}

fn eval_operand(
    term: &Term,
    roller: &mut dyn DieRoller,
    dice: &mut Vec<DieOutcome>,
) -> Result<f64, FormulaError> {
    match term {
        Term::Number(n) => Ok(*n as f64),
        Term::Dice(dice_term) => {
            let outcome = roll_dice(dice_term, roller)?;
            let total = outcome.total() as f64;
            dice.push(outcome);
            Ok(total)
        }
        Term::Group(inner) => eval_terms(inner.terms(), roller, dice),
        Term::Function { function, argument } => {
            Ok(function.apply(eval_terms(argument.terms(), roller, dice)?))
        }
        // Variables are substituted before evaluation
        Term::Variable(_) => Ok(0.0),
        Term::Operator(_) => Err(FormulaError::UnexpectedEnd),
    }
}

fn roll_dice(term: &DiceTerm, roller: &mut dyn DieRoller) -> Result<DieOutcome, FormulaError> {
    // Rewrites such as scaling can grow a term past what parsing accepts
    if term.number > MAX_DICE {
        return Err(FormulaError::InvalidDice(term.to_string()));
    }
    let mut results: Vec<DieResult> = (0..term.number)
        .map(|_| DieResult::active(roller.roll(term.faces)))
        .collect();

    for modifier in &term.modifiers {
        match *modifier {
            DieModifier::RerollBelow(below) => {
                let mut rerolled = Vec::with_capacity(results.len());
                for result in results {
                    if result.active && result.value < below {
                        rerolled.push(DieResult {
                            value: result.value,
                            active: false,
                        });
                        rerolled.push(DieResult::active(roller.roll(term.faces)));
                    } else {
                        rerolled.push(result);
                    }
                }
                results = rerolled;
            }
            DieModifier::KeepHighest(keep) | DieModifier::KeepLowest(keep) => {
                let highest = matches!(modifier, DieModifier::KeepHighest(_));
                let mut order: Vec<usize> = (0..results.len())
                    .filter(|&i| results[i].active)
                    .collect();
                // Stable sort keeps the earlier die on ties
                if highest {
                    order.sort_by(|&a, &b| results[b].value.cmp(&results[a].value));
                } else {
                    order.sort_by(|&a, &b| results[a].value.cmp(&results[b].value));
                }
                for &i in order.iter().skip(keep as usize) {
                    results[i].active = false;
                }
            }
            DieModifier::Minimum(min) => {
                for result in results.iter_mut().filter(|r| r.active) {
                    result.value = result.value.max(min);
                }
            }
        }
    }

    Ok(DieOutcome {
        faces: term.faces,
        results,
    })
}
