//! dice_core - Dice formulas, evaluation and crit classification
//!
//! This library provides:
//! - Formula: Parsed dice formula with structural rewriting (alter, crit dice)
//! - RandomSource: The capability that turns a formula into an EvaluatedRoll
//! - Crit classification of individual die outcomes
//! - MultiRoll: Repeated evaluation with advantage/disadvantage selection
//! - Scaling: Level and slot based formula growth
//!
//! # Quick Start
//!
//! ```rust
//! use dice_core::{Bindings, MultiRoll, RngSource, SelectionMode};
//!
//! let mut source = RngSource::seeded(7);
//! let mut bindings = Bindings::new();
//! bindings.insert("abl", 3);
//!
//! let outcome = MultiRoll::new("1d20")
//!     .with_count(2)
//!     .with_terms(["@abl"])
//!     .with_selection(SelectionMode::Highest)
//!     .resolve(&mut source, &bindings)
//!     .unwrap();
//! assert_eq!(outcome.chosen().count(), 1);
//! ```

pub mod bindings;
pub mod crit;
pub mod evaluate;
pub mod formula;
pub mod multiroll;
pub mod scaling;
pub mod source;

pub use bindings::Bindings;
pub use crit::{classify, classify_dice, CritClassification, CritType, DiceFilter};
pub use evaluate::{
    evaluate, DieOutcome, DieResult, DieRoller, EvaluatedRoll, Maximizer, RngRoller, SequenceRoller,
};
pub use formula::{DiceTerm, DieModifier, Formula, MathFunction, Operator, Term, MAX_DICE};
pub use multiroll::{MultiRoll, MultiRollEntry, MultiRollOutcome, SelectionMode};
pub use scaling::{cantrip_steps, scale, slot_steps};
pub use source::{RandomSource, RngSource, ScriptedSource};

use thiserror::Error;

/// Error parsing or evaluating a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("Empty formula")]
    Empty,
    #[error("Unexpected '{found}' at position {position}")]
    UnexpectedChar { position: usize, found: char },
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
    #[error("Invalid dice term: {0}")]
    InvalidDice(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Division by zero")]
    DivisionByZero,
}
