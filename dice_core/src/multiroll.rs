//! Multi-roll resolution - repeated evaluation with advantage/disadvantage

use crate::bindings::Bindings;
use crate::crit::{classify, classify_dice, CritClassification, CritType, DiceFilter};
use crate::evaluate::EvaluatedRoll;
use crate::formula::Formula;
use crate::source::RandomSource;
use crate::FormulaError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Which evaluation of a multi-roll counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Every evaluation counts
    #[default]
    None,
    /// Advantage: keep the highest total
    Highest,
    /// Disadvantage: keep the lowest total
    Lowest,
}

impl SelectionMode {
    /// Derive the mode from advantage and disadvantage counts; equal counts cancel
    pub fn from_counts(adv: u32, disadv: u32) -> Self {
        match adv.cmp(&disadv) {
            Ordering::Greater => SelectionMode::Highest,
            Ordering::Less => SelectionMode::Lowest,
            Ordering::Equal => SelectionMode::None,
        }
    }

    pub fn is_selecting(self) -> bool {
        self != SelectionMode::None
    }
}

/// Configuration for rolling the same formula several times
///
/// ```rust
/// use dice_core::{Bindings, MultiRoll, ScriptedSource, SelectionMode};
///
/// let mut source = ScriptedSource::new([8, 15]);
/// let outcome = MultiRoll::new("1d20")
///     .with_count(2)
///     .with_selection(SelectionMode::Highest)
///     .resolve(&mut source, &Bindings::new())
///     .unwrap();
/// assert_eq!(outcome.total(), Some(15));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiRoll {
    formula: String,
    terms: Vec<String>,
    count: u32,
    crit_threshold: Option<u32>,
    selection: SelectionMode,
    triggers_crit: bool,
}

impl MultiRoll {
    pub fn new(formula: impl Into<String>) -> Self {
        MultiRoll {
            formula: formula.into(),
            terms: Vec::new(),
            count: 1,
            crit_threshold: None,
            selection: SelectionMode::None,
            triggers_crit: false,
        }
    }

    /// Number of evaluations (at least one)
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    /// Extra terms added to the base formula
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms.extend(terms.into_iter().map(Into::into));
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.terms.push(term.into());
        self
    }

    pub fn with_crit_threshold(mut self, threshold: Option<u32>) -> Self {
        self.crit_threshold = threshold;
        self
    }

    pub fn with_selection(mut self, selection: SelectionMode) -> Self {
        self.selection = selection;
        self
    }

    /// Whether a crit on this roll may mark the whole action as critical
    pub fn triggering_crit(mut self, triggers_crit: bool) -> Self {
        self.triggers_crit = triggers_crit;
        self
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// The base formula joined with every extra term
    pub fn formula(&self) -> String {
        let mut parts = Vec::with_capacity(self.terms.len() + 1);
        parts.push(self.formula.as_str());
        parts.extend(self.terms.iter().map(String::as_str));
        Formula::compose(&parts)
    }

    /// Evaluate the formula `count` times and apply selection
    ///
    /// Only dice sharing the face count of the formula's first die are checked
    /// for crits. The outcome's classification pools the dice of every
    /// evaluation that was not ignored.
    pub fn resolve(
        &self,
        source: &mut dyn RandomSource,
        bindings: &Bindings,
    ) -> Result<MultiRollOutcome, FormulaError> {
        let formula = self.formula();
        let filter = match Formula::parse(&formula)?.first_die_faces() {
            Some(faces) => DiceFilter::Faces(vec![faces]),
            None => DiceFilter::All,
        };

        let rolls = (0..self.count)
            .map(|_| source.evaluate(&formula, bindings))
            .collect::<Result<Vec<_>, _>>()?;
        let chosen = select(&rolls, self.selection);

        let entries: Vec<MultiRollEntry> = rolls
            .into_iter()
            .enumerate()
            .map(|(i, roll)| {
                let classification = classify(&roll, self.crit_threshold, &filter);
                MultiRollEntry {
                    ignored: chosen.is_some_and(|c| c != i),
                    roll,
                    classification,
                }
            })
            .collect();

        let pooled = classify_dice(
            entries
                .iter()
                .filter(|e| !e.ignored)
                .flat_map(|e| e.roll.dice.iter()),
            self.crit_threshold,
            &filter,
        );

        let shared_formula = entries
            .first()
            .map(|e| e.roll.formula.clone())
            .unwrap_or(formula);

        debug!(
            formula = %shared_formula,
            count = self.count,
            selection = ?self.selection,
            crit_type = ?pooled.crit_type,
            is_crit = pooled.is_crit,
            "multi-roll resolved"
        );

        Ok(MultiRollOutcome {
            formula: shared_formula,
            entries,
            selection: self.selection,
            crit_type: pooled.crit_type,
            is_crit: pooled.is_crit,
            triggers_crit: self.triggers_crit,
        })
    }
}

/// Index of the evaluation kept by `mode`, first occurrence on ties
fn select(rolls: &[EvaluatedRoll], mode: SelectionMode) -> Option<usize> {
    let better: fn(i64, i64) -> bool = match mode {
        SelectionMode::None => return None,
        SelectionMode::Highest => |candidate: i64, best: i64| candidate > best,
        SelectionMode::Lowest => |candidate: i64, best: i64| candidate < best,
    };

    let mut best: Option<(usize, i64)> = None;
    for (i, roll) in rolls.iter().enumerate() {
        match best {
            Some((_, total)) if !better(roll.total, total) => {}
            _ => best = Some((i, roll.total)),
        }
    }
    best.map(|(i, _)| i)
}

/// One evaluation of a multi-roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiRollEntry {
    pub roll: EvaluatedRoll,
    /// Dropped by advantage/disadvantage selection
    pub ignored: bool,
    pub classification: CritClassification,
}

/// Every evaluation of a multi-roll plus the derived crit state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiRollOutcome {
    pub formula: String,
    pub entries: Vec<MultiRollEntry>,
    pub selection: SelectionMode,
    pub crit_type: CritType,
    pub is_crit: bool,
    pub triggers_crit: bool,
}

impl MultiRollOutcome {
    /// Evaluations that were not ignored
    pub fn chosen(&self) -> impl Iterator<Item = &MultiRollEntry> {
        self.entries.iter().filter(|e| !e.ignored)
    }

    /// Total of the first chosen evaluation
    pub fn total(&self) -> Option<i64> {
        self.chosen().next().map(|e| e.roll.total)
    }

    pub fn rolls(&self) -> impl Iterator<Item = &EvaluatedRoll> {
        self.entries.iter().map(|e| &e.roll)
    }

    /// True when this outcome marks the whole action as critical
    pub fn flips_crit(&self) -> bool {
        self.triggers_crit && self.is_crit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RngSource, ScriptedSource};
    use proptest::prelude::*;

    #[test]
    fn test_selection_from_counts() {
        assert_eq!(SelectionMode::from_counts(1, 0), SelectionMode::Highest);
        assert_eq!(SelectionMode::from_counts(0, 2), SelectionMode::Lowest);
        assert_eq!(SelectionMode::from_counts(1, 1), SelectionMode::None);
        assert_eq!(SelectionMode::from_counts(0, 0), SelectionMode::None);
    }

    #[test]
    fn test_highest_keeps_first_of_ties() {
        let mut source = ScriptedSource::new([5, 17, 17]);
        let outcome = MultiRoll::new("1d20")
            .with_count(3)
            .with_selection(SelectionMode::Highest)
            .resolve(&mut source, &Bindings::new())
            .unwrap();

        let ignored: Vec<bool> = outcome.entries.iter().map(|e| e.ignored).collect();
        assert_eq!(ignored, vec![true, false, true]);
        assert_eq!(outcome.total(), Some(17));
    }

    #[test]
    fn test_lowest_selection() {
        let mut source = ScriptedSource::new([12, 3]);
        let outcome = MultiRoll::new("1d20")
            .with_term("4")
            .with_count(2)
            .with_selection(SelectionMode::Lowest)
            .resolve(&mut source, &Bindings::new())
            .unwrap();
        assert_eq!(outcome.total(), Some(7));
        assert_eq!(outcome.formula, "1d20 + 4");
    }

    #[test]
    fn test_no_selection_keeps_all() {
        let mut source = ScriptedSource::new([12, 3]);
        let outcome = MultiRoll::new("1d20")
            .with_count(2)
            .resolve(&mut source, &Bindings::new())
            .unwrap();
        assert_eq!(outcome.chosen().count(), 2);
    }

    #[test]
    fn test_single_twenty_does_not_crit() {
        let mut source = ScriptedSource::new([20]);
        let outcome = MultiRoll::new("1d20")
            .triggering_crit(true)
            .resolve(&mut source, &Bindings::new())
            .unwrap();
        assert_eq!(outcome.crit_type, CritType::Success);
        assert!(!outcome.is_crit);
        assert!(!outcome.flips_crit());
    }

    #[test]
    fn test_two_kept_twenties_crit() {
        let mut source = ScriptedSource::new([20, 20]);
        let outcome = MultiRoll::new("1d20")
            .with_count(2)
            .triggering_crit(true)
            .resolve(&mut source, &Bindings::new())
            .unwrap();
        assert!(outcome.is_crit);
        assert!(outcome.flips_crit());
    }

    #[test]
    fn test_ignored_rolls_excluded_from_crit() {
        // Elven accuracy: three rolls, one kept
        let mut source = ScriptedSource::new([20, 20, 20]);
        let outcome = MultiRoll::new("1d20")
            .with_count(3)
            .with_selection(SelectionMode::Highest)
            .triggering_crit(true)
            .resolve(&mut source, &Bindings::new())
            .unwrap();
        assert_eq!(outcome.chosen().count(), 1);
        assert_eq!(outcome.crit_type, CritType::Success);
        assert!(!outcome.is_crit);
    }

    #[test]
    fn test_non_triggering_never_flips() {
        let mut source = ScriptedSource::new([20, 20]);
        let outcome = MultiRoll::new("1d20")
            .with_count(2)
            .resolve(&mut source, &Bindings::new())
            .unwrap();
        assert!(outcome.is_crit);
        assert!(!outcome.flips_crit());
    }

    #[test]
    fn test_crit_threshold_and_damage_dice_filter() {
        // Only the d20 is checked, the d6 bonus is not
        let mut source = ScriptedSource::new([19, 6, 18, 6]);
        let outcome = MultiRoll::new("1d20")
            .with_term("1d6")
            .with_count(2)
            .with_crit_threshold(Some(18))
            .resolve(&mut source, &Bindings::new())
            .unwrap();
        assert!(outcome.is_crit);
        assert_eq!(outcome.entries[0].classification.high, 1);
    }

    proptest! {
        #[test]
        fn prop_highest_selects_first_max(seed in any::<u64>(), count in 1u32..6) {
            let mut source = RngSource::seeded(seed);
            let outcome = MultiRoll::new("1d20")
                .with_count(count)
                .with_selection(SelectionMode::Highest)
                .resolve(&mut source, &Bindings::new())
                .unwrap();

            let totals: Vec<i64> = outcome.rolls().map(|r| r.total).collect();
            let max = *totals.iter().max().unwrap();
            let first = totals.iter().position(|&t| t == max).unwrap();
            prop_assert_eq!(outcome.chosen().count(), 1);
            prop_assert!(!outcome.entries[first].ignored);
            prop_assert_eq!(outcome.entries.len(), count as usize);
        }

        #[test]
        fn prop_lowest_selects_first_min(seed in any::<u64>(), count in 1u32..6) {
            let mut source = RngSource::seeded(seed);
            let outcome = MultiRoll::new("1d20")
                .with_count(count)
                .with_selection(SelectionMode::Lowest)
                .resolve(&mut source, &Bindings::new())
                .unwrap();

            let totals: Vec<i64> = outcome.rolls().map(|r| r.total).collect();
            let min = *totals.iter().min().unwrap();
            let first = totals.iter().position(|&t| t == min).unwrap();
            prop_assert_eq!(outcome.chosen().count(), 1);
            prop_assert!(!outcome.entries[first].ignored);
        }
    }
}
