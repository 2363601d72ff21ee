//! Crit classification of evaluated rolls

use crate::evaluate::{DieOutcome, EvaluatedRoll};
use serde::{Deserialize, Serialize};

/// How a roll's dice landed relative to the crit threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritType {
    #[default]
    None,
    /// At least one die met the threshold
    Success,
    /// At least one die showed a 1
    Failure,
    /// Both a threshold die and a 1
    Mixed,
}

/// Which dice take part in classification
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceFilter {
    #[default]
    All,
    /// Only dice with one of these face counts
    Faces(Vec<u32>),
}

impl DiceFilter {
    pub fn accepts(&self, faces: u32) -> bool {
        match self {
            DiceFilter::All => true,
            DiceFilter::Faces(list) => list.contains(&faces),
        }
    }
}

/// Result of classifying one or more evaluated rolls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CritClassification {
    pub crit_type: CritType,
    /// Two or more dice met the threshold
    pub is_crit: bool,
    /// Dice at or above the threshold
    pub high: u32,
    /// Dice showing 1
    pub low: u32,
}

impl CritClassification {
    fn from_counts(high: u32, low: u32) -> Self {
        let crit_type = match (high > 0, low > 0) {
            (true, true) => CritType::Mixed,
            (true, false) => CritType::Success,
            (false, true) => CritType::Failure,
            (false, false) => CritType::None,
        };
        CritClassification {
            crit_type,
            is_crit: high >= 2,
            high,
            low,
        }
    }
}

/// Classify an evaluated roll
///
/// Only active dice with more than one face that pass `filter` are considered.
/// A die is high when it shows at least `threshold` (its own face count when no
/// threshold is given) and low when it shows 1. `is_crit` needs two high dice:
/// a single natural 20 is a `Success` but not a crit.
pub fn classify(
    roll: &EvaluatedRoll,
    threshold: Option<u32>,
    filter: &DiceFilter,
) -> CritClassification {
    classify_dice(roll.dice.iter(), threshold, filter)
}

/// Classify a pool of dice drawn from any number of rolls
pub fn classify_dice<'a>(
    dice: impl IntoIterator<Item = &'a DieOutcome>,
    threshold: Option<u32>,
    filter: &DiceFilter,
) -> CritClassification {
    let mut high = 0;
    let mut low = 0;
    for die in dice {
        if die.faces <= 1 || !filter.accepts(die.faces) {
            continue;
        }
        let needed = threshold.unwrap_or(die.faces);
        for value in die.active_values() {
            if value >= needed {
                high += 1;
            } else if value == 1 {
                low += 1;
            }
        }
    }
    CritClassification::from_counts(high, low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::DieResult;
    use proptest::prelude::*;

    fn roll_of(faces: u32, values: &[u32]) -> EvaluatedRoll {
        EvaluatedRoll {
            formula: format!("{}d{}", values.len(), faces),
            total: values.iter().map(|&v| v as i64).sum(),
            dice: vec![DieOutcome {
                faces,
                results: values
                    .iter()
                    .map(|&value| DieResult { value, active: true })
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_single_natural_twenty_is_success_not_crit() {
        let roll = roll_of(20, &[20]);
        let class = classify(&roll, None, &DiceFilter::All);
        assert_eq!(class.crit_type, CritType::Success);
        assert!(!class.is_crit);
    }

    #[test]
    fn test_two_high_dice_crit() {
        let roll = roll_of(20, &[20, 19]);
        let class = classify(&roll, Some(19), &DiceFilter::All);
        assert_eq!(class.crit_type, CritType::Success);
        assert!(class.is_crit);
        assert_eq!(class.high, 2);
    }

    #[test]
    fn test_failure_and_mixed() {
        let class = classify(&roll_of(20, &[1]), None, &DiceFilter::All);
        assert_eq!(class.crit_type, CritType::Failure);

        let class = classify(&roll_of(20, &[20, 1]), None, &DiceFilter::All);
        assert_eq!(class.crit_type, CritType::Mixed);
        assert!(!class.is_crit);
    }

    #[test]
    fn test_filter_and_single_faced_dice() {
        let mut roll = roll_of(20, &[20]);
        roll.dice.push(DieOutcome {
            faces: 6,
            results: vec![DieResult { value: 6, active: true }],
        });
        roll.dice.push(DieOutcome {
            faces: 1,
            results: vec![DieResult { value: 1, active: true }],
        });

        let all = classify(&roll, None, &DiceFilter::All);
        assert_eq!(all.high, 2);
        assert_eq!(all.low, 0);

        let d20_only = classify(&roll, None, &DiceFilter::Faces(vec![20]));
        assert_eq!(d20_only.high, 1);
    }

    #[test]
    fn test_inactive_dice_ignored() {
        let mut roll = roll_of(20, &[1, 12]);
        roll.dice[0].results[0].active = false;
        let class = classify(&roll, None, &DiceFilter::All);
        assert_eq!(class.crit_type, CritType::None);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let roll = roll_of(20, &[20, 1, 20]);
        let first = classify(&roll, Some(18), &DiceFilter::All);
        let second = classify(&roll, Some(18), &DiceFilter::All);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_mixed_iff_high_and_one(
            values in proptest::collection::vec(1u32..=20, 1..6),
            threshold in 2u32..=20,
        ) {
            let roll = roll_of(20, &values);
            let class = classify(&roll, Some(threshold), &DiceFilter::All);
            let has_high = values.iter().any(|&v| v >= threshold);
            let has_one = values.iter().any(|&v| v == 1);
            prop_assert_eq!(class.crit_type == CritType::Mixed, has_high && has_one);
        }

        #[test]
        fn prop_crit_iff_two_high(
            values in proptest::collection::vec(1u32..=20, 1..6),
            threshold in 2u32..=20,
        ) {
            let roll = roll_of(20, &values);
            let class = classify(&roll, Some(threshold), &DiceFilter::All);
            let high = values.iter().filter(|&&v| v >= threshold).count();
            prop_assert_eq!(class.is_crit, high >= 2);
        }
    }
}
