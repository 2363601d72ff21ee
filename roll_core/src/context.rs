//! RollContext - state shared by the requests of one run

use crate::item::Item;
use dice_core::{EvaluatedRoll, MultiRollOutcome};
use tracing::debug;

/// Mutable state threaded through one pipeline run
///
/// The crit flag only ever goes from false to true, and the dice pool only
/// grows; both are handed over once when the run finishes.
#[derive(Debug, Clone, Default)]
pub struct RollContext {
    is_crit: bool,
    has_attack: bool,
    has_damage: bool,
    dice_pool: Vec<EvaluatedRoll>,
    ammo: Option<Item>,
}

impl RollContext {
    /// Fresh context; `ammo` is the ammunition fired with the item, if any
    pub fn new(ammo: Option<Item>) -> Self {
        RollContext {
            ammo,
            ..Default::default()
        }
    }

    pub fn is_crit(&self) -> bool {
        self.is_crit
    }

    pub fn has_attack(&self) -> bool {
        self.has_attack
    }

    pub fn has_damage(&self) -> bool {
        self.has_damage
    }

    pub fn ammo(&self) -> Option<&Item> {
        self.ammo.as_ref()
    }

    pub fn dice_pool(&self) -> &[EvaluatedRoll] {
        &self.dice_pool
    }

    pub(crate) fn mark_attack(&mut self) {
        self.has_attack = true;
    }

    pub(crate) fn mark_damage(&mut self) {
        self.has_damage = true;
    }

    /// Pool every evaluation of a multi-roll and take over its crit
    pub(crate) fn record_outcome(&mut self, outcome: &MultiRollOutcome) {
        self.dice_pool.extend(outcome.rolls().cloned());
        if outcome.flips_crit() && !self.is_crit {
            debug!(formula = %outcome.formula, "roll is critical");
            self.is_crit = true;
        }
    }

    pub(crate) fn record_roll(&mut self, roll: &EvaluatedRoll) {
        self.dice_pool.push(roll.clone());
    }

    /// Hand over the dice pool, ending the run
    pub(crate) fn into_pool(self) -> Vec<EvaluatedRoll> {
        self.dice_pool
    }
}
