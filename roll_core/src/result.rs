//! Composite result - everything one run produced, in request order

use crate::labels::DamageLabels;
use crate::ledger::ConsumeOutcome;
use crate::types::{Ability, DamageType};
use dice_core::{EvaluatedRoll, MultiRollOutcome};
use serde::{Deserialize, Serialize};

/// Output of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub item_id: String,
    pub item_name: String,
    pub title: String,
    /// Cast level, when a spell was cast above its own level
    pub slot_level: Option<u8>,
    pub is_crit: bool,
    pub entries: Vec<ResultEntry>,
    /// Item properties, when requested
    pub properties: Vec<String>,
    /// Every evaluated roll of the run, in evaluation order
    pub dice_pool: Vec<EvaluatedRoll>,
    pub consumption: ConsumeOutcome,
}

impl CompositeResult {
    /// True when the item was used up and removed
    pub fn destroyed(&self) -> bool {
        self.consumption == ConsumeOutcome::Destroy
    }

    pub fn damage_entries(&self) -> impl Iterator<Item = &DamageEntry> {
        self.entries.iter().filter_map(|entry| match entry {
            ResultEntry::Damage(damage) | ResultEntry::Other(damage) => Some(damage),
            _ => None,
        })
    }

    /// The first attack roll, if any
    pub fn attack(&self) -> Option<&RollEntry> {
        self.entries.iter().find_map(|entry| match entry {
            ResultEntry::Attack(roll) => Some(roll),
            _ => None,
        })
    }
}

/// One rendered part of a composite result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultEntry {
    Attack(RollEntry),
    Check(RollEntry),
    Custom(RollEntry),
    Damage(DamageEntry),
    Other(DamageEntry),
    SaveDc(SaveDcEntry),
    Text { text: String },
    Flavor { text: String },
}

/// A d20-style multi-roll with its title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollEntry {
    pub title: Option<String>,
    pub outcome: MultiRollOutcome,
}

/// A damage roll with optional crit dice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEntry {
    pub labels: DamageLabels,
    pub damage_type: Option<DamageType>,
    pub versatile: bool,
    pub base: EvaluatedRoll,
    pub crit: Option<EvaluatedRoll>,
    /// Label shown next to the crit dice
    pub crit_label: Option<String>,
    pub max_base: i64,
    pub max_crit: Option<i64>,
}

impl DamageEntry {
    /// Base total plus crit total
    pub fn total(&self) -> i64 {
        self.base.total + self.crit.as_ref().map_or(0, |crit| crit.total)
    }
}

/// A save DC button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDcEntry {
    pub ability: Ability,
    pub dc: u32,
    /// Hide the number from viewers
    pub hidden: bool,
}
