//! Quick-roll presets - per-item request programs for one-click rolls

use crate::item::Item;
use crate::ledger::ConsumptionRequest;
use crate::request::{DamageArgs, DamageSelector, RollParams, RollRequest};
use serde::{Deserialize, Serialize};

/// Which of an item's two presets to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Primary,
    Alternate,
}

/// What one preset rolls
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickRollFlags {
    pub flavor: bool,
    pub description: bool,
    pub attack: bool,
    pub check: bool,
    pub save: bool,
    /// One flag per damage line
    pub damage: Vec<bool>,
    /// First damage line uses the versatile formula
    pub versatile: bool,
    pub other: bool,
    pub properties: bool,
    pub consume: ConsumptionRequest,
    pub template: bool,
}

/// Both presets of an item plus their shared labels
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickRollPresets {
    pub primary: QuickRollFlags,
    pub alternate: QuickRollFlags,
    /// Context label per damage line
    pub damage_context: Vec<Option<String>>,
    pub other_context: Option<String>,
}

impl QuickRollPresets {
    pub fn flags(&self, preset: Preset) -> &QuickRollFlags {
        match preset {
            Preset::Primary => &self.primary,
            Preset::Alternate => &self.alternate,
        }
    }

    /// Context label of damage line `index`
    pub fn damage_context(&self, index: usize) -> Option<&str> {
        self.damage_context
            .get(index)
            .and_then(|context| context.as_deref())
            .filter(|context| !context.is_empty())
    }
}

/// Build the run parameters and requests of an item's preset
///
/// Requests come in a fixed order: flavor, description, attack, check, save,
/// damage lines, other. Flags for things the item cannot do are skipped.
/// Items without presets show their description and properties.
pub fn build_preset(item: &Item, preset: Preset) -> (RollParams, Vec<RollRequest>) {
    let mut params = RollParams::default();
    let mut requests = Vec::new();

    let Some(presets) = &item.presets else {
        params.properties = true;
        requests.push(RollRequest::Description);
        return (params, requests);
    };
    let flags = presets.flags(preset);

    if flags.flavor && item.chat_flavor.is_some() {
        requests.push(RollRequest::Flavor { text: None });
    }
    if flags.description {
        requests.push(RollRequest::Description);
    }
    if flags.attack && item.is_attack() {
        requests.push(RollRequest::attack());
    }
    if flags.check && item.is_check() {
        requests.push(RollRequest::check());
    }
    if flags.save && item.has_save() {
        requests.push(RollRequest::save_dc());
    }
    for (index, _) in flags.damage.iter().enumerate().filter(|(_, on)| **on) {
        requests.push(RollRequest::Damage(DamageArgs {
            index: DamageSelector::Index(index),
            versatile: index == 0 && flags.versatile,
            ..Default::default()
        }));
    }
    if flags.other {
        requests.push(RollRequest::Other);
    }

    params.properties = flags.properties;
    params.consume = flags.consume;
    params.use_template = flags.template;

    (params, requests)
}
