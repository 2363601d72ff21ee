//! Item - weapons, spells, features and consumables that can be rolled

use crate::preset::QuickRollPresets;
use crate::types::{Ability, ActionType, DamageType, ItemKind};
use dice_core::Bindings;
use serde::{Deserialize, Serialize};

/// An owned item with everything needed to roll it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    /// Ability used for attack, check and damage modifiers
    #[serde(default)]
    pub ability: Option<Ability>,
    /// Proficiency multiplier (0 = not proficient)
    #[serde(default)]
    pub proficient: f64,
    #[serde(default)]
    pub finesse: bool,
    #[serde(default)]
    pub attack_bonus: Option<String>,
    #[serde(default)]
    pub check_bonus: Option<String>,
    #[serde(default)]
    pub damage: Damage,
    /// The "other" formula
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub chat_flavor: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub save: Option<SaveSpec>,
    /// Spell level, 0 for cantrips
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub scaling: Scaling,
    #[serde(default)]
    pub uses: Uses,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub recharge: Option<Recharge>,
    #[serde(default)]
    pub consume: Option<ConsumeTarget>,
    #[serde(default)]
    pub crit: CritSettings,
    /// Using the item places an area template
    #[serde(default)]
    pub area_target: bool,
    /// Footer properties, e.g. weapon properties or spell components
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub presets: Option<QuickRollPresets>,
}

fn default_quantity() -> u32 {
    1
}

impl Item {
    /// Create an item with no damage, uses or presets
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ItemKind) -> Self {
        Item {
            id: id.into(),
            name: name.into(),
            kind,
            action_type: None,
            ability: None,
            proficient: 0.0,
            finesse: false,
            attack_bonus: None,
            check_bonus: None,
            damage: Damage::default(),
            formula: None,
            chat_flavor: None,
            description: String::new(),
            save: None,
            level: 0,
            scaling: Scaling::default(),
            uses: Uses::default(),
            quantity: default_quantity(),
            recharge: None,
            consume: None,
            crit: CritSettings::default(),
            area_target: false,
            properties: Vec::new(),
            presets: None,
        }
    }

    pub fn with_action(mut self, action_type: ActionType) -> Self {
        self.action_type = Some(action_type);
        self
    }

    pub fn with_damage(
        mut self,
        formula: impl Into<String>,
        damage_type: Option<DamageType>,
    ) -> Self {
        self.damage.parts.push(DamagePart {
            formula: formula.into(),
            damage_type,
        });
        self
    }

    /// True for melee and ranged weapon or spell attacks
    pub fn is_attack(&self) -> bool {
        self.action_type.is_some_and(ActionType::is_attack)
    }

    pub fn is_weapon_attack(&self) -> bool {
        self.action_type.is_some_and(ActionType::is_weapon_attack)
    }

    /// Tools and ability-check actions roll a check
    pub fn is_check(&self) -> bool {
        self.kind == ItemKind::Tool || self.action_type == Some(ActionType::Abil)
    }

    pub fn has_save(&self) -> bool {
        self.save.is_some()
    }

    /// Other formula, when one is set
    pub fn other_formula(&self) -> Option<&str> {
        self.formula.as_deref().filter(|f| !f.trim().is_empty())
    }

    /// Versatile formula, when one is set
    pub fn versatile_formula(&self) -> Option<&str> {
        self.damage
            .versatile
            .as_deref()
            .filter(|f| !f.trim().is_empty())
    }

    /// Item data exposed to formulas under `item.`
    ///
    /// `level` is the level the item is used at; spells cast with a higher
    /// slot report that slot.
    pub fn roll_bindings(&self, level: Option<u8>) -> Bindings {
        let mut bindings = Bindings::new();
        bindings.insert("level", level.unwrap_or(self.level));
        bindings.insert("quantity", self.quantity);
        bindings.insert("uses.value", self.uses.value);
        bindings.insert("uses.max", self.uses.max);
        bindings
    }
}

/// One damage line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamagePart {
    pub formula: String,
    #[serde(default)]
    pub damage_type: Option<DamageType>,
}

/// Damage lines plus the versatile alternative for the first line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Damage {
    #[serde(default)]
    pub parts: Vec<DamagePart>,
    #[serde(default)]
    pub versatile: Option<String>,
}

/// Saving throw forced by the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSpec {
    pub ability: Ability,
    /// Flat DC; the actor's spell DC when unset
    #[serde(default)]
    pub dc: Option<u32>,
}

/// How damage grows with caster or slot level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    #[default]
    None,
    /// Grows with character level (5, 11, 17)
    Cantrip,
    /// Grows with every slot above the spell's level
    Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scaling {
    #[serde(default)]
    pub mode: ScalingMode,
    /// Formula added per step; blank scales by the damage formula itself
    #[serde(default)]
    pub formula: String,
}

/// Limited uses of an item
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Uses {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub max: u32,
    /// Recovery period, e.g. "day" or "charges"
    #[serde(default)]
    pub per: Option<String>,
    /// Remove the item once the last one is used
    #[serde(default)]
    pub auto_destroy: bool,
}

impl Uses {
    /// True when the item tracks uses at all
    pub fn is_configured(&self) -> bool {
        self.value > 0 || self.max > 0 || self.per.is_some()
    }
}

/// Recharge gate, e.g. "recharge 5-6"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recharge {
    /// Lowest d6 face that recharges
    #[serde(default)]
    pub value: u8,
    #[serde(default)]
    pub charged: bool,
}

/// What kind of resource an item consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeKind {
    Ammo,
    Attribute,
    Material,
    Charges,
}

/// Linked resource consumed when the item is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeTarget {
    #[serde(rename = "type")]
    pub kind: ConsumeKind,
    /// Item id or attribute path
    pub target: String,
    #[serde(default = "default_amount")]
    pub amount: u32,
}

fn default_amount() -> u32 {
    1
}

/// Per-item critical hit settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CritSettings {
    /// Lowest d20 face that crits
    #[serde(default)]
    pub threshold: Option<u32>,
    /// Damage line rolled once more on a crit
    #[serde(default)]
    pub extra_damage: Option<usize>,
    /// Dice added to every crit roll, e.g. "1d8"
    #[serde(default)]
    pub bonus_dice: Option<String>,
}
