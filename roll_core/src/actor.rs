//! Actor - the creature that owns and uses items

use crate::item::Item;
use crate::types::{Ability, ActionType, ActorKind, SlotLevel};
use dice_core::Bindings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A character or creature that rolls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: ActorKind,
    /// Character level, or challenge rating for creatures
    #[serde(default = "default_level")]
    pub level: u32,
    /// Class name to class levels
    #[serde(default)]
    pub classes: BTreeMap<String, u32>,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default = "default_proficiency")]
    pub proficiency: i64,
    #[serde(default)]
    pub spellcasting: Option<Ability>,
    /// Explicit spell save DC; derived from the spellcasting ability when unset
    #[serde(default)]
    pub spell_dc: Option<u32>,
    #[serde(default)]
    pub spells: SpellSlots,
    #[serde(default)]
    pub bonuses: ActorBonuses,
    #[serde(default)]
    pub traits: ActorTraits,
    #[serde(default)]
    pub weapon_crit_threshold: Option<u32>,
    #[serde(default)]
    pub skills: BTreeMap<String, Skill>,
    #[serde(default)]
    pub items: Vec<Item>,
}

fn default_level() -> u32 {
    1
}

fn default_proficiency() -> i64 {
    2
}

impl Actor {
    /// Create a level 1 character with all abilities at 10
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            name: name.into(),
            kind: ActorKind::Character,
            level: default_level(),
            classes: BTreeMap::new(),
            abilities: AbilityScores::default(),
            proficiency: default_proficiency(),
            spellcasting: None,
            spell_dc: None,
            spells: SpellSlots::default(),
            bonuses: ActorBonuses::default(),
            traits: ActorTraits::default(),
            weapon_crit_threshold: None,
            skills: BTreeMap::new(),
            items: Vec::new(),
        }
    }

    /// Ability modifier, `floor((score - 10) / 2)`
    pub fn modifier(&self, ability: Ability) -> i64 {
        self.abilities.get(ability).modifier()
    }

    /// Level used for level-based scaling
    ///
    /// Characters with classes use the sum of their class levels.
    pub fn character_level(&self) -> u32 {
        match self.kind {
            ActorKind::Character if !self.classes.is_empty() => self.classes.values().sum(),
            _ => self.level,
        }
    }

    /// Spell save DC: explicit value or `8 + proficiency + spellcasting mod`
    pub fn spell_dc(&self) -> u32 {
        if let Some(dc) = self.spell_dc {
            return dc;
        }
        let modifier = self.spellcasting.map(|a| self.modifier(a)).unwrap_or(0);
        (8 + self.proficiency + modifier).max(0) as u32
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Remove an item from the inventory, returning it
    pub fn remove_item(&mut self, id: &str) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Add an item, builder style
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Actor data exposed to formulas
    ///
    /// Paths: `abilities.<abl>.mod`, `abilities.<abl>.value`, `attributes.prof`,
    /// `prof`, `attributes.spelldc`, `details.level`, `classes.<name>.levels`,
    /// and `bonuses.<action>.attack|damage` when set.
    pub fn roll_bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        for ability in Ability::ALL {
            let score = self.abilities.get(ability);
            bindings.insert(format!("abilities.{}.mod", ability.key()), score.modifier());
            bindings.insert(format!("abilities.{}.value", ability.key()), score.value);
        }
        bindings.insert("attributes.prof", self.proficiency);
        bindings.insert("prof", self.proficiency);
        bindings.insert("attributes.spelldc", self.spell_dc());
        bindings.insert("details.level", self.character_level());
        for (name, levels) in &self.classes {
            bindings.insert(format!("classes.{}.levels", name), levels);
        }
        for action in ActorBonuses::ACTIONS {
            if let Some(bonus) = self.bonuses.action(action) {
                if let Some(attack) = &bonus.attack {
                    bindings.insert(format!("bonuses.{}.attack", action.key()), attack);
                }
                if let Some(damage) = &bonus.damage {
                    bindings.insert(format!("bonuses.{}.damage", action.key()), damage);
                }
            }
        }
        bindings
    }
}

/// One ability score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityScore {
    pub value: i64,
    /// Saving throw proficiency multiplier
    #[serde(default)]
    pub save_proficiency: f64,
}

impl AbilityScore {
    pub fn new(value: i64) -> Self {
        AbilityScore {
            value,
            save_proficiency: 0.0,
        }
    }

    pub fn modifier(&self) -> i64 {
        (self.value - 10).div_euclid(2)
    }
}

impl Default for AbilityScore {
    fn default() -> Self {
        AbilityScore::new(10)
    }
}

/// All six ability scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityScores {
    pub str: AbilityScore,
    pub dex: AbilityScore,
    pub con: AbilityScore,
    pub int: AbilityScore,
    pub wis: AbilityScore,
    pub cha: AbilityScore,
}

impl AbilityScores {
    pub fn get(&self, ability: Ability) -> &AbilityScore {
        match ability {
            Ability::Str => &self.str,
            Ability::Dex => &self.dex,
            Ability::Con => &self.con,
            Ability::Int => &self.int,
            Ability::Wis => &self.wis,
            Ability::Cha => &self.cha,
        }
    }

    pub fn get_mut(&mut self, ability: Ability) -> &mut AbilityScore {
        match ability {
            Ability::Str => &mut self.str,
            Ability::Dex => &mut self.dex,
            Ability::Con => &mut self.con,
            Ability::Int => &mut self.int,
            Ability::Wis => &mut self.wis,
            Ability::Cha => &mut self.cha,
        }
    }
}

/// Remaining and maximum slots of one spell level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotPool {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub max: u32,
}

impl SlotPool {
    pub fn new(value: u32, max: u32) -> Self {
        SlotPool { value, max }
    }
}

/// Pact magic slots, all cast at one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PactSlots {
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub level: u8,
}

/// Spell slots by level plus pact slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellSlots {
    pub spell1: SlotPool,
    pub spell2: SlotPool,
    pub spell3: SlotPool,
    pub spell4: SlotPool,
    pub spell5: SlotPool,
    pub spell6: SlotPool,
    pub spell7: SlotPool,
    pub spell8: SlotPool,
    pub spell9: SlotPool,
    pub pact: PactSlots,
}

impl SpellSlots {
    /// Slots remaining for a slot choice; `None` for levels outside 1-9
    pub fn remaining(&self, slot: SlotLevel) -> Option<u32> {
        match slot {
            SlotLevel::Pact => Some(self.pact.value),
            SlotLevel::Level(level) => self.level(level).map(|pool| pool.value),
        }
    }

    /// Use one slot; returns the slots left, or `None` when none were available
    pub fn spend(&mut self, slot: SlotLevel) -> Option<u32> {
        let value = match slot {
            SlotLevel::Pact => &mut self.pact.value,
            SlotLevel::Level(level) => &mut self.level_mut(level)?.value,
        };
        if *value == 0 {
            return None;
        }
        *value -= 1;
        Some(*value)
    }

    pub fn level(&self, level: u8) -> Option<&SlotPool> {
        match level {
            1 => Some(&self.spell1),
            2 => Some(&self.spell2),
            3 => Some(&self.spell3),
            4 => Some(&self.spell4),
            5 => Some(&self.spell5),
            6 => Some(&self.spell6),
            7 => Some(&self.spell7),
            8 => Some(&self.spell8),
            9 => Some(&self.spell9),
            _ => None,
        }
    }

    pub fn level_mut(&mut self, level: u8) -> Option<&mut SlotPool> {
        match level {
            1 => Some(&mut self.spell1),
            2 => Some(&mut self.spell2),
            3 => Some(&mut self.spell3),
            4 => Some(&mut self.spell4),
            5 => Some(&mut self.spell5),
            6 => Some(&mut self.spell6),
            7 => Some(&mut self.spell7),
            8 => Some(&mut self.spell8),
            9 => Some(&mut self.spell9),
            _ => None,
        }
    }
}

/// Formula bonuses added to attack and damage rolls of one action type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionBonus {
    #[serde(default)]
    pub attack: Option<String>,
    #[serde(default)]
    pub damage: Option<String>,
}

/// Global roll bonuses of an actor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorBonuses {
    pub mwak: ActionBonus,
    pub rwak: ActionBonus,
    pub msak: ActionBonus,
    pub rsak: ActionBonus,
    /// Added to every ability check
    pub ability_check: Option<String>,
    /// Added to every saving throw
    pub ability_save: Option<String>,
    /// Added to every skill check
    pub skill: Option<String>,
}

impl ActorBonuses {
    const ACTIONS: [ActionType; 4] = [
        ActionType::Mwak,
        ActionType::Rwak,
        ActionType::Msak,
        ActionType::Rsak,
    ];

    /// Bonuses for an attack action type
    pub fn action(&self, action: ActionType) -> Option<&ActionBonus> {
        match action {
            ActionType::Mwak => Some(&self.mwak),
            ActionType::Rwak => Some(&self.rwak),
            ActionType::Msak => Some(&self.msak),
            ActionType::Rsak => Some(&self.rsak),
            _ => None,
        }
    }

    pub fn attack(&self, action: ActionType) -> Option<&str> {
        self.action(action)
            .and_then(|b| b.attack.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn damage(&self, action: ActionType) -> Option<&str> {
        self.action(action)
            .and_then(|b| b.damage.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Special traits that change how d20s are rolled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorTraits {
    /// Reroll natural 1s on d20s
    pub halfling_lucky: bool,
    /// Third attack die on advantage with dex, int, wis or cha
    pub elven_accuracy: bool,
    /// One extra weapon damage die on crits
    pub savage_attacks: bool,
    /// Proficient skill checks never show less than 10
    pub reliable_talent: bool,
    /// Half proficiency on checks without proficiency
    pub jack_of_all_trades: bool,
}

/// A skill and the actor's training in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub ability: Ability,
    /// Proficiency multiplier: 0, 0.5, 1 or 2
    #[serde(default)]
    pub proficiency: f64,
    #[serde(default)]
    pub bonus: i64,
}
