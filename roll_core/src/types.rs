//! Shared enums for actors, items and damage

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six ability scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];

    /// Three-letter key used in formula paths (`abilities.dex.mod`)
    pub fn key(self) -> &'static str {
        match self {
            Ability::Str => "str",
            Ability::Dex => "dex",
            Ability::Con => "con",
            Ability::Int => "int",
            Ability::Wis => "wis",
            Ability::Cha => "cha",
        }
    }

    /// Abilities that let elven accuracy add a third attack die
    pub fn is_elven_accuracy_ability(self) -> bool {
        matches!(self, Ability::Dex | Ability::Int | Ability::Wis | Ability::Cha)
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ability::Str => "Strength",
            Ability::Dex => "Dexterity",
            Ability::Con => "Constitution",
            Ability::Int => "Intelligence",
            Ability::Wis => "Wisdom",
            Ability::Cha => "Charisma",
        };
        write!(f, "{}", name)
    }
}

/// Whether an actor is a player character or a non-player creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    #[default]
    Character,
    Npc,
}

/// Item categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Spell,
    Feat,
    Consumable,
    Equipment,
    Tool,
    #[default]
    Loot,
}

/// What kind of action using an item performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Melee weapon attack
    Mwak,
    /// Ranged weapon attack
    Rwak,
    /// Melee spell attack
    Msak,
    /// Ranged spell attack
    Rsak,
    Save,
    Heal,
    Abil,
    Util,
    Other,
}

impl ActionType {
    /// Short key used for per-action bonuses (`@mwak`)
    pub fn key(self) -> &'static str {
        match self {
            ActionType::Mwak => "mwak",
            ActionType::Rwak => "rwak",
            ActionType::Msak => "msak",
            ActionType::Rsak => "rsak",
            ActionType::Save => "save",
            ActionType::Heal => "heal",
            ActionType::Abil => "abil",
            ActionType::Util => "util",
            ActionType::Other => "other",
        }
    }

    pub fn is_attack(self) -> bool {
        matches!(
            self,
            ActionType::Mwak | ActionType::Rwak | ActionType::Msak | ActionType::Rsak
        )
    }

    pub fn is_weapon_attack(self) -> bool {
        matches!(self, ActionType::Mwak | ActionType::Rwak)
    }
}

/// Damage and healing types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Acid,
    Bludgeoning,
    Cold,
    Fire,
    Force,
    Lightning,
    Necrotic,
    Piercing,
    Poison,
    Psychic,
    Radiant,
    Slashing,
    Thunder,
    Healing,
    Temphp,
}

impl DamageType {
    pub fn is_healing(self) -> bool {
        matches!(self, DamageType::Healing | DamageType::Temphp)
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DamageType::Acid => "Acid",
            DamageType::Bludgeoning => "Bludgeoning",
            DamageType::Cold => "Cold",
            DamageType::Fire => "Fire",
            DamageType::Force => "Force",
            DamageType::Lightning => "Lightning",
            DamageType::Necrotic => "Necrotic",
            DamageType::Piercing => "Piercing",
            DamageType::Poison => "Poison",
            DamageType::Psychic => "Psychic",
            DamageType::Radiant => "Radiant",
            DamageType::Slashing => "Slashing",
            DamageType::Thunder => "Thunder",
            DamageType::Healing => "Healing",
            DamageType::Temphp => "Temporary HP",
        };
        write!(f, "{}", name)
    }
}

/// A spell slot chosen for casting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotLevel {
    Level(u8),
    Pact,
}

impl fmt::Display for SlotLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotLevel::Level(level) => write!(f, "level {}", level),
            SlotLevel::Pact => write!(f, "pact"),
        }
    }
}
