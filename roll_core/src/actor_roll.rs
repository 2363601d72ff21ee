//! Actor rolls - skill checks, ability checks and saving throws
//!
//! These rolls belong to the actor rather than an item, so they bypass the
//! request pipeline and never make an action critical.

use crate::actor::Actor;
use crate::config::PipelineConfig;
use crate::pipeline::{check_roll_count, d20, is_bonus};
use crate::result::RollEntry;
use crate::types::Ability;
use crate::RollError;
use dice_core::{Bindings, MultiRoll, RandomSource, SelectionMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Advantage and crit options of an actor roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorRollArgs {
    pub adv: u32,
    pub disadv: u32,
    pub crit_threshold: Option<u32>,
}

impl ActorRollArgs {
    pub fn selection(&self) -> SelectionMode {
        SelectionMode::from_counts(self.adv, self.disadv)
    }
}

/// Roll a skill check
///
/// The skill total is ability modifier, proficiency and the skill's own bonus.
/// Jack of all trades gives half proficiency to unskilled checks; reliable
/// talent treats a proficient d20 below 10 as 10.
pub fn roll_skill(
    actor: &Actor,
    skill: &str,
    args: &ActorRollArgs,
    config: &PipelineConfig,
    source: &mut dyn RandomSource,
) -> Result<RollEntry, RollError> {
    let data = actor
        .skills
        .get(skill)
        .ok_or_else(|| RollError::UnknownSkill(skill.to_string()))?;

    let multiplier = if data.proficiency == 0.0 && actor.traits.jack_of_all_trades {
        0.5
    } else {
        data.proficiency
    };
    let prof = (multiplier * actor.proficiency as f64).floor() as i64;
    let total = actor.modifier(data.ability) + prof + data.bonus;

    let mut bindings = actor.roll_bindings();
    bindings.insert("mod", total);
    let mut terms = vec!["@mod".to_string()];
    if let Some(bonus) = actor.bonuses.skill.as_deref().filter(|b| is_bonus(b)) {
        terms.push("@skillBonus".to_string());
        bindings.insert("skillBonus", bonus);
    }

    let mut die = d20(actor).to_string();
    if actor.traits.reliable_talent && data.proficiency >= 1.0 {
        die.push_str("min10");
    }

    roll(actor, &die, terms, &bindings, args, config, source, skill)
}

/// Roll a plain ability check
pub fn roll_ability_check(
    actor: &Actor,
    ability: Ability,
    args: &ActorRollArgs,
    config: &PipelineConfig,
    source: &mut dyn RandomSource,
) -> Result<RollEntry, RollError> {
    let mut bindings = actor.roll_bindings();
    bindings.insert("mod", actor.modifier(ability));
    let mut terms = vec!["@mod".to_string()];

    if let Some(bonus) = actor.bonuses.ability_check.as_deref().filter(|b| is_bonus(b)) {
        terms.push("@checkBonus".to_string());
        bindings.insert("checkBonus", bonus);
    }
    if actor.traits.jack_of_all_trades {
        terms.push("floor(@attributes.prof / 2)".to_string());
    }

    let title = format!("{} Check", ability);
    roll(actor, d20(actor), terms, &bindings, args, config, source, &title)
}

/// Roll a saving throw
///
/// Modifier, save proficiency and the global save bonus are folded into one
/// `@mod` term; a save with none of them is a bare d20.
pub fn roll_ability_save(
    actor: &Actor,
    ability: Ability,
    args: &ActorRollArgs,
    config: &PipelineConfig,
    source: &mut dyn RandomSource,
) -> Result<RollEntry, RollError> {
    let score = actor.abilities.get(ability);
    let modifier = score.modifier();
    let prof = (score.save_proficiency * actor.proficiency as f64).floor() as i64;

    let mut parts = Vec::new();
    if modifier != 0 {
        parts.push(modifier.to_string());
    }
    if prof != 0 {
        parts.push(prof.to_string());
    }
    if let Some(bonus) = actor.bonuses.ability_save.as_deref().filter(|b| is_bonus(b)) {
        parts.push(bonus.to_string());
    }

    let mut bindings = actor.roll_bindings();
    let mut terms = Vec::new();
    if !parts.is_empty() {
        bindings.insert("mod", parts.join(" + "));
        terms.push("@mod".to_string());
    }

    let title = format!("{} Save", ability);
    roll(actor, d20(actor), terms, &bindings, args, config, source, &title)
}

#[allow(clippy::too_many_arguments)]
fn roll(
    actor: &Actor,
    die: &str,
    terms: Vec<String>,
    bindings: &Bindings,
    args: &ActorRollArgs,
    config: &PipelineConfig,
    source: &mut dyn RandomSource,
    title: &str,
) -> Result<RollEntry, RollError> {
    let selection = args.selection();
    let outcome = MultiRoll::new(die)
        .with_count(check_roll_count(config, selection))
        .with_terms(terms)
        .with_crit_threshold(args.crit_threshold)
        .with_selection(selection)
        .resolve(source, bindings)?;

    debug!(actor = %actor.id, title, total = ?outcome.total(), "actor roll");
    Ok(RollEntry {
        title: Some(title.to_string()),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Skill;
    use dice_core::ScriptedSource;

    fn rogue() -> Actor {
        let mut actor = Actor::new("rogue", "Rogue");
        actor.abilities.dex.value = 16;
        actor.proficiency = 3;
        actor.skills.insert(
            "stealth".to_string(),
            Skill {
                ability: Ability::Dex,
                proficiency: 2.0,
                bonus: 0,
            },
        );
        actor.skills.insert(
            "arcana".to_string(),
            Skill {
                ability: Ability::Int,
                proficiency: 0.0,
                bonus: 1,
            },
        );
        actor
    }

    #[test]
    fn test_skill_total() {
        let actor = rogue();
        let mut source = ScriptedSource::new([8]);
        let entry = roll_skill(
            &actor,
            "stealth",
            &ActorRollArgs::default(),
            &PipelineConfig::default(),
            &mut source,
        )
        .unwrap();
        // 8 + dex 3 + expertise 6
        assert_eq!(entry.outcome.total(), Some(17));
        assert_eq!(entry.title.as_deref(), Some("stealth"));
    }

    #[test]
    fn test_reliable_talent_floor() {
        let mut actor = rogue();
        actor.traits.reliable_talent = true;
        let mut source = ScriptedSource::new([2, 2]);
        let config = PipelineConfig::default();

        let proficient = roll_skill(
            &actor,
            "stealth",
            &ActorRollArgs::default(),
            &config,
            &mut source,
        )
        .unwrap();
        assert_eq!(proficient.outcome.total(), Some(19));

        let unskilled = roll_skill(
            &actor,
            "arcana",
            &ActorRollArgs::default(),
            &config,
            &mut source,
        )
        .unwrap();
        assert_eq!(unskilled.outcome.total(), Some(3));
    }

    #[test]
    fn test_jack_of_all_trades() {
        let mut actor = rogue();
        actor.traits.jack_of_all_trades = true;
        let config = PipelineConfig::default();

        let mut source = ScriptedSource::new([10]);
        let skill = roll_skill(
            &actor,
            "arcana",
            &ActorRollArgs::default(),
            &config,
            &mut source,
        )
        .unwrap();
        // 10 + int 0 + half prof 1 + bonus 1
        assert_eq!(skill.outcome.total(), Some(12));

        let mut source = ScriptedSource::new([10]);
        let check = roll_ability_check(
            &actor,
            Ability::Dex,
            &ActorRollArgs::default(),
            &config,
            &mut source,
        )
        .unwrap();
        assert_eq!(check.outcome.total(), Some(14));
        assert_eq!(check.title.as_deref(), Some("Dexterity Check"));
    }

    #[test]
    fn test_unknown_skill() {
        let actor = rogue();
        let mut source = ScriptedSource::default();
        let result = roll_skill(
            &actor,
            "flying",
            &ActorRollArgs::default(),
            &PipelineConfig::default(),
            &mut source,
        );
        assert_eq!(result, Err(RollError::UnknownSkill("flying".to_string())));
    }

    #[test]
    fn test_save_with_advantage() {
        let mut actor = rogue();
        actor.abilities.dex.save_proficiency = 1.0;
        actor.bonuses.ability_save = Some("1".to_string());
        let args = ActorRollArgs {
            adv: 1,
            ..Default::default()
        };
        let mut source = ScriptedSource::new([6, 13]);

        let save = roll_ability_save(
            &actor,
            Ability::Dex,
            &args,
            &PipelineConfig::default(),
            &mut source,
        )
        .unwrap();
        assert_eq!(save.outcome.entries.len(), 2);
        // 13 + dex 3 + prof 3 + bonus 1
        assert_eq!(save.outcome.total(), Some(20));
        assert_eq!(save.title.as_deref(), Some("Dexterity Save"));
    }

    #[test]
    fn test_bare_save() {
        let actor = Actor::new("commoner", "Commoner");
        let mut source = ScriptedSource::new([9]);
        let save = roll_ability_save(
            &actor,
            Ability::Wis,
            &ActorRollArgs::default(),
            &PipelineConfig::default(),
            &mut source,
        )
        .unwrap();
        assert_eq!(save.outcome.formula, "1d20");
        assert_eq!(save.outcome.total(), Some(9));
    }
}
