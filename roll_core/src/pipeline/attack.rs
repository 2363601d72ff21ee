//! Attack rolls

use super::{action_bonus, d20, is_bonus, RollEnv};
use crate::actor::Actor;
use crate::context::RollContext;
use crate::item::Item;
use crate::request::AttackArgs;
use crate::result::{ResultEntry, RollEntry};
use crate::types::{Ability, ActionType, ItemKind};
use crate::RollError;
use dice_core::{MultiRoll, RandomSource, SelectionMode};

/// Ability an item attacks with
///
/// Spells use their own ability or the actor's spellcasting ability. Finesse
/// weapons take the better of strength and dexterity unless another ability
/// is set; other weapons default to strength (melee) or dexterity (ranged).
pub(super) fn attack_ability(actor: &Actor, item: &Item) -> Option<Ability> {
    if item.kind == ItemKind::Spell {
        return item.ability.or(actor.spellcasting);
    }

    let finesse_ability = matches!(item.ability, None | Some(Ability::Str) | Some(Ability::Dex));
    if item.kind == ItemKind::Weapon && item.finesse && finesse_ability {
        let best = if actor.modifier(Ability::Dex) > actor.modifier(Ability::Str) {
            Ability::Dex
        } else {
            Ability::Str
        };
        return Some(best);
    }

    item.ability.or(match item.action_type {
        Some(ActionType::Mwak) => Some(Ability::Str),
        Some(ActionType::Rwak) => Some(Ability::Dex),
        _ => None,
    })
}

/// Lowest natural roll that crits
fn crit_threshold(env: &RollEnv<'_>, args: &AttackArgs) -> u32 {
    if let Some(threshold) = args.crit_threshold {
        return threshold;
    }
    let item = env.item.crit.threshold.unwrap_or(20);
    if env.item.is_weapon_attack() {
        let actor = env.actor.weapon_crit_threshold.unwrap_or(20);
        20.min(actor).min(item)
    } else {
        20.min(item)
    }
}

pub(super) fn resolve(
    env: &RollEnv<'_>,
    args: &AttackArgs,
    ctx: &mut RollContext,
    source: &mut dyn RandomSource,
) -> Result<ResultEntry, RollError> {
    let actor = env.actor;
    let item = env.item;
    let mut bindings = env.bindings.clone();
    let mut terms = Vec::new();
    let mut title = String::from("Attack");

    let ability = attack_ability(actor, item);
    if let Some(ability) = ability {
        let modifier = actor.modifier(ability);
        if modifier != 0 {
            terms.push("@abl".to_string());
            bindings.insert("abl", modifier);
        }
    }

    let proficient_kind = matches!(item.kind, ItemKind::Spell | ItemKind::Feat);
    if proficient_kind || item.proficient > 0.0 {
        let prof = if proficient_kind {
            actor.proficiency
        } else {
            (item.proficient * actor.proficiency as f64).floor() as i64
        };
        if prof != 0 {
            terms.push("@prof".to_string());
            bindings.insert("prof", prof);
        }
    }

    if let Some(bonus) = item.attack_bonus.as_deref().filter(|b| is_bonus(b)) {
        terms.push("@bonus".to_string());
        bindings.insert("bonus", bonus);
    }

    if let Some(ammo) = ctx.ammo() {
        if let Some(bonus) = ammo.attack_bonus.as_deref().filter(|b| is_bonus(b)) {
            terms.push("@ammo".to_string());
            bindings.insert("ammo", bonus);
        }
        title = format!("{} [{}]", title, ammo.name);
    }

    if let Some((action, bonus)) = action_bonus(actor, item.action_type, false) {
        terms.push(format!("@{}", action.key()));
        bindings.insert(action.key(), bonus);
    }

    if let Some(bonus) = args.bonus.as_deref().filter(|b| is_bonus(b)) {
        terms.push(bonus.to_string());
    }

    let selection = SelectionMode::from_counts(
        args.adv.unwrap_or(env.params.adv),
        args.disadv.unwrap_or(env.params.disadv),
    );
    let mut count = if selection.is_selecting() {
        2
    } else {
        env.config.multi_roll_count
    };
    let elven = actor.traits.elven_accuracy
        && ability.is_some_and(Ability::is_elven_accuracy_ability)
        && selection != SelectionMode::Lowest;
    if count == 2 && elven {
        count = 3;
    }

    let outcome = MultiRoll::new(d20(actor))
        .with_count(count)
        .with_terms(terms)
        .with_crit_threshold(Some(crit_threshold(env, args)))
        .with_selection(selection)
        .triggering_crit(args.triggers_crit)
        .resolve(source, &bindings)?;

    ctx.mark_attack();
    ctx.record_outcome(&outcome);

    Ok(ResultEntry::Attack(RollEntry {
        title: env.roll_title(&title),
        outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finesse_uses_better_ability() {
        let mut actor = Actor::new("rogue", "Rogue");
        actor.abilities.dex.value = 16;
        actor.abilities.str.value = 12;
        let mut rapier =
            Item::new("rapier", "Rapier", ItemKind::Weapon).with_action(ActionType::Mwak);
        rapier.finesse = true;
        assert_eq!(attack_ability(&actor, &rapier), Some(Ability::Dex));

        rapier.ability = Some(Ability::Cha);
        assert_eq!(attack_ability(&actor, &rapier), Some(Ability::Cha));
    }

    #[test]
    fn test_default_weapon_abilities() {
        let actor = Actor::new("fighter", "Fighter");
        let axe = Item::new("axe", "Axe", ItemKind::Weapon).with_action(ActionType::Mwak);
        let bow = Item::new("bow", "Bow", ItemKind::Weapon).with_action(ActionType::Rwak);
        assert_eq!(attack_ability(&actor, &axe), Some(Ability::Str));
        assert_eq!(attack_ability(&actor, &bow), Some(Ability::Dex));
    }

    #[test]
    fn test_spell_uses_spellcasting_ability() {
        let mut actor = Actor::new("wizard", "Wizard");
        actor.spellcasting = Some(Ability::Int);
        let bolt =
            Item::new("fire_bolt", "Fire Bolt", ItemKind::Spell).with_action(ActionType::Rsak);
        assert_eq!(attack_ability(&actor, &bolt), Some(Ability::Int));
    }
}
