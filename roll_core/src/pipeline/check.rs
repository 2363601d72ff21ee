//! Tool and ability checks made with an item

use super::{check_roll_count, d20, is_bonus, RollEnv};
use crate::context::RollContext;
use crate::request::CheckArgs;
use crate::result::{ResultEntry, RollEntry};
use crate::RollError;
use dice_core::{MultiRoll, RandomSource, SelectionMode};

pub(super) fn resolve(
    env: &RollEnv<'_>,
    args: &CheckArgs,
    ctx: &mut RollContext,
    source: &mut dyn RandomSource,
) -> Result<ResultEntry, RollError> {
    let actor = env.actor;
    let item = env.item;
    let mut bindings = env.bindings.clone();
    let mut terms = Vec::new();

    if let Some(ability) = item.ability {
        let modifier = actor.modifier(ability);
        if modifier != 0 {
            terms.push("@mod".to_string());
            bindings.insert("mod", modifier);
        }
    }

    let prof = (item.proficient * actor.proficiency as f64).floor() as i64;
    if prof != 0 {
        terms.push("@prof".to_string());
        bindings.insert("prof", prof);
    }

    if let Some(bonus) = item.check_bonus.as_deref().filter(|b| is_bonus(b)) {
        terms.push("@bonus".to_string());
        bindings.insert("bonus", bonus);
    }

    if let Some(bonus) = args.bonus.as_deref().filter(|b| is_bonus(b)) {
        terms.push(bonus.to_string());
    }

    let selection = SelectionMode::from_counts(
        args.adv.unwrap_or(env.params.adv),
        args.disadv.unwrap_or(env.params.disadv),
    );

    let outcome = MultiRoll::new(d20(actor))
        .with_count(check_roll_count(env.config, selection))
        .with_terms(terms)
        .with_crit_threshold(args.crit_threshold)
        .with_selection(selection)
        .triggering_crit(args.triggers_crit)
        .resolve(source, &bindings)?;

    ctx.record_outcome(&outcome);

    let title = args.title.as_deref().unwrap_or("Check");
    Ok(ResultEntry::Check(RollEntry {
        title: env.roll_title(title),
        outcome,
    }))
}
