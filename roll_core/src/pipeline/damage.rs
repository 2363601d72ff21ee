//! Damage, other and crit rolls

use super::attack::attack_ability;
use super::plan::{DamageStep, Target};
use super::{action_bonus, RollEnv};
use crate::config::CritBehavior;
use crate::context::RollContext;
use crate::item::{Item, ScalingMode};
use crate::labels::damage_labels;
use crate::request::CritOverride;
use crate::result::{DamageEntry, ResultEntry};
use crate::types::{DamageType, ItemKind};
use crate::RollError;
use dice_core::{cantrip_steps, scale, slot_steps, Bindings, EvaluatedRoll, Formula, RandomSource};
use tracing::debug;

/// What to roll for one damage or other entry
struct Line<'a> {
    item: &'a Item,
    formula: String,
    bindings: Bindings,
    damage_type: Option<DamageType>,
    versatile: bool,
    crit: CritOverride,
    title: Option<&'a str>,
    context: Option<String>,
}

/// Roll one damage line of the item or its ammunition
pub(super) fn resolve_damage(
    env: &RollEnv<'_>,
    step: &DamageStep,
    ctx: &mut RollContext,
    source: &mut dyn RandomSource,
) -> Result<Option<ResultEntry>, RollError> {
    ctx.mark_damage();

    let ammo = match step.target {
        Target::Primary => None,
        Target::Ammo => match ctx.ammo() {
            Some(ammo) => Some(ammo.clone()),
            None => return Ok(None),
        },
    };
    let primary = ammo.is_none();
    let item = ammo.as_ref().unwrap_or(env.item);

    let part = item
        .damage
        .parts
        .get(step.index)
        .ok_or_else(|| RollError::DamageIndexOutOfRange {
            item: item.name.clone(),
            index: step.index,
            len: item.damage.parts.len(),
        })?;

    let versatile_formula = item.versatile_formula().filter(|_| step.versatile);
    let versatile = versatile_formula.is_some();
    let mut formula = versatile_formula.unwrap_or(&part.formula).trim().to_string();
    if formula.is_empty() {
        return Ok(None);
    }

    let mut bindings = env.bindings.clone();
    bindings.insert("mod", damage_modifier(env, item, step.index));

    if primary && step.index == 0 {
        formula = scale_formula(env, &formula, &bindings)?;
        if item.is_attack() {
            if let Some((_, bonus)) = action_bonus(env.actor, item.action_type, true) {
                formula = Formula::compose(&[formula.as_str(), bonus]);
            }
        }
    }

    let context = step.context.clone().or_else(|| {
        primary
            .then(|| item.presets.as_ref())
            .flatten()
            .and_then(|presets| presets.damage_context(step.index))
            .map(str::to_string)
    });
    let damage_type = part.damage_type;
    let title = match damage_type {
        Some(kind) if kind.is_healing() => None,
        _ => Some("Damage"),
    };

    let entry = roll_line(
        env,
        ctx,
        source,
        Line {
            item,
            formula,
            bindings,
            damage_type,
            versatile,
            crit: step.crit,
            title,
            context,
        },
    )?;
    Ok(Some(ResultEntry::Damage(entry)))
}

/// Roll the item's other formula
pub(super) fn resolve_other(
    env: &RollEnv<'_>,
    ctx: &mut RollContext,
    source: &mut dyn RandomSource,
) -> Result<Option<ResultEntry>, RollError> {
    let Some(formula) = env.item.other_formula() else {
        return Ok(None);
    };
    let mut bindings = env.bindings.clone();
    bindings.insert("mod", damage_modifier(env, env.item, usize::MAX));

    let context = env
        .item
        .presets
        .as_ref()
        .and_then(|presets| presets.other_context.clone())
        .filter(|context| !context.is_empty());

    let entry = roll_line(
        env,
        ctx,
        source,
        Line {
            item: env.item,
            formula: formula.trim().to_string(),
            bindings,
            damage_type: None,
            versatile: false,
            crit: CritOverride::Auto,
            title: Some("Other"),
            context,
        },
    )?;
    Ok(Some(ResultEntry::Other(entry)))
}

/// Value bound to `@mod` for damage line `index`
///
/// Spells use their casting ability; weapons and features without an explicit
/// ability fall back to their attack ability on the first line only.
fn damage_modifier(env: &RollEnv<'_>, item: &Item, index: usize) -> i64 {
    let ability = match (item.ability, item.kind) {
        (Some(ability), _) => Some(ability),
        (None, ItemKind::Spell) => env.actor.spellcasting,
        (None, ItemKind::Weapon | ItemKind::Feat) if index == 0 => attack_ability(env.actor, item),
        _ => None,
    };
    ability.map_or(0, |ability| env.actor.modifier(ability))
}

/// Scale the first damage line of a spell by caster level or slot level
fn scale_formula(
    env: &RollEnv<'_>,
    formula: &str,
    bindings: &Bindings,
) -> Result<String, RollError> {
    let item = env.item;
    let steps = match (item.kind, item.scaling.mode) {
        (ItemKind::Spell, ScalingMode::Cantrip) => cantrip_steps(env.actor.character_level()),
        (ItemKind::Spell, ScalingMode::Level) => {
            slot_steps(env.cast_level.unwrap_or(item.level), item.level)
        }
        _ => 0,
    };
    Ok(scale(formula, &item.scaling.formula, steps, bindings)?)
}

fn roll_line(
    env: &RollEnv<'_>,
    ctx: &mut RollContext,
    source: &mut dyn RandomSource,
    line: Line<'_>,
) -> Result<DamageEntry, RollError> {
    let base = source.evaluate(&line.formula, &line.bindings)?;
    ctx.record_roll(&base);
    let max_base = source.maximize(&base.formula, &Bindings::new())?.total;

    let behavior = env.crit_behavior();
    let wants_crit = match line.crit {
        CritOverride::Always => true,
        CritOverride::Never => false,
        CritOverride::Auto => ctx.is_crit(),
    };

    let crit = if wants_crit && behavior != CritBehavior::None {
        crit_roll(env, line.item, &base, max_base, behavior, source)?
    } else {
        None
    };
    let max_crit = match &crit {
        Some(crit) => {
            ctx.record_roll(crit);
            Some(source.maximize(&crit.formula, &Bindings::new())?.total)
        }
        None => None,
    };

    let damage = match (line.damage_type, line.versatile) {
        (Some(kind), false) => Some(kind.to_string()),
        (Some(kind), true) => Some(format!("{} (Versatile)", kind)),
        (None, true) => Some("Versatile".to_string()),
        (None, false) => None,
    };
    let labels = damage_labels(env.config, line.title, line.context.as_deref(), damage.as_deref());

    debug!(
        item = %line.item.id,
        formula = %base.formula,
        total = base.total,
        crit = ?crit.as_ref().map(|c| c.total),
        "rolled damage"
    );

    Ok(DamageEntry {
        labels,
        damage_type: line.damage_type,
        versatile: line.versatile,
        crit_label: crit.as_ref().map(|_| env.config.crit_string.clone()),
        base,
        crit,
        max_base,
        max_crit,
    })
}

/// Extra dice of a critical hit; `None` when the formula has no dice
fn crit_roll(
    env: &RollEnv<'_>,
    item: &Item,
    base: &EvaluatedRoll,
    max_base: i64,
    behavior: CritBehavior,
    source: &mut dyn RandomSource,
) -> Result<Option<EvaluatedRoll>, RollError> {
    let mut dice = Formula::parse(&base.formula)?.dice_only();
    if !dice.has_dice() {
        return Ok(None);
    }
    if item.is_weapon_attack() && env.actor.traits.savage_attacks {
        dice.alter(1, 1, false);
    }

    let mut formula = dice.to_string();
    if let Some(bonus) = item.crit.bonus_dice.as_deref() {
        formula = Formula::compose(&[formula.as_str(), bonus]);
    }

    let empty = Bindings::new();
    let roll = match behavior {
        CritBehavior::None => return Ok(None),
        CritBehavior::BonusDiceOnly => source.evaluate(&formula, &empty)?,
        CritBehavior::MaximizeBase => source.maximize(&formula, &empty)?,
        CritBehavior::MaximizeBoth => {
            let shortfall = max_base - base.total;
            if shortfall > 0 {
                formula = Formula::compose(&[formula, shortfall.to_string()]);
            }
            source.maximize(&formula, &empty)?
        }
    };
    Ok(Some(roll))
}
