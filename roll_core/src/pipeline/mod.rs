//! RequestPipeline - runs a request program against an actor's item
//!
//! A run has three phases. Everything that can fail without drawing dice is
//! checked first (item lookup, slot dialog, resource preflight, damage
//! indices). The plan is then resolved step by step into result entries.
//! Only when every step succeeded are resources committed.

mod attack;
mod check;
mod custom;
mod damage;
mod plan;
mod save;

use crate::actor::Actor;
use crate::config::{CritBehavior, PipelineConfig, Placement};
use crate::context::RollContext;
use crate::host::RollHost;
use crate::item::{ConsumeKind, Item};
use crate::ledger::{self, ConsumeOutcome};
use crate::preset::{build_preset, Preset};
use crate::render::PresentationRenderer;
use crate::request::{CritOverride, RollParams, RollRequest};
use crate::result::{CompositeResult, ResultEntry};
use crate::types::{ActionType, ItemKind, SlotLevel};
use crate::RollError;
use dice_core::{Bindings, RandomSource, SelectionMode};
use plan::{DamageStep, Step, Target};
use tracing::{debug, info, warn};

/// Runs request programs with one configuration
#[derive(Debug, Clone, Default)]
pub struct RequestPipeline {
    config: PipelineConfig,
}

/// Cast level and slot picked for a spell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpellCast {
    level: u8,
    /// Slot spent on commit
    spend: Option<SlotLevel>,
    place_template: bool,
}

/// Read-only state shared by the resolvers of one run
pub(crate) struct RollEnv<'a> {
    pub config: &'a PipelineConfig,
    pub params: &'a RollParams,
    pub actor: &'a Actor,
    pub item: &'a Item,
    /// Level the item is used at; spells only
    pub cast_level: Option<u8>,
    /// Actor data plus item data under `item.`
    pub bindings: Bindings,
}

impl RollEnv<'_> {
    pub fn crit_behavior(&self) -> CritBehavior {
        self.params.crit_behavior.unwrap_or(self.config.crit_behavior)
    }

    pub fn roll_title(&self, title: &str) -> Option<String> {
        (self.config.roll_title_placement != Placement::Hidden)
            .then(|| title.to_string())
    }
}

impl RequestPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        RequestPipeline { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run `requests` for the item `item_id` of `actor`
    ///
    /// On success the item's counters, the actor's spell slots and the host's
    /// resources reflect the consumption in `params`. On error nothing was
    /// committed, though dice may have been drawn.
    pub fn run(
        &self,
        actor: &mut Actor,
        item_id: &str,
        requests: &[RollRequest],
        params: &RollParams,
        source: &mut dyn RandomSource,
        host: &mut dyn RollHost,
    ) -> Result<CompositeResult, RollError> {
        let item = actor
            .item(item_id)
            .cloned()
            .ok_or_else(|| RollError::UnknownItem(item_id.to_string()))?;

        let ammo = resolve_ammo(actor, &item, params);
        let cast = configure_spell(actor, &item, params, host)?;
        ledger::preflight(&item, &params.consume)?;
        let steps = plan::expand(requests, &item, ammo.as_ref(), params.versatile)?;

        let mut ctx = RollContext::new(ammo);
        let mut entries = Vec::new();
        {
            let mut bindings = actor.roll_bindings();
            let cast_level = cast.map(|cast| cast.level);
            bindings.nest("item", &item.roll_bindings(cast_level));
            let env = RollEnv {
                config: &self.config,
                params,
                actor: &*actor,
                item: &item,
                cast_level,
                bindings,
            };

            for step in &steps {
                let entry = resolve_step(&env, step, &mut ctx, source)?;
                debug!(
                    item = %item.id,
                    step = step.name(),
                    produced = entry.is_some(),
                    "resolved request"
                );
                entries.extend(entry);
            }

            if ctx.is_crit() && ctx.has_damage() && item.crit.extra_damage.is_some() {
                let extra = Step::Request(RollRequest::CritExtra { index: None });
                entries.extend(resolve_step(&env, &extra, &mut ctx, source)?);
            }
        }

        let consumption = commit(actor, &item, params, cast, host)?;

        let slot_level = cast
            .filter(|cast| cast.level != item.level)
            .map(|cast| cast.level);
        let properties = if params.properties {
            item.properties.clone()
        } else {
            Vec::new()
        };

        Ok(CompositeResult {
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            title: params.title.clone().unwrap_or_else(|| item.name.clone()),
            slot_level,
            is_crit: ctx.is_crit(),
            entries,
            properties,
            dice_pool: ctx.into_pool(),
            consumption,
        })
    }

    /// Run one of the item's quick-roll presets
    pub fn run_preset(
        &self,
        actor: &mut Actor,
        item_id: &str,
        preset: Preset,
        source: &mut dyn RandomSource,
        host: &mut dyn RollHost,
    ) -> Result<CompositeResult, RollError> {
        let item = actor
            .item(item_id)
            .ok_or_else(|| RollError::UnknownItem(item_id.to_string()))?;
        let (params, requests) = build_preset(item, preset);
        self.run(actor, item_id, &requests, &params, source, host)
    }

    /// Run and hand the result to `renderer`
    #[allow(clippy::too_many_arguments)]
    pub fn run_and_render<R: PresentationRenderer>(
        &self,
        actor: &mut Actor,
        item_id: &str,
        requests: &[RollRequest],
        params: &RollParams,
        source: &mut dyn RandomSource,
        host: &mut dyn RollHost,
        renderer: &mut R,
    ) -> Result<R::Markup, RollError> {
        let result = self.run(actor, item_id, requests, params, source, host)?;
        renderer
            .render(&result)
            .map_err(|e| RollError::Render(e.to_string()))
    }
}

fn resolve_step(
    env: &RollEnv<'_>,
    step: &Step,
    ctx: &mut RollContext,
    source: &mut dyn RandomSource,
) -> Result<Option<ResultEntry>, RollError> {
    let request = match step {
        Step::Damage(damage) => return damage::resolve_damage(env, damage, ctx, source),
        Step::Request(request) => request,
    };

    match request {
        RollRequest::Attack(args) => attack::resolve(env, args, ctx, source).map(Some),
        RollRequest::Check(args) => check::resolve(env, args, ctx, source).map(Some),
        RollRequest::Damage(_) => Ok(None),
        RollRequest::SaveDc(args) => Ok(save::resolve(env, args)),
        RollRequest::Other => damage::resolve_other(env, ctx, source),
        RollRequest::Custom(args) => custom::resolve(env, args, ctx, source).map(Some),
        RollRequest::Text { text } => Ok(text_entry(text)),
        RollRequest::Flavor { text } => {
            let text = text.as_deref().or(env.item.chat_flavor.as_deref());
            Ok(text
                .filter(|t| !t.is_empty())
                .map(|t| ResultEntry::Flavor { text: t.to_string() }))
        }
        RollRequest::Description => Ok(text_entry(&env.item.description)),
        RollRequest::CritExtra { index } => {
            let Some(index) = index.or(env.item.crit.extra_damage) else {
                return Ok(None);
            };
            plan::check_index(env.item, index)?;
            let step = DamageStep {
                index,
                versatile: false,
                crit: CritOverride::Never,
                context: None,
                target: Target::Primary,
            };
            damage::resolve_damage(env, &step, ctx, source)
        }
    }
}

fn text_entry(text: &str) -> Option<ResultEntry> {
    (!text.is_empty()).then(|| ResultEntry::Text {
        text: text.to_string(),
    })
}

/// The ammunition fired with `item`, when its linked resource is spent
fn resolve_ammo(actor: &Actor, item: &Item, params: &RollParams) -> Option<Item> {
    if !params.consume.use_linked_resource {
        return None;
    }
    let target = item.consume.as_ref().filter(|c| c.kind == ConsumeKind::Ammo)?;
    let ammo = actor.item(&target.target).cloned();
    if ammo.is_none() {
        warn!(item = %item.id, ammo = %target.target, "ammunition not found in inventory");
    }
    ammo
}

/// Pick the cast level of a spell
///
/// An explicit slot level skips the dialog and spends no slot. Cantrips are
/// cast at level 0.
fn configure_spell(
    actor: &Actor,
    item: &Item,
    params: &RollParams,
    host: &mut dyn RollHost,
) -> Result<Option<SpellCast>, RollError> {
    if item.kind != ItemKind::Spell {
        return Ok(None);
    }
    if let Some(level) = params.slot_level {
        return Ok(Some(SpellCast {
            level,
            spend: None,
            place_template: params.use_template && template_on_request(item),
        }));
    }
    if item.level == 0 {
        return Ok(Some(SpellCast {
            level: 0,
            spend: None,
            place_template: params.use_template,
        }));
    }

    let choice = host
        .choose(item)
        .ok_or_else(|| RollError::SlotSelectionCancelled(item.name.clone()))?;
    let level = match choice.level {
        SlotLevel::Level(level) => level,
        SlotLevel::Pact => actor.spells.pact.level,
    };
    if choice.consume_slot && actor.spells.remaining(choice.level).unwrap_or(0) == 0 {
        return Err(RollError::NoSlotsAvailable {
            item: item.name.clone(),
            slot: choice.level,
        });
    }

    Ok(Some(SpellCast {
        level,
        spend: choice.consume_slot.then_some(choice.level),
        place_template: choice.place_template,
    }))
}

/// Items whose template follows `use_template` rather than the slot dialog
fn template_on_request(item: &Item) -> bool {
    match item.kind {
        ItemKind::Feat => true,
        ItemKind::Spell => item.level == 0,
        _ => false,
    }
}

/// Write every resource change of a successful run
fn commit(
    actor: &mut Actor,
    item: &Item,
    params: &RollParams,
    cast: Option<SpellCast>,
    host: &mut dyn RollHost,
) -> Result<ConsumeOutcome, RollError> {
    let owned = actor
        .item_mut(&item.id)
        .ok_or_else(|| RollError::UnknownItem(item.id.clone()))?;
    let outcome = ledger::consume(owned, &params.consume, &mut *host)?;

    if let Some(slot) = cast.and_then(|cast| cast.spend) {
        match actor.spells.spend(slot) {
            Some(left) => info!(item = %item.id, %slot, left, "spent spell slot"),
            None => warn!(item = %item.id, %slot, "no spell slot left to spend"),
        }
    }

    let place_template = match cast {
        Some(cast) => cast.place_template,
        None => params.use_template && template_on_request(item),
    };
    if item.area_target && place_template {
        host.place(item);
    }

    if outcome == ConsumeOutcome::Destroy {
        actor.remove_item(&item.id);
        info!(item = %item.id, "item used up and removed");
    }
    Ok(outcome)
}

/// Base d20 of an actor's attacks and checks
pub(crate) fn d20(actor: &Actor) -> &'static str {
    if actor.traits.halfling_lucky {
        "1d20r<2"
    } else {
        "1d20"
    }
}

/// Evaluations of a check; selecting needs at least two
pub(crate) fn check_roll_count(config: &PipelineConfig, selection: SelectionMode) -> u32 {
    if selection.is_selecting() {
        config.multi_roll_count.max(2)
    } else {
        config.multi_roll_count
    }
}

/// True when a bonus formula adds something
pub(crate) fn is_bonus(formula: &str) -> bool {
    let formula = formula.trim();
    !formula.is_empty() && formula != "0"
}

/// Per-action bonus of the actor for the item's action type
pub(crate) fn action_bonus<'a>(
    actor: &'a Actor,
    action: Option<ActionType>,
    damage: bool,
) -> Option<(ActionType, &'a str)> {
    let action = action?;
    let bonus = if damage {
        actor.bonuses.damage(action)
    } else {
        actor.bonuses.attack(action)
    }?;
    is_bonus(bonus).then_some((action, bonus))
}
