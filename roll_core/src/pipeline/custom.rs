//! Free-form rolls

use super::RollEnv;
use crate::context::RollContext;
use crate::request::CustomArgs;
use crate::result::{ResultEntry, RollEntry};
use crate::RollError;
use dice_core::{MultiRoll, RandomSource, SelectionMode};

/// Roll a free formula with the run's bindings; never critical for the run
pub(super) fn resolve(
    env: &RollEnv<'_>,
    args: &CustomArgs,
    ctx: &mut RollContext,
    source: &mut dyn RandomSource,
) -> Result<ResultEntry, RollError> {
    let selection = args.roll_state.map(SelectionMode::from).unwrap_or_default();
    let mut count = args.rolls.max(1);
    if selection.is_selecting() && count == 1 {
        count = 2;
    }

    let outcome = MultiRoll::new(args.formula.as_str())
        .with_count(count)
        .with_selection(selection)
        .triggering_crit(false)
        .resolve(source, &env.bindings)?;

    ctx.record_outcome(&outcome);

    Ok(ResultEntry::Custom(RollEntry {
        title: args.title.clone(),
        outcome,
    }))
}
