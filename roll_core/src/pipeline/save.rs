//! Save DC entries

use super::RollEnv;
use crate::config::HideDc;
use crate::request::SaveDcArgs;
use crate::result::{ResultEntry, SaveDcEntry};
use crate::types::ActorKind;

/// Save DC of the item; `None` when no ability is known
///
/// The DC is the request's, the item's flat DC, or the actor's spell DC.
pub(super) fn resolve(env: &RollEnv<'_>, args: &SaveDcArgs) -> Option<ResultEntry> {
    let spec = env.item.save;
    let ability = args.ability.or(spec.map(|s| s.ability))?;
    let dc = args
        .dc
        .or(spec.and_then(|s| s.dc))
        .unwrap_or_else(|| env.actor.spell_dc());

    let hidden = match env.config.hide_dc {
        HideDc::Never => false,
        HideDc::NpcOnly => env.actor.kind == ActorKind::Npc,
        HideDc::Always => true,
    };

    Some(ResultEntry::SaveDc(SaveDcEntry {
        ability,
        dc,
        hidden,
    }))
}
