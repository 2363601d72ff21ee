//! Plan expansion - damage selectors and ammunition turned into flat steps

use crate::item::Item;
use crate::request::{CritOverride, DamageSelector, RollRequest};
use crate::RollError;

/// Which item a damage step rolls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Primary,
    Ammo,
}

/// One damage line to roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DamageStep {
    pub index: usize,
    pub versatile: bool,
    pub crit: CritOverride,
    pub context: Option<String>,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Request(RollRequest),
    Damage(DamageStep),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Request(request) => request.name(),
            Step::Damage(_) => "damage",
        }
    }
}

/// Expand `requests` into steps, validating every damage index up front
///
/// A damage request becomes one step per selected line; only the first may
/// use the versatile formula, and `versatile` turns it on for line 0 of the
/// item. The ammunition's lines follow the first damage request, once, and
/// are never versatile.
pub(crate) fn expand(
    requests: &[RollRequest],
    item: &Item,
    ammo: Option<&Item>,
    versatile: bool,
) -> Result<Vec<Step>, RollError> {
    if let Some(index) = item.crit.extra_damage {
        check_index(item, index)?;
    }

    let mut steps = Vec::with_capacity(requests.len());
    let mut ammo = ammo;

    for request in requests {
        match request {
            RollRequest::Damage(args) => {
                let indices = match &args.index {
                    DamageSelector::Index(index) => vec![*index],
                    DamageSelector::Indices(indices) => indices.clone(),
                    DamageSelector::All => (0..item.damage.parts.len()).collect(),
                };
                for (i, index) in indices.into_iter().enumerate() {
                    check_index(item, index)?;
                    steps.push(Step::Damage(DamageStep {
                        index,
                        versatile: (args.versatile && i == 0) || (versatile && index == 0),
                        crit: args.crit,
                        context: args.context.clone(),
                        target: Target::Primary,
                    }));
                }

                if let Some(ammo) = ammo.take() {
                    let context = format!("[{}]", ammo.name);
                    steps.extend((0..ammo.damage.parts.len()).map(|index| {
                        Step::Damage(DamageStep {
                            index,
                            versatile: false,
                            crit: args.crit,
                            context: Some(context.clone()),
                            target: Target::Ammo,
                        })
                    }));
                }
            }
            RollRequest::CritExtra { index: Some(index) } => {
                check_index(item, *index)?;
                steps.push(Step::Request(request.clone()));
            }
            other => steps.push(Step::Request(other.clone())),
        }
    }

    Ok(steps)
}

pub(crate) fn check_index(item: &Item, index: usize) -> Result<(), RollError> {
    let len = item.damage.parts.len();
    if index < len {
        Ok(())
    } else {
        Err(RollError::DamageIndexOutOfRange {
            item: item.name.clone(),
            index,
            len,
        })
    }
}
