//! Damage labels - title, context and damage type arranged by placement

use crate::config::{PipelineConfig, Placement};
use serde::{Deserialize, Serialize};

/// Label text for the three label rows of a damage entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DamageLabels {
    pub top: Option<String>,
    pub middle: Option<String>,
    pub bottom: Option<String>,
}

#[derive(Default)]
struct Slots {
    top: Vec<String>,
    middle: Vec<String>,
    bottom: Vec<String>,
}

impl Slots {
    fn get_mut(&mut self, placement: Placement) -> Option<&mut Vec<String>> {
        match placement {
            Placement::Hidden => None,
            Placement::Top => Some(&mut self.top),
            Placement::Middle => Some(&mut self.middle),
            Placement::Bottom => Some(&mut self.bottom),
        }
    }

    fn push(&mut self, placement: Placement, label: String) {
        if let Some(slot) = self.get_mut(placement) {
            slot.push(label);
        }
    }

    fn finish(self) -> DamageLabels {
        let join = |labels: Vec<String>| (!labels.is_empty()).then(|| labels.join(" - "));
        DamageLabels {
            top: join(self.top),
            middle: join(self.middle),
            bottom: join(self.bottom),
        }
    }
}

/// Arrange the labels of a damage or other roll
///
/// When the context shares the title's row it is merged as `Title (context)`.
/// With `context_replaces_title` / `context_replaces_damage` a context in the
/// same row suppresses the title or damage string.
pub fn damage_labels(
    config: &PipelineConfig,
    title: Option<&str>,
    context: Option<&str>,
    damage: Option<&str>,
) -> DamageLabels {
    let title = title.filter(|t| !t.is_empty());
    let context = context.filter(|c| !c.is_empty());
    let damage = damage.filter(|d| !d.is_empty());

    let title_at = config.damage_title_placement;
    let context_at = config.damage_context_placement;
    let damage_at = config.damage_roll_placement;

    let mut slots = Slots::default();

    let mut pushed_title = false;
    if let Some(title) = title {
        let replaced = config.context_replaces_title && context.is_some() && title_at == context_at;
        if title_at != Placement::Hidden && !replaced {
            slots.push(title_at, title.to_string());
            pushed_title = true;
        }
    }

    if let Some(context) = context {
        if pushed_title && context_at == title_at {
            if let Some(first) = slots.get_mut(title_at).and_then(|slot| slot.first_mut()) {
                *first = format!("{} ({})", first, context);
            }
        } else {
            slots.push(context_at, context.to_string());
        }
    }

    if let Some(damage) = damage {
        let replaced =
            config.context_replaces_damage && context.is_some() && damage_at == context_at;
        if !replaced {
            slots.push(damage_at, damage.to_string());
        }
    }

    slots.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(title: Placement, context: Placement, damage: Placement) -> PipelineConfig {
        PipelineConfig {
            damage_title_placement: title,
            damage_context_placement: context,
            damage_roll_placement: damage,
            context_replaces_title: false,
            context_replaces_damage: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_shared_row_joined() {
        let config = config(Placement::Top, Placement::Bottom, Placement::Top);
        let labels = damage_labels(&config, Some("Damage"), None, Some("Fire"));
        assert_eq!(labels.top.as_deref(), Some("Damage - Fire"));
        assert_eq!(labels.middle, None);
        assert_eq!(labels.bottom, None);
    }

    #[test]
    fn test_context_merged_into_title() {
        let config = config(Placement::Top, Placement::Top, Placement::Bottom);
        let labels = damage_labels(&config, Some("Damage"), Some("Sneak Attack"), Some("Piercing"));
        assert_eq!(labels.top.as_deref(), Some("Damage (Sneak Attack)"));
        assert_eq!(labels.bottom.as_deref(), Some("Piercing"));
    }

    #[test]
    fn test_context_replaces_title_and_damage() {
        let mut config = config(Placement::Top, Placement::Top, Placement::Top);
        config.context_replaces_title = true;
        config.context_replaces_damage = true;
        let labels = damage_labels(&config, Some("Damage"), Some("[Arrow]"), Some("Piercing"));
        assert_eq!(labels.top.as_deref(), Some("[Arrow]"));

        let labels = damage_labels(&config, Some("Damage"), None, Some("Piercing"));
        assert_eq!(labels.top.as_deref(), Some("Damage - Piercing"));
    }

    #[test]
    fn test_hidden_rows() {
        let config = config(Placement::Hidden, Placement::Middle, Placement::Hidden);
        let labels = damage_labels(&config, Some("Damage"), Some("Hex"), Some("Necrotic"));
        assert_eq!(labels, DamageLabels {
            top: None,
            middle: Some("Hex".to_string()),
            bottom: None,
        });
    }

    #[test]
    fn test_healing_has_no_title() {
        let config = config(Placement::Top, Placement::Top, Placement::Top);
        let labels = damage_labels(&config, None, None, Some("Healing"));
        assert_eq!(labels.top.as_deref(), Some("Healing"));
    }
}
