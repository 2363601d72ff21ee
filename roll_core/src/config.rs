//! Pipeline configuration

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How critical hits change damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritBehavior {
    /// No crit dice
    None,
    /// Roll the damage dice once more
    #[default]
    BonusDiceOnly,
    /// Crit dice always show their maximum
    MaximizeBase,
    /// Crit dice at maximum, plus whatever the base roll fell short of its maximum
    MaximizeBoth,
}

/// Where a label is shown on a damage entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Hidden,
    #[default]
    Top,
    Middle,
    Bottom,
}

/// When a save DC is hidden from viewers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideDc {
    #[default]
    Never,
    NpcOnly,
    Always,
}

/// Options shared by every run of a pipeline
///
/// Every field has a default, so a config file only needs the options it
/// changes:
///
/// ```rust
/// use roll_core::{CritBehavior, PipelineConfig};
///
/// let config = PipelineConfig::from_toml_str("crit_behavior = \"maximize_base\"").unwrap();
/// assert_eq!(config.crit_behavior, CritBehavior::MaximizeBase);
/// assert_eq!(config.multi_roll_count, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Evaluations per d20 roll without advantage (1-3)
    pub multi_roll_count: u32,
    pub crit_behavior: CritBehavior,
    pub roll_title_placement: Placement,
    pub damage_title_placement: Placement,
    pub damage_roll_placement: Placement,
    pub damage_context_placement: Placement,
    /// Context shown in the title's place replaces the title
    pub context_replaces_title: bool,
    /// Context shown in the damage type's place replaces the damage type
    pub context_replaces_damage: bool,
    /// Label next to crit dice
    pub crit_string: String,
    pub hide_dc: HideDc,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            multi_roll_count: 1,
            crit_behavior: CritBehavior::BonusDiceOnly,
            roll_title_placement: Placement::Top,
            damage_title_placement: Placement::Top,
            damage_roll_placement: Placement::Top,
            damage_context_placement: Placement::Top,
            context_replaces_title: true,
            context_replaces_damage: false,
            crit_string: "Crit".to_string(),
            hide_dc: HideDc::Never,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=3).contains(&self.multi_roll_count) {
            return Err(ConfigError::Validation(format!(
                "multi_roll_count must be between 1 and 3, got {}",
                self.multi_roll_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.multi_roll_count, 1);
        assert_eq!(config.crit_string, "Crit");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
multi_roll_count = 2
damage_context_placement = "bottom"
hide_dc = "npc_only"
crit_string = "Critical"
"#,
        )
        .unwrap();
        assert_eq!(config.multi_roll_count, 2);
        assert_eq!(config.damage_context_placement, Placement::Bottom);
        assert_eq!(config.hide_dc, HideDc::NpcOnly);
        assert_eq!(config.crit_string, "Critical");
        assert_eq!(config.roll_title_placement, Placement::Top);
    }

    #[test]
    fn test_validation() {
        let result = PipelineConfig::from_toml_str("multi_roll_count = 4");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        let result = PipelineConfig::from_toml_str("multi_roll_count = 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = PipelineConfig::from_toml_str("crit_behavior = \"sometimes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = PipelineConfig::load_from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
