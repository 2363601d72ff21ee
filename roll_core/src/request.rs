//! Roll requests - the declarative program a pipeline run executes

use crate::config::CritBehavior;
use crate::ledger::ConsumptionRequest;
use crate::types::Ability;
use dice_core::SelectionMode;
use serde::{Deserialize, Serialize};

/// One step of a composite roll
///
/// Requests run in declaration order. Serialized with a `kind` tag:
///
/// ```rust
/// use roll_core::RollRequest;
///
/// let request: RollRequest = serde_json::from_str(r#"{"kind": "damage", "index": "all"}"#).unwrap();
/// assert!(matches!(request, RollRequest::Damage(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RollRequest {
    Attack(AttackArgs),
    Check(CheckArgs),
    Damage(DamageArgs),
    SaveDc(SaveDcArgs),
    Other,
    Custom(CustomArgs),
    Text { text: String },
    /// Flavor text; the item's chat flavor when no text is given
    Flavor {
        #[serde(default)]
        text: Option<String>,
    },
    /// The item's description as text
    Description,
    /// The item's extra crit damage line, or `index` when given
    CritExtra {
        #[serde(default)]
        index: Option<usize>,
    },
}

impl RollRequest {
    /// Attack that may trigger a crit
    pub fn attack() -> Self {
        RollRequest::Attack(AttackArgs::default())
    }

    pub fn check() -> Self {
        RollRequest::Check(CheckArgs::default())
    }

    /// Damage line `index` with no overrides
    pub fn damage(index: usize) -> Self {
        RollRequest::Damage(DamageArgs {
            index: DamageSelector::Index(index),
            ..Default::default()
        })
    }

    /// Every damage line of the item
    pub fn all_damage() -> Self {
        RollRequest::Damage(DamageArgs::default())
    }

    pub fn save_dc() -> Self {
        RollRequest::SaveDc(SaveDcArgs::default())
    }

    pub fn text(text: impl Into<String>) -> Self {
        RollRequest::Text { text: text.into() }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            RollRequest::Attack(_) => "attack",
            RollRequest::Check(_) => "check",
            RollRequest::Damage(_) => "damage",
            RollRequest::SaveDc(_) => "save_dc",
            RollRequest::Other => "other",
            RollRequest::Custom(_) => "custom",
            RollRequest::Text { .. } => "text",
            RollRequest::Flavor { .. } => "flavor",
            RollRequest::Description => "description",
            RollRequest::CritExtra { .. } => "crit_extra",
        }
    }
}

/// Attack roll arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackArgs {
    /// Advantage count; the run's advantage when unset
    pub adv: Option<u32>,
    /// Disadvantage count; the run's disadvantage when unset
    pub disadv: Option<u32>,
    /// Situational bonus formula
    pub bonus: Option<String>,
    /// A crit on this roll makes later damage critical
    pub triggers_crit: bool,
    /// Overrides the item and actor crit thresholds
    pub crit_threshold: Option<u32>,
}

impl Default for AttackArgs {
    fn default() -> Self {
        AttackArgs {
            adv: None,
            disadv: None,
            bonus: None,
            triggers_crit: true,
            crit_threshold: None,
        }
    }
}

/// Tool or ability check arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckArgs {
    pub adv: Option<u32>,
    pub disadv: Option<u32>,
    pub bonus: Option<String>,
    pub triggers_crit: bool,
    pub crit_threshold: Option<u32>,
    pub title: Option<String>,
}

impl Default for CheckArgs {
    fn default() -> Self {
        CheckArgs {
            adv: None,
            disadv: None,
            bonus: None,
            triggers_crit: true,
            crit_threshold: None,
            title: None,
        }
    }
}

/// Which damage lines a damage request rolls
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SelectorRepr", into = "SelectorRepr")]
pub enum DamageSelector {
    Index(usize),
    Indices(Vec<usize>),
    #[default]
    All,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    Index(usize),
    Indices(Vec<usize>),
    Keyword(SelectorKeyword),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SelectorKeyword {
    All,
}

impl From<SelectorRepr> for DamageSelector {
    fn from(repr: SelectorRepr) -> Self {
        match repr {
            SelectorRepr::Index(i) => DamageSelector::Index(i),
            SelectorRepr::Indices(list) => DamageSelector::Indices(list),
            SelectorRepr::Keyword(SelectorKeyword::All) => DamageSelector::All,
        }
    }
}

impl From<DamageSelector> for SelectorRepr {
    fn from(selector: DamageSelector) -> Self {
        match selector {
            DamageSelector::Index(i) => SelectorRepr::Index(i),
            DamageSelector::Indices(list) => SelectorRepr::Indices(list),
            DamageSelector::All => SelectorRepr::Keyword(SelectorKeyword::All),
        }
    }
}

/// Per-request override of crit damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritOverride {
    /// Crit dice when the run is critical
    #[default]
    Auto,
    Always,
    Never,
}

/// Damage roll arguments
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageArgs {
    pub index: DamageSelector,
    /// Use the versatile formula for the first selected line
    pub versatile: bool,
    pub crit: CritOverride,
    /// Label shown with the damage
    pub context: Option<String>,
}

/// Save DC arguments; unset fields come from the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveDcArgs {
    pub ability: Option<Ability>,
    pub dc: Option<u32>,
}

/// Advantage state for custom rolls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollState {
    Adv,
    Disadv,
}

impl From<RollState> for SelectionMode {
    fn from(state: RollState) -> Self {
        match state {
            RollState::Adv => SelectionMode::Highest,
            RollState::Disadv => SelectionMode::Lowest,
        }
    }
}

/// Free-form roll arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomArgs {
    pub title: Option<String>,
    pub formula: String,
    pub rolls: u32,
    pub roll_state: Option<RollState>,
}

impl Default for CustomArgs {
    fn default() -> Self {
        CustomArgs {
            title: None,
            formula: "1d20".to_string(),
            rolls: 1,
            roll_state: None,
        }
    }
}

/// Parameters for a whole run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RollParams {
    pub adv: u32,
    pub disadv: u32,
    /// Cast level; skips the slot dialog when set
    pub slot_level: Option<u8>,
    /// First damage line uses the versatile formula
    pub versatile: bool,
    pub consume: ConsumptionRequest,
    /// Place the area template for features and cantrips
    pub use_template: bool,
    pub crit_behavior: Option<CritBehavior>,
    pub title: Option<String>,
    /// Include the item's properties in the result
    pub properties: bool,
}

impl RollParams {
    pub fn selection(&self) -> SelectionMode {
        SelectionMode::from_counts(self.adv, self.disadv)
    }

    pub fn with_advantage(mut self) -> Self {
        self.adv += 1;
        self
    }

    pub fn with_disadvantage(mut self) -> Self {
        self.disadv += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_selector_forms() {
        let single: DamageArgs = serde_json::from_str(r#"{"index": 2}"#).unwrap();
        assert_eq!(single.index, DamageSelector::Index(2));

        let list: DamageArgs = serde_json::from_str(r#"{"index": [0, 2]}"#).unwrap();
        assert_eq!(list.index, DamageSelector::Indices(vec![0, 2]));

        let all: DamageArgs = serde_json::from_str(r#"{"index": "all"}"#).unwrap();
        assert_eq!(all.index, DamageSelector::All);

        let json = serde_json::to_string(&DamageSelector::All).unwrap();
        assert_eq!(json, "\"all\"");
    }

    #[test]
    fn test_request_defaults() {
        let request: RollRequest = serde_json::from_str(r#"{"kind": "attack"}"#).unwrap();
        match request {
            RollRequest::Attack(args) => {
                assert!(args.triggers_crit);
                assert_eq!(args.adv, None);
            }
            other => panic!("Expected attack, got {:?}", other),
        }

        let request: RollRequest = serde_json::from_str(r#"{"kind": "custom"}"#).unwrap();
        match request {
            RollRequest::Custom(args) => {
                assert_eq!(args.formula, "1d20");
                assert_eq!(args.rolls, 1);
            }
            other => panic!("Expected custom, got {:?}", other),
        }
    }

    #[test]
    fn test_requests_from_toml() {
        #[derive(Deserialize)]
        struct Program {
            requests: Vec<RollRequest>,
        }

        let program: Program = toml::from_str(
            r#"
[[requests]]
kind = "attack"
adv = 1

[[requests]]
kind = "damage"
index = 0
versatile = true
crit = "never"

[[requests]]
kind = "crit_extra"
"#,
        )
        .unwrap();

        assert_eq!(program.requests.len(), 3);
        assert_eq!(program.requests[2], RollRequest::CritExtra { index: None });
        match &program.requests[1] {
            RollRequest::Damage(args) => {
                assert_eq!(args.index, DamageSelector::Index(0));
                assert_eq!(args.crit, CritOverride::Never);
                assert!(args.versatile);
            }
            other => panic!("Expected damage, got {:?}", other),
        }
    }

    #[test]
    fn test_params_selection() {
        let params = RollParams::default().with_advantage();
        assert_eq!(params.selection(), SelectionMode::Highest);
        let params = params.with_disadvantage();
        assert_eq!(params.selection(), SelectionMode::None);
    }
}
