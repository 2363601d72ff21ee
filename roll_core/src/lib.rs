//! roll_core - Composite roll pipeline for actors and their items
//!
//! This library provides:
//! - Actor / Item: The creatures that roll and the things they roll with
//! - RollRequest: Declarative steps of a composite roll
//! - RequestPipeline: Runs a request program into one CompositeResult
//! - Resource ledger: Uses, quantity, recharge and linked resource consumption
//! - Quick-roll presets and actor rolls (skills, checks, saves)
//!
//! # Quick Start
//!
//! ```rust
//! use roll_core::prelude::*;
//! use dice_core::ScriptedSource;
//!
//! let sword = Item::new("longsword", "Longsword", ItemKind::Weapon)
//!     .with_action(ActionType::Mwak)
//!     .with_damage("1d8 + @mod", Some(DamageType::Slashing));
//! let mut fighter = Actor::new("fighter", "Fighter").with_item(sword);
//!
//! let pipeline = RequestPipeline::new(PipelineConfig::default());
//! let mut source = ScriptedSource::new([15, 6]);
//! let mut host = StaticHost::new();
//! let result = pipeline
//!     .run(
//!         &mut fighter,
//!         "longsword",
//!         &[RollRequest::attack(), RollRequest::damage(0)],
//!         &RollParams::default(),
//!         &mut source,
//!         &mut host,
//!     )
//!     .unwrap();
//! assert_eq!(result.entries.len(), 2);
//! assert!(!result.is_crit);
//! ```

pub mod actor;
pub mod actor_roll;
pub mod config;
pub mod context;
pub mod host;
pub mod item;
pub mod labels;
pub mod ledger;
pub mod pipeline;
pub mod prelude;
pub mod preset;
pub mod render;
pub mod request;
pub mod result;
pub mod types;

// Core API - what most users need
pub use actor::Actor;
pub use item::Item;
pub use pipeline::RequestPipeline;
pub use request::{RollParams, RollRequest};
pub use result::{CompositeResult, ResultEntry};

// Configuration
pub use config::{CritBehavior, HideDc, PipelineConfig, Placement};

// Host collaborators
pub use host::{
    ResourceConsumer, RollHost, SlotChoice, SlotSelectionDialog, StaticHost, TemplatePlacer,
};
pub use render::{JsonRenderer, PresentationRenderer};

// Advanced
pub use actor_roll::{roll_ability_check, roll_ability_save, roll_skill, ActorRollArgs};
pub use context::RollContext;
pub use ledger::{ConsumeOutcome, ConsumptionRequest};
pub use preset::{build_preset, Preset, QuickRollPresets};

use dice_core::FormulaError;
use thiserror::Error;
use types::SlotLevel;

/// Error aborting a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("{0} has no uses left")]
    InsufficientUses(String),
    #[error("{0} is not recharged")]
    NotRecharged(String),
    #[error("Linked resource of {0} could not be consumed")]
    ResourceConsumptionRefused(String),
    #[error("Slot selection for {0} was cancelled")]
    SlotSelectionCancelled(String),
    #[error("No {slot} slots left to cast {item}")]
    NoSlotsAvailable { item: String, slot: SlotLevel },
    #[error("Unknown item: {0}")]
    UnknownItem(String),
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),
    #[error("{item} has no damage line {index} (it has {len})")]
    DamageIndexOutOfRange { item: String, index: usize, len: usize },
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),
    #[error("Render error: {0}")]
    Render(String),
}

/// Error loading a pipeline config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Validation(String),
}
