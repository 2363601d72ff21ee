//! Prelude module for convenient imports
//!
//! ```rust
//! use roll_core::prelude::*;
//! ```

// Model
pub use crate::actor::Actor;
pub use crate::item::Item;
pub use crate::types::{Ability, ActionType, ActorKind, DamageType, ItemKind, SlotLevel};

// Requests and results
pub use crate::request::{DamageSelector, RollParams, RollRequest};
pub use crate::result::{CompositeResult, ResultEntry};

// Pipeline
pub use crate::config::PipelineConfig;
pub use crate::pipeline::RequestPipeline;
pub use crate::preset::{build_preset, Preset};

// Host collaborators
pub use crate::host::{RollHost, SlotChoice, StaticHost};

pub use crate::RollError;
