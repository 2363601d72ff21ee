use roll_core::{Actor, Item};
use serde::Deserialize;

/// Raw contents of one catalog file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

/// An item entry, optionally assigned to an actor
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    /// Actor id whose inventory receives the item
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(flatten)]
    pub item: Item,
}
