//! Catalog of actors and items loaded from TOML files
//!
//! A catalog directory holds any number of `*.toml` files, each listing
//! `[[actors]]` and `[[items]]`. Items naming an `owner` are placed in that
//! actor's inventory; the rest form a shared library that can be handed out
//! with [`Catalog::give_item`].

mod config;
mod registry;

pub use config::{CatalogFile, CatalogItem};
pub use registry::Catalog;

use std::path::PathBuf;
use thiserror::Error;

/// Error loading catalog files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    #[error("Parse error in '{path}': {error}")]
    Parse {
        error: toml::de::Error,
        path: PathBuf,
    },
    #[error("Validation error in '{path}': {message}")]
    Validation { message: String, path: PathBuf },
}

/// Error looking up catalog entries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown actor: {0}")]
    UnknownActor(String),
    #[error("Unknown item: {0}")]
    UnknownItem(String),
}
