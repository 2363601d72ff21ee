use crate::config::{CatalogFile, CatalogItem};
use crate::{CatalogError, LoadError};
use dice_core::Formula;
use roll_core::{Actor, Item};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Actors and library items, loaded from TOML files
#[derive(Debug, Default)]
pub struct Catalog {
    actors: BTreeMap<String, Actor>,
    items: BTreeMap<String, Item>,
    /// Owned items waiting for their actor, resolved once every file is read
    pending: Vec<(PathBuf, String, Item)>,
    sources: BTreeMap<String, PathBuf>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every catalog file under a directory (recursively)
    pub fn load(dir: &Path) -> Result<Self, LoadError> {
        let mut catalog = Self::new();
        catalog.load_dir(dir)?;
        catalog.assign_owned()?;
        info!(
            actors = catalog.actors.len(),
            items = catalog.items.len(),
            dir = %dir.display(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    fn load_dir(&mut self, dir: &Path) -> Result<(), LoadError> {
        if !dir.exists() {
            return Ok(());
        }

        let entries = std::fs::read_dir(dir).map_err(|e| LoadError::Io {
            error: e,
            path: Some(dir.to_path_buf()),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LoadError::Io {
                error: e,
                path: Some(dir.to_path_buf()),
            })?;
            paths.push(entry.path());
        }
        // Directory order is platform dependent; duplicates must be reported
        // against the same file every time.
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.load_dir(&path)?;
            } else if path.extension().is_some_and(|ext| ext == "toml") {
                self.load_file(&path)?;
            }
        }

        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            error: e,
            path: Some(path.to_path_buf()),
        })?;

        let file: CatalogFile = toml::from_str(&content).map_err(|e| LoadError::Parse {
            error: e,
            path: path.to_path_buf(),
        })?;

        let invalid = |message: String| LoadError::Validation {
            message,
            path: path.to_path_buf(),
        };

        for actor in file.actors {
            for item in &actor.items {
                validate_item(item).map_err(invalid)?;
            }
            if self.actors.contains_key(&actor.id) {
                return Err(invalid(format!("duplicate actor '{}'", actor.id)));
            }
            self.sources.insert(actor.id.clone(), path.to_path_buf());
            self.actors.insert(actor.id.clone(), actor);
        }

        for CatalogItem { owner, item } in file.items {
            validate_item(&item).map_err(invalid)?;
            match owner {
                Some(owner) => self.pending.push((path.to_path_buf(), owner, item)),
                None => {
                    if self.items.contains_key(&item.id) {
                        return Err(invalid(format!("duplicate item '{}'", item.id)));
                    }
                    self.items.insert(item.id.clone(), item);
                }
            }
        }

        debug!(path = %path.display(), "read catalog file");
        Ok(())
    }

    /// Move owned items into their actors' inventories
    fn assign_owned(&mut self) -> Result<(), LoadError> {
        for (path, owner, item) in std::mem::take(&mut self.pending) {
            let Some(actor) = self.actors.get_mut(&owner) else {
                return Err(LoadError::Validation {
                    message: format!("item '{}' names unknown owner '{}'", item.id, owner),
                    path,
                });
            };
            if actor.item(&item.id).is_some() {
                return Err(LoadError::Validation {
                    message: format!("actor '{}' already owns item '{}'", owner, item.id),
                    path,
                });
            }
            actor.items.push(item);
        }
        Ok(())
    }

    /// Get an actor by ID
    pub fn get_actor(&self, id: &str) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Get an actor by ID, failing when it is missing
    pub fn actor(&self, id: &str) -> Result<&Actor, CatalogError> {
        self.actors
            .get(id)
            .ok_or_else(|| CatalogError::UnknownActor(id.to_string()))
    }

    /// Mutable actor, for running rolls that spend its resources
    pub fn actor_mut(&mut self, id: &str) -> Result<&mut Actor, CatalogError> {
        self.actors
            .get_mut(id)
            .ok_or_else(|| CatalogError::UnknownActor(id.to_string()))
    }

    /// Get a library item by ID
    pub fn item(&self, id: &str) -> Result<&Item, CatalogError> {
        self.items
            .get(id)
            .ok_or_else(|| CatalogError::UnknownItem(id.to_string()))
    }

    /// Check if an actor exists
    pub fn contains_actor(&self, id: &str) -> bool {
        self.actors.contains_key(id)
    }

    /// Check if a library item exists
    pub fn contains_item(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// List all actor IDs
    pub fn actor_ids(&self) -> impl Iterator<Item = &str> {
        self.actors.keys().map(|s| s.as_str())
    }

    /// List all library item IDs
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(|s| s.as_str())
    }

    /// File an actor was loaded from
    pub fn source_of(&self, actor_id: &str) -> Option<&Path> {
        self.sources.get(actor_id).map(|p| p.as_path())
    }

    /// Copy a library item into an actor's inventory
    ///
    /// An item the actor already holds is left untouched.
    pub fn give_item(&mut self, actor_id: &str, item_id: &str) -> Result<(), CatalogError> {
        let item = self.item(item_id)?.clone();
        let actor = self.actor_mut(actor_id)?;
        if actor.item(item_id).is_none() {
            actor.items.push(item);
        }
        Ok(())
    }
}

/// Reject items whose formulas or crit settings can never roll
fn validate_item(item: &Item) -> Result<(), String> {
    let formulas = item
        .damage
        .parts
        .iter()
        .map(|part| part.formula.as_str())
        .chain(item.damage.versatile.as_deref())
        .chain(item.formula.as_deref())
        .chain(item.crit.bonus_dice.as_deref());

    for formula in formulas.filter(|f| !f.trim().is_empty()) {
        Formula::parse(formula)
            .map_err(|e| format!("item '{}' has a bad formula '{}': {}", item.id, formula, e))?;
    }

    if let Some(index) = item.crit.extra_damage {
        if index >= item.damage.parts.len() {
            return Err(format!(
                "item '{}' crit extra damage line {} is out of range ({} lines)",
                item.id,
                index,
                item.damage.parts.len()
            ));
        }
    }
    Ok(())
}
