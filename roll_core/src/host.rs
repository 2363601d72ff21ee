//! Host collaborators - the capabilities a run borrows from its environment

use crate::item::Item;
use crate::types::SlotLevel;
use serde::{Deserialize, Serialize};

/// The slot picked in the cast dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotChoice {
    pub level: SlotLevel,
    /// Spend a slot of the chosen level
    pub consume_slot: bool,
    /// Place the spell's area template
    pub place_template: bool,
}

impl SlotChoice {
    /// Cast at `level`, spending a slot, without a template
    pub fn level(level: u8) -> Self {
        SlotChoice {
            level: SlotLevel::Level(level),
            consume_slot: true,
            place_template: false,
        }
    }

    pub fn pact() -> Self {
        SlotChoice {
            level: SlotLevel::Pact,
            consume_slot: true,
            place_template: false,
        }
    }
}

/// Asks the user at which level to cast a leveled spell
pub trait SlotSelectionDialog {
    /// `None` when the user cancels
    fn choose(&mut self, item: &Item) -> Option<SlotChoice>;
}

/// Spends the linked resource of an item (ammunition, attribute, ...)
pub trait ResourceConsumer {
    /// Returns false to refuse the consumption
    fn consume(&mut self, item: &Item) -> bool;
}

/// Places an area-of-effect template for an item
pub trait TemplatePlacer {
    fn place(&mut self, item: &Item);
}

/// Everything a run needs from its host
pub trait RollHost: SlotSelectionDialog + ResourceConsumer + TemplatePlacer {}

impl<T> RollHost for T where T: SlotSelectionDialog + ResourceConsumer + TemplatePlacer {}

/// Host with fixed answers that records what it was asked to do
///
/// Useful headless, where no dialog can be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHost {
    /// Answer to every slot dialog; `None` cancels
    pub slot_choice: Option<SlotChoice>,
    pub allow_consumption: bool,
    /// Number of slot dialogs shown
    pub dialogs: usize,
    /// Ids of items whose linked resource was spent
    pub consumed: Vec<String>,
    /// Ids of items whose template was placed
    pub placed: Vec<String>,
}

impl Default for StaticHost {
    fn default() -> Self {
        StaticHost {
            slot_choice: None,
            allow_consumption: true,
            dialogs: 0,
            consumed: Vec::new(),
            placed: Vec::new(),
        }
    }
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, choice: SlotChoice) -> Self {
        self.slot_choice = Some(choice);
        self
    }

    pub fn refusing_consumption(mut self) -> Self {
        self.allow_consumption = false;
        self
    }
}

impl SlotSelectionDialog for StaticHost {
    fn choose(&mut self, _item: &Item) -> Option<SlotChoice> {
        self.dialogs += 1;
        self.slot_choice
    }
}

impl ResourceConsumer for StaticHost {
    fn consume(&mut self, item: &Item) -> bool {
        if self.allow_consumption {
            self.consumed.push(item.id.clone());
        }
        self.allow_consumption
    }
}

impl TemplatePlacer for StaticHost {
    fn place(&mut self, item: &Item) {
        self.placed.push(item.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;

    fn ask(host: &mut dyn RollHost, item: &Item) -> Option<SlotChoice> {
        host.choose(item)
    }

    #[test]
    fn test_static_host_records() {
        let item = Item::new("bless", "Bless", ItemKind::Spell);
        let mut host = StaticHost::new().with_slot(SlotChoice::level(2));
        assert_eq!(ask(&mut host, &item), Some(SlotChoice::level(2)));
        assert_eq!(host.dialogs, 1);

        assert!(host.consume(&item));
        host.place(&item);
        assert_eq!(host.consumed, vec!["bless".to_string()]);
        assert_eq!(host.placed, vec!["bless".to_string()]);

        let mut refusing = StaticHost::new().refusing_consumption();
        assert!(!refusing.consume(&item));
        assert!(refusing.consumed.is_empty());
        assert_eq!(refusing.choose(&item), None);
    }
}
