//! Resource ledger - validating and committing item consumption
//!
//! Four axes can be requested at once: uses (charges), quantity, recharge and
//! a linked resource. Every requested axis is validated before any counter
//! changes; the new counters are then written in one step.

use crate::host::ResourceConsumer;
use crate::item::Item;
use crate::RollError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which consumable axes a run spends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionRequest {
    pub use_charges: bool,
    pub use_quantity: bool,
    pub use_recharge: bool,
    pub use_linked_resource: bool,
}

impl ConsumptionRequest {
    pub fn is_empty(&self) -> bool {
        !(self.use_charges || self.use_quantity || self.use_recharge || self.use_linked_resource)
    }
}

/// Result of a successful consumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeOutcome {
    Success,
    /// The last of an auto-destroying item was used up
    Destroy,
}

/// New counter values, applied together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CounterUpdate {
    uses: Option<u32>,
    quantity: Option<u32>,
    charged: Option<bool>,
}

impl CounterUpdate {
    fn apply(self, item: &mut Item) {
        if let Some(uses) = self.uses {
            item.uses.value = uses;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let (Some(charged), Some(recharge)) = (self.charged, item.recharge.as_mut()) {
            recharge.charged = charged;
        }
    }
}

/// Validate the uses, quantity and recharge axes without changing anything
///
/// The linked resource axis is not checked here since only the consumer can
/// decide it.
pub fn preflight(item: &Item, request: &ConsumptionRequest) -> Result<(), RollError> {
    let has_uses = item.uses.is_configured();
    let uses = item.uses.value;
    let quantity = item.quantity;

    if has_uses && request.use_charges && !request.use_quantity && uses == 0 {
        return Err(RollError::InsufficientUses(item.name.clone()));
    }
    if request.use_quantity && !request.use_charges && quantity == 0 {
        return Err(RollError::InsufficientUses(item.name.clone()));
    }
    if has_uses && request.use_charges && request.use_quantity && uses == 0 && quantity <= 1 {
        return Err(RollError::InsufficientUses(item.name.clone()));
    }
    if request.use_recharge && !item.recharge.is_some_and(|r| r.charged) {
        return Err(RollError::NotRecharged(item.name.clone()));
    }
    Ok(())
}

/// Validate every requested axis and commit the new counters
///
/// The linked resource is delegated to `resources` last, after the other
/// axes passed; a refusal leaves the item untouched.
pub fn consume<C>(
    item: &mut Item,
    request: &ConsumptionRequest,
    resources: &mut C,
) -> Result<ConsumeOutcome, RollError>
where
    C: ResourceConsumer + ?Sized,
{
    preflight(item, request)?;

    if request.use_linked_resource && item.consume.is_some() && !resources.consume(item) {
        warn!(item = %item.id, "linked resource consumption refused");
        return Err(RollError::ResourceConsumptionRefused(item.name.clone()));
    }

    let (update, outcome) = plan_update(item, request);
    update.apply(item);

    if !request.is_empty() {
        info!(
            item = %item.id,
            uses = item.uses.value,
            quantity = item.quantity,
            outcome = ?outcome,
            "consumed item resources"
        );
    }
    Ok(outcome)
}

fn plan_update(item: &Item, request: &ConsumptionRequest) -> (CounterUpdate, ConsumeOutcome) {
    let has_uses = item.uses.is_configured();
    let uses = item.uses.value;
    let quantity = item.quantity;
    let auto_destroy = item.uses.auto_destroy;

    let mut update = CounterUpdate::default();
    let mut outcome = ConsumeOutcome::Success;

    if has_uses && request.use_charges && !request.use_quantity {
        update.uses = Some(uses.saturating_sub(1));
    } else if request.use_quantity && !request.use_charges {
        if quantity <= 1 && auto_destroy {
            outcome = ConsumeOutcome::Destroy;
        }
        update.quantity = Some(quantity.saturating_sub(1));
    } else if has_uses && request.use_charges && request.use_quantity {
        let mut remaining_uses = uses.saturating_sub(1);
        let mut remaining_quantity = quantity;
        if remaining_uses < 1 {
            remaining_quantity = remaining_quantity.saturating_sub(1);
            remaining_uses = if remaining_quantity >= 1 { item.uses.max } else { 0 };
            if remaining_quantity < 1 && auto_destroy {
                outcome = ConsumeOutcome::Destroy;
            }
        }
        update.uses = Some(remaining_uses);
        update.quantity = Some(remaining_quantity);
    }

    if request.use_recharge {
        update.charged = Some(false);
    }

    (update, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ConsumeKind, ConsumeTarget, Recharge, Uses};
    use crate::types::ItemKind;
    use proptest::prelude::*;

    struct Consumer {
        allow: bool,
        calls: usize,
    }

    impl ResourceConsumer for Consumer {
        fn consume(&mut self, _item: &Item) -> bool {
            self.calls += 1;
            self.allow
        }
    }

    fn allow() -> Consumer {
        Consumer { allow: true, calls: 0 }
    }

    fn potion(uses: u32, max: u32, quantity: u32) -> Item {
        let mut item = Item::new("potion", "Potion", ItemKind::Consumable);
        item.uses = Uses {
            value: uses,
            max,
            per: Some("charges".to_string()),
            auto_destroy: true,
        };
        item.quantity = quantity;
        item
    }

    fn both() -> ConsumptionRequest {
        ConsumptionRequest {
            use_charges: true,
            use_quantity: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_last_use_of_last_item_destroys() {
        let mut item = potion(1, 1, 1);
        let outcome = consume(&mut item, &both(), &mut allow()).unwrap();
        assert_eq!(outcome, ConsumeOutcome::Destroy);
        assert_eq!(item.uses.value, 0);
        assert_eq!(item.quantity, 0);
    }

    #[test]
    fn test_empty_uses_open_next_item() {
        let mut item = potion(0, 3, 3);
        let outcome = consume(&mut item, &both(), &mut allow()).unwrap();
        assert_eq!(outcome, ConsumeOutcome::Success);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.uses.value, 3);
    }

    #[test]
    fn test_both_without_anything_left() {
        let mut item = potion(0, 3, 1);
        let result = consume(&mut item, &both(), &mut allow());
        assert!(matches!(result, Err(RollError::InsufficientUses(_))));
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_charges_only() {
        let request = ConsumptionRequest {
            use_charges: true,
            ..Default::default()
        };
        let mut item = potion(2, 3, 1);
        consume(&mut item, &request, &mut allow()).unwrap();
        assert_eq!(item.uses.value, 1);

        let mut empty = potion(0, 3, 1);
        assert!(matches!(
            consume(&mut empty, &request, &mut allow()),
            Err(RollError::InsufficientUses(_))
        ));
    }

    #[test]
    fn test_charges_ignored_without_uses() {
        let request = ConsumptionRequest {
            use_charges: true,
            ..Default::default()
        };
        let mut item = Item::new("sword", "Sword", ItemKind::Weapon);
        let outcome = consume(&mut item, &request, &mut allow()).unwrap();
        assert_eq!(outcome, ConsumeOutcome::Success);
        assert_eq!(item.uses.value, 0);
    }

    #[test]
    fn test_quantity_only() {
        let request = ConsumptionRequest {
            use_quantity: true,
            ..Default::default()
        };
        let mut item = potion(0, 0, 2);
        assert_eq!(consume(&mut item, &request, &mut allow()).unwrap(), ConsumeOutcome::Success);
        assert_eq!(item.quantity, 1);
        assert_eq!(consume(&mut item, &request, &mut allow()).unwrap(), ConsumeOutcome::Destroy);
        assert_eq!(item.quantity, 0);
        assert!(matches!(
            consume(&mut item, &request, &mut allow()),
            Err(RollError::InsufficientUses(_))
        ));
    }

    #[test]
    fn test_recharge() {
        let request = ConsumptionRequest {
            use_recharge: true,
            ..Default::default()
        };
        let mut item = Item::new("breath", "Fire Breath", ItemKind::Feat);
        assert!(matches!(
            consume(&mut item, &request, &mut allow()),
            Err(RollError::NotRecharged(_))
        ));

        item.recharge = Some(Recharge { value: 5, charged: true });
        consume(&mut item, &request, &mut allow()).unwrap();
        assert_eq!(item.recharge, Some(Recharge { value: 5, charged: false }));
        assert!(preflight(&item, &request).is_err());
    }

    #[test]
    fn test_refused_resource_leaves_counters() {
        let request = ConsumptionRequest {
            use_charges: true,
            use_linked_resource: true,
            ..Default::default()
        };
        let mut item = potion(2, 3, 1);
        item.consume = Some(ConsumeTarget {
            kind: ConsumeKind::Attribute,
            target: "resources.primary".to_string(),
            amount: 1,
        });

        let mut consumer = Consumer { allow: false, calls: 0 };
        let result = consume(&mut item, &request, &mut consumer);
        assert!(matches!(result, Err(RollError::ResourceConsumptionRefused(_))));
        assert_eq!(consumer.calls, 1);
        assert_eq!(item.uses.value, 2);
    }

    #[test]
    fn test_resource_skipped_without_target() {
        let request = ConsumptionRequest {
            use_linked_resource: true,
            ..Default::default()
        };
        let mut item = potion(2, 3, 1);
        let mut consumer = Consumer { allow: false, calls: 0 };
        assert!(consume(&mut item, &request, &mut consumer).is_ok());
        assert_eq!(consumer.calls, 0);
    }

    #[test]
    fn test_failed_check_skips_resource() {
        let request = ConsumptionRequest {
            use_charges: true,
            use_linked_resource: true,
            ..Default::default()
        };
        let mut item = potion(0, 3, 1);
        item.consume = Some(ConsumeTarget {
            kind: ConsumeKind::Ammo,
            target: "arrows".to_string(),
            amount: 1,
        });
        let mut consumer = allow();
        assert!(consume(&mut item, &request, &mut consumer).is_err());
        assert_eq!(consumer.calls, 0);
    }

    proptest! {
        #[test]
        fn prop_failed_consume_changes_nothing(
            uses in 0u32..4,
            max in 1u32..4,
            quantity in 0u32..3,
            charges in any::<bool>(),
            by_quantity in any::<bool>(),
            recharge in any::<bool>(),
            charged in any::<bool>(),
        ) {
            let mut item = potion(uses.min(max), max, quantity);
            item.recharge = Some(Recharge { value: 6, charged });
            let request = ConsumptionRequest {
                use_charges: charges,
                use_quantity: by_quantity,
                use_recharge: recharge,
                use_linked_resource: false,
            };
            let before = item.clone();
            match consume(&mut item, &request, &mut allow()) {
                Ok(_) => prop_assert!(item.uses.value <= max),
                Err(_) => prop_assert_eq!(item, before),
            }
        }
    }
}
