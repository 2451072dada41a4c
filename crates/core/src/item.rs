//! Item system - live item stacks and the plain-data slot records saved in
//! restock templates.
//!
//! A live [`ItemStack`] may carry extended metadata (display name, lore,
//! enchantments). Templates only keep the type identifier, the quantity and
//! the variant value, so [`ItemSlot::capture`] discards [`ItemMeta`]. A
//! restocked container therefore receives plain stacks: this is a known gap
//! of the template format and is kept on purpose.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type identifier of the empty item.
pub const AIR: &str = "air";

/// Extended item metadata that templates do not record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    /// Custom display name.
    pub display_name: Option<String>,
    /// Lore lines shown under the name.
    pub lore: Vec<String>,
    /// Enchantment identifiers with their levels.
    pub enchantments: Vec<(String, u8)>,
}

/// An item stack as held by a live container slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Type identifier (e.g. `bread`, `iron_sword`).
    pub item_id: String,
    /// Quantity in stack
    pub count: u32,
    /// Sub-type or durability value.
    pub damage: u16,
    /// Extended metadata, if any.
    pub meta: Option<ItemMeta>,
}

impl ItemStack {
    /// Create a plain stack without metadata.
    pub fn new(item_id: impl Into<String>, count: u32) -> Self {
        Self {
            item_id: item_id.into(),
            count,
            damage: 0,
            meta: None,
        }
    }

    /// Set the sub-type/durability value.
    pub fn with_damage(mut self, damage: u16) -> Self {
        self.damage = damage;
        self
    }

    /// Attach extended metadata.
    pub fn with_meta(mut self, meta: ItemMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// True for air or zero-count stacks.
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item_id.is_empty() || self.item_id == AIR
    }
}

/// Errors raised when a decoded [`ItemSlot`] violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemSlotError {
    /// The type identifier was empty or air.
    #[error("item slot has no type")]
    MissingType,
    /// Slots must hold at least one item.
    #[error("item slot `{item_type}` has amount 0")]
    ZeroAmount {
        /// Offending type identifier.
        item_type: String,
    },
}

/// Plain-data record of one template slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemSlot {
    /// Type identifier.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Quantity, always at least 1.
    pub amount: u32,
    /// Sub-type/durability value.
    #[serde(default)]
    pub variant: u16,
}

impl ItemSlot {
    /// Record a live stack. Empty stacks yield `None`; metadata is dropped.
    pub fn capture(stack: &ItemStack) -> Option<Self> {
        if stack.is_empty() {
            return None;
        }
        Some(Self {
            item_type: stack.item_id.clone(),
            amount: stack.count,
            variant: stack.damage,
        })
    }

    /// Rebuild a live stack from this record (never carries metadata).
    pub fn to_stack(&self) -> ItemStack {
        ItemStack::new(self.item_type.clone(), self.amount).with_damage(self.variant)
    }

    /// Check the invariants a decoded record must satisfy.
    pub fn validate(&self) -> Result<(), ItemSlotError> {
        if self.item_type.is_empty() || self.item_type == AIR {
            return Err(ItemSlotError::MissingType);
        }
        if self.amount == 0 {
            return Err(ItemSlotError::ZeroAmount {
                item_type: self.item_type.clone(),
            });
        }
        Ok(())
    }
}

/// Capture a full slot array into a template of the same length.
pub fn capture_slots(live: &[Option<ItemStack>]) -> Vec<Option<ItemSlot>> {
    live.iter()
        .map(|slot| slot.as_ref().and_then(ItemSlot::capture))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_skips_air_and_empty_stacks() {
        assert!(ItemSlot::capture(&ItemStack::new(AIR, 4)).is_none());
        assert!(ItemSlot::capture(&ItemStack::new("bread", 0)).is_none());
        assert!(ItemSlot::capture(&ItemStack::new("", 3)).is_none());
    }

    #[test]
    fn capture_drops_extended_metadata() {
        let stack = ItemStack::new("iron_sword", 1)
            .with_damage(12)
            .with_meta(ItemMeta {
                display_name: Some("Oathkeeper".into()),
                lore: vec!["old".into()],
                enchantments: vec![("sharpness".into(), 3)],
            });
        let slot = ItemSlot::capture(&stack).expect("non-empty");
        assert_eq!(slot.item_type, "iron_sword");
        assert_eq!(slot.amount, 1);
        assert_eq!(slot.variant, 12);

        let rebuilt = slot.to_stack();
        assert_eq!(rebuilt.meta, None);
        assert_ne!(rebuilt, stack);
    }

    #[test]
    fn capture_slots_keeps_length_and_positions() {
        let live = vec![
            Some(ItemStack::new("bread", 3)),
            None,
            Some(ItemStack::new(AIR, 1)),
            Some(ItemStack::new("arrow", 16)),
        ];
        let template = capture_slots(&live);
        assert_eq!(template.len(), 4);
        assert!(template[0].is_some());
        assert!(template[1].is_none());
        assert!(template[2].is_none());
        assert_eq!(template[3].as_ref().map(|s| s.amount), Some(16));
    }

    #[test]
    fn slot_serializes_with_plain_field_names() {
        let slot = ItemSlot {
            item_type: "wool".into(),
            amount: 2,
            variant: 14,
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["type"], "wool");
        assert_eq!(json["amount"], 2);
        assert_eq!(json["variant"], 14);

        let decoded: ItemSlot =
            serde_json::from_str(r#"{"type":"wool","amount":2}"#).unwrap();
        assert_eq!(decoded.variant, 0);
    }

    #[test]
    fn validate_rejects_zero_amount_and_missing_type() {
        let zero = ItemSlot {
            item_type: "wool".into(),
            amount: 0,
            variant: 0,
        };
        assert!(matches!(
            zero.validate(),
            Err(ItemSlotError::ZeroAmount { .. })
        ));
        let air = ItemSlot {
            item_type: AIR.into(),
            amount: 1,
            variant: 0,
        };
        assert_eq!(air.validate(), Err(ItemSlotError::MissingType));
    }
}
