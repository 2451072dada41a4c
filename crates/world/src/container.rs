use restock_core::ItemStack;
use serde::{Deserialize, Serialize};

/// Number of slots in a single chest inventory (3 rows × 9 columns).
pub const CHEST_SLOT_COUNT: usize = 27;

/// Number of slots in a dispenser inventory.
pub const DISPENSER_SLOT_COUNT: usize = 9;

/// Block kinds that own a slot array and may be registered for restocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Single chest.
    Chest,
    /// Dispenser.
    Dispenser,
}

impl ContainerKind {
    /// Slot count of a freshly placed container of this kind.
    pub fn slot_count(self) -> usize {
        match self {
            ContainerKind::Chest => CHEST_SLOT_COUNT,
            ContainerKind::Dispenser => DISPENSER_SLOT_COUNT,
        }
    }

    /// Parse a block name (`chest`, `dispenser`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chest" => Some(ContainerKind::Chest),
            "dispenser" => Some(ContainerKind::Dispenser),
            _ => None,
        }
    }
}

/// Get/set/clear access over a fixed-size slot array.
pub trait Container {
    /// Number of slots.
    fn size(&self) -> usize;

    /// Item in `slot`, or `None` when empty or out of range.
    fn get_item(&self, slot: usize) -> Option<&ItemStack>;

    /// Replace the item in `slot`. Out-of-range slots are ignored.
    fn set_item(&mut self, slot: usize, item: Option<ItemStack>);

    /// Empty every slot.
    fn clear(&mut self);

    /// Copy of every slot, in order.
    fn contents(&self) -> Vec<Option<ItemStack>> {
        (0..self.size()).map(|i| self.get_item(i).cloned()).collect()
    }
}

/// Vec-backed container used by the in-memory world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotContainer {
    slots: Vec<Option<ItemStack>>,
}

impl SlotContainer {
    /// Create an empty container sized for `kind`.
    pub fn new(kind: ContainerKind) -> Self {
        Self {
            slots: vec![None; kind.slot_count()],
        }
    }
}

impl Container for SlotContainer {
    fn size(&self) -> usize {
        self.slots.len()
    }

    fn get_item(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn set_item(&mut self, slot: usize, item: Option<ItemStack>) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = item;
        }
    }

    fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}
