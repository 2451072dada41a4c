#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod item;
pub mod location;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use item::{capture_slots, ItemMeta, ItemSlot, ItemSlotError, ItemStack, AIR};
pub use location::{LocationKey, LocationKeyError};

/// Host simulation rate (20 TPS => 50 ms per tick).
pub const TICKS_PER_SECOND: u64 = 20;

/// Fixed tick type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }

    /// Whole seconds elapsed at this tick.
    pub fn seconds(self) -> u64 {
        self.0 / TICKS_PER_SECOND
    }
}
