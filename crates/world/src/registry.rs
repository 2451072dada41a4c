//! Authoritative store of registered containers.
//!
//! All state sits behind one `RwLock`. Every mutation that is persisted
//! writes the state document while still holding the write guard, so the file
//! always reflects a whole mutation and never a partially applied one.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use restock_core::{capture_slots, ItemSlot, ItemStack, LocationKey};
use tracing::{info, warn};

use crate::{Container, RestockError, RestockStore};

/// Everything the registry knows about one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    /// Saved contents, one entry per slot at registration time.
    pub template: Vec<Option<ItemSlot>>,
    /// Seconds until the next automatic restock.
    pub timer: u32,
    /// Value `timer` is reloaded to after each restock.
    pub restock_interval: u32,
}

impl ContainerRecord {
    /// New record with a full timer.
    pub fn new(template: Vec<Option<ItemSlot>>, restock_interval: u32) -> Self {
        Self {
            template,
            timer: restock_interval,
            restock_interval,
        }
    }

    /// Number of non-empty template slots.
    pub fn filled_slots(&self) -> usize {
        self.template.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Result of advancing one record by a single scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStep {
    /// The record vanished before the step ran.
    Missing,
    /// Timer decremented; `remaining` seconds left.
    Counting {
        /// Seconds left after this step.
        remaining: u32,
    },
    /// This step expires the timer; a restock is due.
    Due,
}

/// Overwrite `container` with `template`: clear every slot, then copy the
/// overlapping indices. Returns the number of slots filled.
pub fn apply_template(template: &[Option<ItemSlot>], container: &mut dyn Container) -> usize {
    container.clear();
    let mut filled = 0;
    for (index, slot) in template.iter().enumerate().take(container.size()) {
        if let Some(slot) = slot {
            container.set_item(index, Some(slot.to_stack()));
            filled += 1;
        }
    }
    filled
}

/// Thread-safe map of [`LocationKey`] to [`ContainerRecord`].
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    records: RwLock<BTreeMap<LocationKey, ContainerRecord>>,
    store: Option<RestockStore>,
}

impl ContainerRegistry {
    /// Registry without persistence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry that persists to `store`.
    pub fn with_store(store: RestockStore) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            store: Some(store),
        }
    }

    /// Load the registry from `store`.
    ///
    /// A missing document yields an empty registry. A malformed document is
    /// logged and also yields an empty registry; individual malformed records
    /// are logged and skipped.
    pub fn load(store: RestockStore, default_interval: u32) -> Self {
        let records = match store.load(default_interval) {
            Ok(report) => {
                for skipped in &report.skipped {
                    let err = RestockError::from(skipped.clone());
                    warn!(%err, "Skipping malformed restock record");
                }
                info!(
                    path = %store.path().display(),
                    loaded = report.records.len(),
                    skipped = report.skipped.len(),
                    "Loaded restock state"
                );
                report.records
            }
            Err(err) => {
                warn!(
                    %err,
                    path = %store.path().display(),
                    "Failed to load restock state. Starting empty"
                );
                BTreeMap::new()
            }
        };
        Self {
            records: RwLock::new(records),
            store: Some(store),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<LocationKey, ContainerRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<LocationKey, ContainerRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `records` to the store. Failures are logged; memory stays authoritative.
    fn persist(&self, records: &BTreeMap<LocationKey, ContainerRecord>) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(records) {
                warn!(%err, path = %store.path().display(), "Failed to save restock state");
            }
        }
    }

    /// Register the container at `key`, capturing its current contents.
    ///
    /// Replaces any existing record. Returns the number of captured slots.
    pub fn register(
        &self,
        key: LocationKey,
        live: &[Option<ItemStack>],
        default_interval: u32,
    ) -> usize {
        let record = ContainerRecord::new(capture_slots(live), default_interval);
        let captured = record.filled_slots();
        info!(
            %key,
            slots = live.len(),
            captured,
            interval = default_interval,
            "Registered container"
        );

        let mut records = self.write();
        records.insert(key, record);
        self.persist(&records);
        captured
    }

    /// Overwrite `container` with the template saved for `key` and reset its timer.
    ///
    /// The state document is not rewritten here; only register, clear,
    /// interval changes and removals persist.
    pub fn restock(
        &self,
        key: &LocationKey,
        container: &mut dyn Container,
    ) -> Result<usize, RestockError> {
        let mut records = self.write();
        let record = records
            .get_mut(key)
            .ok_or_else(|| RestockError::NotRegistered(key.clone()))?;
        let filled = apply_template(&record.template, container);
        record.timer = record.restock_interval;
        Ok(filled)
    }

    /// Set both the interval and the timer of an existing record.
    pub fn set_interval(&self, key: &LocationKey, seconds: i64) -> Result<(), RestockError> {
        let seconds = u32::try_from(seconds).map_err(|_| RestockError::InvalidInterval(seconds))?;

        let mut records = self.write();
        let record = records
            .get_mut(key)
            .ok_or_else(|| RestockError::NotRegistered(key.clone()))?;
        record.restock_interval = seconds;
        record.timer = seconds;
        info!(%key, interval = seconds, "Updated container restock interval");
        self.persist(&records);
        Ok(())
    }

    /// Forget every registered container.
    pub fn clear_all(&self) {
        let mut records = self.write();
        let count = records.len();
        records.clear();
        info!(count, "Cleared all registered containers");
        self.persist(&records);
    }

    /// Drop the record at `key`. Returns whether one existed.
    pub fn remove(&self, key: &LocationKey) -> bool {
        let mut records = self.write();
        let removed = records.remove(key).is_some();
        if removed {
            info!(%key, "Removed container that no longer exists");
            self.persist(&records);
        }
        removed
    }

    /// Snapshot of `(key, timer)` pairs in key order.
    pub fn list(&self) -> impl Iterator<Item = (LocationKey, u32)> {
        let entries: Vec<_> = self
            .read()
            .iter()
            .map(|(key, record)| (key.clone(), record.timer))
            .collect();
        entries.into_iter()
    }

    /// Snapshot of registered keys in key order.
    pub fn keys(&self) -> Vec<LocationKey> {
        self.read().keys().cloned().collect()
    }

    /// Copy of the record at `key`.
    pub fn get(&self, key: &LocationKey) -> Option<ContainerRecord> {
        self.read().get(key).cloned()
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &LocationKey) -> bool {
        self.read().contains_key(key)
    }

    /// Number of registered containers.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Advance the timer at `key` by one second.
    ///
    /// A timer of 1 or 0 expires on this step and reports [`TickStep::Due`]
    /// without being modified; the restock that follows reloads it.
    pub fn advance(&self, key: &LocationKey) -> TickStep {
        let mut records = self.write();
        let Some(record) = records.get_mut(key) else {
            return TickStep::Missing;
        };
        match record.timer.saturating_sub(1) {
            0 => TickStep::Due,
            remaining => {
                record.timer = remaining;
                TickStep::Counting { remaining }
            }
        }
    }

    /// Persist the current state unconditionally.
    pub fn flush(&self) -> Result<(), RestockError> {
        let records = self.read();
        if let Some(store) = &self.store {
            store.save(&records)?;
        }
        Ok(())
    }
}
