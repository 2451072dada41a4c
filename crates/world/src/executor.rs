//! Applying templates to live containers.

use restock_core::LocationKey;
use tracing::debug;

use crate::{ActorId, ContainerProvider, ContainerRegistry, RestockError};

/// Radius (in blocks) of the auto-restock announcement.
pub const ANNOUNCE_RADIUS: f64 = 10.0;

/// Sent to nearby actors after an automatic restock.
pub const AUTO_RESTOCK_NOTICE: &str = "Container auto-restocked nearby.";

/// Sent to the initiating actor after a manual restock.
pub const MANUAL_RESTOCK_NOTICE: &str = "Container restocked!";

/// What an automatic restock did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoRestock {
    /// Template applied; `notified` actors were told.
    Restocked {
        /// Number of announcement recipients.
        notified: usize,
    },
    /// The block is gone or no longer a container; the record was dropped.
    Removed,
    /// The record disappeared concurrently; nothing happened.
    Skipped,
}

/// Restock `key` on behalf of the scheduler.
///
/// | Live block | Effect |
/// |---|---|
/// | missing or not a container | record removed |
/// | container | template applied, timer reset |
///
/// When `announce` is set, online actors within [`ANNOUNCE_RADIUS`] in the
/// same world receive [`AUTO_RESTOCK_NOTICE`].
pub fn auto_restock<P>(
    registry: &ContainerRegistry,
    provider: &mut P,
    key: &LocationKey,
    announce: bool,
) -> AutoRestock
where
    P: ContainerProvider + ?Sized,
{
    let Some(container) = provider.container_mut(key) else {
        registry.remove(key);
        return AutoRestock::Removed;
    };

    match registry.restock(key, container) {
        Ok(filled) => {
            debug!(%key, filled, "Auto-restocked container");
        }
        Err(_) => return AutoRestock::Skipped,
    }

    let mut notified = 0;
    if announce {
        for actor in provider.actors_near(key, ANNOUNCE_RADIUS) {
            provider.notify(actor, AUTO_RESTOCK_NOTICE);
            notified += 1;
        }
    }
    AutoRestock::Restocked { notified }
}

/// Restock `key` because `actor` struck it.
///
/// Registration is checked first. The live block is not re-validated beyond
/// resolving its slot array, and the record is never removed here. On success
/// the actor receives [`MANUAL_RESTOCK_NOTICE`].
pub fn manual_restock<P>(
    registry: &ContainerRegistry,
    provider: &mut P,
    key: &LocationKey,
    actor: ActorId,
) -> Result<usize, RestockError>
where
    P: ContainerProvider + ?Sized,
{
    if !registry.contains(key) {
        return Err(RestockError::NotRegistered(key.clone()));
    }
    let container = provider
        .container_mut(key)
        .ok_or_else(|| RestockError::ContainerUnavailable(key.clone()))?;
    let filled = registry.restock(key, container)?;
    provider.notify(actor, MANUAL_RESTOCK_NOTICE);
    debug!(%key, %actor, filled, "Manually restocked container");
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Container, ContainerKind, MemoryWorld};
    use restock_core::ItemStack;

    fn key() -> LocationKey {
        LocationKey::new("world", 0, 64, 0)
    }

    fn setup() -> (ContainerRegistry, MemoryWorld) {
        let registry = ContainerRegistry::new();
        let mut world = MemoryWorld::new();
        let chest = world.place_container(key(), ContainerKind::Chest);
        chest.set_item(2, Some(ItemStack::new("bread", 6)));
        registry.register(key(), &chest.contents(), 10);
        chest.clear();
        (registry, world)
    }

    #[test]
    fn auto_restock_applies_template() {
        let (registry, mut world) = setup();
        let outcome = auto_restock(&registry, &mut world, &key(), false);
        assert_eq!(outcome, AutoRestock::Restocked { notified: 0 });
        assert_eq!(
            world.container(&key()).unwrap().get_item(2),
            Some(&ItemStack::new("bread", 6))
        );
    }

    #[test]
    fn auto_restock_removes_record_when_block_is_gone() {
        let (registry, mut world) = setup();
        world.place_solid(key(), "stone");
        assert_eq!(auto_restock(&registry, &mut world, &key(), true), AutoRestock::Removed);
        assert!(!registry.contains(&key()));

        let (registry, mut world) = setup();
        world.break_block(&key());
        assert_eq!(auto_restock(&registry, &mut world, &key(), false), AutoRestock::Removed);
        assert!(registry.is_empty());
    }

    #[test]
    fn auto_restock_skips_vanished_record() {
        let (registry, mut world) = setup();
        registry.clear_all();
        assert_eq!(auto_restock(&registry, &mut world, &key(), false), AutoRestock::Skipped);
        assert!(world.container(&key()).unwrap().get_item(2).is_none());
    }

    #[test]
    fn announcement_reaches_only_nearby_actors() {
        let (registry, mut world) = setup();
        world.spawn_actor(ActorId(1), "near", "world", [5.0, 64.0, 5.0]);
        world.spawn_actor(ActorId(2), "far", "world", [50.0, 64.0, 0.0]);
        world.spawn_actor(ActorId(3), "edge", "world", [10.0, 64.0, 0.0]);
        world.spawn_actor(ActorId(4), "past-edge", "world", [0.0, 64.0, -10.5]);

        let outcome = auto_restock(&registry, &mut world, &key(), true);
        assert_eq!(outcome, AutoRestock::Restocked { notified: 2 });
        assert_eq!(world.take_inbox(ActorId(1)), vec![AUTO_RESTOCK_NOTICE.to_string()]);
        assert_eq!(world.take_inbox(ActorId(3)), vec![AUTO_RESTOCK_NOTICE.to_string()]);
        assert!(world.take_inbox(ActorId(2)).is_empty());
        assert!(world.take_inbox(ActorId(4)).is_empty());

        auto_restock(&registry, &mut world, &key(), false);
        assert!(world.take_inbox(ActorId(1)).is_empty());
    }

    #[test]
    fn manual_restock_confirms_to_actor() {
        let (registry, mut world) = setup();
        world.spawn_actor(ActorId(9), "far-away", "world", [500.0, 64.0, 0.0]);
        registry.set_interval(&key(), 50).unwrap();
        registry.advance(&key());

        let filled = manual_restock(&registry, &mut world, &key(), ActorId(9)).unwrap();
        assert_eq!(filled, 1);
        assert_eq!(registry.get(&key()).unwrap().timer, 50);
        assert_eq!(world.take_inbox(ActorId(9)), vec![MANUAL_RESTOCK_NOTICE.to_string()]);
    }

    #[test]
    fn manual_restock_reports_errors_without_removing() {
        let (registry, mut world) = setup();
        let other = LocationKey::new("world", 1, 64, 0);
        world.place_container(other.clone(), ContainerKind::Dispenser);
        assert!(matches!(
            manual_restock(&registry, &mut world, &other, ActorId(1)),
            Err(RestockError::NotRegistered(_))
        ));

        world.break_block(&key());
        assert!(matches!(
            manual_restock(&registry, &mut world, &key(), ActorId(1)),
            Err(RestockError::ContainerUnavailable(_))
        ));
        assert!(registry.contains(&key()));
    }
}
