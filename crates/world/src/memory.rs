//! In-memory world used by the headless driver and tests.
//!
//! Blocks and actors live in ordered maps so iteration (and therefore
//! notification order) is deterministic.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use restock_core::LocationKey;

use crate::{ActorId, Container, ContainerKind, ContainerProvider, SlotContainer};

/// A placed block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Any block without an inventory.
    Solid(String),
    /// A container-capable block.
    Container(SlotContainer),
}

/// Actor state tracked by the in-memory world.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Display name.
    pub name: String,
    /// World the actor is in.
    pub world: String,
    /// Position (x, y, z).
    pub position: [f64; 3],
    /// Offline actors receive no notifications.
    pub online: bool,
    /// Messages delivered so far.
    pub inbox: Vec<String>,
}

/// Map-backed [`ContainerProvider`].
#[derive(Debug, Default)]
pub struct MemoryWorld {
    containers: BTreeMap<LocationKey, SlotContainer>,
    solids: BTreeMap<LocationKey, String>,
    actors: BTreeMap<ActorId, Actor>,
}

impl MemoryWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an empty container, replacing whatever block was there.
    pub fn place_container(&mut self, key: LocationKey, kind: ContainerKind) -> &mut SlotContainer {
        self.solids.remove(&key);
        match self.containers.entry(key) {
            Entry::Occupied(entry) => {
                let container = entry.into_mut();
                *container = SlotContainer::new(kind);
                container
            }
            Entry::Vacant(entry) => entry.insert(SlotContainer::new(kind)),
        }
    }

    /// Place a block without an inventory.
    pub fn place_solid(&mut self, key: LocationKey, name: impl Into<String>) {
        self.containers.remove(&key);
        self.solids.insert(key, name.into());
    }

    /// Remove the block at `key`, returning it.
    pub fn break_block(&mut self, key: &LocationKey) -> Option<Block> {
        if let Some(container) = self.containers.remove(key) {
            return Some(Block::Container(container));
        }
        self.solids.remove(key).map(Block::Solid)
    }

    /// Read-only access to a container.
    pub fn container(&self, key: &LocationKey) -> Option<&SlotContainer> {
        self.containers.get(key)
    }

    /// Mutable access to a container.
    pub fn container_at_mut(&mut self, key: &LocationKey) -> Option<&mut SlotContainer> {
        self.containers.get_mut(key)
    }

    /// Add an online actor.
    pub fn spawn_actor(
        &mut self,
        id: ActorId,
        name: impl Into<String>,
        world: impl Into<String>,
        position: [f64; 3],
    ) {
        self.actors.insert(
            id,
            Actor {
                name: name.into(),
                world: world.into(),
                position,
                online: true,
                inbox: Vec::new(),
            },
        );
    }

    /// Find an actor by display name.
    pub fn actor_by_name(&self, name: &str) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|(_, actor)| actor.name == name)
            .map(|(id, _)| *id)
    }

    /// Move an actor, possibly into another world.
    pub fn move_actor(&mut self, id: ActorId, world: impl Into<String>, position: [f64; 3]) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.world = world.into();
            actor.position = position;
        }
    }

    /// Mark an actor online or offline.
    pub fn set_online(&mut self, id: ActorId, online: bool) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.online = online;
        }
    }

    /// Drain an actor's delivered messages.
    pub fn take_inbox(&mut self, id: ActorId) -> Vec<String> {
        self.actors
            .get_mut(&id)
            .map(|actor| std::mem::take(&mut actor.inbox))
            .unwrap_or_default()
    }
}

impl ContainerProvider for MemoryWorld {
    fn container_mut(&mut self, key: &LocationKey) -> Option<&mut dyn Container> {
        self.containers
            .get_mut(key)
            .map(|container| container as &mut dyn Container)
    }

    fn is_container(&self, key: &LocationKey) -> bool {
        self.containers.contains_key(key)
    }

    fn actors_near(&self, key: &LocationKey, radius: f64) -> Vec<ActorId> {
        let radius_sq = radius * radius;
        self.actors
            .iter()
            .filter(|(_, actor)| actor.online && actor.world == key.world)
            .filter(|(_, actor)| {
                let [x, y, z] = actor.position;
                key.distance_squared(x, y, z) <= radius_sq
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn notify(&mut self, actor: ActorId, message: &str) {
        if let Some(actor) = self.actors.get_mut(&actor) {
            actor.inbox.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_core::ItemStack;

    fn key(x: i32) -> LocationKey {
        LocationKey::new("world", x, 64, 0)
    }

    #[test]
    fn only_container_blocks_resolve() {
        let mut world = MemoryWorld::new();
        world.place_container(key(0), ContainerKind::Chest);
        world.place_solid(key(1), "stone");

        assert!(world.is_container(&key(0)));
        assert!(!world.is_container(&key(1)));
        assert!(!world.is_container(&key(2)));
        assert!(world.container_mut(&key(1)).is_none());

        let container = world.container_mut(&key(0)).expect("chest");
        container.set_item(3, Some(ItemStack::new("bread", 1)));
        assert!(world.container(&key(0)).unwrap().get_item(3).is_some());
    }

    #[test]
    fn placing_replaces_and_breaking_returns_the_block() {
        let mut world = MemoryWorld::new();
        world
            .place_container(key(0), ContainerKind::Chest)
            .set_item(0, Some(ItemStack::new("bread", 1)));
        let dispenser = world.place_container(key(0), ContainerKind::Dispenser);
        assert_eq!(dispenser.size(), 9);
        assert!(dispenser.get_item(0).is_none());

        world.place_solid(key(0), "stone");
        assert!(!world.is_container(&key(0)));
        assert_eq!(world.break_block(&key(0)), Some(Block::Solid("stone".into())));
        assert_eq!(world.break_block(&key(0)), None);

        world.place_container(key(1), ContainerKind::Chest);
        assert!(matches!(world.break_block(&key(1)), Some(Block::Container(_))));
        assert!(world.container(&key(1)).is_none());
    }

    #[test]
    fn actors_near_filters_world_radius_and_presence() {
        let mut world = MemoryWorld::new();
        world.spawn_actor(ActorId(1), "near", "world", [3.0, 64.0, 4.0]);
        world.spawn_actor(ActorId(2), "far", "world", [30.0, 64.0, 0.0]);
        world.spawn_actor(ActorId(3), "elsewhere", "world_nether", [0.0, 64.0, 0.0]);
        world.spawn_actor(ActorId(4), "away", "world", [0.0, 64.0, 0.0]);
        world.set_online(ActorId(4), false);

        assert_eq!(world.actors_near(&key(0), 10.0), vec![ActorId(1)]);
    }

    #[test]
    fn notify_fills_inbox() {
        let mut world = MemoryWorld::new();
        world.spawn_actor(ActorId(7), "alex", "world", [0.0, 0.0, 0.0]);
        world.notify(ActorId(7), "hello");
        world.notify(ActorId(99), "nobody");
        assert_eq!(world.actor_by_name("alex"), Some(ActorId(7)));
        assert_eq!(world.take_inbox(ActorId(7)), vec!["hello".to_string()]);
        assert!(world.take_inbox(ActorId(7)).is_empty());
    }
}
